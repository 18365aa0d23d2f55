use crate::beans::BeanId;
use thiserror::Error;

/// **DISPOSAL FAILURE**
///
/// One failed destruction: the bean whose disposer failed and the reported reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisposalFailure {
    pub bean: BeanId,
    pub message: String,
}

impl DisposalFailure {
    pub fn new(bean: BeanId, message: impl Into<String>) -> Self {
        Self {
            bean,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for DisposalFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.bean, self.message)
    }
}

#[derive(Debug, Clone, Error)]
pub enum ContainerError {
    #[error("DEFINITION ERROR: {code} - {message}")]
    Definition { code: String, message: String },

    #[error("CONFIGURATION ERROR: {code} - {message}")]
    Configuration { code: String, message: String },

    #[error("NOT DEPLOYED: resolution of {key} attempted before deployment complete")]
    NotDeployed { key: String },

    #[error("UNSATISFIED DEPENDENCY: no bean matches {key}")]
    Unsatisfied { key: String },

    #[error("AMBIGUOUS DEPENDENCY: {key} matches {}", .candidates.join(", "))]
    Ambiguous { key: String, candidates: Vec<String> },

    #[error("CIRCULAR CONSTRUCTION: {}", .chain.join(" -> "))]
    CircularConstruction { chain: Vec<String> },

    #[error("CONTEXT NOT ACTIVE: no active context for scope {scope}")]
    ContextNotActive { scope: String },

    #[error("CONTEXT ALREADY ACTIVE: scope {scope} is already active")]
    ContextAlreadyActive { scope: String },

    #[error("CONSTRUCTION ERROR: bean {bean} - {message}")]
    Construction { bean: String, message: String },

    #[error("INSTANCE TYPE ERROR: instance of bean {bean} is not a {expected}")]
    InstanceType { bean: String, expected: &'static str },

    #[error("DISPOSAL ERROR: {}", describe_failures(.failures))]
    Disposal { failures: Vec<DisposalFailure> },
}

fn describe_failures(failures: &[DisposalFailure]) -> String {
    let joined = failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    format!("{} instance(s) failed to dispose: {}", failures.len(), joined)
}

impl ContainerError {
    pub fn definition(code: &str, message: impl Into<String>) -> Self {
        ContainerError::Definition {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn configuration(code: &str, message: impl Into<String>) -> Self {
        ContainerError::Configuration {
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Error a bean factory returns when it cannot build its instance.
    pub fn construction(bean: impl Into<String>, message: impl Into<String>) -> Self {
        ContainerError::Construction {
            bean: bean.into(),
            message: message.into(),
        }
    }

    /// **RESOLUTION ERROR CHECK**
    ///
    /// `Unsatisfied` and `Ambiguous` are ordinary outcomes of a unique lookup that
    /// application code may recover from; everything else aborts the triggering operation.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            ContainerError::Unsatisfied { .. } | ContainerError::Ambiguous { .. }
        )
    }

    /// Stable code for the definition and configuration kinds.
    pub fn code(&self) -> Option<&str> {
        match self {
            ContainerError::Definition { code, .. }
            | ContainerError::Configuration { code, .. } => Some(code),
            _ => None,
        }
    }
}

pub type ContainerResult<T> = Result<T, ContainerError>;

/// **ERROR CODES**
///
/// Stable identifiers carried by `Definition` and `Configuration` errors.
pub mod error_codes {
    pub const EMPTY_BEAN_ID: &str = "CONTAINER_DEFINITION_EMPTY_BEAN_ID";
    pub const DUPLICATE_BEAN: &str = "CONTAINER_DEFINITION_DUPLICATE_BEAN";
    pub const MISSING_CONSTRUCTION: &str = "CONTAINER_DEFINITION_MISSING_CONSTRUCTION";
    pub const INVALID_TYPE: &str = "CONTAINER_DEFINITION_INVALID_TYPE";
    pub const SPECIALIZED_BEAN_MISSING: &str = "CONTAINER_DEFINITION_SPECIALIZED_BEAN_MISSING";
    pub const SPECIALIZATION_TYPES: &str = "CONTAINER_DEFINITION_SPECIALIZATION_TYPES";
    pub const SPECIALIZATION_QUALIFIERS: &str = "CONTAINER_DEFINITION_SPECIALIZATION_QUALIFIERS";
    pub const INCONSISTENT_SPECIALIZATION: &str =
        "CONTAINER_DEFINITION_INCONSISTENT_SPECIALIZATION";
    pub const DECLARING_BEAN_MISSING: &str = "CONTAINER_DEFINITION_DECLARING_BEAN_MISSING";
    pub const SPECIALIZATION_CYCLE: &str = "CONTAINER_DEFINITION_SPECIALIZATION_CYCLE";
    pub const DEPENDENT_VALUE: &str = "CONTAINER_DEFINITION_DEPENDENT_VALUE";
    pub const AMBIGUOUS_NAME: &str = "CONTAINER_DEFINITION_AMBIGUOUS_NAME";
    pub const INVALID_DECORATOR: &str = "CONTAINER_DEFINITION_INVALID_DECORATOR";
    pub const DISCOVERY: &str = "CONTAINER_DEFINITION_DISCOVERY";
    pub const UNSATISFIED_INJECTION_POINT: &str =
        "CONTAINER_DEFINITION_UNSATISFIED_INJECTION_POINT";
    pub const AMBIGUOUS_INJECTION_POINT: &str = "CONTAINER_DEFINITION_AMBIGUOUS_INJECTION_POINT";
    pub const UNPROXIED_CYCLE: &str = "CONTAINER_DEFINITION_UNPROXIED_CYCLE";
    pub const EXTENSION_FAILED: &str = "CONTAINER_DEFINITION_EXTENSION_FAILED";

    pub const REGISTRY_FROZEN: &str = "CONTAINER_CONFIGURATION_REGISTRY_FROZEN";
    pub const INVALID_CONFIG: &str = "CONTAINER_CONFIGURATION_INVALID_CONFIG";
    pub const UNKNOWN_SCOPE: &str = "CONTAINER_CONFIGURATION_UNKNOWN_SCOPE";
    pub const NOT_ACTIVATABLE: &str = "CONTAINER_CONFIGURATION_NOT_ACTIVATABLE";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_errors_are_recoverable() {
        let unsatisfied = ContainerError::Unsatisfied {
            key: "Bar @Red".to_string(),
        };
        let ambiguous = ContainerError::Ambiguous {
            key: "Foo".to_string(),
            candidates: vec!["p".to_string(), "q".to_string()],
        };
        let circular = ContainerError::CircularConstruction {
            chain: vec!["c".to_string(), "d".to_string(), "c".to_string()],
        };

        assert!(unsatisfied.is_resolution_error());
        assert!(ambiguous.is_resolution_error());
        assert!(!circular.is_resolution_error());
    }

    #[test]
    fn test_error_messages() {
        let ambiguous = ContainerError::Ambiguous {
            key: "Foo".to_string(),
            candidates: vec!["p".to_string(), "q".to_string()],
        };
        assert_eq!(
            ambiguous.to_string(),
            "AMBIGUOUS DEPENDENCY: Foo matches p, q"
        );

        let circular = ContainerError::CircularConstruction {
            chain: vec!["c".to_string(), "d".to_string(), "c".to_string()],
        };
        assert_eq!(circular.to_string(), "CIRCULAR CONSTRUCTION: c -> d -> c");

        let disposal = ContainerError::Disposal {
            failures: vec![DisposalFailure::new(BeanId::new("b"), "boom")],
        };
        assert!(disposal.to_string().contains("1 instance(s)"));
        assert!(disposal.to_string().contains("b: boom"));
    }

    #[test]
    fn test_error_codes() {
        let err =
            ContainerError::definition(error_codes::DUPLICATE_BEAN, "bean 'a' registered twice");
        assert_eq!(err.code(), Some(error_codes::DUPLICATE_BEAN));
        assert!(err.to_string().contains("DEFINITION ERROR"));

        let err = ContainerError::construction("a", "factory failed");
        assert_eq!(err.code(), None);
    }
}
