//! # CONTAINER CONFIGURATION
//!
//! Deployment settings, loadable from JSON. Every field has a default, so a
//! partial document only overrides what it names.

use crate::beans::ScopeKind;
use crate::errors::{error_codes, ContainerError, ContainerResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Alternatives enabled without a priority, by bean identifier or bean-class raw name.
    pub enabled_alternatives: Vec<String>,
    /// Names of custom normal scopes handles may activate.
    pub custom_scopes: Vec<String>,
    /// Raw requests match every parameterization of their raw type.
    pub relaxed_raw_types: bool,
    /// Declared injection points must resolve uniquely at deployment.
    pub validate_injection_points: bool,
    /// Injection points reached without a proxy must not form a cycle.
    pub detect_unproxied_cycles: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            enabled_alternatives: Vec::new(),
            custom_scopes: Vec::new(),
            relaxed_raw_types: true,
            validate_injection_points: true,
            detect_unproxied_cycles: true,
        }
    }
}

impl ContainerConfig {
    pub fn from_json_str(json: &str) -> ContainerResult<Self> {
        let config: ContainerConfig = serde_json::from_str(json).map_err(|e| {
            ContainerError::configuration(
                error_codes::INVALID_CONFIG,
                format!("invalid container configuration: {}", e),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> ContainerResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ContainerError::configuration(
                error_codes::INVALID_CONFIG,
                format!("cannot read {}: {}", path.display(), e),
            )
        })?;
        Self::from_json_str(&json)
    }

    /// Custom scope names must be non-empty and distinct from the built-in scopes.
    pub fn validate(&self) -> ContainerResult<()> {
        for name in &self.custom_scopes {
            if name.trim().is_empty() {
                return Err(ContainerError::configuration(
                    error_codes::INVALID_CONFIG,
                    "custom scope names must not be empty",
                ));
            }
            if !matches!(ScopeKind::from_name(name), ScopeKind::Custom(_)) {
                return Err(ContainerError::configuration(
                    error_codes::INVALID_CONFIG,
                    format!("'{}' is a built-in scope, not a custom one", name),
                ));
            }
        }
        Ok(())
    }

    pub fn declares_scope(&self, name: &str) -> bool {
        self.custom_scopes.iter().any(|scope| scope == name)
    }

    pub fn with_custom_scope(mut self, name: impl Into<String>) -> Self {
        self.custom_scopes.push(name.into());
        self
    }

    pub fn with_enabled_alternative(mut self, selector: impl Into<String>) -> Self {
        self.enabled_alternatives.push(selector.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ContainerConfig::default();
        assert!(config.relaxed_raw_types);
        assert!(config.validate_injection_points);
        assert!(config.detect_unproxied_cycles);
        assert!(config.custom_scopes.is_empty());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ContainerConfig::from_json_str(
            r#"{"enabled_alternatives": ["MockMailer"], "relaxed_raw_types": false}"#,
        )
        .unwrap();
        assert_eq!(config.enabled_alternatives, vec!["MockMailer"]);
        assert!(!config.relaxed_raw_types);
        assert!(config.validate_injection_points);
    }

    #[test]
    fn test_invalid_json() {
        let err = ContainerConfig::from_json_str("{not json").unwrap_err();
        assert_eq!(err.code(), Some(error_codes::INVALID_CONFIG));
    }

    #[test]
    fn test_builtin_scope_rejected_as_custom() {
        let err = ContainerConfig::from_json_str(r#"{"custom_scopes": ["request"]}"#).unwrap_err();
        assert_eq!(err.code(), Some(error_codes::INVALID_CONFIG));

        let config =
            ContainerConfig::from_json_str(r#"{"custom_scopes": ["conversation"]}"#).unwrap();
        assert!(config.declares_scope("conversation"));
    }

    #[test]
    fn test_missing_file() {
        let err = ContainerConfig::from_json_file("/nonexistent/container.json").unwrap_err();
        assert_eq!(err.code(), Some(error_codes::INVALID_CONFIG));
    }
}
