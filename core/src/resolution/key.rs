use crate::beans::BeanMetadata;
use crate::errors::ContainerError;
use crate::qualifiers::QualifierSet;
use crate::types::TypeDescriptor;
use std::fmt;
use std::sync::Arc;

/// **RESOLUTION KEY**
///
/// Requested type plus requested qualifiers. Qualifiers are stored in their binding
/// view, so two keys differing only in non-binding members are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionKey {
    required_type: TypeDescriptor,
    qualifiers: QualifierSet,
}

impl ResolutionKey {
    pub fn new(required_type: TypeDescriptor, qualifiers: &QualifierSet) -> Self {
        Self {
            required_type,
            qualifiers: qualifiers.binding_view(),
        }
    }

    pub fn of_type(required_type: TypeDescriptor) -> Self {
        Self::new(required_type, &QualifierSet::new())
    }

    pub fn required_type(&self) -> &TypeDescriptor {
        &self.required_type
    }

    pub fn qualifiers(&self) -> &QualifierSet {
        &self.qualifiers
    }
}

impl fmt::Display for ResolutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.qualifiers.is_empty() {
            write!(f, "{}", self.required_type)
        } else {
            write!(f, "{} {}", self.required_type, self.qualifiers)
        }
    }
}

#[derive(Debug, Clone)]
pub enum ResolutionOutcome {
    Unique(Arc<BeanMetadata>),
    Ambiguous(Vec<Arc<BeanMetadata>>),
    Unsatisfied,
}

impl ResolutionOutcome {
    pub fn classify(mut survivors: Vec<Arc<BeanMetadata>>) -> Self {
        match survivors.len() {
            0 => ResolutionOutcome::Unsatisfied,
            1 => ResolutionOutcome::Unique(survivors.remove(0)),
            _ => ResolutionOutcome::Ambiguous(survivors),
        }
    }

    pub fn is_unique(&self) -> bool {
        matches!(self, ResolutionOutcome::Unique(_))
    }
}

/// Cached result for one key: every matching candidate plus the unique-lookup verdict.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub key: ResolutionKey,
    /// Matching, non-specialized beans in registration order.
    pub candidates: Vec<Arc<BeanMetadata>>,
    pub outcome: ResolutionOutcome,
}

impl Resolution {
    /// The unique bean, or the `Unsatisfied`/`Ambiguous` error for this key.
    pub fn unique(&self) -> Result<Arc<BeanMetadata>, ContainerError> {
        match &self.outcome {
            ResolutionOutcome::Unique(bean) => Ok(Arc::clone(bean)),
            ResolutionOutcome::Unsatisfied => Err(ContainerError::Unsatisfied {
                key: self.key.to_string(),
            }),
            ResolutionOutcome::Ambiguous(beans) => Err(ContainerError::Ambiguous {
                key: self.key.to_string(),
                candidates: beans.iter().map(|b| b.id().to_string()).collect(),
            }),
        }
    }
}
