use crate::qualifiers::{Qualifier, QualifierSet};
use crate::types::TypeDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an injection point receives its dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Delivery {
    /// Contextual reference: a client proxy for normal scopes, the instance otherwise.
    Reference,
    /// The contextual instance itself, never proxied.
    Instance,
    /// Every matching bean, no uniqueness requirement.
    All,
}

/// **INJECTION POINT**
///
/// A dependency a bean declares. Factories look dependencies up through their
/// creation context; declared injection points let deployment validate them upfront.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InjectionPoint {
    pub required_type: TypeDescriptor,
    #[serde(default)]
    pub qualifiers: QualifierSet,
    pub delivery: Delivery,
}

impl InjectionPoint {
    pub fn reference(required_type: TypeDescriptor) -> Self {
        Self {
            required_type,
            qualifiers: QualifierSet::new(),
            delivery: Delivery::Reference,
        }
    }

    pub fn instance(required_type: TypeDescriptor) -> Self {
        Self {
            delivery: Delivery::Instance,
            ..Self::reference(required_type)
        }
    }

    pub fn all(required_type: TypeDescriptor) -> Self {
        Self {
            delivery: Delivery::All,
            ..Self::reference(required_type)
        }
    }

    pub fn qualified(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers.insert(qualifier);
        self
    }

    pub fn requires_unique(&self) -> bool {
        self.delivery != Delivery::All
    }
}

impl fmt::Display for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.qualifiers.is_empty() {
            write!(f, "{}", self.required_type)
        } else {
            write!(f, "{} {}", self.qualifiers, self.required_type)
        }
    }
}
