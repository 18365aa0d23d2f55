use serde::{Deserialize, Serialize};
use std::fmt;

/// **SCOPE KIND**
///
/// Normal scopes (`Application`, `Request`, `Session`, custom) keep one instance per
/// store and are reached through client proxies. Pseudo scopes (`Dependent`,
/// `Singleton`) hand out the instance itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScopeKind {
    #[default]
    Dependent,
    Singleton,
    Application,
    Request,
    Session,
    Custom(String),
}

impl ScopeKind {
    pub fn is_normal(&self) -> bool {
        matches!(
            self,
            ScopeKind::Application | ScopeKind::Request | ScopeKind::Session | ScopeKind::Custom(_)
        )
    }

    pub fn is_pseudo(&self) -> bool {
        !self.is_normal()
    }

    /// Stores owned by the container itself, active for its whole life.
    pub fn is_container_owned(&self) -> bool {
        matches!(self, ScopeKind::Application | ScopeKind::Singleton)
    }

    pub fn name(&self) -> &str {
        match self {
            ScopeKind::Dependent => "dependent",
            ScopeKind::Singleton => "singleton",
            ScopeKind::Application => "application",
            ScopeKind::Request => "request",
            ScopeKind::Session => "session",
            ScopeKind::Custom(name) => name,
        }
    }

    /// Built-in scope by name; any other name is a custom scope.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "dependent" => ScopeKind::Dependent,
            "singleton" => ScopeKind::Singleton,
            "application" => ScopeKind::Application,
            "request" => ScopeKind::Request,
            "session" => ScopeKind::Session,
            _ => ScopeKind::Custom(name.to_string()),
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
