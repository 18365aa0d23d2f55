use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub const DEFAULT: &str = "Default";
pub const ANY: &str = "Any";
pub const NAMED: &str = "Named";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemberValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<MemberValue>),
}

impl From<&str> for MemberValue {
    fn from(value: &str) -> Self {
        MemberValue::Str(value.to_string())
    }
}

impl From<String> for MemberValue {
    fn from(value: String) -> Self {
        MemberValue::Str(value)
    }
}

impl From<i64> for MemberValue {
    fn from(value: i64) -> Self {
        MemberValue::Int(value)
    }
}

impl From<bool> for MemberValue {
    fn from(value: bool) -> Self {
        MemberValue::Bool(value)
    }
}

impl fmt::Display for MemberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberValue::Bool(b) => write!(f, "{}", b),
            MemberValue::Int(i) => write!(f, "{}", i),
            MemberValue::Str(s) => write!(f, "\"{}\"", s),
            MemberValue::List(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "}}")
            }
        }
    }
}

fn binding_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifierMember {
    pub value: MemberValue,
    #[serde(default = "binding_default")]
    pub binding: bool,
}

/// **QUALIFIER**
///
/// **PURPOSE**: Typed discriminator attached to beans and requests.
/// **GUARANTEE**: Matching compares the kind and the binding members only;
/// members flagged non-binding never affect resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Qualifier {
    pub kind: String,
    #[serde(default)]
    pub members: BTreeMap<String, QualifierMember>,
}

impl Qualifier {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            members: BTreeMap::new(),
        }
    }

    pub fn default_qualifier() -> Self {
        Self::new(DEFAULT)
    }

    pub fn any() -> Self {
        Self::new(ANY)
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new(NAMED).member("value", name.into())
    }

    /// Adds a binding member.
    pub fn member(mut self, name: impl Into<String>, value: impl Into<MemberValue>) -> Self {
        self.members.insert(
            name.into(),
            QualifierMember {
                value: value.into(),
                binding: true,
            },
        );
        self
    }

    /// Adds a member ignored during matching.
    pub fn non_binding(mut self, name: impl Into<String>, value: impl Into<MemberValue>) -> Self {
        self.members.insert(
            name.into(),
            QualifierMember {
                value: value.into(),
                binding: false,
            },
        );
        self
    }

    pub fn is_any(&self) -> bool {
        self.kind == ANY
    }

    pub fn is_default(&self) -> bool {
        self.kind == DEFAULT
    }

    pub fn is_named(&self) -> bool {
        self.kind == NAMED
    }

    /// `value` member of a `Named` qualifier.
    pub fn name_value(&self) -> Option<&str> {
        if !self.is_named() {
            return None;
        }
        match self.members.get("value").map(|m| &m.value) {
            Some(MemberValue::Str(name)) => Some(name),
            _ => None,
        }
    }

    /// Same kind and equal values for every member flagged binding on either side.
    pub fn binding_eq(&self, other: &Qualifier) -> bool {
        if self.kind != other.kind {
            return false;
        }
        let binding_names: BTreeSet<&String> = self
            .members
            .iter()
            .chain(other.members.iter())
            .filter(|(_, member)| member.binding)
            .map(|(name, _)| name)
            .collect();

        binding_names.into_iter().all(|name| {
            match (self.members.get(name), other.members.get(name)) {
                (Some(a), Some(b)) => a.value == b.value,
                _ => false,
            }
        })
    }

    /// Copy without non-binding members; the form used in resolution keys.
    pub fn binding_view(&self) -> Qualifier {
        Qualifier {
            kind: self.kind.clone(),
            members: self
                .members
                .iter()
                .filter(|(_, member)| member.binding)
                .map(|(name, member)| (name.clone(), member.clone()))
                .collect(),
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.kind)?;
        if self.members.is_empty() {
            return Ok(());
        }
        write!(f, "(")?;
        for (i, (name, member)) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, member.value)?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualifierSet(BTreeSet<Qualifier>);

impl QualifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(qualifiers: impl IntoIterator<Item = Qualifier>) -> Self {
        Self(qualifiers.into_iter().collect())
    }

    pub fn with(mut self, qualifier: Qualifier) -> Self {
        self.0.insert(qualifier);
        self
    }

    pub fn insert(&mut self, qualifier: Qualifier) -> bool {
        self.0.insert(qualifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Qualifier> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_kind(&self, kind: &str) -> bool {
        self.0.iter().any(|q| q.kind == kind)
    }

    /// Bean name carried by a `Named` qualifier, if any.
    pub fn name(&self) -> Option<&str> {
        self.0.iter().find_map(Qualifier::name_value)
    }

    /// **BEAN QUALIFIER NORMALIZATION**
    ///
    /// Beans declaring nothing beyond `Named`/`Any` carry `Default`; every bean carries `Any`.
    pub fn normalized_for_bean(&self) -> QualifierSet {
        let mut normalized = self.clone();
        if self.0.iter().all(|q| q.is_named() || q.is_any()) {
            normalized.insert(Qualifier::default_qualifier());
        }
        normalized.insert(Qualifier::any());
        normalized
    }

    /// Copy with non-binding members stripped from every qualifier.
    pub fn binding_view(&self) -> QualifierSet {
        QualifierSet(self.0.iter().map(Qualifier::binding_view).collect())
    }

    /// Every qualifier of `other` has a binding-equal counterpart here.
    pub fn covers(&self, other: &QualifierSet) -> bool {
        other
            .iter()
            .all(|wanted| self.0.iter().any(|q| q.binding_eq(wanted)))
    }
}

impl FromIterator<Qualifier> for QualifierSet {
    fn from_iter<I: IntoIterator<Item = Qualifier>>(iter: I) -> Self {
        Self::of(iter)
    }
}

impl fmt::Display for QualifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", rendered.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_eq_ignores_non_binding_members() {
        let a = Qualifier::new("Cached").member("region", "eu").non_binding("note", "a");
        let b = Qualifier::new("Cached").member("region", "eu").non_binding("note", "b");
        let c = Qualifier::new("Cached").member("region", "us");

        assert!(a.binding_eq(&b));
        assert!(!a.binding_eq(&c));
        assert_ne!(a, b);
        assert_eq!(a.binding_view(), b.binding_view());
    }

    #[test]
    fn test_binding_member_missing_on_one_side() {
        let with = Qualifier::new("Cached").member("region", "eu");
        let without = Qualifier::new("Cached");
        assert!(!with.binding_eq(&without));
    }

    #[test]
    fn test_bean_normalization() {
        let plain = QualifierSet::new().normalized_for_bean();
        assert!(plain.contains_kind(DEFAULT));
        assert!(plain.contains_kind(ANY));

        let named = QualifierSet::of([Qualifier::named("orders")]).normalized_for_bean();
        assert!(named.contains_kind(DEFAULT));
        assert_eq!(named.name(), Some("orders"));

        let red = QualifierSet::of([Qualifier::new("Red")]).normalized_for_bean();
        assert!(!red.contains_kind(DEFAULT));
        assert!(red.contains_kind(ANY));
    }

    #[test]
    fn test_with_chains_and_deduplicates() {
        let set = QualifierSet::new()
            .with(Qualifier::new("Red"))
            .with(Qualifier::new("Fast"))
            .with(Qualifier::new("Red"));
        assert_eq!(set.len(), 2);
        assert_eq!(set, QualifierSet::of([Qualifier::new("Fast"), Qualifier::new("Red")]));
    }

    #[test]
    fn test_display() {
        let q = Qualifier::new("Cached").member("region", "eu").member("ttl", 30i64);
        assert_eq!(q.to_string(), "@Cached(region=\"eu\", ttl=30)");
    }
}
