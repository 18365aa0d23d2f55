use crate::qualifiers::types::{Qualifier, QualifierSet};
use once_cell::sync::Lazy;

static IMPLICIT_DEFAULT: Lazy<QualifierSet> =
    Lazy::new(|| QualifierSet::of([Qualifier::default_qualifier()]));

/// **QUALIFIER MATCHER**
///
/// An empty request stands for `Default`. A candidate matches when every requested
/// qualifier finds a binding-equal qualifier among the candidate's; a requested
/// `Any` is satisfied by every candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualifierMatcher;

impl QualifierMatcher {
    pub fn new() -> Self {
        Self
    }

    pub fn matches(&self, requested: &QualifierSet, candidate: &QualifierSet) -> bool {
        let requested = if requested.is_empty() {
            &*IMPLICIT_DEFAULT
        } else {
            requested
        };

        requested
            .iter()
            .filter(|q| !q.is_any())
            .all(|wanted| candidate.iter().any(|q| q.binding_eq(wanted)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bean(qualifiers: Vec<Qualifier>) -> QualifierSet {
        QualifierSet::of(qualifiers).normalized_for_bean()
    }

    #[test]
    fn test_empty_request_means_default() {
        let matcher = QualifierMatcher::new();
        assert!(matcher.matches(&QualifierSet::new(), &bean(vec![])));
        assert!(!matcher.matches(&QualifierSet::new(), &bean(vec![Qualifier::new("Red")])));
    }

    #[test]
    fn test_every_requested_qualifier_must_match() {
        let matcher = QualifierMatcher::new();
        let candidate = bean(vec![Qualifier::new("Red"), Qualifier::new("Fast")]);

        assert!(matcher.matches(&QualifierSet::of([Qualifier::new("Red")]), &candidate));
        assert!(matcher.matches(
            &QualifierSet::of([Qualifier::new("Red"), Qualifier::new("Fast")]),
            &candidate
        ));
        assert!(!matcher.matches(
            &QualifierSet::of([Qualifier::new("Red"), Qualifier::new("Slow")]),
            &candidate
        ));
    }

    #[test]
    fn test_any_matches_unconditionally() {
        let matcher = QualifierMatcher::new();
        let any = QualifierSet::of([Qualifier::any()]);
        assert!(matcher.matches(&any, &bean(vec![Qualifier::new("Red")])));
        assert!(matcher.matches(&any, &QualifierSet::new()));

        let any_red = QualifierSet::of([Qualifier::any(), Qualifier::new("Red")]);
        assert!(!matcher.matches(&any_red, &bean(vec![Qualifier::new("Blue")])));
    }

    #[test]
    fn test_binding_members() {
        let matcher = QualifierMatcher::new();
        let candidate = bean(vec![Qualifier::new("Store")
            .member("kind", "disk")
            .non_binding("description", "local files")]);

        let same = QualifierSet::of([Qualifier::new("Store").member("kind", "disk")]);
        let different = QualifierSet::of([Qualifier::new("Store").member("kind", "memory")]);

        assert!(matcher.matches(&same, &candidate));
        assert!(!matcher.matches(&different, &candidate));
    }
}
