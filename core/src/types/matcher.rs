use crate::types::descriptor::{TypeDescriptor, WildcardBound};
use crate::types::hierarchy::TypeHierarchy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// **TYPE MATCHER**
///
/// **PURPOSE**: Decides whether a bean type closure satisfies a requested type.
/// **GUARANTEE**: Pure. Verdicts are memoized per `(requested, candidate)` pair.
///
/// Rules, after normalization:
/// - identical types match;
/// - a raw request matches any parameterization of the same raw type (legacy mode,
///   disabled by `relaxed_raw_types = false`);
/// - a parameterized request matches a bean type with the same raw type when every
///   argument pair matches (see [`TypeMatcher::argument_matches`]);
/// - a raw bean type matches a parameterized request only when every requested
///   argument is `Object` or an unbounded type variable.
pub struct TypeMatcher {
    hierarchy: Arc<TypeHierarchy>,
    relaxed_raw_types: bool,
    memo: RwLock<HashMap<(TypeDescriptor, TypeDescriptor), bool>>,
}

impl TypeMatcher {
    pub fn new(hierarchy: Arc<TypeHierarchy>) -> Self {
        Self::with_raw_mode(hierarchy, true)
    }

    pub fn with_raw_mode(hierarchy: Arc<TypeHierarchy>, relaxed_raw_types: bool) -> Self {
        Self {
            hierarchy,
            relaxed_raw_types,
            memo: RwLock::new(HashMap::new()),
        }
    }

    pub fn hierarchy(&self) -> &TypeHierarchy {
        &self.hierarchy
    }

    /// `true` if any type in the closure matches the requested type.
    pub fn matches(&self, requested: &TypeDescriptor, closure: &[TypeDescriptor]) -> bool {
        closure
            .iter()
            .any(|candidate| self.matches_type(requested, candidate))
    }

    pub fn matches_type(&self, requested: &TypeDescriptor, candidate: &TypeDescriptor) -> bool {
        let key = (requested.clone(), candidate.clone());
        if let Some(verdict) = self.memo.read().get(&key) {
            return *verdict;
        }

        let verdict = self.compute(&requested.normalized(), &candidate.normalized());
        self.memo.write().insert(key, verdict);
        verdict
    }

    pub fn memoized_pairs(&self) -> usize {
        self.memo.read().len()
    }

    fn compute(&self, requested: &TypeDescriptor, candidate: &TypeDescriptor) -> bool {
        match (requested, candidate) {
            (TypeDescriptor::Class(r), TypeDescriptor::Class(c)) => r == c,
            (TypeDescriptor::Class(r), TypeDescriptor::Parameterized { raw, args }) => {
                r == raw
                    && (self.relaxed_raw_types
                        || args.iter().all(TypeDescriptor::is_object_or_unbounded_variable))
            }
            (TypeDescriptor::Parameterized { raw, args }, TypeDescriptor::Class(c)) => {
                raw == c && args.iter().all(TypeDescriptor::is_object_or_unbounded_variable)
            }
            (
                TypeDescriptor::Parameterized { raw: r, args: r_args },
                TypeDescriptor::Parameterized { raw: c, args: c_args },
            ) => {
                r == c
                    && r_args.len() == c_args.len()
                    && r_args
                        .iter()
                        .zip(c_args)
                        .all(|(r_arg, c_arg)| self.argument_matches(r_arg, c_arg))
            }
            (TypeDescriptor::Array(r), TypeDescriptor::Array(c)) => {
                if r.is_primitive() || c.is_primitive() {
                    r == c
                } else {
                    self.matches_type(r, c)
                }
            }
            _ => requested == candidate,
        }
    }

    /// **TYPE ARGUMENT MATCHING**
    ///
    /// **STEP 1**: actual vs actual → the candidate argument matches the requested one
    ///   by the same rules, recursively (identity for plain classes).
    /// **STEP 2**: wildcard vs actual → within the wildcard's bounds.
    /// **STEP 3**: wildcard vs type variable → the variable's upper bound is related to
    ///   the wildcard's upper bound in either direction, and the lower bound fits.
    /// **STEP 4**: actual vs type variable → the actual type satisfies every bound.
    /// **STEP 5**: type variable vs type variable → bean bounds accept requested bounds.
    pub fn argument_matches(&self, requested: &TypeDescriptor, candidate: &TypeDescriptor) -> bool {
        let hierarchy = self.hierarchy.as_ref();
        match (requested, candidate) {
            (TypeDescriptor::Wildcard(bound), TypeDescriptor::Variable { .. }) => {
                let candidate_bounds = candidate.upper_bounds();
                let upper_ok = match bound {
                    WildcardBound::Extends(upper) => candidate_bounds.iter().all(|c| {
                        hierarchy.is_assignable(upper, c) || hierarchy.is_assignable(c, upper)
                    }),
                    _ => true,
                };
                let lower_ok = match bound {
                    WildcardBound::Super(lower) => candidate_bounds
                        .iter()
                        .all(|c| hierarchy.is_assignable(c, lower)),
                    _ => true,
                };
                upper_ok && lower_ok
            }
            (TypeDescriptor::Wildcard(WildcardBound::Unbounded), _) => true,
            (TypeDescriptor::Wildcard(WildcardBound::Extends(upper)), actual) => {
                hierarchy.is_assignable(upper, actual)
            }
            (TypeDescriptor::Wildcard(WildcardBound::Super(lower)), actual) => {
                hierarchy.is_assignable(actual, lower)
            }
            (TypeDescriptor::Variable { .. }, TypeDescriptor::Variable { .. }) => {
                let requested_bounds = requested.upper_bounds();
                candidate.upper_bounds().iter().all(|c| {
                    requested_bounds
                        .iter()
                        .any(|r| hierarchy.is_assignable(c, r))
                })
            }
            (actual, TypeDescriptor::Variable { .. }) => candidate
                .upper_bounds()
                .iter()
                .all(|bound| hierarchy.is_assignable(bound, actual)),
            (requested, candidate) => self.matches_type(requested, candidate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::hierarchy::TypeDeclaration;

    fn matcher() -> TypeMatcher {
        let mut hierarchy = TypeHierarchy::new();
        hierarchy.declare(TypeDeclaration::new("Number"));
        hierarchy.declare(TypeDeclaration::new("Integer").extends("Number").unwrap());
        hierarchy.declare(TypeDeclaration::new("Long").extends("Number").unwrap());
        TypeMatcher::new(Arc::new(hierarchy))
    }

    fn ty(text: &str) -> TypeDescriptor {
        TypeDescriptor::parse(text).unwrap()
    }

    #[test]
    fn test_exact_match() {
        let m = matcher();
        assert!(m.matches_type(&ty("Foo"), &ty("Foo")));
        assert!(!m.matches_type(&ty("Foo"), &ty("Bar")));
        assert!(m.matches(&ty("Foo"), &[ty("Bar"), ty("Foo"), ty("Object")]));
    }

    #[test]
    fn test_actual_type_arguments_must_be_identical() {
        let m = matcher();
        assert!(m.matches_type(&ty("List<Integer>"), &ty("List<Integer>")));
        assert!(!m.matches_type(&ty("List<Number>"), &ty("List<Integer>")));
        assert!(!m.matches_type(&ty("List<Integer>"), &ty("Set<Integer>")));
    }

    #[test]
    fn test_upper_bounded_wildcard() {
        let m = matcher();
        assert!(m.matches_type(&ty("List<? extends Number>"), &ty("List<Integer>")));
        assert!(m.matches_type(&ty("List<? extends Number>"), &ty("List<Number>")));
        assert!(!m.matches_type(&ty("List<? extends Integer>"), &ty("List<Number>")));
    }

    #[test]
    fn test_lower_bounded_wildcard() {
        let m = matcher();
        assert!(m.matches_type(&ty("List<? super Integer>"), &ty("List<Number>")));
        assert!(m.matches_type(&ty("List<? super Integer>"), &ty("List<Object>")));
        assert!(!m.matches_type(&ty("List<? super Number>"), &ty("List<Integer>")));
    }

    #[test]
    fn test_unbounded_wildcard() {
        let m = matcher();
        assert!(m.matches_type(&ty("List<?>"), &ty("List<Integer>")));
        assert!(m.matches_type(&ty("Map<?, ?>"), &ty("Map<String, Long>")));
    }

    #[test]
    fn test_raw_request_legacy_mode() {
        let m = matcher();
        assert!(m.matches_type(&ty("List"), &ty("List<Integer>")));

        let strict = TypeMatcher::with_raw_mode(Arc::new(TypeHierarchy::new()), false);
        assert!(!strict.matches_type(&ty("List"), &ty("List<Integer>")));
        assert!(strict.matches_type(&ty("List"), &ty("List<Object>")));
    }

    #[test]
    fn test_raw_bean_type() {
        let m = matcher();
        assert!(m.matches_type(&ty("List<Object>"), &ty("List")));
        assert!(!m.matches_type(&ty("List<Integer>"), &ty("List")));
    }

    #[test]
    fn test_type_variable_candidates() {
        let m = matcher();
        let bounded = TypeDescriptor::parameterized(
            "Dao",
            vec![TypeDescriptor::variable("T", vec![ty("Number")])],
        );
        assert!(m.matches_type(&ty("Dao<Integer>"), &bounded));
        assert!(!m.matches_type(&ty("Dao<String>"), &bounded));
        assert!(m.matches_type(&ty("Dao<? extends Integer>"), &bounded));
        assert!(m.matches_type(&ty("Dao<? super Integer>"), &bounded));
        assert!(!m.matches_type(&ty("Dao<? super String>"), &bounded));
    }

    #[test]
    fn test_primitive_normalization() {
        let m = matcher();
        assert!(m.matches_type(&ty("int"), &ty("Integer")));
        assert!(m.matches_type(&ty("Integer"), &ty("int")));
        assert!(!m.matches_type(&ty("int[]"), &ty("Integer[]")));
        assert!(m.matches_type(&ty("int[]"), &ty("int[]")));
    }

    #[test]
    fn test_verdicts_are_memoized() {
        let m = matcher();
        assert!(m.matches_type(&ty("List<?>"), &ty("List<Integer>")));
        let pairs = m.memoized_pairs();
        assert!(m.matches_type(&ty("List<?>"), &ty("List<Integer>")));
        assert_eq!(m.memoized_pairs(), pairs);
    }
}
