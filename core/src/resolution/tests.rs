use crate::beans::BeanMetadata;
use crate::errors::{error_codes, ContainerError};
use crate::qualifiers::{Qualifier, QualifierSet};
use crate::registry::BeanRegistry;
use crate::resolution::{ResolutionKey, ResolutionOutcome, TypeSafeResolver};
use crate::types::{TypeDeclaration, TypeDescriptor};
use std::sync::Arc;

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(text: &str) -> TypeDescriptor {
        TypeDescriptor::parse(text).unwrap()
    }

    fn simple(id: &str, types: &[&str]) -> BeanMetadata {
        types
            .iter()
            .fold(BeanMetadata::builder(id), |builder, t| builder.typed(*t))
            .value(id.to_string())
            .build()
            .unwrap()
    }

    fn resolver(beans: Vec<BeanMetadata>) -> TypeSafeResolver {
        let mut registry = BeanRegistry::new();
        for bean in beans {
            registry.register(bean).unwrap();
        }
        registry.freeze().unwrap();
        TypeSafeResolver::new(Arc::new(registry), true)
    }

    fn unique_id(resolver: &TypeSafeResolver, required: &str, qualifiers: &QualifierSet) -> String {
        resolver
            .resolve_unique(&ty(required), qualifiers)
            .unwrap()
            .id()
            .to_string()
    }

    // **BASIC RESOLUTION TESTS**
    #[test]
    fn test_unique_by_type() {
        let resolver = resolver(vec![
            simple("mailer", &["Mailer"]),
            simple("clock", &["Clock"]),
        ]);
        assert_eq!(unique_id(&resolver, "Mailer", &QualifierSet::new()), "mailer");
    }

    #[test]
    fn test_unsatisfied_with_qualifier() {
        let resolver = resolver(vec![simple("bar", &["Bar"])]);
        let err = resolver
            .resolve_unique(&ty("Bar"), &QualifierSet::of([Qualifier::new("Red")]))
            .unwrap_err();
        assert!(matches!(err, ContainerError::Unsatisfied { .. }));
        assert!(err.is_resolution_error());
    }

    #[test]
    fn test_ambiguous_without_tie_break() {
        let resolver = resolver(vec![simple("p", &["Foo"]), simple("q", &["Foo"])]);
        match resolver.resolve_unique(&ty("Foo"), &QualifierSet::new()) {
            Err(ContainerError::Ambiguous { candidates, .. }) => {
                assert_eq!(candidates, vec!["p".to_string(), "q".to_string()])
            }
            other => panic!("Expected ambiguous resolution, got {:?}", other),
        }
    }

    #[test]
    fn test_not_deployed_before_freeze() {
        let mut registry = BeanRegistry::new();
        registry.register(simple("a", &["A"])).unwrap();
        let resolver = TypeSafeResolver::new(Arc::new(registry), true);
        let err = resolver
            .resolve(&ResolutionKey::of_type(ty("A")))
            .unwrap_err();
        assert!(matches!(err, ContainerError::NotDeployed { .. }));
    }

    #[test]
    fn test_deterministic_and_cached() {
        let resolver = resolver(vec![simple("p", &["Foo"]), simple("q", &["Foo"])]);
        let key = ResolutionKey::of_type(ty("Foo"));

        let first = resolver.resolve(&key).unwrap();
        let second = resolver.resolve(&key).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let stats = resolver.cache_stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_non_binding_members_share_cache_entry() {
        let bean = BeanMetadata::builder("eu")
            .typed("Cache")
            .qualifier(Qualifier::new("Region").member("code", "eu"))
            .value(1u8)
            .build()
            .unwrap();
        let resolver = resolver(vec![bean]);

        let a = QualifierSet::of([Qualifier::new("Region")
            .member("code", "eu")
            .non_binding("comment", "first")]);
        let b = QualifierSet::of([Qualifier::new("Region")
            .member("code", "eu")
            .non_binding("comment", "second")]);

        assert_eq!(unique_id(&resolver, "Cache", &a), "eu");
        assert_eq!(unique_id(&resolver, "Cache", &b), "eu");
        assert_eq!(resolver.cache_stats().entries, 1);
    }

    // **ALTERNATIVE AND PRIORITY TESTS**
    #[test]
    fn test_sole_enabled_alternative_wins() {
        let p = BeanMetadata::builder("p")
            .typed("Foo")
            .alternative()
            .priority(1)
            .value(1u8)
            .build()
            .unwrap();
        let resolver = resolver(vec![p, simple("q", &["Foo"])]);
        assert_eq!(unique_id(&resolver, "Foo", &QualifierSet::new()), "p");

        let all = resolver.resolve_all(&ty("Foo"), &QualifierSet::new()).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_alternative_enabled_by_selection() {
        let mut registry = BeanRegistry::new();
        registry
            .register(
                BeanMetadata::builder("mock")
                    .bean_class("MockMailer")
                    .typed("Mailer")
                    .alternative()
                    .value(1u8)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry.register(simple("smtp", &["Mailer"])).unwrap();
        registry.enable_alternative("mock").unwrap();
        registry.freeze().unwrap();
        let resolver = TypeSafeResolver::new(Arc::new(registry), true);

        assert_eq!(unique_id(&resolver, "Mailer", &QualifierSet::new()), "mock");
    }

    #[test]
    fn test_disabled_alternative_ignored() {
        let mock = BeanMetadata::builder("mock")
            .typed("Mailer")
            .alternative()
            .value(1u8)
            .build()
            .unwrap();
        let resolver = resolver(vec![mock, simple("smtp", &["Mailer"])]);
        assert_eq!(unique_id(&resolver, "Mailer", &QualifierSet::new()), "smtp");
    }

    #[test]
    fn test_highest_priority_among_alternatives() {
        let low = BeanMetadata::builder("low")
            .typed("Foo")
            .alternative()
            .priority(10)
            .value(1u8)
            .build()
            .unwrap();
        let high = BeanMetadata::builder("high")
            .typed("Foo")
            .alternative()
            .priority(20)
            .value(2u8)
            .build()
            .unwrap();
        let resolver = resolver(vec![low, high, simple("plain", &["Foo"])]);
        assert_eq!(unique_id(&resolver, "Foo", &QualifierSet::new()), "high");
    }

    // **SPECIALIZATION TESTS**
    #[test]
    fn test_specializer_replaces_specialized() {
        let a = BeanMetadata::builder("a")
            .bean_class("PaymentImpl")
            .typed("Payment")
            .value(1u8)
            .build()
            .unwrap();
        let b = BeanMetadata::builder("b")
            .bean_class("MockPayment")
            .typed("PaymentImpl")
            .typed("Payment")
            .specializes("a")
            .value(2u8)
            .build()
            .unwrap();

        let before = resolver(vec![a.clone()]);
        assert_eq!(unique_id(&before, "Payment", &QualifierSet::new()), "a");

        let after = resolver(vec![a, b]);
        assert_eq!(unique_id(&after, "Payment", &QualifierSet::new()), "b");
        assert_eq!(unique_id(&after, "PaymentImpl", &QualifierSet::new()), "b");
        let all = after.resolve_all(&ty("Payment"), &QualifierSet::new()).unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn test_transitive_specialization() {
        let a = simple("a", &["Service"]);
        let b = BeanMetadata::builder("b")
            .typed("a")
            .typed("Service")
            .specializes("a")
            .value(2u8)
            .build()
            .unwrap();
        let c = BeanMetadata::builder("c")
            .typed("b")
            .typed("a")
            .typed("Service")
            .specializes("b")
            .value(3u8)
            .build()
            .unwrap();
        let resolver = resolver(vec![a, b, c]);
        assert_eq!(unique_id(&resolver, "Service", &QualifierSet::new()), "c");
        assert!(resolver.registry().is_specialized_by(
            &crate::beans::BeanId::new("a"),
            &crate::beans::BeanId::new("c")
        ));
    }

    #[test]
    fn test_inconsistent_specialization() {
        let a = simple("a", &["Service"]);
        let b = BeanMetadata::builder("b")
            .typed("a")
            .typed("Service")
            .specializes("a")
            .value(2u8)
            .build()
            .unwrap();
        let c = BeanMetadata::builder("c")
            .typed("a")
            .typed("Service")
            .specializes("a")
            .value(3u8)
            .build()
            .unwrap();
        let mut registry = BeanRegistry::new();
        for bean in [a, b, c] {
            registry.register(bean).unwrap();
        }
        let err = registry.freeze().unwrap_err();
        assert_eq!(err.code(), Some(error_codes::INCONSISTENT_SPECIALIZATION));
    }

    // **GENERIC TYPE TESTS**
    #[test]
    fn test_generic_resolution_through_hierarchy() {
        let mut registry = BeanRegistry::new();
        registry
            .declare_type(TypeDeclaration::new("Integer").extends("Number").unwrap())
            .unwrap();
        registry
            .declare_type(
                TypeDeclaration::generic("ArrayList", &["E"])
                    .extends("List<E>")
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                BeanMetadata::builder("ints")
                    .bean_class("IntList")
                    .typed("ArrayList<Integer>")
                    .typed("List<Integer>")
                    .value(Vec::<i64>::new())
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                BeanMetadata::builder("names")
                    .bean_class("NameList")
                    .typed("List<String>")
                    .value(Vec::<String>::new())
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry.freeze().unwrap();
        let resolver = TypeSafeResolver::new(Arc::new(registry), true);
        let none = QualifierSet::new();

        assert_eq!(unique_id(&resolver, "List<Integer>", &none), "ints");
        assert_eq!(unique_id(&resolver, "List<? extends Number>", &none), "ints");
        assert_eq!(unique_id(&resolver, "List<String>", &none), "names");

        let raw = resolver.resolve(&ResolutionKey::of_type(ty("List"))).unwrap();
        assert!(matches!(raw.outcome, ResolutionOutcome::Ambiguous(_)));
        assert_eq!(raw.candidates.len(), 2);

        let wildcard = resolver.resolve_all(&ty("List<?>"), &none).unwrap();
        assert_eq!(wildcard.len(), 2);
    }

    #[test]
    fn test_primitive_request_matches_wrapper() {
        let resolver = resolver(vec![simple("answer", &["Integer"])]);
        assert_eq!(unique_id(&resolver, "int", &QualifierSet::new()), "answer");
    }

    #[test]
    fn test_any_qualifier_reaches_qualified_beans() {
        let red = BeanMetadata::builder("red")
            .typed("Color")
            .qualifier(Qualifier::new("Red"))
            .value(1u8)
            .build()
            .unwrap();
        let resolver = resolver(vec![red, simple("plain", &["Color"])]);

        let any = QualifierSet::of([Qualifier::any()]);
        let all = resolver.resolve_all(&ty("Color"), &any).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(unique_id(&resolver, "Color", &QualifierSet::new()), "plain");
        assert_eq!(
            unique_id(&resolver, "Color", &QualifierSet::of([Qualifier::new("Red")])),
            "red"
        );
    }

    // **NAME AND DECORATOR TESTS**
    #[test]
    fn test_resolve_by_name() {
        let bean = BeanMetadata::builder("orders")
            .typed("OrderService")
            .named("orderService")
            .value(1u8)
            .build()
            .unwrap();
        let resolver = resolver(vec![bean, simple("other", &["OrderService"])]);
        assert_eq!(
            resolver.resolve_by_name("orderService").unwrap().id().as_str(),
            "orders"
        );
        assert!(matches!(
            resolver.resolve_by_name("missing"),
            Err(ContainerError::Unsatisfied { .. })
        ));

        let named = QualifierSet::new().with(Qualifier::named("orderService"));
        let key = ResolutionKey::new(TypeDescriptor::object(), &named);
        assert!(resolver.resolve(&key).unwrap().outcome.is_unique());
        let all = ResolutionKey::of_type(ty("OrderService"));
        assert!(!resolver.resolve(&all).unwrap().outcome.is_unique());
    }

    #[test]
    fn test_decorators_ordered_by_priority() {
        let mut registry = BeanRegistry::new();
        registry.register(simple("greeter", &["Greeter"])).unwrap();
        for (id, priority) in [("outer", Some(1)), ("inner", Some(9)), ("off", None)] {
            let mut builder = crate::beans::DecoratorMetadata::builder(id)
                .delegate("Greeter")
                .decorate(|delegate, _| Ok(delegate));
            if let Some(priority) = priority {
                builder = builder.priority(priority);
            }
            registry.register_decorator(builder.build().unwrap()).unwrap();
        }
        registry.freeze().unwrap();
        let resolver = TypeSafeResolver::new(Arc::new(registry), true);

        let bean = Arc::clone(resolver.registry().bean("greeter").unwrap());
        let decorators = resolver.resolve_decorators(&bean);
        let ids: Vec<&str> = decorators.iter().map(|d| d.id().as_str()).collect();
        assert_eq!(ids, vec!["outer", "inner"]);
    }
}
