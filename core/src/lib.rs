//! # CONTEXTUAL CORE LIBRARY
//!
//! **TYPESAFE BEAN RESOLUTION AND CONTEXTUAL LIFECYCLE ENGINE**
//!
//! **ARCHITECTURE**: Frozen bean registry + cached typesafe resolver + per-scope stores
//! **GUARANTEE**: Deterministic resolution after deployment, at most one instance per
//! bean per scope store, every instance destroyed exactly once
//! **INTEGRATION**: Explicit context handles; client proxies through a pluggable factory

pub mod api;
pub mod beans;
pub mod config;
pub mod container;
pub mod context;
pub mod errors;
pub mod qualifiers;
pub mod registry;
pub mod resolution;
pub mod types;

#[cfg(test)]
mod tests {
    use crate::api::*;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Greeter {
        greeting: String,
    }

    fn greeter_deployment() -> Deployment {
        let mut deployment = Deployment::default();
        deployment
            .add_bean(
                BeanMetadata::builder("greeter")
                    .bean_class("PlainGreeter")
                    .typed("Greeter")
                    .constructor(|_| {
                        Ok(Arc::new(Greeter {
                            greeting: "hello".to_string(),
                        }))
                    })
                    .build()
                    .unwrap(),
            )
            .unwrap();
        deployment
    }

    // **FACADE SMOKE TESTS**
    #[test]
    fn test_deploy_and_lookup() {
        let container = greeter_deployment().deploy().unwrap();
        let ctx = container.new_context();

        let greeter = ctx.lookup::<Greeter>("Greeter").unwrap();
        assert_eq!(greeter.greeting, "hello");
    }

    #[test]
    fn test_unknown_type_is_unsatisfied() {
        let container = greeter_deployment().deploy().unwrap();
        let ctx = container.new_context();

        let err = ctx.lookup::<Greeter>("Farewell").unwrap_err();
        assert!(err.is_resolution_error());
    }

    #[test]
    fn test_wrong_downcast() {
        let container = greeter_deployment().deploy().unwrap();
        let ctx = container.new_context();

        match ctx.lookup::<String>("Greeter") {
            Err(ContainerError::InstanceType { bean, .. }) => assert_eq!(bean, "greeter"),
            other => panic!("Expected instance type error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_describe_lists_beans() {
        let container = greeter_deployment().deploy().unwrap();
        let summary = container.describe();

        assert_eq!(summary["beans"][0]["id"], "greeter");
        assert_eq!(summary["beans"][0]["scope"], "dependent");
        assert_eq!(summary["beans"][0]["active"], true);
        assert_eq!(summary["cache"]["entries"], 0);
    }
}
