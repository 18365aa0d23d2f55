use crate::beans::{BeanMetadata, Instance};
use crate::errors::DisposalFailure;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// **CREATIONAL CONTEXT**
///
/// Dependent instances created while constructing one bean. They live and die
/// with that bean's contextual instance.
#[derive(Default)]
pub struct CreationalContext {
    dependents: Vec<ContextualInstance>,
}

impl CreationalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dependent(&mut self, dependent: ContextualInstance) {
        self.dependents.push(dependent);
    }

    pub fn len(&self) -> usize {
        self.dependents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }

    /// Destroys every dependent, newest first, and reports what failed.
    pub fn destroy(self) -> Vec<DisposalFailure> {
        self.dependents
            .into_iter()
            .rev()
            .flat_map(ContextualInstance::destroy)
            .collect()
    }
}

/// **CONTEXTUAL INSTANCE**
///
/// A live bean instance plus everything that must be torn down with it.
/// `instance` is what callers see (decorated); `raw` is what the disposer receives.
pub struct ContextualInstance {
    bean: Arc<BeanMetadata>,
    instance: Instance,
    raw: Instance,
    creational: CreationalContext,
}

impl ContextualInstance {
    pub fn new(
        bean: Arc<BeanMetadata>,
        instance: Instance,
        raw: Instance,
        creational: CreationalContext,
    ) -> Self {
        Self {
            bean,
            instance,
            raw,
            creational,
        }
    }

    pub fn bean(&self) -> &Arc<BeanMetadata> {
        &self.bean
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn dependents(&self) -> usize {
        self.creational.len()
    }

    /// Runs the disposer, then destroys the dependents. Never stops at a failure.
    pub fn destroy(self) -> Vec<DisposalFailure> {
        let mut failures = Vec::new();

        if let Some(disposer) = self.bean.disposer() {
            let outcome = catch_unwind(AssertUnwindSafe(|| disposer(&self.raw)))
                .unwrap_or_else(|_| Err("disposer panicked".to_string()));
            if let Err(message) = outcome {
                log::warn!("Disposal of bean {} failed: {}", self.bean.id(), message);
                failures.push(DisposalFailure::new(self.bean.id().clone(), message));
            }
        }

        failures.extend(self.creational.destroy());
        failures
    }
}
