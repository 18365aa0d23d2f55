use crate::container::Container;
use crate::errors::ContainerResult;
use crate::registry::BeanRegistry;

/// **EXTENSION**
///
/// Deployment hooks, invoked in registration order. `after_bean_discovery` may still
/// register beans and decorators; `after_deployment_validation` sees the deployed
/// container. An error from either aborts the deployment.
pub trait Extension: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn after_bean_discovery(&self, _registry: &mut BeanRegistry) -> ContainerResult<()> {
        Ok(())
    }

    fn after_deployment_validation(&self, _container: &Container) -> ContainerResult<()> {
        Ok(())
    }
}
