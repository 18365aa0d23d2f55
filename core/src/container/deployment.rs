use crate::beans::{BeanMetadata, DecoratorMetadata};
use crate::config::ContainerConfig;
use crate::container::extension::Extension;
use crate::container::{validator, Container};
use crate::context::{DefaultProxyFactory, ProxyFactory};
use crate::errors::{error_codes, ContainerError, ContainerResult};
use crate::registry::BeanRegistry;
use crate::types::TypeDeclaration;
use std::sync::Arc;

/// **DEPLOYMENT**
///
/// **PURPOSE**: Boot-time assembly of a container.
/// **GUARANTEE**: `deploy()` either yields a frozen, validated container or fails
/// with the first definition error; nothing is deployed halfway.
///
/// ## PHASES
///
/// 1. **DISCOVERY** - types, beans, decorators and reported definition errors
/// 2. **AFTER BEAN DISCOVERY** - extensions may still register beans
/// 3. **FREEZE** - specialization, alternatives, name uniqueness
/// 4. **VALIDATION** - injection points and unproxied cycles
/// 5. **AFTER DEPLOYMENT VALIDATION** - extensions see the container
pub struct Deployment {
    config: ContainerConfig,
    registry: BeanRegistry,
    extensions: Vec<Box<dyn Extension>>,
    definition_errors: Vec<String>,
    proxy_factory: Arc<dyn ProxyFactory>,
}

impl Deployment {
    pub fn new(config: ContainerConfig) -> Self {
        Self {
            config,
            registry: BeanRegistry::new(),
            extensions: Vec::new(),
            definition_errors: Vec::new(),
            proxy_factory: Arc::new(DefaultProxyFactory),
        }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub fn registry(&self) -> &BeanRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut BeanRegistry {
        &mut self.registry
    }

    pub fn declare_type(&mut self, declaration: TypeDeclaration) -> ContainerResult<&mut Self> {
        self.registry.declare_type(declaration)?;
        Ok(self)
    }

    pub fn add_bean(&mut self, bean: BeanMetadata) -> ContainerResult<&mut Self> {
        self.registry.register(bean)?;
        Ok(self)
    }

    pub fn add_decorator(&mut self, decorator: DecoratorMetadata) -> ContainerResult<&mut Self> {
        self.registry.register_decorator(decorator)?;
        Ok(self)
    }

    pub fn add_extension(&mut self, extension: impl Extension + 'static) -> &mut Self {
        self.extensions.push(Box::new(extension));
        self
    }

    pub fn with_proxy_factory(&mut self, factory: Arc<dyn ProxyFactory>) -> &mut Self {
        self.proxy_factory = factory;
        self
    }

    /// Definition error found by discovery; any reported error aborts `deploy()`.
    pub fn report_definition_error(&mut self, message: impl Into<String>) -> &mut Self {
        let message = message.into();
        log::warn!("Definition error reported: {}", message);
        self.definition_errors.push(message);
        self
    }

    pub fn deploy(self) -> ContainerResult<Container> {
        let Deployment {
            config,
            mut registry,
            extensions,
            definition_errors,
            proxy_factory,
        } = self;

        config.validate()?;
        if !definition_errors.is_empty() {
            return Err(ContainerError::definition(
                error_codes::DISCOVERY,
                definition_errors.join("; "),
            ));
        }

        for selector in &config.enabled_alternatives {
            registry.enable_alternative(selector.clone())?;
        }

        for extension in &extensions {
            log::debug!("Running after_bean_discovery for {}", extension.name());
            extension
                .after_bean_discovery(&mut registry)
                .map_err(|err| extension_failure(extension.as_ref(), err))?;
        }

        registry.freeze()?;
        let container = Container::new(registry, config, proxy_factory);

        let checks = container.config();
        if checks.validate_injection_points || checks.detect_unproxied_cycles {
            validator::validate(&container)?;
        }

        for extension in &extensions {
            log::debug!("Running after_deployment_validation for {}", extension.name());
            extension
                .after_deployment_validation(&container)
                .map_err(|err| extension_failure(extension.as_ref(), err))?;
        }

        log::info!(
            "Deployment complete: {} beans, {} decorators",
            container.registry().len(),
            container.registry().decorators().len()
        );
        Ok(container)
    }
}

impl Default for Deployment {
    fn default() -> Self {
        Self::new(ContainerConfig::default())
    }
}

// Definition errors raised by an extension keep their code; anything else is wrapped.
fn extension_failure(extension: &dyn Extension, err: ContainerError) -> ContainerError {
    match err {
        ContainerError::Definition { .. } => err,
        other => ContainerError::definition(
            error_codes::EXTENSION_FAILED,
            format!("extension {} failed: {}", extension.name(), other),
        ),
    }
}
