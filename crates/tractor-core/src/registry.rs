//! Service registry
//!
//! A typed map from service identifier to shared instance, built once at
//! startup and passed to whatever needs default collaborators. Nothing in
//! the engine reaches for a global registry.
//!
//! Copyright (c) 2025 Tractor Team
//! Licensed under the Apache-2.0 license

use crate::accessor::Resolver;
use crate::arguments::ArgumentProvider;
use crate::config::EngineConfig;
use crate::transformer::StageRegistry;
use crate::{Error, Result};
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Identifiers of the services registered by [`Registry::with_defaults`]
pub mod services {
    /// [`crate::Resolver`]
    pub const RESOLVER: &str = "accessor.resolver";
    /// [`crate::ArgumentProvider`]
    pub const ARGUMENT_PROVIDER: &str = "argument.provider";
    /// [`crate::StageRegistry`]
    pub const STAGE_REGISTRY: &str = "stage.registry";
}

/// Typed service map
#[derive(Clone, Default)]
pub struct Registry {
    services: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the resolver, argument provider and built-in stages
    pub fn with_defaults(config: &EngineConfig) -> Self {
        let resolver = Arc::new(Resolver::with_config(config.resolver.clone()));
        let provider = ArgumentProvider::new(Arc::clone(&resolver));
        let stages = StageRegistry::with_built_ins(provider.clone());

        let mut registry = Self::new();
        registry.register_shared(services::RESOLVER, resolver);
        registry.register(services::ARGUMENT_PROVIDER, provider);
        registry.register(services::STAGE_REGISTRY, stages);
        registry
    }

    /// Register `instance` under `id`, replacing any previous entry
    pub fn register<T: Send + Sync + 'static>(&mut self, id: impl Into<String>, instance: T) -> &mut Self {
        self.register_shared(id, Arc::new(instance))
    }

    /// Register an already shared instance
    pub fn register_shared<T: Send + Sync + 'static>(&mut self, id: impl Into<String>, instance: Arc<T>) -> &mut Self {
        let id = id.into();
        log::trace!("registering service '{}'", id);
        self.services.insert(id, instance);
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.services.contains_key(id)
    }

    /// Resolve the instance registered under `id`
    ///
    /// Fails with [`Error::NotFound`] when nothing is registered and with
    /// [`Error::InvalidInstance`] when the instance is not a `T`.
    pub fn resolve<T: Send + Sync + 'static>(&self, id: &str) -> Result<Arc<T>> {
        let instance = self.services.get(id).ok_or_else(|| Error::not_found(id))?;

        Arc::clone(instance)
            .downcast::<T>()
            .map_err(|_| Error::invalid_instance(id, type_name::<T>()))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.services.keys().collect();
        ids.sort();
        f.debug_struct("Registry").field("services", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_defaults_are_resolvable() {
        let config = EngineConfig {
            resolver: crate::ResolverConfig { max_depth: 7 },
        };
        let registry = Registry::with_defaults(&config);

        let resolver = registry.resolve::<Resolver>(services::RESOLVER).unwrap();
        assert_eq!(resolver.config().max_depth, 7);

        let provider = registry
            .resolve::<ArgumentProvider>(services::ARGUMENT_PROVIDER)
            .unwrap();
        assert_eq!(provider.resolver().config().max_depth, 7);

        let stages = registry.resolve::<StageRegistry>(services::STAGE_REGISTRY).unwrap();
        assert!(stages.contains("upper"));
    }

    #[test]
    fn test_missing_service() {
        let err = Registry::new().resolve::<Resolver>("nothing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Service 'nothing' not found");
    }

    #[test]
    fn test_wrong_instance_type() {
        let mut registry = Registry::new();
        registry.register(services::RESOLVER, String::from("not a resolver"));

        let err = registry.resolve::<Resolver>(services::RESOLVER).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInstance);
        assert!(err.to_string().contains("Resolver"));
    }
}
