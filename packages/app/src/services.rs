//! Shared services, stored in and resolved from the [`Registry`].
//!
//! The composition root registers them once; coordinators resolve them when
//! they build their containers.

use std::sync::Arc;

use armature::Registry;
use armature_net::NetworkService;
use tracing::warn;

use crate::config::AppConfig;
use crate::fixtures::FixtureTransport;

#[derive(Debug, Clone)]
pub struct Services {
    pub network: NetworkService,
    pub config: Arc<AppConfig>,
}

impl Services {
    pub fn new(network: NetworkService, config: AppConfig) -> Self {
        Self {
            network,
            config: Arc::new(config),
        }
    }

    /// A fixture-backed set that never touches the network.
    pub fn offline(config: AppConfig) -> Self {
        let transport = FixtureTransport::new(config.simulated_delay);
        Self::new(NetworkService::new(Arc::new(transport)), config)
    }

    pub fn register(&self, registry: &Registry) {
        registry.register(self.network.clone());
        registry.register(Arc::clone(&self.config));
    }

    /// Resolve from `registry`, substituting defaults for anything missing.
    pub fn resolve(registry: &Registry) -> Self {
        let config = registry
            .resolve::<Arc<AppConfig>>()
            .unwrap_or_else(|| Arc::new(AppConfig::default()));
        let network = registry.resolve::<NetworkService>().unwrap_or_else(|| {
            warn!("services: no network service registered; serving fixtures");
            NetworkService::new(Arc::new(FixtureTransport::new(config.simulated_delay)))
        });
        Self { network, config }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[test]
    fn registered_services_resolve() {
        let registry = Registry::new();
        Services::offline(AppConfig::for_environment(Environment::Staging)).register(&registry);

        let services = Services::resolve(&registry);
        assert_eq!(services.config.environment, Environment::Staging);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn missing_services_fall_back_to_defaults() {
        let services = Services::resolve(&Registry::new());
        assert_eq!(services.config.environment, Environment::Development);
    }
}
