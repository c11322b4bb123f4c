use std::sync::Arc;

use bookfinder_core::{BookCache, Config, Resolver, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    resolver: Arc<Resolver>,
}

impl AppState {
    pub fn new(config: Config, resolver: Arc<Resolver>) -> Self {
        Self { config, resolver }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &Resolver {
        self.resolver.as_ref()
    }

    pub fn cache(&self) -> &BookCache {
        self.resolver.cache().as_ref()
    }
}
