//! Strategy registry keyed by integration type.

use super::{Publisher, WebhookPublisher};
use crate::models::IntegrationType;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Resolves the concrete delivery strategy for an integration type.
pub struct PublisherFactory {
    strategies: RwLock<HashMap<IntegrationType, Arc<dyn Publisher>>>,
}

impl PublisherFactory {
    /// Empty factory; callers register their own strategies.
    pub fn new() -> Self {
        Self {
            strategies: RwLock::new(HashMap::new()),
        }
    }

    /// Factory pre-loaded with the built-in strategies.
    pub fn with_defaults() -> Self {
        let factory = Self::new();
        factory.register(Arc::new(WebhookPublisher::new()));
        factory
    }

    /// Register (or replace) the strategy for its integration type.
    pub fn register(&self, strategy: Arc<dyn Publisher>) {
        let integration_type = strategy.integration_type();
        debug!(%integration_type, "Registering publisher strategy");
        self.strategies.write().insert(integration_type, strategy);
    }

    /// Resolve the strategy for an integration type.
    pub fn resolve(&self, integration_type: IntegrationType) -> Option<Arc<dyn Publisher>> {
        self.strategies.read().get(&integration_type).cloned()
    }

    pub fn registered_types(&self) -> Vec<IntegrationType> {
        self.strategies.read().keys().copied().collect()
    }
}

impl Default for PublisherFactory {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_include_webhook() {
        let factory = PublisherFactory::with_defaults();
        let strategy = factory.resolve(IntegrationType::Webhook).unwrap();
        assert_eq!(strategy.integration_type(), IntegrationType::Webhook);
    }

    #[test]
    fn test_empty_factory_resolves_nothing() {
        let factory = PublisherFactory::new();
        assert!(factory.resolve(IntegrationType::Webhook).is_none());
        assert!(factory.registered_types().is_empty());
    }
}
