//! Resolves alert keys into typed notifier configuration.

use crate::core::{AlerterConfig, ConfigStore, Message};
use crate::errors::ResolveError;
use crate::registry::NotifierRegistry;
use std::sync::Arc;
use tracing::{error, instrument, trace};

/// Fetches and decodes the `AlerterConfig` for an alert key.
///
/// Configs are fetched fresh for every key of every message; nothing is
/// cached between calls.
#[derive(Clone)]
pub struct ConfigResolver {
    store: Arc<dyn ConfigStore>,
    registry: Arc<NotifierRegistry>,
}

impl ConfigResolver {
    pub fn new(store: Arc<dyn ConfigStore>, registry: Arc<NotifierRegistry>) -> Self {
        Self { store, registry }
    }

    /// Loads the config for `key` on behalf of `message`.
    ///
    /// # Returns
    /// * `Ok(AlerterConfig)` whose `type` names a registered notifier
    /// * `Err(ResolveError::Fetch)` if the store is unreachable or has no record
    /// * `Err(ResolveError::Decode)` if the stored payload is not a valid config
    /// * `Err(ResolveError::UnknownType)` if no notifier handles the config's type
    #[instrument(skip(self, message), fields(correlation_id = %message.correlation_id()))]
    pub async fn load_alerter_config(
        &self,
        key: &str,
        message: &Message,
    ) -> Result<AlerterConfig, ResolveError> {
        let payload = self.store.fetch_alerter_config(key).await.map_err(|e| {
            error!(
                "Unable to fetch alerter config for message {}: {}",
                message.correlation_id(),
                e
            );
            ResolveError::Fetch(e)
        })?;

        let config: AlerterConfig = serde_json::from_str(&payload).map_err(|e| {
            error!(
                "Unable to unmarshal alerter config for message {}: {}",
                message.correlation_id(),
                e
            );
            ResolveError::Decode(e)
        })?;

        if !self.registry.contains(&config.kind) {
            let err = ResolveError::UnknownType(config.kind);
            error!("{}", err);
            return Err(err);
        }

        trace!(notifier = %config.kind, "Resolved alerter config");
        Ok(config)
    }

    pub fn registry(&self) -> &Arc<NotifierRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Notifier;
    use crate::errors::{NotifierError, StoreError};
    use crate::store::MemoryConfigStore;
    use async_trait::async_trait;

    struct ChatNotifier;

    #[async_trait]
    impl Notifier for ChatNotifier {
        fn identify(&self) -> &str {
            "chat"
        }

        fn validate_config(&self, _config: &AlerterConfig) -> Result<(), NotifierError> {
            Ok(())
        }

        async fn send(&self, _message: &Message, _config: &AlerterConfig) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn resolver_with(records: &[(&str, &str)]) -> ConfigResolver {
        let store = MemoryConfigStore::new();
        for (key, payload) in records {
            store.insert(*key, *payload);
        }
        let registry = NotifierRegistry::new(vec![Arc::new(ChatNotifier) as Arc<dyn Notifier>]);
        ConfigResolver::new(Arc::new(store), Arc::new(registry))
    }

    #[tokio::test]
    async fn test_resolves_known_type() {
        let resolver = resolver_with(&[(
            "svc-a",
            r##"{"type":"chat","description":"ops room","options":{"channel":"#ops"}}"##,
        )]);
        let config = resolver
            .load_alerter_config("svc-a", &Message::default())
            .await
            .unwrap();
        assert_eq!(config.kind, "chat");
        assert_eq!(config.options["channel"], "#ops");
    }

    #[tokio::test]
    async fn test_missing_key_is_fetch_error() {
        let resolver = resolver_with(&[]);
        let err = resolver
            .load_alerter_config("missing-key", &Message::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Fetch(StoreError::NotFound(key)) if key == "missing-key"));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_decode_error() {
        let resolver = resolver_with(&[("svc-a", "{not json")]);
        let err = resolver
            .load_alerter_config("svc-a", &Message::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unregistered_type_is_unknown_type_error() {
        let resolver = resolver_with(&[("svc-a", r#"{"type":"fax","options":{}}"#)]);
        let err = resolver
            .load_alerter_config("svc-a", &Message::default())
            .await
            .unwrap_err();
        assert!(matches!(&err, ResolveError::UnknownType(kind) if kind == "fax"));
        assert_eq!(err.to_string(), "Unable to find any alerter named fax");
    }
}
