//! Immutable lookup table from notifier type name to implementation.

use crate::core::Notifier;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maps the `type` of an `AlerterConfig` to the notifier that handles it.
///
/// Built once at startup and shared behind an `Arc`. There is no way to
/// mutate it afterwards, so concurrent handlers read it without locking.
#[derive(Clone, Default)]
pub struct NotifierRegistry {
    notifiers: HashMap<String, Arc<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Builds the registry, keying each notifier by `identify()`.
    ///
    /// A later notifier with the same type name replaces an earlier one.
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        let mut map: HashMap<String, Arc<dyn Notifier>> = HashMap::with_capacity(notifiers.len());
        for notifier in notifiers {
            let name = notifier.identify().to_string();
            debug!(notifier = %name, "Registering notifier");
            if map.insert(name.clone(), notifier).is_some() {
                warn!(notifier = %name, "Duplicate notifier type registered; keeping the last one");
            }
        }
        Self { notifiers: map }
    }

    pub fn get(&self, kind: &str) -> Option<&Arc<dyn Notifier>> {
        self.notifiers.get(kind)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.notifiers.contains_key(kind)
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.notifiers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl std::fmt::Debug for NotifierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierRegistry")
            .field("notifiers", &self.names())
            .finish()
    }
}
