#![allow(dead_code)]
pub mod mock_notifier;
pub mod test_metrics;

use alerter::{
    core::{Message, Notifier},
    dispatcher::DispatchContext,
    registry::NotifierRegistry,
    report::{MemoryReportSink, ReportEntry},
    resolver::ConfigResolver,
    store::MemoryConfigStore,
};
use std::{collections::HashMap, sync::Arc, time::Duration};

/// Builds a message with the given classification, keys and contents.
pub fn message(kind: &str, keys: &[&str], source: &str, contents: &[(&str, &str)]) -> Message {
    let mut message = Message::new(kind, keys.iter().copied(), source).with_contents(
        contents
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>(),
    );
    message.title = "test alert".to_string();
    message.text = "something happened".to_string();
    message.count = 1;
    message
}

/// A dispatch context over an in-memory store seeded with `records`.
pub fn context(
    notifiers: Vec<Arc<dyn Notifier>>,
    records: &[(&str, &str)],
) -> (DispatchContext, Arc<MemoryReportSink>) {
    let store = MemoryConfigStore::new();
    for (key, payload) in records {
        store.insert(*key, *payload);
    }
    let registry = Arc::new(NotifierRegistry::new(notifiers));
    let sink = Arc::new(MemoryReportSink::new());
    let ctx = DispatchContext::new(ConfigResolver::new(Arc::new(store), registry), sink.clone());
    (ctx, sink)
}

/// Polls the sink until it holds at least `count` entries.
pub async fn wait_for_entries(sink: &MemoryReportSink, count: usize, timeout: Duration) -> Vec<ReportEntry> {
    let wait = async {
        loop {
            let entries = sink.entries();
            if entries.len() >= count {
                return entries;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    tokio::time::timeout(timeout, wait)
        .await
        .expect("Timed out waiting for report entries")
}
