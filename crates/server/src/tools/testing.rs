//! Worker fixture and output parsing for tool tests.

use std::sync::Arc;

use mealsw_client::testing::{ORIGIN, ScriptedNetwork};
use mealsw_client::{Worker, WorkerConfig};
use mealsw_core::CacheDb;
use tokio::sync::mpsc;
use url::Url;

use crate::host::LocalHost;

/// A worker over an in-memory store, a scripted network and a [`LocalHost`].
pub(crate) async fn worker() -> (Worker, Arc<ScriptedNetwork>) {
    let db = CacheDb::open_in_memory().await.unwrap();
    let network = Arc::new(ScriptedNetwork::new());
    let (tx, _rx) = mpsc::unbounded_channel();
    let host = Arc::new(LocalHost::new(network.clone(), network.url("/sw.js"), tx));
    let config = WorkerConfig::new(Url::parse(ORIGIN).unwrap());
    let worker = Worker::new(config, db, network.clone(), host).unwrap();
    (worker, network)
}

/// Decode the JSON text content of a tool result.
pub(crate) fn parse_output<T: serde::de::DeserializeOwned>(result: &rmcp::model::CallToolResult) -> T {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
