//! sw_sync tool implementation.

use mealsw_client::Worker;
use mealsw_client::worker::BACKGROUND_SYNC_TAG;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the sw_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncParams {
    /// Sync tag (default: "background-sync").
    #[serde(default = "default_tag")]
    pub tag: String,
}

fn default_tag() -> String {
    BACKGROUND_SYNC_TAG.into()
}

/// Output from the sw_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncOutput {
    pub tag: String,
    /// Whether the worker recognised the tag.
    pub handled: bool,
}

/// Implementation of the sw_sync tool.
pub async fn sync_impl(worker: &Worker, params: SyncParams) -> Result<CallToolResult, McpError> {
    let handled = worker.on_sync(&params.tag).await;
    super::json_result(&SyncOutput { tag: params.tag, handled })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{parse_output, worker};

    #[tokio::test]
    async fn test_sync_tags() {
        let (worker, _network) = worker().await;

        let params: SyncParams = serde_json::from_str("{}").unwrap();
        let output: SyncOutput = parse_output(&sync_impl(&worker, params).await.unwrap());
        assert_eq!(output.tag, "background-sync");
        assert!(output.handled);

        let output: SyncOutput = parse_output(&sync_impl(&worker, SyncParams { tag: "other".into() }).await.unwrap());
        assert!(!output.handled);
    }
}
