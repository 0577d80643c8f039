//! cache_sweep tool implementation.
//!
//! Runs one eviction pass immediately instead of waiting for the timer.

use mealsw_client::Worker;
use rmcp::{ErrorData as McpError, model::CallToolResult};

/// Implementation of the cache_sweep tool.
pub async fn sweep_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let report = worker.sweep_now().await?;
    crate::tools::json_result(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{parse_output, worker};
    use mealsw_core::{Request, Response};

    #[tokio::test]
    async fn test_sweep_trims_large_partition() {
        let (worker, network) = worker().await;
        let partition = worker.db().open_partition("erica-meal-dynamic-v3.4.4").await.unwrap();
        for i in 0..120 {
            let request = Request::get(network.url(&format!("/api/v1/meals?day={i}")));
            partition.put(&request, &Response::new(200, "{}")).await.unwrap();
        }

        let output: serde_json::Value = parse_output(&sweep_impl(&worker).await.unwrap());
        assert_eq!(output["partitions"][0]["entries"], 120);
        assert_eq!(output["partitions"][0]["deleted"], 50);
        assert_eq!(partition.entry_count().await.unwrap(), 70);
    }
}
