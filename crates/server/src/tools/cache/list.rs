//! cache_list tool implementation.
//!
//! Lists partitions with their entry counts, or the stored requests of one
//! partition in enumeration order.

use mealsw_core::{CacheDb, Error, PartitionSummary, StoredRequest};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {
    /// List the stored requests of this partition instead of all partitions.
    #[serde(default)]
    pub partition: Option<String>,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CacheListOutput {
    Partitions { partitions: Vec<PartitionSummary> },
    Entries { partition: String, entries: Vec<StoredRequest> },
}

/// Implementation of the cache_list tool.
pub async fn list_impl(cache: &CacheDb, params: CacheListParams) -> Result<CallToolResult, McpError> {
    let output = match params.partition {
        None => CacheListOutput::Partitions { partitions: cache.partition_summaries().await? },
        Some(name) => {
            if !cache.has_partition(&name).await? {
                return Err(Error::CacheMiss(name).into());
            }
            let entries = cache.partition(&name).keys().await?;
            CacheListOutput::Entries { partition: name, entries }
        }
    };

    crate::tools::json_result(&output)
}
