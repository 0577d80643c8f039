//! MCP tool implementations.
//!
//! This module contains all tools exposed by the meal-sw server.

pub mod cache;
pub mod fetch;
pub mod menu;
pub mod message;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

use mealsw_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

pub use cache::{CacheListParams, list_impl, sweep_impl};
pub use fetch::{FetchParams, fetch_impl};
pub use menu::{MenuDayParams, menu_dates_impl, menu_day_impl};
pub use message::{MessageParams, message_impl};
pub use sync::{SyncParams, sync_impl};

/// Serialize a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
