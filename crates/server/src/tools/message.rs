//! sw_message tool implementation.
//!
//! Posts a control message to the worker and waits for its reply, if the
//! message has one.

use mealsw_client::{ControlMessage, Worker, reply_channel};
use mealsw_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MessageParams {
    /// Message type: "skip-waiting" or "get-version".
    #[serde(rename = "type")]
    pub kind: String,
}

/// Output from the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MessageOutput {
    /// The message type that was delivered.
    #[serde(rename = "type")]
    pub kind: String,
    /// Version reply (get-version only).
    pub version: Option<String>,
    /// Lifecycle state after the message was handled.
    pub state: String,
}

fn parse_message(kind: &str) -> Result<ControlMessage, Error> {
    serde_json::from_value(serde_json::json!({ "type": kind }))
        .map_err(|_| Error::InvalidInput(format!("unknown message type: {kind}")))
}

/// Implementation of the sw_message tool.
pub async fn message_impl(worker: &Worker, params: MessageParams) -> Result<CallToolResult, McpError> {
    let message = parse_message(params.kind.trim())?;

    let version = match message {
        ControlMessage::GetVersion => {
            let (port, reply) = reply_channel();
            worker.on_message(message, Some(port)).await;
            let reply = reply
                .await
                .map_err(|_| Error::Host("worker dropped the reply port".into()))?;
            Some(reply.version)
        }
        ControlMessage::SkipWaiting => {
            worker.on_message(message, None).await;
            None
        }
    };

    let output = MessageOutput { kind: params.kind, version, state: worker.state().await.as_str().to_string() };
    super::json_result(&output)
}
