//! Control message protocol.
//!
//! Inbound messages are JSON objects tagged by `type`:
//! `{"type": "skip-waiting"}` and `{"type": "get-version"}`. The version
//! answer travels back on the reply port supplied with the message.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// A control message sent to the worker by a client page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ControlMessage {
    /// Force immediate activation.
    #[serde(alias = "SKIP_WAITING")]
    SkipWaiting,
    /// Ask for the live version tag.
    #[serde(alias = "GET_VERSION")]
    GetVersion,
}

/// Answer to [`ControlMessage::GetVersion`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionReply {
    pub version: String,
}

/// Reply channel attached to a message.
pub type ReplyPort = oneshot::Sender<VersionReply>;

/// Create a reply port and the receiver the sender waits on.
pub fn reply_channel() -> (ReplyPort, oneshot::Receiver<VersionReply>) {
    oneshot::channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_messages() {
        let msg: ControlMessage = serde_json::from_str(r#"{"type":"skip-waiting"}"#).unwrap();
        assert_eq!(msg, ControlMessage::SkipWaiting);

        let msg: ControlMessage = serde_json::from_str(r#"{"type":"get-version"}"#).unwrap();
        assert_eq!(msg, ControlMessage::GetVersion);
    }

    #[test]
    fn test_parse_legacy_alias() {
        let msg: ControlMessage = serde_json::from_str(r#"{"type":"SKIP_WAITING"}"#).unwrap();
        assert_eq!(msg, ControlMessage::SkipWaiting);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result: Result<ControlMessage, _> = serde_json::from_str(r#"{"type":"reload"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_version_reply_shape() {
        let json = serde_json::to_value(VersionReply { version: "v3.4.4".into() }).unwrap();
        assert_eq!(json, serde_json::json!({ "version": "v3.4.4" }));
    }
}
