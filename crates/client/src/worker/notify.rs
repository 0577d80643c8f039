//! Push payloads and the notifications built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NOTIFICATION_ICON: &str = "/static/icons/icon-192x192.png";
pub const NOTIFICATION_BADGE: &str = "/static/icons/icon-72x72.png";
pub const ACTION_ICON: &str = "/static/icons/icon-96x96.png";

/// Action that opens the app root when clicked.
pub const ACTION_EXPLORE: &str = "explore";
pub const ACTION_CLOSE: &str = "close";

/// JSON body of a push message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub primary_key: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    /// Milliseconds since the Unix epoch.
    pub date_of_arrival: i64,
    pub primary_key: Option<Value>,
}

/// A notification the host is asked to display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub body: Option<String>,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

impl Notification {
    pub fn from_push(payload: PushPayload, received_at: DateTime<Utc>) -> Self {
        let action = |action: &str, title: &str| NotificationAction {
            action: action.to_string(),
            title: title.to_string(),
            icon: ACTION_ICON.to_string(),
        };

        Self {
            title: payload.title,
            body: payload.body,
            icon: NOTIFICATION_ICON.to_string(),
            badge: NOTIFICATION_BADGE.to_string(),
            vibrate: vec![100, 50, 100],
            data: NotificationData {
                date_of_arrival: received_at.timestamp_millis(),
                primary_key: payload.primary_key,
            },
            actions: vec![action(ACTION_EXPLORE, "View menu"), action(ACTION_CLOSE, "Close")],
        }
    }
}
