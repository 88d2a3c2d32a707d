use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Row-store change operation carried in the webhook envelope.
///
/// Deletes (and anything else the webhook starts emitting) are parsed but
/// never actionable, so they fall through classification as no-ops instead
/// of failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Insert,
    Update,
    #[serde(other)]
    Other,
}

/// The database webhook envelope. `record` is required; its shape depends on
/// `table`, so it stays untyped and each classifier branch extracts only the
/// fields it needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "type")]
    pub operation: Operation,
    pub table: String,
    pub record: serde_json::Value,
    #[serde(default)]
    pub old_record: Option<serde_json::Value>,
}

/// APNs alert payload: either a bare string or a title/body pair. Serializes
/// into `aps.alert` in exactly those two shapes (untagged).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Alert {
    Plain(String),
    Titled { title: String, body: String },
}

/// A resolved notification: what to say and who hears it. The target set is
/// deduplicated and never contains the user whose action produced the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationIntent {
    pub alert: Alert,
    pub target_user_ids: BTreeSet<String>,
}

/// Outcome of one dispatch batch. `sent` counts attempts, not confirmed
/// deliveries; individual failures are logged and swallowed.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DispatchReport {
    pub sent: usize,
}
