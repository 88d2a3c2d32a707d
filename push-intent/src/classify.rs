use push_core::{ChangeEvent, Operation};
use serde_json::Value;

/// What kind of notification a change event calls for, with the fields each
/// branch needs already validated and extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    DirectMessage {
        sender_id: String,
        recipient_id: String,
        message: String,
    },
    TribeMessage {
        tribe_id: String,
        sender_id: String,
        message: String,
    },
    TripJoined {
        user_id: String,
        destination: String,
    },
    TribeJoined {
        user_id: String,
        tribe_id: String,
    },
    FriendRequest {
        requester_id: String,
        receiver_id: String,
    },
    FriendRequestAccepted {
        requester_id: String,
        receiver_id: String,
    },
}

/// Classify a change event. Pure and total: events that carry no actionable
/// intent (unknown tables, missing fields, already-accepted requests) come
/// back as `None` and the invocation responds with a successful no-op.
pub fn classify(event: &ChangeEvent) -> Option<Intent> {
    let row = &event.record;

    match (event.operation, event.table.as_str()) {
        (Operation::Insert, "friend_messages") => Some(Intent::DirectMessage {
            sender_id: text_field(row, "sender_id")?,
            recipient_id: text_field(row, "receiver_id")?,
            message: text_field(row, "message").unwrap_or_default(),
        }),
        (Operation::Insert, "tribe_messages") => Some(Intent::TribeMessage {
            tribe_id: text_field(row, "tribe_id")?,
            sender_id: text_field(row, "sender_id")?,
            message: text_field(row, "message").unwrap_or_default(),
        }),
        (Operation::Insert, "mytrips") => Some(Intent::TripJoined {
            user_id: text_field(row, "user_id")?,
            destination: text_field(row, "destination")?,
        }),
        (Operation::Insert, "tribes_join") => Some(Intent::TribeJoined {
            user_id: text_field(row, "user_id")?,
            tribe_id: text_field(row, "tribe_id")?,
        }),
        (Operation::Insert, "friend_requests") => {
            if text_field(row, "status").as_deref() != Some("pending") {
                return None;
            }
            Some(Intent::FriendRequest {
                requester_id: text_field(row, "sender_id")?,
                receiver_id: text_field(row, "receiver_id")?,
            })
        }
        (Operation::Update, "friend_requests") => {
            if text_field(row, "status").as_deref() != Some("accepted") {
                return None;
            }
            // Duplicate update events for an already-accepted request must
            // not re-fire the notification.
            let old_status = event
                .old_record
                .as_ref()
                .and_then(|old| text_field(old, "status"));
            if old_status.as_deref() == Some("accepted") {
                return None;
            }
            Some(Intent::FriendRequestAccepted {
                requester_id: text_field(row, "sender_id")?,
                receiver_id: text_field(row, "receiver_id")?,
            })
        }
        _ => None,
    }
}

/// Extract a non-empty string column from an untyped row. Absent, null, or
/// blank values all read as "not present".
fn text_field(row: &Value, key: &str) -> Option<String> {
    row.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(table: &str, record: serde_json::Value) -> ChangeEvent {
        ChangeEvent {
            operation: Operation::Insert,
            table: table.to_string(),
            record,
            old_record: None,
        }
    }

    fn update(table: &str, record: serde_json::Value, old: serde_json::Value) -> ChangeEvent {
        ChangeEvent {
            operation: Operation::Update,
            table: table.to_string(),
            record,
            old_record: Some(old),
        }
    }

    #[test]
    fn test_friend_message_insert() {
        let event = insert(
            "friend_messages",
            serde_json::json!({"sender_id": "u1", "receiver_id": "u2", "message": "hey"}),
        );
        assert_eq!(
            classify(&event),
            Some(Intent::DirectMessage {
                sender_id: "u1".to_string(),
                recipient_id: "u2".to_string(),
                message: "hey".to_string(),
            })
        );
    }

    #[test]
    fn test_classification_is_deterministic() {
        let event = insert(
            "tribe_messages",
            serde_json::json!({"tribe_id": "t1", "sender_id": "u1", "message": "hi"}),
        );
        assert_eq!(classify(&event), classify(&event));
    }

    #[test]
    fn test_missing_fields_decline() {
        let event = insert("friend_messages", serde_json::json!({"sender_id": "u1"}));
        assert_eq!(classify(&event), None);

        let event = insert(
            "friend_messages",
            serde_json::json!({"sender_id": "u1", "receiver_id": null}),
        );
        assert_eq!(classify(&event), None);
    }

    #[test]
    fn test_trip_and_tribe_joins() {
        let event = insert(
            "mytrips",
            serde_json::json!({"user_id": "u1", "destination": "Lisbon"}),
        );
        assert_eq!(
            classify(&event),
            Some(Intent::TripJoined {
                user_id: "u1".to_string(),
                destination: "Lisbon".to_string(),
            })
        );

        let event = insert(
            "tribes_join",
            serde_json::json!({"user_id": "u1", "tribe_id": "t9"}),
        );
        assert_eq!(
            classify(&event),
            Some(Intent::TribeJoined {
                user_id: "u1".to_string(),
                tribe_id: "t9".to_string(),
            })
        );
    }

    #[test]
    fn test_friend_request_requires_pending_status() {
        let pending = insert(
            "friend_requests",
            serde_json::json!({"sender_id": "u1", "receiver_id": "u2", "status": "pending"}),
        );
        assert_eq!(
            classify(&pending),
            Some(Intent::FriendRequest {
                requester_id: "u1".to_string(),
                receiver_id: "u2".to_string(),
            })
        );

        let blocked = insert(
            "friend_requests",
            serde_json::json!({"sender_id": "u1", "receiver_id": "u2", "status": "blocked"}),
        );
        assert_eq!(classify(&blocked), None);
    }

    #[test]
    fn test_accepted_transition_fires_once() {
        let accepted = update(
            "friend_requests",
            serde_json::json!({"sender_id": "u1", "receiver_id": "u2", "status": "accepted"}),
            serde_json::json!({"sender_id": "u1", "receiver_id": "u2", "status": "pending"}),
        );
        assert_eq!(
            classify(&accepted),
            Some(Intent::FriendRequestAccepted {
                requester_id: "u1".to_string(),
                receiver_id: "u2".to_string(),
            })
        );

        // A second update event over the already-accepted row is a no-op.
        let duplicate = update(
            "friend_requests",
            serde_json::json!({"sender_id": "u1", "receiver_id": "u2", "status": "accepted"}),
            serde_json::json!({"sender_id": "u1", "receiver_id": "u2", "status": "accepted"}),
        );
        assert_eq!(classify(&duplicate), None);
    }

    #[test]
    fn test_unknown_events_are_noops() {
        let event = insert("profiles", serde_json::json!({"user_id": "u1"}));
        assert_eq!(classify(&event), None);

        let event = ChangeEvent {
            operation: Operation::Other,
            table: "friend_messages".to_string(),
            record: serde_json::json!({"sender_id": "u1", "receiver_id": "u2"}),
            old_record: None,
        };
        assert_eq!(classify(&event), None);
    }
}
