use axum::{extract::Extension, http::StatusCode, response::Json};
use serde_json::{json, Value};
use tracing;

use push_core::{ChangeEvent, NotificationIntent, PushContext, PushError};
use push_delivery::{issue, ApnsClient, Push};
use push_intent::{classify, resolve, tokens_for};

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "push-api"
    }))
}

/// Database webhook entry point. Classifies the change event, resolves
/// recipients and tokens, then fans out one push per token under a fresh
/// signed assertion. Non-actionable events are acknowledged as ignored.
pub async fn db_event(
    Extension(ctx): Extension<PushContext>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let apns = match ctx.config.apns.resolved() {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    let event: ChangeEvent = match serde_json::from_value(body) {
        Ok(e) => e,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": format!("bad event envelope: {}", e)})),
            );
        }
    };

    let intent = match classify(&event) {
        Some(intent) => intent,
        None => {
            tracing::debug!("Event on table {} is not actionable", event.table);
            return (StatusCode::OK, Json(json!({"ignored": true})));
        }
    };

    let resolved = match resolve(&ctx, &intent).await {
        Ok(r) => r,
        Err(e) => return error_response(e),
    };
    if !fanout_required(&resolved) {
        return ok_sent(0);
    }

    let tokens = match tokens_for(&ctx, &resolved.target_user_ids).await {
        Ok(t) => t,
        Err(e) => return error_response(e),
    };
    let pushes: Vec<Push> = tokens
        .values()
        .flatten()
        .map(|token| Push {
            token: token.clone(),
            alert: resolved.alert.clone(),
        })
        .collect();
    if pushes.is_empty() {
        return ok_sent(0);
    }

    let assertion = match issue(&apns.team_id, &apns.key_id, &apns.private_key) {
        Ok(a) => a,
        Err(e) => return error_response(e),
    };
    let client = match ApnsClient::new(&apns.host, &apns.bundle_id) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    let report = client.dispatch(pushes, &assertion).await;
    ok_sent(report.sent)
}

/// Scheduled entry point: runs the trip-reminder sweep. The request body is
/// ignored; the scheduler only supplies the trigger.
pub async fn trip_reminders(Extension(ctx): Extension<PushContext>) -> (StatusCode, Json<Value>) {
    match push_sweep::sweep(&ctx).await {
        Ok(report) => ok_sent(report.sent),
        Err(e) => error_response(e),
    }
}

/// Zero recipients end the invocation early: no token query, no signing, and
/// a successful `sent: 0` response.
fn fanout_required(intent: &NotificationIntent) -> bool {
    !intent.target_user_ids.is_empty()
}

fn ok_sent(sent: usize) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({"ok": true, "sent": sent})))
}

/// Pre-dispatch failures abort the invocation with a short diagnostic.
/// Per-push failures never reach here; the dispatcher swallows them.
fn error_response(err: PushError) -> (StatusCode, Json<Value>) {
    tracing::error!("Invocation failed: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": err.to_string()})),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use push_core::Alert;
    use std::collections::BTreeSet;

    #[test]
    fn test_empty_target_set_skips_fanout() {
        let intent = NotificationIntent {
            alert: Alert::Plain("hello".to_string()),
            target_user_ids: BTreeSet::new(),
        };
        assert!(!fanout_required(&intent));
    }

    #[test]
    fn test_nonempty_target_set_fans_out() {
        let intent = NotificationIntent {
            alert: Alert::Plain("hello".to_string()),
            target_user_ids: ["u2".to_string()].into_iter().collect(),
        };
        assert!(fanout_required(&intent));
    }
}
