use futures::future::join_all;
use serde_json::json;
use tracing;

use push_core::{Alert, DispatchReport, PushError};

use crate::auth::SignedAssertion;

/// One outbound push: a device token and the alert it should carry.
#[derive(Debug, Clone)]
pub struct Push {
    pub token: String,
    pub alert: Alert,
}

/// Thin client over the provider's device-push endpoint. One instance per
/// invocation; holds no key material, only the host and application topic.
pub struct ApnsClient {
    client: reqwest::Client,
    base_url: String,
    bundle_id: String,
}

impl ApnsClient {
    pub fn new(host: &str, bundle_id: &str) -> Result<Self, PushError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| PushError::Transport(e.to_string()))?;

        // The host setting is normally bare ("api.push.apple.com") but a full
        // URL is accepted as-is.
        let base_url = if host.contains("://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", host)
        };

        Ok(Self {
            client,
            base_url,
            bundle_id: bundle_id.to_string(),
        })
    }

    /// Fan out one request per push, all concurrent, and wait for every one
    /// to settle. Individual failures are logged and swallowed; the report
    /// counts attempts, not confirmed deliveries.
    pub async fn dispatch(&self, pushes: Vec<Push>, assertion: &SignedAssertion) -> DispatchReport {
        let sent = pushes.len();
        join_all(pushes.iter().map(|p| self.send(p, &assertion.jwt))).await;
        DispatchReport { sent }
    }

    async fn send(&self, push: &Push, jwt: &str) {
        let url = format!("{}/3/device/{}", self.base_url, push.token);
        let payload = json!({"aps": {"alert": push.alert}});

        let result = self
            .client
            .post(&url)
            .header("authorization", format!("bearer {}", jwt))
            .header("apns-topic", &self.bundle_id)
            .header("apns-push-type", "alert")
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    tracing::debug!("Push delivered to device {}", push.token);
                } else {
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    tracing::warn!("Push to device {} rejected: {} {}", push.token, status, body);
                }
            }
            Err(e) => {
                tracing::warn!("Push to device {} failed: {}", push.token, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Stub {
        base_url: String,
        hits: Arc<AtomicUsize>,
        accepted: Arc<AtomicUsize>,
    }

    async fn spawn_stub() -> Stub {
        let hits = Arc::new(AtomicUsize::new(0));
        let accepted = Arc::new(AtomicUsize::new(0));
        let hits_handle = hits.clone();
        let accepted_handle = accepted.clone();

        let app = Router::new().route(
            "/3/device/:token",
            post(move |Path(token): Path<String>, headers: HeaderMap| {
                let hits = hits_handle.clone();
                let accepted = accepted_handle.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    let header = |name: &str| {
                        headers.get(name).and_then(|v| v.to_str().ok()).map(String::from)
                    };
                    if header("authorization").as_deref() != Some("bearer test.jwt")
                        || header("apns-topic").as_deref() != Some("com.wander.app")
                        || header("apns-push-type").as_deref() != Some("alert")
                    {
                        return StatusCode::FORBIDDEN;
                    }
                    if token == "bad" {
                        return StatusCode::BAD_REQUEST;
                    }
                    accepted.fetch_add(1, Ordering::SeqCst);
                    StatusCode::OK
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Stub {
            base_url,
            hits,
            accepted,
        }
    }

    fn test_assertion() -> SignedAssertion {
        SignedAssertion {
            jwt: "test.jwt".to_string(),
            issued_at: Utc::now(),
        }
    }

    fn push(token: &str) -> Push {
        Push {
            token: token.to_string(),
            alert: Alert::Plain("hello".to_string()),
        }
    }

    #[tokio::test]
    async fn test_dispatch_attempts_every_token_despite_failures() {
        let stub = spawn_stub().await;
        let client = ApnsClient::new(&stub.base_url, "com.wander.app").unwrap();

        let report = client
            .dispatch(vec![push("tok1"), push("bad"), push("tok3")], &test_assertion())
            .await;

        assert_eq!(report.sent, 3);
        assert_eq!(stub.hits.load(Ordering::SeqCst), 3);
        assert_eq!(stub.accepted.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dispatch_swallows_transport_errors() {
        // Nothing listens here; every send fails at connect, and the report
        // still counts all attempts.
        let client = ApnsClient::new("http://127.0.0.1:1", "com.wander.app").unwrap();
        let report = client
            .dispatch(vec![push("tok1"), push("tok2")], &test_assertion())
            .await;
        assert_eq!(report.sent, 2);
    }

    #[tokio::test]
    async fn test_empty_batch_sends_nothing() {
        let client = ApnsClient::new("api.push.apple.com", "com.wander.app").unwrap();
        let report = client.dispatch(Vec::new(), &test_assertion()).await;
        assert_eq!(report.sent, 0);
    }
}
