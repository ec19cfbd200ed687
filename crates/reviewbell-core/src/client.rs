//! Summary fetch client.
//!
//! A fetch is total: failures come back as a failure [`Snapshot`], never as
//! an `Err`, so the engine can always schedule a retry and never crashes
//! the host process. HTTP 401/403 map to [`ErrorKind::Auth`]; everything
//! else unexpected (timeout, DNS, bad status, undecodable body) maps to
//! [`ErrorKind::Transport`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::CoreError;
use crate::snapshot::{ErrorKind, Snapshot};

const USER_AGENT: &str = "reviewbell";

/// Default per-request timeout. A slow fetch only delays the next
/// evaluation; it never blocks it forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can produce a point-in-time review summary.
#[allow(async_fn_in_trait)]
pub trait ReviewSource: Send + Sync {
    async fn fetch_summary(&self) -> Snapshot;
}

/// Wire shape of the service's summary endpoint.
#[derive(Debug, Deserialize)]
struct SummaryBody {
    #[serde(default)]
    reviews_available: u32,
    #[serde(default)]
    lessons_available: u32,
    #[serde(default)]
    next_review_at: Option<DateTime<Utc>>,
}

/// HTTP client for the review service's summary endpoint.
pub struct SummaryClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl SummaryClient {
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built
    /// (TLS backend initialization).
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Result<Self, CoreError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            token: token.into(),
        })
    }
}

impl ReviewSource for SummaryClient {
    async fn fetch_summary(&self) -> Snapshot {
        let response = match self
            .http
            .get(&self.endpoint)
            .bearer_auth(&self.token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(_) => return Snapshot::failure(ErrorKind::Transport),
        };

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Snapshot::failure(ErrorKind::Auth)
            }
            status if !status.is_success() => return Snapshot::failure(ErrorKind::Transport),
            _ => {}
        }

        match response.json::<SummaryBody>().await {
            Ok(body) => Snapshot::counts(
                body.reviews_available,
                body.lessons_available,
                body.next_review_at,
            ),
            Err(_) => Snapshot::failure(ErrorKind::Transport),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn client_for(server: &mockito::ServerGuard) -> SummaryClient {
        SummaryClient::new(format!("{}/summary", server.url()), "token").unwrap()
    }

    #[tokio::test]
    async fn valid_summary_parses_counts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/summary")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"reviews_available": 12, "lessons_available": 4,
                    "next_review_at": "2026-08-23T10:00:00Z"}"#,
            )
            .create_async()
            .await;

        let snap = client_for(&server).await.fetch_summary().await;
        mock.assert_async().await;
        assert_eq!(snap.reviews_available, 12);
        assert_eq!(snap.lessons_available, 4);
        assert!(snap.next_review_at.is_some());
        assert!(snap.error.is_none());
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/summary")
            .with_status(401)
            .create_async()
            .await;

        let snap = client_for(&server).await.fetch_summary().await;
        assert_eq!(snap.error, Some(ErrorKind::Auth));
    }

    #[tokio::test]
    async fn server_error_maps_to_transport() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/summary")
            .with_status(503)
            .create_async()
            .await;

        let snap = client_for(&server).await.fetch_summary().await;
        assert_eq!(snap.error, Some(ErrorKind::Transport));
    }

    #[tokio::test]
    async fn undecodable_body_maps_to_transport() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/summary")
            .with_status(200)
            .with_body("not json at all")
            .create_async()
            .await;

        let snap = client_for(&server).await.fetch_summary().await;
        assert_eq!(snap.error, Some(ErrorKind::Transport));
    }

    #[tokio::test]
    async fn absent_optional_fields_default() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/summary")
            .with_status(200)
            .with_body(r#"{"reviews_available": 3}"#)
            .create_async()
            .await;

        let snap = client_for(&server).await.fetch_summary().await;
        assert_eq!(snap.reviews_available, 3);
        assert_eq!(snap.lessons_available, 0);
        assert!(snap.next_review_at.is_none());
    }
}
