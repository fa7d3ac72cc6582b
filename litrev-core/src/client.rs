//! HTTP client for the review endpoint

use reqwest::StatusCode;
use url::Url;

use crate::review::{ErrorBody, ReviewRequest, ReviewResponse};
use crate::{Error, Result};

/// Path of the review endpoint on the server
pub const REVIEW_PATH: &str = "/api/literature-review";

/// Client for a remote review server
#[derive(Debug, Clone)]
pub struct ReviewClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl ReviewClient {
    /// Create a client for the server at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid server URL '{}': {}", base_url, e)))?;
        let endpoint = base
            .join(REVIEW_PATH)
            .map_err(|e| Error::Config(format!("Invalid server URL '{}': {}", base_url, e)))?;

        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
        })
    }

    /// Full endpoint URL
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Request a review and decode it for display
    pub async fn review(&self, request: &ReviewRequest) -> Result<ReviewResponse> {
        let value = self.review_raw(request).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Request a review and return the payload as the server sent it
    pub async fn review_raw(&self, request: &ReviewRequest) -> Result<serde_json::Value> {
        tracing::debug!(
            endpoint = %self.endpoint,
            has_api_key = request.api_key.is_some(),
            model = ?request.model,
            "Sending review request"
        );

        let response = self.http.post(self.endpoint.clone()).json(request).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            return Ok(serde_json::from_slice(&body)?);
        }

        Err(Error::Server {
            status: status.as_u16(),
            message: error_message(status, &body),
        })
    }
}

fn error_message(status: StatusCode, body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(err) if !err.error.is_empty() => err.error,
        _ => format!(
            "API error: {}",
            status.canonical_reason().unwrap_or(status.as_str())
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode as AxumStatus, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_endpoint_join() {
        let client = ReviewClient::new("http://localhost:3000").unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "http://localhost:3000/api/literature-review"
        );
        assert!(ReviewClient::new("not a url").is_err());
    }

    #[test]
    fn test_error_message_fallback() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, br#"{"error":"Invalid query parameter"}"#),
            "Invalid query parameter"
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, b"<html>"),
            "API error: Bad Gateway"
        );
    }

    #[tokio::test]
    async fn test_review_success_sends_overrides() {
        let app = Router::new().route(
            REVIEW_PATH,
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["apiKey"], "sk-user");
                Json(json!({
                    "articles": [{"title": "FedAvg", "confidence": "high"}],
                    "synthesis": {"fieldOverview": body["query"].clone()}
                }))
            }),
        );
        let base = serve(app).await;

        let client = ReviewClient::new(&base).unwrap();
        let request = ReviewRequest::new("federated learning")
            .unwrap()
            .with_api_key("sk-user");
        let review = client.review(&request).await.unwrap();

        assert_eq!(review.articles.len(), 1);
        assert_eq!(review.articles[0].title, "FedAvg");
        assert_eq!(review.synthesis.field_overview, "federated learning");
    }

    #[tokio::test]
    async fn test_review_error_body() {
        let app = Router::new().route(
            REVIEW_PATH,
            post(|| async {
                (
                    AxumStatus::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "Generator process failed: boom"})),
                )
            }),
        );
        let base = serve(app).await;

        let client = ReviewClient::new(&base).unwrap();
        let err = client
            .review(&ReviewRequest::new("q").unwrap())
            .await
            .unwrap_err();

        match err {
            Error::Server { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Generator process failed: boom");
            }
            other => panic!("expected Server error, got {:?}", other),
        }
    }
}
