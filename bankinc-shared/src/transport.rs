//! HTTP plumbing between the client and the banking API.
//!
//! [`Transport`] is the seam tests replace; [`ReqwestTransport`] is the real
//! thing. Bodies are kept as text until [`ResponseBody::parse`] decides
//! whether they are JSON.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use url::Url;

use crate::action::Method;

/// Failures that prevented a request from producing any HTTP status.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// Connecting, sending or reading the body failed.
    #[error("request to {url} failed: {source}")]
    Request {
        /// Target of the failed request.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// Catch-all used by alternative transports.
    #[error("request to {url} failed: {reason}")]
    Unavailable {
        /// Target of the failed request.
        url: String,
        /// Why it failed.
        reason: String,
    },
}

/// A fully resolved request, ready to go on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// HTTP verb.
    pub method: Method,
    /// Absolute target, query string included.
    pub url: Url,
    /// JSON payload, if the endpoint takes one.
    pub body: Option<Value>,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub bearer: Option<String>,
}

/// Status and raw text of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Undecoded response body.
    pub text: String,
}

/// Sends requests to the banking API.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Performs a single request. Non-2xx statuses are successful sends.
    ///
    /// # Errors
    /// Returns [`TransportError`] only when no status could be obtained.
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds a transport that identifies itself with `user_agent`.
    ///
    /// # Errors
    /// Returns [`TransportError::Build`] if the TLS backend cannot initialise.
    pub fn new(user_agent: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(user_agent.to_string())
            .build()
            .map_err(TransportError::Build)?;
        Ok(Self { client })
    }

    /// Wraps an already configured client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let HttpRequest {
            method,
            url,
            body,
            bearer,
        } = request;
        let failed = |source| TransportError::Request {
            url: url.to_string(),
            source,
        };

        let mut builder = match method {
            Method::Get => self.client.get(url.clone()),
            Method::Post => self.client.post(url.clone()),
        };
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder.send().await.map_err(failed)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(failed)?;
        Ok(RawResponse { status, text })
    }
}

/// A response body, structured when it parses as JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Body that parsed as JSON.
    Json(Value),
    /// Anything else, verbatim.
    Text(String),
}

impl ResponseBody {
    /// Parses `text` as JSON, keeping it verbatim when it is not.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        serde_json::from_str(text).map_or_else(|_| Self::Text(text.to_string()), Self::Json)
    }

    /// JSON view of the body; text becomes a JSON string.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Json(value) => value.clone(),
            Self::Text(text) => Value::String(text.clone()),
        }
    }
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(Value::String(text)) | Self::Text(text) => f.write_str(text),
            Self::Json(value) => write!(f, "{value}"),
        }
    }
}

/// Outcome of a dispatched call that reached the service.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// Requested URL.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Decoded body.
    pub body: ResponseBody,
}

impl ApiResponse {
    /// Any 2xx status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        http::{HeaderMap, StatusCode},
        routing::{get, post},
    };
    use serde_json::json;
    use tokio::net::TcpListener;

    async fn spawn_api() -> Url {
        let app = Router::new()
            .route(
                "/echo",
                post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    Json(json!({"authorization": auth, "received": body}))
                }),
            )
            .route(
                "/plain",
                get(|| async { (StatusCode::NOT_FOUND, "Tarjeta no encontrada") }),
            )
            .route(
                "/agent",
                get(|headers: HeaderMap| async move {
                    headers
                        .get("user-agent")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or_default()
                        .to_string()
                }),
            );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    #[test]
    fn test_parse_json_body() {
        assert_eq!(
            ResponseBody::parse(r#"{"token":"t"}"#),
            ResponseBody::Json(json!({"token": "t"}))
        );
        assert_eq!(ResponseBody::parse("25.50"), ResponseBody::Json(json!(25.5)));
    }

    #[test]
    fn test_parse_keeps_non_json_as_text() {
        assert_eq!(
            ResponseBody::parse("Transacción tx-1 anulada exitosamente."),
            ResponseBody::Text("Transacción tx-1 anulada exitosamente.".into())
        );
        assert_eq!(ResponseBody::parse(""), ResponseBody::Text(String::new()));
    }

    #[test]
    fn test_success_range() {
        let mut response = ApiResponse {
            url: "http://localhost:8081/x".into(),
            status: 204,
            body: ResponseBody::Text(String::new()),
        };
        assert!(response.is_success());
        response.status = 400;
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_reqwest_transport_sends_bearer_and_json() {
        let base = spawn_api().await;
        let transport = ReqwestTransport::new("bankinc-test").unwrap();

        let raw = transport
            .send(HttpRequest {
                method: Method::Post,
                url: base.join("echo").unwrap(),
                body: Some(json!({"transactionId": "tx-9"})),
                bearer: Some("tok".into()),
            })
            .await
            .unwrap();

        assert_eq!(raw.status, 200);
        assert_eq!(
            ResponseBody::parse(&raw.text),
            ResponseBody::Json(json!({
                "authorization": "Bearer tok",
                "received": {"transactionId": "tx-9"}
            }))
        );
    }

    #[tokio::test]
    async fn test_reqwest_transport_reports_error_status_as_response() {
        let base = spawn_api().await;
        let transport = ReqwestTransport::new("bankinc-test").unwrap();

        let raw = transport
            .send(HttpRequest {
                method: Method::Get,
                url: base.join("plain").unwrap(),
                body: None,
                bearer: None,
            })
            .await
            .unwrap();

        assert_eq!(raw.status, 404);
        assert_eq!(raw.text, "Tarjeta no encontrada");
    }

    #[tokio::test]
    async fn test_reqwest_transport_uses_the_wrapped_client() {
        let base = spawn_api().await;
        let client = Client::builder()
            .user_agent("bankinc-embedded/2.0")
            .build()
            .unwrap();
        let transport = ReqwestTransport::with_client(client);

        let raw = transport
            .send(HttpRequest {
                method: Method::Get,
                url: base.join("agent").unwrap(),
                body: None,
                bearer: None,
            })
            .await
            .unwrap();

        assert_eq!(raw.status, 200);
        assert_eq!(raw.text, "bankinc-embedded/2.0");
    }

    #[tokio::test]
    async fn test_reqwest_transport_connection_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let transport = ReqwestTransport::new("bankinc-test").unwrap();

        let result = transport
            .send(HttpRequest {
                method: Method::Get,
                url: Url::parse(&format!("http://{addr}/cards/me")).unwrap(),
                body: None,
                bearer: None,
            })
            .await;

        assert!(matches!(result, Err(TransportError::Request { .. })));
    }
}
