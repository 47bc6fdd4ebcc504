//! HTTP Channel
//!
//! [`Channel`] implementation that posts JSON-encoded wire messages to a
//! Nebula HTTP gateway:
//!
//! ```text
//! POST {base}/v1/tables   ListTables        -> TableList
//! POST {base}/v1/state    TableStateRequest -> TableStateResponse
//! POST {base}/v1/load     LoadRequest       -> LoadResponse
//! POST {base}/v1/query    QueryRequest      -> QueryResponse
//! ```
//!
//! Identity metadata travels as request headers. Each call is a single
//! attempt bounded by the configured request timeout.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

use super::channel::{codes, Channel, Identity, ServiceError};
use super::error::{ClientError, ClientResult};
use crate::config::ServiceConfig;
use crate::wire::{
    ListTables, LoadRequest, LoadResponse, QueryRequest, QueryResponse, TableList,
    TableStateRequest, TableStateResponse,
};

/// JSON-over-HTTP channel
#[derive(Debug, Clone)]
pub struct HttpChannel {
    client: Client,
    base_url: String,
}

impl HttpChannel {
    /// Create a channel for the configured service
    pub fn new(config: &ServiceConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ClientError::Setup(e.to_string()))?;

        Ok(Self::with_client(client, config.base_url()))
    }

    /// Create a channel around a preconfigured HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/v1/{}", self.base_url, method)
    }

    /// Post one request and decode the reply
    async fn call<Req, Resp>(
        &self,
        method: &str,
        request: &Req,
        identity: &Identity,
    ) -> Result<Option<Resp>, ServiceError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned + Send,
    {
        tracing::debug!(
            method,
            user = identity.name().unwrap_or("anonymous"),
            "Calling nebula"
        );

        let mut builder = self.client.post(self.endpoint(method)).json(request);
        for (key, value) in identity.metadata() {
            builder = builder.header(key, value);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(error_from_body(status, &body));
        }

        if body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str::<Option<Resp>>(&body).map_err(|e| {
            ServiceError::new(codes::INTERNAL, format!("Malformed {} reply: {}", method, e))
        })
    }
}

#[async_trait]
impl Channel for HttpChannel {
    async fn tables(
        &self,
        request: ListTables,
        identity: &Identity,
    ) -> Result<Option<TableList>, ServiceError> {
        self.call("tables", &request, identity).await
    }

    async fn state(
        &self,
        request: TableStateRequest,
        identity: &Identity,
    ) -> Result<Option<TableStateResponse>, ServiceError> {
        self.call("state", &request, identity).await
    }

    async fn load(
        &self,
        request: LoadRequest,
        identity: &Identity,
    ) -> Result<Option<LoadResponse>, ServiceError> {
        self.call("load", &request, identity).await
    }

    async fn query(
        &self,
        request: QueryRequest,
        identity: &Identity,
    ) -> Result<Option<QueryResponse>, ServiceError> {
        self.call("query", &request, identity).await
    }
}

/// Error body returned by the gateway
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: i32,
    #[serde(default)]
    message: String,
}

fn error_from_body(status: StatusCode, body: &str) -> ServiceError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => ServiceError::new(err.code, err.message),
        Err(_) => {
            let message = if body.is_empty() {
                status.to_string()
            } else {
                body.to_string()
            };
            ServiceError::new(status_code(status), message)
        }
    }
}

/// Map an HTTP status onto a service status code
fn status_code(status: StatusCode) -> i32 {
    match status.as_u16() {
        400 => codes::INVALID_ARGUMENT,
        401 => codes::UNAUTHENTICATED,
        403 => codes::PERMISSION_DENIED,
        404 => codes::NOT_FOUND,
        429 => codes::RESOURCE_EXHAUSTED,
        501 => codes::UNIMPLEMENTED,
        502 | 503 => codes::UNAVAILABLE,
        504 => codes::DEADLINE_EXCEEDED,
        500 => codes::INTERNAL,
        _ => codes::UNKNOWN,
    }
}

fn transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::new(codes::DEADLINE_EXCEEDED, e.to_string())
    } else if e.is_connect() {
        ServiceError::new(codes::UNAVAILABLE, e.to_string())
    } else {
        ServiceError::new(codes::UNKNOWN, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];

            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
                if request_complete(&received) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&received).to_string()
        });

        (addr, handle)
    }

    fn request_complete(received: &[u8]) -> bool {
        let text = String::from_utf8_lossy(received);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);
        received.len() >= header_end + 4 + content_length
    }

    fn channel_for(addr: &str) -> HttpChannel {
        let client = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        HttpChannel::with_client(client, format!("http://{}", addr))
    }

    #[test]
    fn test_endpoint() {
        let channel = HttpChannel::new(&ServiceConfig::default()).unwrap();
        assert_eq!(channel.base_url(), "http://localhost:9190");
        assert_eq!(channel.endpoint("query"), "http://localhost:9190/v1/query");
    }

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(status_code(StatusCode::BAD_REQUEST), codes::INVALID_ARGUMENT);
        assert_eq!(status_code(StatusCode::SERVICE_UNAVAILABLE), codes::UNAVAILABLE);
        assert_eq!(status_code(StatusCode::GATEWAY_TIMEOUT), codes::DEADLINE_EXCEEDED);
        assert_eq!(status_code(StatusCode::IM_A_TEAPOT), codes::UNKNOWN);
    }

    #[test]
    fn test_error_from_body() {
        let err = error_from_body(
            StatusCode::BAD_REQUEST,
            r#"{"code": 3, "message": "table not found"}"#,
        );
        assert_eq!(err, ServiceError::new(3, "table not found"));

        let err = error_from_body(StatusCode::SERVICE_UNAVAILABLE, "upstream down");
        assert_eq!(err, ServiceError::new(codes::UNAVAILABLE, "upstream down"));
    }

    #[tokio::test]
    async fn test_query_round_trip() {
        let (addr, server) = serve_once(
            "200 OK",
            r#"{"stats":{"error":0,"queryTimeMs":5,"rowsScanned":10,"blocksScanned":1,"rowsReturn":2},"data":"AQI="}"#,
        )
        .await;
        let channel = channel_for(&addr);

        let request = QueryRequest {
            table: "nebula.test".to_string(),
            top: 10,
            ..Default::default()
        };
        let reply = channel
            .query(request, &Identity::user("someone@example.com"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(reply.data, vec![1, 2]);
        assert_eq!(reply.stats.unwrap().rows_return, 2);

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /v1/query "));
        assert!(raw.contains("nebula-auth: 1"));
        assert!(raw.contains("nebula-user: someone@example.com"));
        assert!(raw.contains("\"table\":\"nebula.test\""));
    }

    #[tokio::test]
    async fn test_null_reply_is_absent() {
        let (addr, server) = serve_once("200 OK", "null").await;
        let channel = channel_for(&addr);

        let reply = channel
            .tables(ListTables { limit: 100 }, &Identity::anonymous())
            .await
            .unwrap();
        assert!(reply.is_none());

        let raw = server.await.unwrap();
        assert!(raw.contains("nebula-auth: 0"));
        assert!(!raw.contains("nebula-user"));
    }

    #[tokio::test]
    async fn test_service_error() {
        let (addr, server) =
            serve_once("400 Bad Request", r#"{"code":3,"message":"bad table"}"#).await;
        let channel = channel_for(&addr);

        let err = channel
            .state(
                TableStateRequest {
                    table: "missing".to_string(),
                },
                &Identity::anonymous(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::new(3, "bad table"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let channel = channel_for(&addr);
        let err = channel
            .load(LoadRequest::unload("t"), &Identity::anonymous())
            .await
            .unwrap_err();
        assert_eq!(err.code, codes::UNAVAILABLE);
    }
}
