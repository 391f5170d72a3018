use crate::error::{DalleError, Result};
use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use std::fmt;
use std::pin::Pin;
use std::time::Duration;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built request, ready for a transport to execute.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

pub struct HttpResponse {
    pub status: u16,
    pub body: ByteStream,
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl HttpResponse {
    pub fn new(status: u16, body: ByteStream) -> Self {
        Self { status, body }
    }

    /// Response whose body is a single in-memory chunk.
    pub fn from_bytes(status: u16, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        Self::new(status, Box::pin(stream::iter(vec![Ok::<_, DalleError>(body)])))
    }

    /// Response whose body yields the given chunks in order, errors included.
    pub fn from_chunks(status: u16, chunks: Vec<Result<Vec<u8>>>) -> Self {
        Self::new(status, Box::pin(stream::iter(chunks)))
    }

    pub async fn read_to_end(mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }
}

/// The seam between [`DalleClient`](super::DalleClient) and the network.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DalleError::Config(format!("building HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Use a caller-configured `reqwest::Client` (proxies, TLS, pooling, timeouts).
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let built = builder
            .build()
            .map_err(|e| DalleError::Request(format!("building request: {}", e)))?;

        let response = self
            .client
            .execute(built)
            .await
            .map_err(|e| DalleError::Transport(format!("performing request: {}", e)))?;

        let status = response.status().as_u16();
        let body = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| DalleError::Transport(format!("reading response body: {}", e)))
        });

        Ok(HttpResponse::new(status, Box::pin(body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let req = HttpRequest {
            method: Method::Get,
            url: "http://localhost/tasks".into(),
            headers: vec![("User-Agent".into(), "dalle/1.0.0".into())],
            body: None,
        };
        assert_eq!(req.header("user-agent"), Some("dalle/1.0.0"));
        assert_eq!(req.header("authorization"), None);
    }

    #[tokio::test]
    async fn test_read_to_end_joins_chunks() {
        let resp = HttpResponse::from_chunks(200, vec![Ok(b"ab".to_vec()), Ok(b"cd".to_vec())]);
        assert_eq!(resp.read_to_end().await.unwrap(), b"abcd");
    }

    #[tokio::test]
    async fn test_read_to_end_surfaces_chunk_error() {
        let resp = HttpResponse::from_chunks(
            200,
            vec![
                Ok(b"ab".to_vec()),
                Err(DalleError::Transport("connection reset".into())),
            ],
        );
        assert!(matches!(
            resp.read_to_end().await,
            Err(DalleError::Transport(_))
        ));
    }

    #[test]
    fn test_reqwest_transport_builds() {
        assert!(ReqwestTransport::new(Duration::from_secs(5)).is_ok());
    }
}
