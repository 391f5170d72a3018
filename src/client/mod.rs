pub mod image_stream;
pub mod transport;

use crate::{
    config::ClientConfig,
    error::{ApiError, DalleError, Result},
    models::{GenerateRequest, GenerationData, ListTasksRequest, ListTasksResponse, Task},
};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub use image_stream::ImageStream;
pub use transport::{ByteStream, HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};

/// The operations the labs API offers.
#[async_trait]
pub trait DalleApi: Send + Sync {
    /// Submit a text-to-image task for `caption`.
    async fn generate(&self, caption: &str) -> Result<Task>;

    async fn list_tasks(&self, request: ListTasksRequest) -> Result<ListTasksResponse>;

    async fn get_task(&self, task_id: &str) -> Result<Task>;

    /// Open the image body of a generation. The HTTP status is not checked.
    async fn download(&self, generation_id: &str) -> Result<ImageStream>;

    /// Make a generation public and return its image path.
    async fn share(&self, generation_id: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct DalleClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for DalleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DalleClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DalleClient {
    /// Client backed by `reqwest` with the configured timeout.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.timeout)?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        config.validate()?;
        log::debug!(
            "Creating DALL-E client for {} (user agent: {}, key length: {})",
            config.base_url,
            config.user_agent,
            config.api_key.len()
        );
        Ok(Self {
            config: Arc::new(config),
            transport,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn build_request(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<Vec<u8>>,
    ) -> Result<HttpRequest> {
        let raw = format!("{}{}", self.config.base_url, path);
        let url = if query.is_empty() {
            reqwest::Url::parse(&raw)
        } else {
            reqwest::Url::parse_with_params(&raw, query)
        }
        .map_err(|e| DalleError::Request(format!("building request url {}: {}", raw, e)))?;

        Ok(HttpRequest {
            method,
            url: url.to_string(),
            headers: vec![
                (
                    "Authorization".to_string(),
                    format!("Bearer {}", self.config.api_key),
                ),
                ("Content-Type".to_string(), "application/json".to_string()),
                ("User-Agent".to_string(), self.config.user_agent.clone()),
            ],
            body,
        })
    }

    /// Build, send and decode one JSON call.
    ///
    /// Non-200 responses become [`ApiError`] with the raw body as details, and
    /// so do 200 responses whose body does not decode into `R`.
    async fn request<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<Vec<u8>>,
    ) -> Result<R> {
        let request_id = Uuid::new_v4();
        let request = self.build_request(method, path, query, body)?;
        log::debug!("[req:{}] {} {}", request_id, method, path);

        let response = self.transport.send(request).await?;
        let status = response.status;
        let raw = response.read_to_end().await?;
        let raw = String::from_utf8_lossy(&raw).into_owned();

        if status != 200 {
            log::warn!("[req:{}] {} {} returned {}", request_id, method, path, status);
            return Err(ApiError::unexpected_status(status, raw).into());
        }

        log::debug!("[req:{}] {} {} -> {} ({} bytes)", request_id, method, path, status, raw.len());

        serde_json::from_str(&raw).map_err(|e| {
            log::error!("[req:{}] failed to decode {} response: {}", request_id, path, e);
            ApiError::decode(&e, status, raw.clone()).into()
        })
    }
}

fn encode_body<T: Serialize>(body: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(body).map_err(|e| DalleError::Request(format!("parsing request data: {}", e)))
}

#[async_trait]
impl DalleApi for DalleClient {
    async fn generate(&self, caption: &str) -> Result<Task> {
        let body = encode_body(&GenerateRequest::text_to_image(caption))?;
        log::info!("Submitting text-to-image task ({} chars)", caption.chars().count());
        self.request(Method::Post, "/tasks", &[], Some(body)).await
    }

    async fn list_tasks(&self, request: ListTasksRequest) -> Result<ListTasksResponse> {
        self.request(Method::Get, "/tasks", &request.query(), None)
            .await
    }

    async fn get_task(&self, task_id: &str) -> Result<Task> {
        self.request(Method::Get, &format!("/tasks/{}", task_id), &[], None)
            .await
    }

    async fn download(&self, generation_id: &str) -> Result<ImageStream> {
        let path = format!("/generations/{}/download", generation_id);
        let request = self.build_request(Method::Get, &path, &[], None)?;
        let response = self.transport.send(request).await?;

        if response.status != 200 {
            log::warn!("Download of {} answered with status {}", generation_id, response.status);
        }

        Ok(ImageStream::new(generation_id, response))
    }

    async fn share(&self, generation_id: &str) -> Result<String> {
        let path = format!("/generations/{}/share", generation_id);
        let shared: GenerationData = self.request(Method::Post, &path, &[], None).await?;
        Ok(shared.generation.image_path)
    }
}
