//! Detection service API.
//!
//! Five endpoints: `POST /upload`, `POST /detect/{id}`, `GET /results/{id}`,
//! `GET /blueprints/{id}` and `GET /health`. Detection payloads are parsed
//! leniently: elements that do not look like a detection are dropped with a
//! warning instead of failing the whole response.

use std::future::Future;

use overlay_engine::{detections_from_value, Detection, ViewerConfig};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{error_message, Result, ServiceError};
use crate::upload::UploadFile;

#[cfg(not(target_arch = "wasm32"))]
const REQUEST_TIMEOUT_SECS: u64 = 120;
#[cfg(not(target_arch = "wasm32"))]
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Body of a successful upload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadReceipt {
    pub id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

pub trait DetectionService {
    fn upload(&self, file: UploadFile) -> impl Future<Output = Result<UploadReceipt>>;

    /// Run detection now and return its results.
    fn detect(&self, id: &str) -> impl Future<Output = Result<Vec<Detection>>>;

    /// Stored results; [`ServiceError::NotComputed`] when detection never ran.
    fn results(&self, id: &str) -> impl Future<Output = Result<Vec<Detection>>>;

    fn blueprint_image(&self, id: &str) -> impl Future<Output = Result<Vec<u8>>>;

    /// Address of the blueprint image, for hosts that load it themselves.
    fn blueprint_url(&self, id: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct HttpDetectionService {
    client: Client,
    base_url: Url,
}

impl HttpDetectionService {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let raw = base_url.into();
        let base_url = Url::parse(raw.trim()).map_err(|e| ServiceError::InvalidUrl(format!("{}: {}", raw, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::InvalidUrl(raw));
        }
        Ok(Self {
            client: build_client()?,
            base_url,
        })
    }

    pub fn from_config(config: &ViewerConfig) -> Result<Self> {
        Self::new(config.api_base_url.clone())
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Append `segments` to the base path, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self.client.get(self.url(&["health"])).send().await?;
        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn build_client() -> Result<Client> {
    use std::time::Duration;

    Ok(Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .build()?)
}

#[cfg(target_arch = "wasm32")]
fn build_client() -> Result<Client> {
    Ok(Client::new())
}

/// Turn a non-2xx response into [`ServiceError::Status`].
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

async fn read_detections(response: Response) -> Result<Vec<Detection>> {
    let value: serde_json::Value = response
        .json()
        .await
        .map_err(|e| ServiceError::Decode(e.to_string()))?;
    Ok(detections_from_value(value)?)
}

impl DetectionService for HttpDetectionService {
    async fn upload(&self, file: UploadFile) -> Result<UploadReceipt> {
        info!("Uploading {} ({} bytes)", file.file_name, file.bytes.len());
        let part = reqwest::multipart::Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(file.mime)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self.client.post(self.url(&["upload"])).multipart(form).send().await?;
        let receipt: UploadReceipt = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;
        info!("Uploaded blueprint {}", receipt.id);
        Ok(receipt)
    }

    async fn detect(&self, id: &str) -> Result<Vec<Detection>> {
        info!("Running detection for blueprint {}", id);
        let response = self.client.post(self.url(&["detect", id])).send().await?;
        let detections = read_detections(check_status(response).await?).await?;
        info!("Detection for {} returned {} elements", id, detections.len());
        Ok(detections)
    }

    async fn results(&self, id: &str) -> Result<Vec<Detection>> {
        let response = self.client.get(self.url(&["results", id])).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("No stored results for {}", id);
            return Err(ServiceError::NotComputed(id.to_string()));
        }
        read_detections(check_status(response).await?).await
    }

    async fn blueprint_image(&self, id: &str) -> Result<Vec<u8>> {
        let response = self.client.get(self.blueprint_url(id)).send().await?;
        let bytes = check_status(response).await?.bytes().await?;
        if bytes.is_empty() {
            warn!("Blueprint {} image is empty", id);
        }
        Ok(bytes.to_vec())
    }

    fn blueprint_url(&self, id: &str) -> String {
        self.url(&["blueprints", id]).into()
    }
}
