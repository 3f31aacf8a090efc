//! Client for the blueprint detection service.

pub mod error;
pub mod fetch;
pub mod service;
pub mod upload;

pub use error::{Result, ServiceError};
pub use fetch::{fetch_detections, DetectionSource, FetchOutcome};
pub use service::{DetectionService, HealthStatus, HttpDetectionService, UploadReceipt};
pub use upload::{validate_upload, UploadFile, MAX_UPLOAD_BYTES};
