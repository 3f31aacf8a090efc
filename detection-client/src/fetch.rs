use overlay_engine::Detection;
use tracing::info;

use crate::error::Result;
use crate::service::DetectionService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    /// Stored results from an earlier detection run.
    Cached,
    /// Detection was run because no results were stored.
    Computed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub detections: Vec<Detection>,
    pub source: DetectionSource,
}

/// Load detections for `id`, running detection when none are stored.
///
/// Only a 404 from the results endpoint falls through to detection. Any
/// other failure is returned as is; retrying is up to the caller.
pub async fn fetch_detections<S: DetectionService>(service: &S, id: &str) -> Result<FetchOutcome> {
    match service.results(id).await {
        Ok(detections) => Ok(FetchOutcome {
            detections,
            source: DetectionSource::Cached,
        }),
        Err(e) if e.is_not_computed() => {
            info!("No results for {}, running detection", id);
            let detections = service.detect(id).await?;
            Ok(FetchOutcome {
                detections,
                source: DetectionSource::Computed,
            })
        }
        Err(e) => Err(e),
    }
}
