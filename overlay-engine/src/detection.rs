use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{Result, ViewerError};

/// A labeled bounding box produced by the detection service.
///
/// `bbox` is `[x, y, width, height]` in source-image pixels. It is kept as the
/// raw JSON value so that exports reproduce the service payload verbatim,
/// including boxes that cannot be drawn; use [`Detection::bbox`] to get a
/// validated box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f64,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Value>,
}

/// A present field, even `null`, is kept as written.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Validated `[x, y, width, height]` in image space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f64, bbox: [f64; 4]) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox: Some(Value::from(bbox.to_vec())),
        }
    }

    /// The box, or `None` when it is missing, is not a four-element array or
    /// holds a coordinate that is not a finite number. Such detections stay
    /// in the list and are only skipped when painting.
    pub fn bbox(&self) -> Option<BBox> {
        let items = self.bbox.as_ref()?.as_array()?;
        let coords: Vec<f64> = items
            .iter()
            .map(|v| v.as_f64().filter(|n| n.is_finite()))
            .collect::<Option<_>>()?;
        match coords.as_slice() {
            &[x, y, width, height] => Some(BBox::new(x, y, width, height)),
            _ => None,
        }
    }

    /// Case-insensitive label comparison.
    pub fn matches_label(&self, label: &str) -> bool {
        self.label.to_lowercase() == label.to_lowercase()
    }

    /// Confidence as a whole percentage, rounded half away from zero.
    pub fn confidence_percent(&self) -> i64 {
        (self.confidence * 100.0).round() as i64
    }

    /// Text shown in the label chip, e.g. `"door 89%"`.
    pub fn chip_text(&self) -> String {
        format!("{} {}%", self.label, self.confidence_percent())
    }
}

/// Restrict `detections` to those matching `selected_label`.
///
/// `None` keeps everything. The input is never modified.
pub fn filter_by_label<'a>(detections: &'a [Detection], selected_label: Option<&str>) -> Vec<&'a Detection> {
    match selected_label {
        Some(label) => detections.iter().filter(|d| d.matches_label(label)).collect(),
        None => detections.iter().collect(),
    }
}

/// Parse a detection payload.
///
/// Accepts either a bare array or a service response object carrying a
/// `detections` field (a missing field reads as an empty list). Elements that
/// are not detection objects are dropped with a warning so one bad entry does
/// not discard the rest.
pub fn parse_detections(json: &str) -> Result<Vec<Detection>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    detections_from_value(value)
}

pub fn detections_from_value(value: serde_json::Value) -> Result<Vec<Detection>> {
    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("detections") {
            Some(serde_json::Value::Array(items)) => items,
            Some(serde_json::Value::Null) | None => Vec::new(),
            Some(_) => return Err(ViewerError::UnexpectedPayload),
        },
        _ => return Err(ViewerError::UnexpectedPayload),
    };

    let total = items.len();
    let detections: Vec<Detection> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<Detection>(item) {
            Ok(detection) => Some(detection),
            Err(e) => {
                warn!("Skipping malformed detection #{}: {}", index, e);
                None
            }
        })
        .collect();

    if detections.len() < total {
        warn!("Kept {} of {} detections", detections.len(), total);
    }

    Ok(detections)
}
