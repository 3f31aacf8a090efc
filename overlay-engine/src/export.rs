use crate::detection::Detection;
use crate::error::Result;

/// Serialise detections exactly as received, two-space indented.
pub fn export_json(detections: &[Detection]) -> Result<String> {
    Ok(serde_json::to_string_pretty(detections)?)
}

/// Download name for an export, `blueprint-<id>.json`.
pub fn export_file_name(blueprint_id: Option<&str>) -> String {
    format!("blueprint-{}.json", blueprint_id.filter(|id| !id.is_empty()).unwrap_or("detections"))
}

pub fn export_summary(count: usize) -> String {
    match count {
        0 => "No detections available".to_string(),
        1 => "1 detection ready to export".to_string(),
        n => format!("{} detections ready to export", n),
    }
}
