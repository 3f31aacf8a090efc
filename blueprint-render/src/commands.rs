use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use detection_client::{fetch_detections, validate_upload, DetectionService, HttpDetectionService};
use overlay_engine::{
    export_file_name, export_json, export_summary, parse_detections, Detection, DetectionStats, ViewerConfig,
};
use tracing::{info, warn};

use crate::cli::{DetectionSourceArgs, ExportArgs, StatsArgs};

/// Config file (or defaults), then flag/environment overrides.
pub fn load_config(path: Option<&Path>, api_url: Option<String>, font: Option<PathBuf>) -> Result<ViewerConfig> {
    let config = match path {
        Some(path) => ViewerConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    let config = config.with_overrides(api_url, font);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

pub fn service(config: &ViewerConfig) -> Result<HttpDetectionService> {
    HttpDetectionService::from_config(config).context("failed to build HTTP client")
}

/// Read detections from a file, or fetch them for a blueprint id.
pub async fn load_detections(source: &DetectionSourceArgs, config: &ViewerConfig) -> Result<Vec<Detection>> {
    if let Some(path) = &source.detections {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let detections =
            parse_detections(&text).with_context(|| format!("{} is not a detection payload", path.display()))?;
        info!("Read {} detections from {}", detections.len(), path.display());
        return Ok(detections);
    }

    if let Some(id) = &source.blueprint {
        let service = service(config)?;
        let outcome = fetch_detections(&service, id)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e.user_message()))
            .with_context(|| format!("failed to fetch detections for {}", id))?;
        info!(
            "Fetched {} detections for {} ({:?})",
            outcome.detections.len(),
            id,
            outcome.source
        );
        return Ok(outcome.detections);
    }

    bail!("pass --detections FILE or --blueprint ID")
}

pub fn format_stats(stats: &DetectionStats) -> String {
    let mut out = format!(
        "Total detections: {}\nAverage confidence: {}\n",
        stats.total,
        stats.avg_confidence_display()
    );
    for share in stats.shares() {
        out.push_str(&format!(
            "  {:<8} {:>4}  {:>5.1}%  {}\n",
            share.label,
            share.count,
            share.percentage,
            share.color.to_hex()
        ));
    }
    out
}

pub async fn stats(args: StatsArgs, config: &ViewerConfig) -> Result<()> {
    let detections = load_detections(&args.source, config).await?;
    let stats = DetectionStats::from_detections(&detections);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print!("{}", format_stats(&stats));
    }
    Ok(())
}

pub async fn export(args: ExportArgs, config: &ViewerConfig) -> Result<()> {
    let detections = load_detections(&args.source, config).await?;
    let json = export_json(&detections).context("failed to serialise detections")?;

    let Some(output) = args.output else {
        println!("{}", json);
        return Ok(());
    };

    let path = if output.is_dir() {
        output.join(export_file_name(args.source.blueprint.as_deref()))
    } else {
        output
    };
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    eprintln!("{} to {}", export_summary(detections.len()), path.display());
    Ok(())
}

pub async fn upload(file: &Path, detect: bool, config: &ViewerConfig) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "blueprint".to_string());
    let upload = validate_upload(name, bytes)?;

    let service = service(config)?;
    let receipt = service
        .upload(upload)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e.user_message()))
        .context("upload failed")?;
    println!("{}", receipt.id);

    if detect {
        match service.detect(&receipt.id).await {
            Ok(detections) => eprintln!("Detection found {} elements", detections.len()),
            Err(e) => warn!("Detection for {} failed: {}", receipt.id, e.user_message()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_stats() {
        let detections = vec![
            Detection::new("wall", 0.95, [0.0, 0.0, 1.0, 1.0]),
            Detection::new("door", 0.85, [0.0, 0.0, 1.0, 1.0]),
        ];
        let text = format_stats(&DetectionStats::from_detections(&detections));
        assert!(text.starts_with("Total detections: 2\nAverage confidence: 90.0%\n"));
        assert!(text.contains("door"));
        assert!(text.contains("#ef4444"));
    }

    #[test]
    fn test_load_config_applies_overrides() {
        let config = load_config(None, Some("http://detector:9000".into()), None).unwrap();
        assert_eq!(config.api_base_url, "http://detector:9000");
        assert_eq!(config.viewport_width, 800.0);
    }
}
