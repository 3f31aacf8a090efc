use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Result, ViewerError};
use crate::geometry::Size;
use crate::transform::ZoomLimits;

/// Viewer settings. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Base URL of the detection service.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f64,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,
    #[serde(default)]
    pub zoom: ZoomLimits,
    /// TrueType/OpenType font for label text on raster output.
    #[serde(default)]
    pub font_path: Option<PathBuf>,
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_viewport_width() -> f64 {
    800.0
}

fn default_viewport_height() -> f64 {
    600.0
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            zoom: ZoomLimits::default(),
            font_path: None,
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ViewerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading viewer config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Apply command-line or environment overrides on top of a loaded config.
    /// A blank URL is ignored.
    pub fn with_overrides(mut self, api_base_url: Option<String>, font_path: Option<PathBuf>) -> Self {
        if let Some(url) = api_base_url.filter(|url| !url.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(path) = font_path {
            self.font_path = Some(path);
        }
        self
    }

    pub fn viewport(&self) -> Size {
        Size::new(self.viewport_width, self.viewport_height)
    }

    pub fn validate(&self) -> Result<()> {
        if self.viewport().is_empty() {
            return Err(ViewerError::InvalidConfig(format!(
                "viewport must be positive, got {}x{}",
                self.viewport_width, self.viewport_height
            )));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(ViewerError::InvalidConfig("api_base_url is empty".to_string()));
        }
        self.zoom.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = ViewerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.api_base_url, "http://127.0.0.1:8000");
        assert_eq!(config.viewport(), Size::new(800.0, 600.0));
        assert_eq!(config.zoom, ZoomLimits::default());
    }

    #[test]
    fn test_partial_zoom_section() {
        let config = ViewerConfig::from_json_str(r#"{"zoom": {"max": 8.0}, "viewport_width": 1024}"#).unwrap();
        assert_eq!(config.zoom.max, 8.0);
        assert_eq!(config.zoom.min, 0.1);
        assert_eq!(config.viewport_width, 1024.0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(matches!(
            ViewerConfig::from_json_str(r#"{"viewport_width": 0}"#),
            Err(ViewerError::InvalidConfig(_))
        ));
        assert!(matches!(
            ViewerConfig::from_json_str(r#"{"zoom": {"step": 0.5}}"#),
            Err(ViewerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let config = ViewerConfig::default().with_overrides(
            Some("http://detector:9000".to_string()),
            Some(PathBuf::from("/fonts/Inter.ttf")),
        );
        assert_eq!(config.api_base_url, "http://detector:9000");
        assert_eq!(config.font_path, Some(PathBuf::from("/fonts/Inter.ttf")));

        let untouched = ViewerConfig::default().with_overrides(Some("  ".to_string()), None);
        assert_eq!(untouched, ViewerConfig::default());
    }
}
