use thiserror::Error;

/// Errors talking to the detection service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// `/results/{id}` answered 404: detection has not run yet.
    #[error("no results computed yet for blueprint {0}")]
    NotComputed(String),

    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error("invalid service URL {0}")]
    InvalidUrl(String),
}

impl ServiceError {
    pub fn is_not_computed(&self) -> bool {
        matches!(self, ServiceError::NotComputed(_))
    }

    /// Text to show next to a retry button.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Status { message, .. } if !message.is_empty() => message.clone(),
            ServiceError::Status { status, .. } => format!("Request failed with status {}", status),
            ServiceError::Transport(_) => "Could not reach the detection service".to_string(),
            ServiceError::NotComputed(_) => "Detection has not run for this blueprint".to_string(),
            ServiceError::Decode(_) => "The detection service sent an unreadable response".to_string(),
            ServiceError::InvalidUpload(reason) => reason.clone(),
            ServiceError::InvalidUrl(url) => format!("The detection service address {} is not valid", url),
        }
    }
}

impl From<overlay_engine::ViewerError> for ServiceError {
    fn from(e: overlay_engine::ViewerError) -> Self {
        ServiceError::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Pull a human-readable message out of an error body.
///
/// Looks for `detail`, `message` or `error` string fields, and falls back
/// to the trimmed body text.
pub fn error_message(body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "message", "error"] {
            if let Some(serde_json::Value::String(text)) = map.get(key) {
                return text.clone();
            }
        }
    }
    body.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_detail() {
        assert_eq!(
            error_message(r#"{"detail": "Blueprint not found: abc", "message": "other"}"#),
            "Blueprint not found: abc"
        );
        assert_eq!(error_message(r#"{"message": "Detection failed"}"#), "Detection failed");
        assert_eq!(error_message(r#"{"error": "boom", "detail": null}"#), "boom");
        assert_eq!(error_message("  Internal Server Error\n"), "Internal Server Error");
    }

    #[test]
    fn test_user_message() {
        let err = ServiceError::Status {
            status: 500,
            message: "Failed to load results: disk full".to_string(),
        };
        assert_eq!(err.user_message(), "Failed to load results: disk full");

        let bare = ServiceError::Status {
            status: 502,
            message: String::new(),
        };
        assert_eq!(bare.user_message(), "Request failed with status 502");
        assert!(ServiceError::NotComputed("x".into()).is_not_computed());
        assert!(!bare.is_not_computed());
    }
}
