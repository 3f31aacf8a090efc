use image::ImageFormat;

use crate::error::{Result, ServiceError};

/// Largest blueprint the service accepts.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// A blueprint image checked and ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

/// Check that `bytes` are a PNG or JPEG of at most 10MB.
///
/// The format is sniffed from the content, so a mislabelled extension does
/// not matter. The file name is kept for the multipart form.
pub fn validate_upload(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<UploadFile> {
    let file_name = file_name.into();
    if bytes.is_empty() {
        return Err(ServiceError::InvalidUpload(format!("{} is empty", file_name)));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ServiceError::InvalidUpload(format!(
            "{} is {:.1}MB, the limit is 10MB",
            file_name,
            bytes.len() as f64 / (1024.0 * 1024.0)
        )));
    }

    let mime = match image::guess_format(&bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        _ => {
            return Err(ServiceError::InvalidUpload(format!(
                "{} is not a PNG or JPEG image",
                file_name
            )))
        }
    };

    Ok(UploadFile { file_name, bytes, mime })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
    const JPEG_MAGIC: &[u8] = &[0xff, 0xd8, 0xff, 0xe0];

    #[test]
    fn test_accepts_png_and_jpeg() {
        let png = validate_upload("plan.png", PNG_MAGIC.to_vec()).unwrap();
        assert_eq!(png.mime, "image/png");

        let mut jpeg_bytes = JPEG_MAGIC.to_vec();
        jpeg_bytes.extend_from_slice(&[0; 16]);
        let jpeg = validate_upload("plan.bin", jpeg_bytes).unwrap();
        assert_eq!(jpeg.mime, "image/jpeg");
        assert_eq!(jpeg.file_name, "plan.bin");
    }

    #[test]
    fn test_rejects_other_content() {
        assert!(matches!(
            validate_upload("plan.png", b"GIF89a......".to_vec()),
            Err(ServiceError::InvalidUpload(_))
        ));
        assert!(matches!(
            validate_upload("plan.png", Vec::new()),
            Err(ServiceError::InvalidUpload(_))
        ));
    }

    #[test]
    fn test_rejects_oversized() {
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.resize(MAX_UPLOAD_BYTES + 1, 0);
        let err = validate_upload("huge.png", bytes).unwrap_err();
        assert!(err.to_string().contains("10MB"));
    }
}
