use detection_client::{validate_upload, DetectionService, ServiceError, UploadReceipt};
use tracing::info;
use wasm_bindgen_futures::JsFuture;

/// Check the file locally, then send it.
pub async fn submit_upload<S: DetectionService>(
    service: &S,
    file_name: String,
    bytes: Vec<u8>,
) -> Result<UploadReceipt, ServiceError> {
    let upload = validate_upload(file_name, bytes)?;
    let receipt = service.upload(upload).await?;
    info!("Blueprint uploaded as {}", receipt.id);
    Ok(receipt)
}

/// Read a picked file and upload it. Errors come back ready to display.
pub async fn upload_picked_file<S: DetectionService>(service: &S, file: web_sys::File) -> Result<String, String> {
    let name = file.name();
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|_| format!("Could not read {}", name))?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();

    submit_upload(service, name, bytes)
        .await
        .map(|receipt| receipt.id)
        .map_err(|e| e.user_message())
}
