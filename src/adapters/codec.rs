//! Image payload encoding for the OCR request.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};

/// MIME type for an image path, based on its extension.
///
/// Anything that is not recognizably JPEG is sent as PNG.
pub fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "image/png",
    }
}

/// Encode raw bytes as a `data:<mime>;base64,<payload>` URI
pub fn encode_data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}
