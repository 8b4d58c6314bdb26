//! OCR.space adapter.
//!
//! Sends the image as a base64 data URI in a form-encoded POST and reads
//! back the first `ParsedText` entry.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::timeout;

use super::codec::{encode_data_uri, mime_for_path};
use super::{body_snippet, ExtractionError, TextExtractor};

/// Default OCR.space parse endpoint
pub const DEFAULT_OCR_ENDPOINT: &str = "https://api.ocr.space/parse/image";

/// Default recognition language hint
pub const DEFAULT_LANGUAGE: &str = "rus";

/// Settings for the OCR.space client
#[derive(Debug, Clone)]
pub struct OcrSpaceConfig {
    pub api_key: String,
    pub endpoint: String,
    pub language: String,
    pub timeout: Duration,
}

impl OcrSpaceConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_OCR_ENDPOINT.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrResponse {
    #[serde(default)]
    parsed_results: Option<Vec<ParsedResult>>,
    #[serde(default)]
    is_errored_on_processing: bool,
    #[serde(default)]
    error_message: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: String,
}

/// OCR.space HTTP client
pub struct OcrSpaceExtractor {
    config: OcrSpaceConfig,
    client: reqwest::Client,
}

impl OcrSpaceExtractor {
    pub fn new(config: OcrSpaceConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Form body for a parse request. Overlay and searchable-PDF output are off.
    fn form_fields(&self, data_uri: String) -> Vec<(&'static str, String)> {
        vec![
            ("language", self.config.language.clone()),
            ("isOverlayRequired", "false".to_string()),
            ("base64Image", data_uri),
            ("iscreatesearchablepdf", "false".to_string()),
            ("issearchablepdfhidetextlayer", "false".to_string()),
        ]
    }
}

#[async_trait]
impl TextExtractor for OcrSpaceExtractor {
    fn name(&self) -> &str {
        "ocr.space"
    }

    async fn extract(&self, image_path: &Path) -> Result<String, ExtractionError> {
        let bytes = tokio::fs::read(image_path)
            .await
            .map_err(|source| ExtractionError::Read {
                path: image_path.to_path_buf(),
                source,
            })?;

        let data_uri = encode_data_uri(&bytes, mime_for_path(image_path));

        let request = self
            .client
            .post(&self.config.endpoint)
            .header("apikey", &self.config.api_key)
            .form(&self.form_fields(data_uri));

        let (status, body) = timeout(self.config.timeout, async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        })
        .await
        .map_err(|_| ExtractionError::Timeout(self.config.timeout))?
        .map_err(ExtractionError::Transport)?;

        if !status.is_success() {
            return Err(ExtractionError::Status {
                status: status.as_u16(),
                body: body_snippet(&body),
            });
        }

        parse_ocr_response(&body)
    }
}

/// Pull the first parsed text out of an OCR.space response body
pub(crate) fn parse_ocr_response(body: &str) -> Result<String, ExtractionError> {
    let response: OcrResponse = serde_json::from_str(body).map_err(ExtractionError::Parse)?;

    if let Some(first) = response.parsed_results.and_then(|r| r.into_iter().next()) {
        return Ok(first.parsed_text);
    }

    if response.is_errored_on_processing {
        let message = match response.error_message {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            _ => "unknown error".to_string(),
        };
        return Err(ExtractionError::Provider(message));
    }

    Err(ExtractionError::NoResults)
}
