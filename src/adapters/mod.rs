//! Adapter interfaces for the external OCR and text-generation services.
//!
//! The pipeline only sees the two traits below; the concrete HTTP clients
//! live in `ocr` and `gemini`.

pub mod codec;
pub mod gemini;
pub mod ocr;

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::{GeminiConfig, GeminiGenerator};
pub use ocr::{OcrSpaceConfig, OcrSpaceExtractor};

/// Errors produced while turning an image into text
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Failed to read image {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("OCR request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("OCR request timed out after {0:?}")]
    Timeout(Duration),

    #[error("OCR service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse OCR response: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("OCR service reported an error: {0}")]
    Provider(String),

    #[error("No text found in image")]
    NoResults,
}

/// Errors produced while generating a response from a prompt
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Generation request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Generation request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Generation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse generation response: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("No response candidates returned")]
    NoCandidates,
}

/// Recognizes text in an image
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// Return the text of the first recognized result
    async fn extract(&self, image_path: &Path) -> Result<String, ExtractionError>;
}

/// Produces a text response for a prompt
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// Return the first candidate's first content part
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Shorten a response body for inclusion in an error message
pub(crate) fn body_snippet(body: &str) -> String {
    const MAX_CHARS: usize = 200;
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_CHARS {
        return trimmed.to_string();
    }
    let mut snippet: String = trimmed.chars().take(MAX_CHARS).collect();
    snippet.push('…');
    snippet
}
