//! ocrflow - screenshot to LLM answer pipeline
//!
//! Watches a directory for new images, extracts their text with OCR.space,
//! asks Gemini about the text and saves the answer as Markdown.
//!
//! # Architecture
//!
//! - A polling loop lists the input directory every interval
//! - Each new `.png` / `.jpg` / `.jpeg` name is dispatched exactly once
//!   per process (dedup by file name, in memory only)
//! - Each dispatched file runs extract → generate → persist; a failure is
//!   logged and the loop moves on
//! - Only a failure to list the input directory stops the loop
//!
//! # Modules
//!
//! - `adapters`: OCR and generation clients (OCR.space, Gemini)
//! - `core`: Dedup gate and per-file pipeline
//! - `domain`: File identity and artifacts
//! - `ingest`: The watch loop
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Watch ./input, write answers to ./output/result.md
//! OCR_API_KEY=... GEMINI_API_KEY=... ocrflow watch
//!
//! # One image
//! ocrflow process screenshot.png
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod ingest;

// Re-export main types at crate root for convenience
pub use adapters::{ExtractionError, GenerationError, ResponseGenerator, TextExtractor};
pub use crate::core::{FileGate, Pipeline, PipelineError};
pub use domain::{ArtifactNaming, ArtifactWriter, FileIdentity, PersistenceError};
pub use ingest::{IngestionLoop, ListedEntry, ScanResult, WatchError, WatcherConfig};
