//! Screenshot ingestion.
//!
//! ```text
//! input dir → list → FileGate → Pipeline (OCR → LLM → artifact) → output dir
//!                 ↑
//!          poll interval / fs events
//! ```
//!
//! Dedup state lives only in memory: restarting the watcher reprocesses
//! every image still present in the input directory.

pub mod watcher;

pub use watcher::{
    has_image_suffix, IngestionLoop, ListedEntry, LoopSummary, ScanResult, WatchError,
    WatcherConfig, IMAGE_SUFFIXES,
};
