//! Core processing logic.
//!
//! This module contains:
//! - FileGate: dedup of dispatched files
//! - Pipeline: extract → generate → persist for one file

pub mod gate;
pub mod pipeline;

pub use gate::FileGate;
pub use pipeline::{build_prompt, Pipeline, PipelineError, DEFAULT_PROMPT_TEMPLATE};
