//! Fake collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ocrflow::{
    ArtifactWriter, ExtractionError, GenerationError, Pipeline, ResponseGenerator, TextExtractor,
};

pub const TEMPLATE: &str = "Explain:\n";

/// Returns `text of <file name>`, or no results for names in `failing`
#[derive(Default)]
pub struct ScriptedExtractor {
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
    /// Directory to delete on the first call
    remove_on_call: Option<PathBuf>,
    /// Read the image from disk like a real extractor would
    read_files: bool,
}

impl ScriptedExtractor {
    pub fn failing_on(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn removing_dir(dir: &Path) -> Self {
        Self {
            remove_on_call: Some(dir.to_path_buf()),
            ..Default::default()
        }
    }

    pub fn reading_files() -> Self {
        Self {
            read_files: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextExtractor for ScriptedExtractor {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn extract(&self, image_path: &Path) -> Result<String, ExtractionError> {
        let name = image_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        self.calls.lock().unwrap().push(name.clone());

        if let Some(dir) = &self.remove_on_call {
            let _ = std::fs::remove_dir_all(dir);
        }

        if self.read_files {
            std::fs::read(image_path).map_err(|source| ExtractionError::Read {
                path: image_path.to_path_buf(),
                source,
            })?;
        }

        if self.failing.contains(&name) {
            return Err(ExtractionError::NoResults);
        }
        Ok(format!("text of {}", name))
    }
}

/// Echoes the prompt back; fails for prompts containing any `failing` marker
#[derive(Default)]
pub struct RecordingGenerator {
    failing: Vec<String>,
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn failing_on(markers: &[&str]) -> Self {
        Self {
            failing: markers.iter().map(|m| m.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResponseGenerator for RecordingGenerator {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if self.failing.iter().any(|m| prompt.contains(m.as_str())) {
            return Err(GenerationError::NoCandidates);
        }
        Ok(format!("response for: {}", prompt))
    }
}

pub fn pipeline(
    extractor: &Arc<ScriptedExtractor>,
    generator: &Arc<RecordingGenerator>,
    output_dir: &Path,
) -> Pipeline {
    Pipeline::new(
        extractor.clone(),
        generator.clone(),
        ArtifactWriter::new(output_dir),
    )
    .with_prompt_template(TEMPLATE)
}
