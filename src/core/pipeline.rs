//! Per-file pipeline: extract text, generate a response, persist it.
//!
//! Each stage runs once. The first failure ends processing of that file;
//! nothing is retried and the caller keeps going with the next file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::adapters::{ExtractionError, GenerationError, ResponseGenerator, TextExtractor};
use crate::domain::{ArtifactNaming, ArtifactWriter, FileIdentity, PersistenceError};

/// Instruction prefixed to the extracted text
pub const DEFAULT_PROMPT_TEMPLATE: &str =
    "Very briefly explain the idea behind the solution to this problem and write the code in Go:\n";

/// A failed pipeline stage
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("OCR failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Saving failed: {0}")]
    Persistence(#[from] PersistenceError),
}

impl PipelineError {
    /// Stage that failed
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Extraction(_) => "extract",
            Self::Generation(_) => "generate",
            Self::Persistence(_) => "persist",
        }
    }
}

/// Wrap extracted text in the instruction template
pub fn build_prompt(template: &str, extracted: &str) -> String {
    format!("{}{}", template, extracted)
}

/// The three-stage per-file sequence
pub struct Pipeline {
    extractor: Arc<dyn TextExtractor>,
    generator: Arc<dyn ResponseGenerator>,
    writer: ArtifactWriter,
    naming: ArtifactNaming,
    prompt_template: String,
}

impl Pipeline {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        generator: Arc<dyn ResponseGenerator>,
        writer: ArtifactWriter,
    ) -> Self {
        Self {
            extractor,
            generator,
            writer,
            naming: ArtifactNaming::default(),
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }

    pub fn with_naming(mut self, naming: ArtifactNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = template.into();
        self
    }

    /// Run all stages for one image and return the artifact path
    #[instrument(skip(self, image_path), fields(file = %image_path.display()))]
    pub async fn execute(&self, image_path: &Path) -> Result<PathBuf, PipelineError> {
        let identity = FileIdentity::from_path(image_path)
            .unwrap_or_else(|| FileIdentity::new(image_path.to_string_lossy().into_owned()));

        let text = self.extractor.extract(image_path).await?;

        let prompt = build_prompt(&self.prompt_template, &text);
        let response = self.generator.generate(&prompt).await?;

        let name = self.naming.artifact_name(&identity);
        let path = self.writer.write(&name, &response).await?;

        Ok(path)
    }

    /// Adapter (or the writer) responsible for a failure
    pub fn failed_component(&self, err: &PipelineError) -> &str {
        match err {
            PipelineError::Extraction(_) => self.extractor.name(),
            PipelineError::Generation(_) => self.generator.name(),
            PipelineError::Persistence(_) => "artifact writer",
        }
    }

    /// Run all stages and log the outcome. Never fails.
    pub async fn process(&self, image_path: &Path) {
        info!("Processing file: {}", image_path.display());

        if let Err(e) = self.execute(image_path).await {
            warn!(
                stage = e.stage(),
                component = self.failed_component(&e),
                "{} ({})",
                e,
                image_path.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FixedExtractor(Option<&'static str>);

    #[async_trait]
    impl TextExtractor for FixedExtractor {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn extract(&self, _image_path: &Path) -> Result<String, ExtractionError> {
            self.0
                .map(|s| s.to_string())
                .ok_or(ExtractionError::NoResults)
        }
    }

    #[derive(Default)]
    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ResponseGenerator for RecordingGenerator {
        fn name(&self) -> &str {
            "recording"
        }

        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(format!("answer to: {}", prompt))
        }
    }

    #[test]
    fn test_build_prompt() {
        assert_eq!(build_prompt("Explain:\n", "2+2"), "Explain:\n2+2");
        assert_eq!(build_prompt("Explain:\n", ""), "Explain:\n");
    }

    #[tokio::test]
    async fn test_execute_writes_artifact() {
        let temp = TempDir::new().unwrap();
        let generator = Arc::new(RecordingGenerator::default());
        let pipeline = Pipeline::new(
            Arc::new(FixedExtractor(Some("fizzbuzz"))),
            generator.clone(),
            ArtifactWriter::new(temp.path()),
        )
        .with_prompt_template("Q: ");

        let path = pipeline.execute(Path::new("shot.png")).await.unwrap();

        assert_eq!(path, temp.path().join("result.md"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "answer to: Q: fizzbuzz");
        assert_eq!(*generator.prompts.lock().unwrap(), vec!["Q: fizzbuzz".to_string()]);
    }

    #[tokio::test]
    async fn test_extraction_failure_stops_pipeline() {
        let temp = TempDir::new().unwrap();
        let generator = Arc::new(RecordingGenerator::default());
        let pipeline = Pipeline::new(
            Arc::new(FixedExtractor(None)),
            generator.clone(),
            ArtifactWriter::new(temp.path()),
        );

        let err = pipeline.execute(Path::new("c.jpg")).await.unwrap_err();

        assert_eq!(err.stage(), "extract");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_persistence_failure_is_reported() {
        let temp = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            Arc::new(FixedExtractor(Some("text"))),
            Arc::new(RecordingGenerator::default()),
            ArtifactWriter::new(temp.path().join("gone")),
        );

        let err = pipeline.execute(Path::new("a.png")).await.unwrap_err();
        assert_eq!(err.stage(), "persist");
    }

    #[tokio::test]
    async fn test_per_source_naming() {
        let temp = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            Arc::new(FixedExtractor(Some("text"))),
            Arc::new(RecordingGenerator::default()),
            ArtifactWriter::new(temp.path()),
        )
        .with_naming(ArtifactNaming::PerSource);

        let path = pipeline.execute(Path::new("/in/task-3.jpeg")).await.unwrap();
        assert_eq!(path, temp.path().join("task-3.md"));
    }

    #[tokio::test]
    async fn test_failed_component_names_adapter() {
        let temp = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            Arc::new(FixedExtractor(None)),
            Arc::new(RecordingGenerator::default()),
            ArtifactWriter::new(temp.path().join("gone")),
        );

        let err = pipeline.execute(Path::new("c.jpg")).await.unwrap_err();
        assert_eq!(pipeline.failed_component(&err), "fixed");

        let err = PipelineError::Generation(GenerationError::NoCandidates);
        assert_eq!(pipeline.failed_component(&err), "recording");

        let writing = Pipeline::new(
            Arc::new(FixedExtractor(Some("text"))),
            Arc::new(RecordingGenerator::default()),
            ArtifactWriter::new(temp.path().join("gone")),
        );
        let err = writing.execute(Path::new("a.png")).await.unwrap_err();
        assert_eq!(writing.failed_component(&err), "artifact writer");
    }

    #[tokio::test]
    async fn test_process_swallows_errors() {
        let temp = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            Arc::new(FixedExtractor(None)),
            Arc::new(RecordingGenerator::default()),
            ArtifactWriter::new(temp.path()),
        );

        // Returns unit even though extraction fails
        pipeline.process(Path::new("bad.png")).await;
    }
}
