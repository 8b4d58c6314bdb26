//! Command-line interface for ocrflow.
//!
//! Provides commands for watching the input directory, processing a single
//! image, and showing the resolved configuration.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{GeminiGenerator, OcrSpaceExtractor};
use crate::config::{self, mask_secret, ResolvedConfig};
use crate::core::Pipeline;
use crate::domain::ArtifactWriter;

pub mod watch;

/// ocrflow - turn screenshots into LLM answers
#[derive(Parser, Debug)]
#[command(name = "ocrflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to .ocrflow/config.yaml in this or a parent directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch the input directory and process new images
    Watch {
        /// Scan once and exit
        #[arg(long)]
        once: bool,

        /// Directory to watch
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory for generated artifacts
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Delay between scans in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Also rescan as soon as the filesystem reports a change
        #[arg(long)]
        events: bool,
    },

    /// Run the pipeline on a single image
    Process {
        /// Image file to process
        image: PathBuf,

        /// Directory for the generated artifact
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show resolved configuration
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let mut config = config::load_config(self.config.as_deref())?;

        match self.command {
            Commands::Watch {
                once,
                input,
                output,
                interval_ms,
                events,
            } => {
                if let Some(input) = input {
                    config.input_dir = input;
                }
                if let Some(output) = output {
                    config.output_dir = output;
                }
                if let Some(ms) = interval_ms {
                    config.poll_interval_ms = ms;
                }
                if events {
                    config.watch_events = true;
                }
                watch::execute_watch(&config, once).await
            }
            Commands::Process { image, output } => {
                if let Some(output) = output {
                    config.output_dir = output;
                }
                watch::execute_process(&config, &image).await
            }
            Commands::Config => show_config(&config),
        }
    }
}

/// Create the output directory if it does not exist yet
pub(crate) fn ensure_output_dir(config: &ResolvedConfig) -> Result<()> {
    if !config.output_dir.exists() {
        std::fs::create_dir_all(&config.output_dir).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                config.output_dir.display()
            )
        })?;
        tracing::info!("Created output directory {}", config.output_dir.display());
    }
    Ok(())
}

/// Wire the HTTP adapters and artifact writer into a pipeline
pub(crate) fn build_pipeline(config: &ResolvedConfig) -> Result<Pipeline> {
    let extractor = Arc::new(OcrSpaceExtractor::new(config.ocr_config()?));
    let generator = Arc::new(GeminiGenerator::new(config.gemini_config()?));

    Ok(Pipeline::new(extractor, generator, ArtifactWriter::new(&config.output_dir))
        .with_naming(config.artifact_naming)
        .with_prompt_template(config.prompt_template.clone()))
}

fn show_config(config: &ResolvedConfig) -> Result<()> {
    println!("ocrflow configuration");
    println!("=====================");
    println!();
    match &config.config_file {
        Some(path) => println!("Config file:      {}", path.display()),
        None => println!("Config file:      (none, using env/defaults)"),
    }
    println!("Input dir:        {}", config.input_dir.display());
    println!("Output dir:       {}", config.output_dir.display());
    println!("Poll interval:    {} ms", config.poll_interval_ms);
    println!("FS events:        {}", config.watch_events);
    println!("Request timeout:  {} s", config.request_timeout_secs);
    println!("Ignore case:      {}", config.case_insensitive_extensions);
    println!("Artifact naming:  {:?}", config.artifact_naming);
    println!();
    println!("OCR endpoint:     {}", config.ocr_endpoint);
    println!("OCR language:     {}", config.ocr_language);
    println!("OCR API key:      {}", mask_secret(config.ocr_api_key.as_deref()));
    println!();
    println!("Model:            {}", config.model);
    println!("Model endpoint:   {}", config.generation_endpoint);
    println!(
        "Gemini API key:   {}",
        mask_secret(config.gemini_api_key.as_deref())
    );

    if !config.input_dir.is_dir() {
        println!();
        println!("⚠️  Input directory does not exist.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watch_flags() {
        let cli = Cli::parse_from([
            "ocrflow",
            "watch",
            "--input",
            "/shots",
            "-o",
            "/out",
            "--interval-ms",
            "250",
            "--once",
        ]);

        match cli.command {
            Commands::Watch {
                once,
                input,
                output,
                interval_ms,
                events,
            } => {
                assert!(once);
                assert!(!events);
                assert_eq!(input, Some(PathBuf::from("/shots")));
                assert_eq!(output, Some(PathBuf::from("/out")));
                assert_eq!(interval_ms, Some(250));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_process_with_global_config() {
        let cli = Cli::parse_from(["ocrflow", "process", "shot.png", "--config", "my.yaml"]);
        assert_eq!(cli.config, Some(PathBuf::from("my.yaml")));
        assert!(matches!(cli.command, Commands::Process { .. }));
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
