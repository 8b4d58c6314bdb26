//! Configuration for ocrflow.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags (applied by the CLI on top of the resolved config)
//! 2. Environment variables (OCRFLOW_INPUT_DIR, OCRFLOW_OUTPUT_DIR,
//!    OCR_API_KEY, GEMINI_API_KEY), including a `.env` file loaded at startup
//! 3. Config file (`--config <path>`, else `.ocrflow/config.yaml`)
//! 4. Defaults (`./input`, `./output`)
//!
//! Config file discovery:
//! - Searches current directory and parents for .ocrflow/config.yaml
//! - Falls back to `<user config dir>/ocrflow/config.yaml`
//! - Relative paths in the file resolve against the directory holding `.ocrflow/`

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::gemini::{DEFAULT_GENERATION_ENDPOINT, DEFAULT_MODEL};
use crate::adapters::ocr::{DEFAULT_LANGUAGE, DEFAULT_OCR_ENDPOINT};
use crate::adapters::{GeminiConfig, OcrSpaceConfig};
use crate::core::DEFAULT_PROMPT_TEMPLATE;
use crate::domain::ArtifactNaming;
use crate::ingest::WatcherConfig;

pub const ENV_INPUT_DIR: &str = "OCRFLOW_INPUT_DIR";
pub const ENV_OUTPUT_DIR: &str = "OCRFLOW_OUTPUT_DIR";
pub const ENV_OCR_API_KEY: &str = "OCR_API_KEY";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub ocr: OcrFileConfig,
    #[serde(default)]
    pub generation: GenerationFileConfig,
    #[serde(default)]
    pub watch: WatchFileConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Directory to watch for images
    pub input: Option<String>,
    /// Directory for generated artifacts
    pub output: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrFileConfig {
    pub language: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationFileConfig {
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub prompt_template: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchFileConfig {
    pub interval_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub case_insensitive_extensions: Option<bool>,
    pub watch_events: Option<bool>,
    pub artifact_naming: Option<ArtifactNaming>,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub ocr_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub ocr_language: String,
    pub ocr_endpoint: String,
    pub model: String,
    pub generation_endpoint: String,
    pub prompt_template: String,
    pub poll_interval_ms: u64,
    pub request_timeout_secs: u64,
    pub case_insensitive_extensions: bool,
    pub watch_events: bool,
    pub artifact_naming: ArtifactNaming,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            input_dir: self.input_dir.clone(),
            poll_interval_ms: self.poll_interval_ms,
            case_insensitive_extensions: self.case_insensitive_extensions,
            watch_events: self.watch_events,
        }
    }

    /// OCR client settings. Fails if the API key is missing.
    pub fn ocr_config(&self) -> Result<OcrSpaceConfig> {
        let api_key = self
            .ocr_api_key
            .clone()
            .with_context(|| format!("{} is not set", ENV_OCR_API_KEY))?;

        Ok(OcrSpaceConfig {
            api_key,
            endpoint: self.ocr_endpoint.clone(),
            language: self.ocr_language.clone(),
            timeout: self.request_timeout(),
        })
    }

    /// Generation client settings. Fails if the API key is missing.
    pub fn gemini_config(&self) -> Result<GeminiConfig> {
        let api_key = self
            .gemini_api_key
            .clone()
            .with_context(|| format!("{} is not set", ENV_GEMINI_API_KEY))?;

        Ok(GeminiConfig {
            api_key,
            endpoint: self.generation_endpoint.clone(),
            model: self.model.clone(),
            timeout: self.request_timeout(),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            anyhow::bail!("watch.request_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".ocrflow").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("ocrflow").join("config.yaml"))
        .filter(|path| path.exists())
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn parse_config(content: &str) -> Result<ConfigFile> {
    if content.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

/// Directory that relative paths in a config file are resolved against
fn config_base_dir(config_path: &Path) -> PathBuf {
    let parent = config_path.parent().unwrap_or(Path::new("."));
    match parent.file_name() {
        Some(name) if name == ".ocrflow" => {
            parent.parent().unwrap_or(Path::new(".")).to_path_buf()
        }
        _ => parent.to_path_buf(),
    }
}

/// Resolve a path that may be relative to the config file's base directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Combine a config file (if any) with environment lookups and defaults
fn resolve(
    file: Option<(PathBuf, ConfigFile)>,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Blank values (e.g. `OCR_API_KEY=` in .env) count as unset
    let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    let (config_file, file) = match file {
        Some((path, file)) => (Some(path), file),
        None => (None, ConfigFile::default()),
    };
    let base = config_file
        .as_deref()
        .map(config_base_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    let input_dir = env(ENV_INPUT_DIR)
        .map(PathBuf::from)
        .or_else(|| file.paths.input.as_deref().map(|p| resolve_path(&base, p)))
        .unwrap_or_else(|| PathBuf::from("input"));

    let output_dir = env(ENV_OUTPUT_DIR)
        .map(PathBuf::from)
        .or_else(|| file.paths.output.as_deref().map(|p| resolve_path(&base, p)))
        .unwrap_or_else(|| PathBuf::from("output"));

    let defaults = WatcherConfig::default();

    ResolvedConfig {
        input_dir,
        output_dir,
        ocr_api_key: env(ENV_OCR_API_KEY),
        gemini_api_key: env(ENV_GEMINI_API_KEY),
        ocr_language: file
            .ocr
            .language
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        ocr_endpoint: file
            .ocr
            .endpoint
            .unwrap_or_else(|| DEFAULT_OCR_ENDPOINT.to_string()),
        model: file
            .generation
            .model
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        generation_endpoint: file
            .generation
            .endpoint
            .unwrap_or_else(|| DEFAULT_GENERATION_ENDPOINT.to_string()),
        prompt_template: file
            .generation
            .prompt_template
            .unwrap_or_else(|| DEFAULT_PROMPT_TEMPLATE.to_string()),
        poll_interval_ms: file.watch.interval_ms.unwrap_or(defaults.poll_interval_ms),
        request_timeout_secs: file.watch.request_timeout_secs.unwrap_or(60),
        case_insensitive_extensions: file
            .watch
            .case_insensitive_extensions
            .unwrap_or(defaults.case_insensitive_extensions),
        watch_events: file.watch.watch_events.unwrap_or(defaults.watch_events),
        artifact_naming: file.watch.artifact_naming.unwrap_or_default(),
        config_file,
    }
}

/// Load configuration from all sources.
///
/// `explicit` is a config file path given on the command line; it must exist.
pub fn load_config(explicit: Option<&Path>) -> Result<ResolvedConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(),
    };

    let file = match path {
        Some(path) => {
            let parsed = load_config_file(&path)?;
            tracing::debug!("Loaded config file {}", path.display());
            Some((path, parsed))
        }
        None => None,
    };

    let config = resolve(file, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

/// Show the first few characters of a secret
pub fn mask_secret(secret: Option<&str>) -> String {
    match secret {
        None => "<not set>".to_string(),
        Some(s) if s.chars().count() <= 4 => "****".to_string(),
        Some(s) => format!("{}****", s.chars().take(4).collect::<String>()),
    }
}
