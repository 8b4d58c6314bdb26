//! Generated-response artifacts written to the output directory.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

use super::FileIdentity;

/// Name used for every artifact under [`ArtifactNaming::Constant`]
pub const DEFAULT_ARTIFACT_NAME: &str = "result";

/// Errors that can occur while persisting an artifact
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Output directory does not exist: {0}")]
    OutputDirMissing(PathBuf),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// How artifacts are named
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactNaming {
    /// Every artifact is `result.md`; each run overwrites the last
    #[default]
    Constant,

    /// Artifact named after the source file stem
    PerSource,
}

impl ArtifactNaming {
    /// Artifact name (without extension) for a source file
    pub fn artifact_name(&self, source: &FileIdentity) -> String {
        match self {
            Self::Constant => DEFAULT_ARTIFACT_NAME.to_string(),
            Self::PerSource => source.stem().into_owned(),
        }
    }
}

/// Writes `<output_dir>/<name>.md`
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.md", name))
    }

    /// Write (or replace) an artifact and return its path.
    ///
    /// The output directory must already exist; it is never created here.
    pub async fn write(&self, name: &str, content: &str) -> Result<PathBuf, PersistenceError> {
        let target = self.artifact_path(name);
        let dir = self.output_dir.clone();
        let path = target.clone();
        let bytes = content.as_bytes().to_vec();

        tokio::task::spawn_blocking(move || write_replace(&dir, &path, &bytes))
            .await
            .map_err(|e| PersistenceError::Io {
                path: target.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            })??;

        tracing::info!("Artifact saved: {}", target.display());
        Ok(target)
    }
}

/// Write through a temp file in `dir`, then rename over `target`
fn write_replace(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    if !dir.is_dir() {
        return Err(PersistenceError::OutputDirMissing(dir.to_path_buf()));
    }

    let io_err = |source: std::io::Error| PersistenceError::Io {
        path: target.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(io_err)?;
    }

    tmp.persist(target).map_err(|e| io_err(e.error))?;
    Ok(())
}
