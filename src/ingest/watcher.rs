//! Input directory watcher.
//!
//! Polls the input directory, passes every new image through the
//! [`FileGate`] and runs the pipeline on it. Files are processed one at a
//! time; a failing file is logged and skipped, a failing directory listing
//! stops the loop.

use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::core::{FileGate, Pipeline};
use crate::domain::FileIdentity;

/// Suffixes of files that are picked up
pub const IMAGE_SUFFIXES: [&str; 3] = [".png", ".jpg", ".jpeg"];

/// Errors that can occur with the watcher
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Input directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Failed to list input directory {path}: {source}")]
    Listing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
}

/// Configuration for the watcher
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Directory to watch
    pub input_dir: PathBuf,

    /// Delay between scans (milliseconds)
    pub poll_interval_ms: u64,

    /// Match `.PNG`, `.Jpg` etc. as well
    pub case_insensitive_extensions: bool,

    /// Rescan early when the filesystem reports a change
    pub watch_events: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            poll_interval_ms: 100,
            case_insensitive_extensions: false,
            watch_events: false,
        }
    }
}

impl WatcherConfig {
    /// Check that the input directory exists
    pub fn validate(&self) -> Result<(), WatchError> {
        if !self.input_dir.is_dir() {
            return Err(WatchError::DirectoryNotFound(self.input_dir.clone()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// One entry of a directory listing. The name is kept as the raw OS string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEntry {
    pub name: OsString,
    pub is_dir: bool,
}

impl ListedEntry {
    pub fn file(name: impl Into<OsString>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<OsString>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Whether a file name ends in one of [`IMAGE_SUFFIXES`]
pub fn has_image_suffix(name: &str, case_insensitive: bool) -> bool {
    IMAGE_SUFFIXES.iter().any(|suffix| {
        if !case_insensitive {
            return name.ends_with(suffix);
        }
        name.len() >= suffix.len()
            && name
                .get(name.len() - suffix.len()..)
                .map(|tail| tail.eq_ignore_ascii_case(suffix))
                .unwrap_or(false)
    })
}

/// Result of a single scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Files handed to the pipeline
    pub dispatched: usize,
    /// Eligible files skipped because they were dispatched before
    pub already_seen: usize,
    /// Directories and non-image files
    pub ignored: usize,
}

impl ScanResult {
    pub fn total_scanned(&self) -> usize {
        self.dispatched + self.already_seen + self.ignored
    }
}

/// Totals for a watch session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub cycles: u64,
    pub dispatched: usize,
}

/// The scan / wait loop. Owns the dedup gate.
pub struct IngestionLoop {
    config: WatcherConfig,
    gate: FileGate,
    pipeline: Pipeline,
}

impl IngestionLoop {
    pub fn new(config: WatcherConfig, pipeline: Pipeline) -> Self {
        Self {
            config,
            gate: FileGate::new(),
            pipeline,
        }
    }

    pub fn gate(&self) -> &FileGate {
        &self.gate
    }

    /// List the input directory, sorted by name
    pub async fn list_entries(&self) -> Result<Vec<ListedEntry>, WatchError> {
        let dir = &self.config.input_dir;
        let listing_err = |source: std::io::Error| WatchError::Listing {
            path: dir.clone(),
            source,
        };

        let mut reader = tokio::fs::read_dir(dir).await.map_err(listing_err)?;
        let mut entries = Vec::new();

        while let Some(entry) = reader.next_entry().await.map_err(listing_err)? {
            let file_type = entry.file_type().await.map_err(listing_err)?;
            entries.push(ListedEntry {
                name: entry.file_name(),
                is_dir: file_type.is_dir(),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Filter a listing and run the pipeline on every file that is new.
    ///
    /// The gate is marked before the pipeline starts, so a file that fails
    /// is never tried again in this process.
    pub async fn scan_entries(&mut self, entries: Vec<ListedEntry>) -> ScanResult {
        let mut result = ScanResult::default();

        for entry in entries {
            // Suffixes are ASCII, so a lossy name matches the same way
            let eligible = !entry.is_dir
                && has_image_suffix(
                    &entry.name.to_string_lossy(),
                    self.config.case_insensitive_extensions,
                );
            if !eligible {
                result.ignored += 1;
                continue;
            }

            let path = self.config.input_dir.join(&entry.name);
            let identity = FileIdentity::new(entry.name);
            if !self.gate.try_dispatch(&identity) {
                result.already_seen += 1;
                continue;
            }

            debug!("Dispatching {}", identity);
            result.dispatched += 1;

            self.pipeline.process(&path).await;
        }

        result
    }

    /// One scanning pass over the input directory
    pub async fn scan_once(&mut self) -> Result<ScanResult, WatchError> {
        let entries = self.list_entries().await?;
        Ok(self.scan_entries(entries).await)
    }

    /// Scan, wait, repeat until `shutdown` resolves.
    ///
    /// Shutdown is observed between scans. A listing failure ends the loop
    /// with an error.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<LoopSummary, WatchError>
    where
        F: Future<Output = ()>,
    {
        self.config.validate()?;

        tokio::pin!(shutdown);

        let (_debouncer, mut wake_rx) = if self.config.watch_events {
            let (debouncer, rx) = spawn_notifier(&self.config.input_dir)?;
            (Some(debouncer), rx)
        } else {
            // Sender dropped: the wake branch never fires
            let (_, rx) = mpsc::channel::<()>(1);
            (None, rx)
        };

        let interval = self.config.poll_interval();
        let mut summary = LoopSummary::default();

        info!("Watching {} for images", self.config.input_dir.display());

        loop {
            let result = match self.scan_once().await {
                Ok(result) => result,
                Err(e) => {
                    error!("Stopping watcher: {}", e);
                    return Err(e);
                }
            };

            summary.cycles += 1;
            summary.dispatched += result.dispatched;

            tokio::select! {
                _ = &mut shutdown => {
                    info!(
                        "Watcher stopping after {} file(s)",
                        self.gate.dispatched_count()
                    );
                    break;
                }
                _ = tokio::time::sleep(interval) => {}
                Some(()) = wake_rx.recv() => {
                    debug!("Change in input directory, rescanning");
                }
            }
        }

        Ok(summary)
    }
}

/// Debounced filesystem notifier that pings `rx` on any change in `dir`
fn spawn_notifier(
    dir: &Path,
) -> Result<(Debouncer<notify::RecommendedWatcher>, mpsc::Receiver<()>), WatchError> {
    let (tx, rx) = mpsc::channel::<()>(1);

    let mut debouncer = new_debouncer(
        Duration::from_millis(250),
        move |res: DebounceEventResult| match res {
            Ok(_) => {
                // A full channel already has a pending wake-up
                let _ = tx.try_send(());
            }
            Err(e) => tracing::warn!("Watcher error: {:?}", e),
        },
    )?;

    debouncer
        .watcher()
        .watch(dir, RecursiveMode::NonRecursive)?;

    Ok((debouncer, rx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_suffix_case_sensitive() {
        assert!(has_image_suffix("a.png", false));
        assert!(has_image_suffix("a.jpg", false));
        assert!(has_image_suffix("a.jpeg", false));
        assert!(!has_image_suffix("a.PNG", false));
        assert!(!has_image_suffix("a.txt", false));
        assert!(!has_image_suffix("png", false));
        assert!(!has_image_suffix("a.png.part", false));
    }

    #[test]
    fn test_image_suffix_case_insensitive() {
        assert!(has_image_suffix("a.PNG", true));
        assert!(has_image_suffix("Shot.JpEg", true));
        assert!(!has_image_suffix("a.gif", true));
        // Multi-byte names must not panic on slicing
        assert!(!has_image_suffix("снимок", true));
        assert!(has_image_suffix("снимок.JPG", true));
    }

    #[test]
    fn test_default_config() {
        let config = WatcherConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert!(!config.case_insensitive_extensions);
        assert!(!config.watch_events);
    }

    #[test]
    fn test_validate_missing_dir() {
        let config = WatcherConfig {
            input_dir: PathBuf::from("/no/such/input/dir"),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(WatchError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn test_scan_result_total() {
        let result = ScanResult {
            dispatched: 1,
            already_seen: 2,
            ignored: 3,
        };
        assert_eq!(result.total_scanned(), 6);
    }
}
