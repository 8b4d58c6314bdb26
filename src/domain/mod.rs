//! Domain types for the ingestion pipeline.
//!
//! - FileIdentity: the name used to tell already-seen files from new ones
//! - Artifact: naming policy and the writer for generated responses

pub mod artifact;

use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;

pub use artifact::{ArtifactNaming, ArtifactWriter, PersistenceError, DEFAULT_ARTIFACT_NAME};

/// Base name of a discovered file.
///
/// Two files with the same name are the same file as far as dedup is
/// concerned, even if the content changes. Names are kept as raw OS
/// strings, so names that are not valid UTF-8 stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileIdentity(OsString);

impl FileIdentity {
    pub fn new(name: impl Into<OsString>) -> Self {
        Self(name.into())
    }

    /// Identity of a path, i.e. its final component
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name().map(|name| Self(name.to_os_string()))
    }

    pub fn as_os_str(&self) -> &OsStr {
        &self.0
    }

    /// Name without its extension (`shot.png` -> `shot`)
    pub fn stem(&self) -> Cow<'_, str> {
        Path::new(&self.0)
            .file_stem()
            .unwrap_or(self.0.as_os_str())
            .to_string_lossy()
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_string_lossy())
    }
}

impl From<&str> for FileIdentity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_from_path() {
        let id = FileIdentity::from_path(Path::new("/tmp/shots/Screenshot 1.png")).unwrap();
        assert_eq!(id.as_os_str(), "Screenshot 1.png");
        assert_eq!(id.stem(), "Screenshot 1");
    }

    #[test]
    fn test_identity_from_root_has_none() {
        assert!(FileIdentity::from_path(Path::new("/")).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_stay_distinct() {
        use std::os::unix::ffi::OsStrExt;

        let a = FileIdentity::new(OsStr::from_bytes(b"shot\xfe.png"));
        let b = FileIdentity::new(OsStr::from_bytes(b"shot\xff.png"));

        assert_ne!(a, b);
        assert_eq!(a.as_os_str().as_bytes(), b"shot\xfe.png");
        // Display and stem fall back to a lossy form
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(a.stem(), "shot\u{fffd}");
    }
}
