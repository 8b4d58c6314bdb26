//! Dedup tracker for discovered files.
//!
//! Entries are in memory only and never evicted. A restart forgets every
//! entry, so all matching files still in the input directory are
//! dispatched again.

use std::collections::HashSet;

use crate::domain::FileIdentity;

/// Set of file identities already dispatched for processing
#[derive(Debug, Default)]
pub struct FileGate {
    dispatched: HashSet<FileIdentity>,
}

impl FileGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the identity has never been dispatched
    pub fn is_new(&self, identity: &FileIdentity) -> bool {
        !self.dispatched.contains(identity)
    }

    /// Record a dispatch. Marking twice is a no-op.
    pub fn mark_dispatched(&mut self, identity: FileIdentity) {
        self.dispatched.insert(identity);
    }

    /// Check and mark in one step.
    ///
    /// Returns true exactly once per identity; every later call returns false.
    pub fn try_dispatch(&mut self, identity: &FileIdentity) -> bool {
        if self.dispatched.contains(identity) {
            return false;
        }
        self.dispatched.insert(identity.clone())
    }

    /// Number of identities dispatched so far
    pub fn dispatched_count(&self) -> usize {
        self.dispatched.len()
    }
}
