use std::collections::BTreeMap;

use crate::error::GitTheseusError;
use crate::replay::worktree::{FileMode, WorkTree};
use crate::utils::debug_log;

/// Content and permission bits of a file as they were before the run touched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PristineSnapshot {
    pub bytes: Vec<u8>,
    pub mode: FileMode,
}

/// Read-through cache of pristine file content, keyed by path. Entries are
/// filled on first reference and never invalidated within a run.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    snapshots: BTreeMap<String, PristineSnapshot>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture `path` unless it is already cached; repeated calls do not re-read.
    pub fn capture<W: WorkTree + ?Sized>(
        &mut self,
        tree: &W,
        path: &str,
    ) -> Result<&PristineSnapshot, GitTheseusError> {
        if !self.snapshots.contains_key(path) {
            let (bytes, mode) = tree.read(path)?;
            debug_log(&format!(
                "Captured pristine '{}' ({} bytes, mode {})",
                path,
                bytes.len(),
                mode
            ));
            self.snapshots
                .insert(path.to_string(), PristineSnapshot { bytes, mode });
        }
        Ok(&self.snapshots[path])
    }

    pub fn get(&self, path: &str) -> Option<&PristineSnapshot> {
        self.snapshots.get(path)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Write `path` back to its pristine bytes and mode.
    pub fn restore<W: WorkTree + ?Sized>(
        &self,
        tree: &mut W,
        path: &str,
    ) -> Result<(), GitTheseusError> {
        let snapshot = self.snapshots.get(path).ok_or_else(|| {
            GitTheseusError::Generic(format!("No pristine snapshot of '{}'", path))
        })?;
        tree.write(path, &snapshot.bytes, snapshot.mode)
    }

    /// Restore every captured file, stopping at the first failure.
    pub fn restore_all<W: WorkTree + ?Sized>(&self, tree: &mut W) -> Result<(), GitTheseusError> {
        for (path, snapshot) in &self.snapshots {
            tree.write(path, &snapshot.bytes, snapshot.mode)?;
        }
        Ok(())
    }
}
