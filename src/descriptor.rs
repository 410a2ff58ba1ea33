//! In-memory model of the input descriptor: which physical lines of which file
//! were visible as of which original commit.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::GitTheseusError;

/// As of `commit_id`, the 1-based lines in `line_nums` were present in `file_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitLineEntry {
    pub commit_id: String,
    pub file_path: String,
    #[serde(alias = "line_numbers")]
    pub line_nums: Vec<u64>,
}

/// `file_path -> line numbers`, flattened across every entry of a single commit.
pub type FileLines = BTreeMap<String, Vec<u64>>;

/// The two accepted JSON shapes. Both normalize to a flat list of entries.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDescriptor {
    Flat(Vec<CommitLineEntry>),
    Keyed(BTreeMap<String, FileLines>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptor {
    entries: Vec<CommitLineEntry>,
}

impl Descriptor {
    pub fn new(entries: Vec<CommitLineEntry>) -> Self {
        Self { entries }
    }

    /// Decode a descriptor from JSON bytes.
    ///
    /// Accepts either a list of `{commit_id, file_path, line_nums}` records or an
    /// object keyed by commit id whose values map file paths to line numbers.
    pub fn parse(bytes: &[u8]) -> Result<Self, GitTheseusError> {
        let raw: RawDescriptor = serde_json::from_slice(bytes).map_err(|e| {
            GitTheseusError::DecodeError(format!(
                "expected a list of {{commit_id, file_path, line_nums}} records or an object \
                 keyed by commit id: {}",
                e
            ))
        })?;

        let entries = match raw {
            RawDescriptor::Flat(entries) => entries,
            RawDescriptor::Keyed(by_commit) => by_commit
                .into_iter()
                .flat_map(|(commit_id, files)| {
                    files
                        .into_iter()
                        .map(move |(file_path, line_nums)| CommitLineEntry {
                            commit_id: commit_id.clone(),
                            file_path,
                            line_nums,
                        })
                })
                .collect(),
        };

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CommitLineEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct commit ids referenced anywhere. Order carries no meaning.
    pub fn commit_ids(&self) -> BTreeSet<String> {
        self.entries.iter().map(|e| e.commit_id.clone()).collect()
    }

    /// Distinct file paths referenced anywhere, across all commits.
    pub fn file_paths(&self) -> BTreeSet<String> {
        self.entries.iter().map(|e| e.file_path.clone()).collect()
    }

    /// All entries for `commit_id`, with line numbers concatenated per file.
    /// Duplicates are kept; they collapse once inserted into a visible set.
    pub fn entries_for(&self, commit_id: &str) -> FileLines {
        self.entries_for_any(&[commit_id])
    }

    /// Like `entries_for`, merged across several ids naming the same commit.
    pub fn entries_for_any<S: AsRef<str>>(&self, commit_ids: &[S]) -> FileLines {
        let mut aggregated = FileLines::new();
        for entry in self
            .entries
            .iter()
            .filter(|e| commit_ids.iter().any(|id| id.as_ref() == e.commit_id))
        {
            aggregated
                .entry(entry.file_path.clone())
                .or_default()
                .extend_from_slice(&entry.line_nums);
        }
        aggregated
    }
}
