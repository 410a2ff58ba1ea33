//! In-memory stand-ins for the repository, for exercising the replay without git.

use std::collections::{BTreeMap, HashSet};

use chrono::DateTime;

use crate::error::GitTheseusError;
use crate::git::backend::{HistoryBackend, OriginalCommit, Signature};
use crate::replay::worktree::MemoryWorkTree;

#[derive(Debug, Clone)]
pub struct FakeCommit {
    pub id: String,
    pub author: Signature,
    pub message: String,
    /// Full tree content as of this commit.
    pub files: BTreeMap<String, Vec<u8>>,
    /// Created through `HistoryBackend::commit` rather than seeded as history.
    pub synthesized: bool,
}

/// A linear history held in memory. Staging reads file content from a shared
/// `MemoryWorkTree`, so commits capture exactly what the driver wrote.
pub struct FakeHistory {
    tree: MemoryWorkTree,
    commits: Vec<FakeCommit>,
    index: BTreeMap<String, Vec<u8>>,
    head_files: BTreeMap<String, Vec<u8>>,
    failing_stage: HashSet<String>,
    fail_commit_at: Option<usize>,
    unstage_calls: usize,
}

impl FakeHistory {
    pub fn new(tree: MemoryWorkTree) -> Self {
        Self {
            tree,
            commits: Vec::new(),
            index: BTreeMap::new(),
            head_files: BTreeMap::new(),
            failing_stage: HashSet::new(),
            fail_commit_at: None,
            unstage_calls: 0,
        }
    }

    fn next_id(&self) -> String {
        format!("c{:039x}", self.commits.len() + 1)
    }

    /// Seed an original commit (each one a child of the previous). Returns its id.
    pub fn add_original(
        &mut self,
        message: &str,
        name: &str,
        email: &str,
        rfc3339: &str,
    ) -> String {
        let id = self.next_id();
        let when = DateTime::parse_from_rfc3339(rfc3339).expect("valid RFC 3339 date");
        self.commits.push(FakeCommit {
            id: id.clone(),
            author: Signature {
                name: name.to_string(),
                email: email.to_string(),
                when,
            },
            message: message.to_string(),
            files: self.head_files.clone(),
            synthesized: false,
        });
        id
    }

    pub fn fail_stage_of(&mut self, path: &str) {
        self.failing_stage.insert(path.to_string());
    }

    /// Make the `n`-th synthesized commit (0-based) fail.
    pub fn fail_commit_at(&mut self, n: usize) {
        self.fail_commit_at = Some(n);
    }

    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }

    pub fn synthesized(&self) -> Vec<&FakeCommit> {
        self.commits.iter().filter(|c| c.synthesized).collect()
    }

    pub fn staged_paths(&self) -> Vec<String> {
        self.index.keys().cloned().collect()
    }

    pub fn unstage_calls(&self) -> usize {
        self.unstage_calls
    }

    fn find(&self, id: &str) -> Result<&FakeCommit, GitTheseusError> {
        let mut matches = self
            .commits
            .iter()
            .filter(|c| c.id == id || (id.len() >= 4 && c.id.starts_with(id)));
        match (matches.next(), matches.next()) {
            (Some(commit), None) => Ok(commit),
            (Some(_), Some(_)) => Err(GitTheseusError::Generic(format!(
                "short object ID {} is ambiguous",
                id
            ))),
            (None, _) => Err(GitTheseusError::Generic(format!(
                "unknown revision '{}'",
                id
            ))),
        }
    }
}

impl HistoryBackend for FakeHistory {
    fn resolve_commit(&self, id: &str) -> Result<String, GitTheseusError> {
        Ok(self.find(id)?.id.clone())
    }

    fn topo_order(&self, ids: &[String]) -> Result<Vec<String>, GitTheseusError> {
        for id in ids {
            self.find(id)?;
        }
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        Ok(self
            .commits
            .iter()
            .filter(|c| wanted.contains(c.id.as_str()))
            .map(|c| c.id.clone())
            .collect())
    }

    fn original_commit(&self, id: &str) -> Result<OriginalCommit, GitTheseusError> {
        let commit = self.find(id)?;
        Ok(OriginalCommit {
            id: commit.id.clone(),
            author: commit.author.clone(),
            message: commit.message.clone(),
        })
    }

    fn stage(&mut self, path: &str) -> Result<(), GitTheseusError> {
        if self.failing_stage.contains(path) {
            return Err(GitTheseusError::Generic(format!(
                "pathspec '{}' refused",
                path
            )));
        }
        let bytes = self.tree.contents(path).ok_or_else(|| {
            GitTheseusError::Generic(format!("pathspec '{}' did not match any files", path))
        })?;
        self.index.insert(path.to_string(), bytes);
        Ok(())
    }

    fn unstage_all(&mut self) -> Result<(), GitTheseusError> {
        self.unstage_calls += 1;
        self.index.clear();
        Ok(())
    }

    fn commit(&mut self, message: &str, author: &Signature) -> Result<String, GitTheseusError> {
        let nth = self.commits.iter().filter(|c| c.synthesized).count();
        if self.fail_commit_at == Some(nth) {
            return Err(GitTheseusError::Generic("commit rejected".to_string()));
        }
        let changed = self
            .index
            .iter()
            .any(|(path, bytes)| self.head_files.get(path) != Some(bytes));
        if !changed {
            return Err(GitTheseusError::Generic(
                "nothing to commit, working tree clean".to_string(),
            ));
        }

        self.head_files.append(&mut self.index);
        let id = self.next_id();
        self.commits.push(FakeCommit {
            id: id.clone(),
            author: author.clone(),
            message: message.to_string(),
            files: self.head_files.clone(),
            synthesized: true,
        });
        Ok(id)
    }
}
