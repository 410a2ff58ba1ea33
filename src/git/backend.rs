use chrono::{DateTime, FixedOffset};

use crate::error::GitTheseusError;

/// An author identity as recorded on a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub when: DateTime<FixedOffset>,
}

impl Signature {
    /// Render the timestamp the way git accepts it in `GIT_AUTHOR_DATE`: `<unix-seconds> <±HHMM>`.
    pub fn git_date(&self) -> String {
        let seconds = self.when.timestamp();
        let offset_min = self.when.offset().local_minus_utc() / 60;
        let sign = if offset_min >= 0 { '+' } else { '-' };
        let abs = offset_min.abs();
        format!("{} {}{:02}{:02}", seconds, sign, abs / 60, abs % 60)
    }

    /// Date as printed in a log entry, e.g. `Wed Sep 27 18:56:49 2023 +0900`.
    pub fn log_date(&self) -> String {
        self.when.format("%a %b %d %H:%M:%S %Y %z").to_string()
    }
}

/// Metadata of an original commit that a synthesized commit is modelled on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalCommit {
    /// Full object id.
    pub id: String,
    pub author: Signature,
    /// Raw message, without the trailing newline git appends on output.
    pub message: String,
}

/// Operations the replay needs from the host version-control system.
///
/// Paths handed to `stage` are relative to the repository workdir.
pub trait HistoryBackend {
    /// Resolve a (possibly abbreviated) identifier to a full commit id.
    fn resolve_commit(&self, id: &str) -> Result<String, GitTheseusError>;

    /// Return `ids` (full ids) oldest ancestor first.
    fn topo_order(&self, ids: &[String]) -> Result<Vec<String>, GitTheseusError>;

    fn original_commit(&self, id: &str) -> Result<OriginalCommit, GitTheseusError>;

    fn stage(&mut self, path: &str) -> Result<(), GitTheseusError>;

    /// Drop everything currently staged.
    fn unstage_all(&mut self) -> Result<(), GitTheseusError>;

    /// Commit the staged changes. The committer comes from the environment.
    fn commit(&mut self, message: &str, author: &Signature) -> Result<String, GitTheseusError>;
}
