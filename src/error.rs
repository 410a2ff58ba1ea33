use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum GitTheseusError {
    #[cfg(feature = "test-support")]
    GitError(git2::Error),
    /// The input descriptor is not JSON of a supported shape
    DecodeError(String),
    /// Filesystem read/write failure on a specific path
    IoError {
        path: Option<PathBuf>,
        source: std::io::Error,
    },
    /// Commit ids could not be resolved or ordered by ancestry
    OrderingError(String),
    /// The repository refused to stage or unstage a path
    StagingError { path: String, reason: String },
    /// The repository refused to create (or look up) a commit
    CommitError { commit_id: String, reason: String },
    /// Errors from invoking the git CLI that exited with a non-zero status
    GitCliError {
        code: Option<i32>,
        stderr: String,
        args: Vec<String>,
    },
    FromUtf8Error(std::string::FromUtf8Error),
    Generic(String),
}

impl GitTheseusError {
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GitTheseusError::IoError {
            path: Some(path.into()),
            source,
        }
    }
}

impl fmt::Display for GitTheseusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "test-support")]
            GitTheseusError::GitError(e) => write!(f, "Git error: {}", e),
            GitTheseusError::DecodeError(e) => write!(f, "Decode error: {}", e),
            GitTheseusError::IoError { path, source } => match path {
                Some(p) => write!(f, "IO error on '{}': {}", p.display(), source),
                None => write!(f, "IO error: {}", source),
            },
            GitTheseusError::OrderingError(e) => write!(f, "Ordering error: {}", e),
            GitTheseusError::StagingError { path, reason } => {
                write!(f, "Failed to stage '{}': {}", path, reason)
            }
            GitTheseusError::CommitError { commit_id, reason } => {
                write!(f, "Commit error for '{}': {}", commit_id, reason)
            }
            GitTheseusError::GitCliError { code, stderr, args } => match code {
                Some(c) => write!(
                    f,
                    "Git CLI ({}) failed with exit code {}: {}",
                    args.join(" "),
                    c,
                    stderr
                ),
                None => write!(f, "Git CLI ({}) failed: {}", args.join(" "), stderr),
            },
            GitTheseusError::FromUtf8Error(e) => write!(f, "From UTF-8 error: {}", e),
            GitTheseusError::Generic(e) => write!(f, "Generic error: {}", e),
        }
    }
}

impl std::error::Error for GitTheseusError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GitTheseusError::IoError { source, .. } => Some(source),
            GitTheseusError::FromUtf8Error(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "test-support")]
impl From<git2::Error> for GitTheseusError {
    fn from(err: git2::Error) -> Self {
        GitTheseusError::GitError(err)
    }
}

impl From<std::io::Error> for GitTheseusError {
    fn from(err: std::io::Error) -> Self {
        GitTheseusError::IoError {
            path: None,
            source: err,
        }
    }
}

impl From<std::string::FromUtf8Error> for GitTheseusError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        GitTheseusError::FromUtf8Error(err)
    }
}
