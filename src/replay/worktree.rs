//! File access for the working tree: whole-file reads and writes that carry the
//! permission bits along.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::GitTheseusError;

/// Permission bits of a file, as captured before the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMode(u32);

impl FileMode {
    pub const DEFAULT: FileMode = FileMode(0o644);

    pub fn new(bits: u32) -> Self {
        FileMode(bits & 0o7777)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    #[cfg(unix)]
    fn from_permissions(perms: &fs::Permissions) -> Self {
        use std::os::unix::fs::PermissionsExt;
        FileMode::new(perms.mode())
    }

    #[cfg(not(unix))]
    fn from_permissions(perms: &fs::Permissions) -> Self {
        if perms.readonly() {
            FileMode(0o444)
        } else {
            FileMode::DEFAULT
        }
    }

    #[cfg(unix)]
    fn apply(self, path: &Path) -> std::io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(self.bits()))
    }

    #[cfg(not(unix))]
    fn apply(self, path: &Path) -> std::io::Result<()> {
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_readonly(self.0 & 0o222 == 0);
        fs::set_permissions(path, perms)
    }
}

impl std::fmt::Display for FileMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

/// Whole-file access to the working tree. Paths are relative to the tree root.
pub trait WorkTree {
    fn read(&self, path: &str) -> Result<(Vec<u8>, FileMode), GitTheseusError>;

    /// Replace the file's content and set its permission bits.
    fn write(&mut self, path: &str, bytes: &[u8], mode: FileMode) -> Result<(), GitTheseusError>;
}

/// The real working tree on disk, rooted at the repository workdir.
#[derive(Debug, Clone)]
pub struct DiskWorkTree {
    root: PathBuf,
}

impl DiskWorkTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }
}

impl WorkTree for DiskWorkTree {
    fn read(&self, path: &str) -> Result<(Vec<u8>, FileMode), GitTheseusError> {
        let full = self.resolve(path);
        let metadata = fs::metadata(&full).map_err(|e| GitTheseusError::io_at(&full, e))?;
        let bytes = fs::read(&full).map_err(|e| GitTheseusError::io_at(&full, e))?;
        Ok((bytes, FileMode::from_permissions(&metadata.permissions())))
    }

    fn write(&mut self, path: &str, bytes: &[u8], mode: FileMode) -> Result<(), GitTheseusError> {
        let full = self.resolve(path);
        fs::write(&full, bytes).map_err(|e| GitTheseusError::io_at(&full, e))?;
        mode.apply(&full).map_err(|e| GitTheseusError::io_at(&full, e))
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryWorkTree;

#[cfg(any(test, feature = "test-support"))]
mod memory {
    use std::cell::RefCell;
    use std::collections::{BTreeMap, HashSet};
    use std::rc::Rc;

    use super::{FileMode, WorkTree};
    use crate::error::GitTheseusError;

    #[derive(Default)]
    struct State {
        files: BTreeMap<String, (Vec<u8>, FileMode)>,
        failing_writes: HashSet<String>,
        write_limit: Option<usize>,
        reads: usize,
        writes: usize,
    }

    /// In-memory working tree. Clones share the same files, so a fake history
    /// can observe what the driver wrote.
    #[derive(Clone, Default)]
    pub struct MemoryWorkTree {
        state: Rc<RefCell<State>>,
    }

    impl MemoryWorkTree {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_file(self, path: &str, bytes: &[u8], mode: FileMode) -> Self {
            self.insert(path, bytes, mode);
            self
        }

        pub fn insert(&self, path: &str, bytes: &[u8], mode: FileMode) {
            self.state
                .borrow_mut()
                .files
                .insert(path.to_string(), (bytes.to_vec(), mode));
        }

        pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
            self.state.borrow().files.get(path).map(|(b, _)| b.clone())
        }

        pub fn mode(&self, path: &str) -> Option<FileMode> {
            self.state.borrow().files.get(path).map(|(_, m)| *m)
        }

        /// Make every later write to `path` fail with an IO error.
        pub fn fail_writes_to(&self, path: &str) {
            self.state
                .borrow_mut()
                .failing_writes
                .insert(path.to_string());
        }

        /// Let the next `n` writes succeed and fail every one after that.
        pub fn fail_writes_after(&self, n: usize) {
            let mut state = self.state.borrow_mut();
            state.write_limit = Some(state.writes + n);
        }

        pub fn read_count(&self) -> usize {
            self.state.borrow().reads
        }

        pub fn write_count(&self) -> usize {
            self.state.borrow().writes
        }
    }

    impl WorkTree for MemoryWorkTree {
        fn read(&self, path: &str) -> Result<(Vec<u8>, FileMode), GitTheseusError> {
            let mut state = self.state.borrow_mut();
            state.reads += 1;
            state.files.get(path).cloned().ok_or_else(|| {
                GitTheseusError::io_at(
                    path,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
                )
            })
        }

        fn write(
            &mut self,
            path: &str,
            bytes: &[u8],
            mode: FileMode,
        ) -> Result<(), GitTheseusError> {
            let mut state = self.state.borrow_mut();
            let over_limit = state.write_limit.is_some_and(|limit| state.writes >= limit);
            if over_limit || state.failing_writes.contains(path) {
                return Err(GitTheseusError::io_at(
                    path,
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "write refused"),
                ));
            }
            state.writes += 1;
            state
                .files
                .insert(path.to_string(), (bytes.to_vec(), mode));
            Ok(())
        }
    }
}
