#![allow(dead_code)]

use assert_cmd::Command as BinCommand;
use git_theseus::git::repository as TheseusRepository;
use git2::Repository;
use rand::Rng;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug)]
pub struct TestRepo {
    path: PathBuf,
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRepo {
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        let n: u64 = rng.gen_range(0..10000000000);
        let path = std::env::temp_dir().join(format!("git-theseus-{}", n));
        let repo = Repository::init(&path).expect("failed to initialize git2 repository");
        let mut config = repo.config().expect("failed to open repository config");
        config
            .set_str("user.name", "Test User")
            .expect("failed to set user.name");
        config
            .set_str("user.email", "test@example.com")
            .expect("failed to set user.email");
        config
            .set_bool("commit.gpgsign", false)
            .expect("failed to set commit.gpgsign");

        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn git2(&self) -> Repository {
        Repository::open(&self.path).expect("failed to open repository")
    }

    /// Run git against the repository and return stdout.
    pub fn git(&self, args: &[&str]) -> Result<String, String> {
        let mut full_args: Vec<String> =
            vec!["-C".to_string(), self.path.to_str().unwrap().to_string()];
        full_args.extend(args.iter().map(|s| s.to_string()));

        TheseusRepository::exec_git(&full_args)
            .map(|output| String::from_utf8_lossy(&output.stdout).to_string())
            .map_err(|e| e.to_string())
    }

    pub fn write_file(&self, relative: &str, contents: &str) {
        let file_path = self.path.join(relative);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(file_path, contents).unwrap();
    }

    pub fn read_file(&self, relative: &str) -> Option<String> {
        fs::read_to_string(self.path.join(relative)).ok()
    }

    /// Stage everything and commit it with a fixed author and date. Returns the new commit id.
    pub fn commit_as(&self, message: &str, name: &str, email: &str, date: &str) -> String {
        self.git(&["add", "-A"]).expect("add -A should succeed");
        let output = std::process::Command::new("git")
            .arg("-C")
            .arg(&self.path)
            .args(["commit", "--quiet", "-m", message])
            .env("GIT_AUTHOR_NAME", name)
            .env("GIT_AUTHOR_EMAIL", email)
            .env("GIT_AUTHOR_DATE", date)
            .env("GIT_COMMITTER_DATE", date)
            .output()
            .expect("failed to run git commit");
        assert!(
            output.status.success(),
            "git commit failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        self.head()
    }

    pub fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"]).unwrap().trim().to_string()
    }

    pub fn commit_count(&self) -> usize {
        self.git(&["rev-list", "--count", "HEAD"])
            .unwrap()
            .trim()
            .parse()
            .unwrap()
    }

    /// Content of `path` as recorded in `rev`.
    pub fn show_file(&self, rev: &str, path: &str) -> String {
        self.git(&["show", &format!("{}:{}", rev, path)])
            .unwrap_or_else(|e| panic!("failed to show {}:{}: {}", rev, path, e))
    }

    pub fn message(&self, rev: &str) -> String {
        self.git(&["log", "-1", "--format=%B", rev]).unwrap()
    }

    pub fn staged_paths(&self) -> Vec<String> {
        self.git(&["diff", "--cached", "--name-only"])
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Write `json` to a temp file and return a command that runs the binary
    /// against this repository with it.
    pub fn theseus(&self, json: &str) -> (BinCommand, NamedTempFile) {
        let mut input = NamedTempFile::new().expect("failed to create descriptor file");
        input.write_all(json.as_bytes()).unwrap();
        input.flush().unwrap();

        let mut command = BinCommand::cargo_bin("git-theseus").expect("binary should be built");
        command
            .current_dir(&self.path)
            .arg("--input-file")
            .arg(input.path());
        (command, input)
    }

    pub fn theseus_from(&self, dir: &Path, json: &str) -> (BinCommand, NamedTempFile) {
        let (mut command, input) = self.theseus(json);
        command.current_dir(dir);
        (command, input)
    }
}

impl Drop for TestRepo {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}
