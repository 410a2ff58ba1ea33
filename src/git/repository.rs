use crate::config;
use crate::error::GitTheseusError;
use crate::git::backend::{HistoryBackend, OriginalCommit, Signature};
use crate::utils::debug_log;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

pub struct Commit<'a> {
    repo: &'a Repository,
    oid: String,
}

impl<'a> Commit<'a> {
    pub fn id(&self) -> String {
        self.oid.clone()
    }

    // Author identity, author date and raw message in a single `git show`.
    pub fn metadata(&self) -> Result<OriginalCommit, GitTheseusError> {
        let mut args = self.repo.global_args_for_exec();
        args.push("show".to_string());
        args.push("-s".to_string());
        args.push("--no-notes".to_string());
        args.push("--encoding=UTF-8".to_string());
        args.push("--format=%H%n%an%n%ae%n%aI%n%B".to_string());
        args.push(self.oid.clone());
        let output = exec_git(&args)?;
        parse_show_output(&String::from_utf8(output.stdout)?)
    }
}

fn parse_show_output(stdout: &str) -> Result<OriginalCommit, GitTheseusError> {
    let mut parts = stdout.splitn(5, '\n');
    let mut next_field = |name: &str| {
        parts
            .next()
            .map(|s| s.trim_end_matches('\r').to_string())
            .ok_or_else(|| GitTheseusError::Generic(format!("Missing {} in git show output", name)))
    };
    let id = next_field("commit id")?.trim().to_string();
    // Identity fields are kept byte for byte.
    let name = next_field("author name")?;
    let email = next_field("author email")?;
    let date = next_field("author date")?.trim().to_string();
    let message = parts.next().unwrap_or("").trim_end_matches('\n').to_string();

    let when = chrono::DateTime::parse_from_rfc3339(&date).map_err(|e| {
        GitTheseusError::Generic(format!("Unparseable author date '{}' on {}: {}", date, id, e))
    })?;

    Ok(OriginalCommit {
        id,
        author: Signature { name, email, when },
        message,
    })
}

#[derive(Debug, Clone)]
pub struct Repository {
    global_args: Vec<String>,
    workdir: PathBuf,
}

impl Repository {
    // Util for preparing global args for execution
    pub fn global_args_for_exec(&self) -> Vec<String> {
        let mut args = self.global_args.clone();
        if !args.iter().any(|arg| arg == "--no-pager") {
            args.push("--no-pager".to_string());
        }
        args
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    // Lookup a commit by any revision that peels to one.
    pub fn find_commit(&self, rev: &str) -> Result<Commit<'_>, GitTheseusError> {
        let mut args = self.global_args_for_exec();
        args.push("rev-parse".to_string());
        args.push("--verify".to_string());
        args.push("--quiet".to_string());
        args.push(format!("{}^{{commit}}", rev));
        let output = exec_git(&args)?;
        let oid = String::from_utf8(output.stdout)?.trim().to_string();
        if oid.is_empty() {
            return Err(GitTheseusError::Generic(format!("Not a commit: {}", rev)));
        }
        Ok(Commit { repo: self, oid })
    }

    /// Every commit reachable from `tips`, oldest first, restricted to `tips` themselves.
    ///
    /// Walks the ancestry so the result is a real topological order; ids are fed on
    /// stdin to stay clear of argv limits.
    pub fn rev_list_topo_reverse(&self, tips: &[String]) -> Result<Vec<String>, GitTheseusError> {
        if tips.is_empty() {
            return Ok(Vec::new());
        }
        let mut args = self.global_args_for_exec();
        args.push("rev-list".to_string());
        args.push("--topo-order".to_string());
        args.push("--reverse".to_string());
        args.push("--stdin".to_string());

        let mut stdin_data = tips.join("\n");
        stdin_data.push('\n');
        let output = exec_git_stdin(&args, stdin_data.as_bytes())?;
        let wanted: HashSet<&str> = tips.iter().map(String::as_str).collect();

        Ok(String::from_utf8(output.stdout)?
            .lines()
            .map(str::trim)
            .filter(|oid| wanted.contains(oid))
            .map(str::to_string)
            .collect())
    }

    pub fn add_path(&self, path: &str) -> Result<(), GitTheseusError> {
        let mut args = self.global_args_for_exec();
        args.push("add".to_string());
        args.push("--".to_string());
        args.push(path.to_string());
        exec_git(&args)?;
        Ok(())
    }

    pub fn reset_index(&self) -> Result<(), GitTheseusError> {
        let mut args = self.global_args_for_exec();
        args.push("reset".to_string());
        args.push("--quiet".to_string());
        exec_git(&args)?;
        Ok(())
    }

    /// Commit whatever is staged, with the given author. Hooks are skipped and the
    /// message is stored byte for byte.
    pub fn commit_staged(
        &self,
        message: &str,
        author: &Signature,
    ) -> Result<String, GitTheseusError> {
        if author.name.trim().is_empty() || author.email.trim().is_empty() {
            return Err(GitTheseusError::Generic(
                "Missing author name or email".to_string(),
            ));
        }

        let env: Vec<(String, String)> = vec![
            ("GIT_AUTHOR_NAME".to_string(), author.name.clone()),
            ("GIT_AUTHOR_EMAIL".to_string(), author.email.clone()),
            ("GIT_AUTHOR_DATE".to_string(), author.git_date()),
        ];

        let mut args = self.global_args_for_exec();
        args.push("commit".to_string());
        args.push("--quiet".to_string());
        args.push("--no-verify".to_string());
        args.push("--cleanup=verbatim".to_string());
        args.push("--file=-".to_string());
        exec_git_stdin_with_env(&args, &env, message.as_bytes())?;

        let head = self.find_commit("HEAD")?;
        Ok(head.id())
    }
}

impl HistoryBackend for Repository {
    fn resolve_commit(&self, id: &str) -> Result<String, GitTheseusError> {
        Ok(self.find_commit(id)?.id())
    }

    fn topo_order(&self, ids: &[String]) -> Result<Vec<String>, GitTheseusError> {
        self.rev_list_topo_reverse(ids)
    }

    fn original_commit(&self, id: &str) -> Result<OriginalCommit, GitTheseusError> {
        self.find_commit(id)?.metadata()
    }

    fn stage(&mut self, path: &str) -> Result<(), GitTheseusError> {
        self.add_path(path)
    }

    fn unstage_all(&mut self) -> Result<(), GitTheseusError> {
        self.reset_index()
    }

    fn commit(&mut self, message: &str, author: &Signature) -> Result<String, GitTheseusError> {
        self.commit_staged(message, author)
    }
}

pub fn find_repository(global_args: &[String]) -> Result<Repository, GitTheseusError> {
    let mut rev_parse_args = global_args.to_owned();
    rev_parse_args.push("rev-parse".to_string());
    // Use --git-dir instead of --absolute-git-dir for compatibility with Git < 2.13
    rev_parse_args.push("--is-bare-repository".to_string());
    rev_parse_args.push("--git-dir".to_string());

    let rev_parse_output = exec_git(&rev_parse_args)?;
    let rev_parse_stdout = String::from_utf8(rev_parse_output.stdout)?;
    let mut lines = rev_parse_stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty());

    match lines.next() {
        Some("false") => {}
        Some("true") => {
            return Err(GitTheseusError::Generic(
                "A working tree is required, but the repository is bare".to_string(),
            ));
        }
        Some(other) => {
            return Err(GitTheseusError::Generic(format!(
                "Unexpected --is-bare-repository output: {}",
                other
            )));
        }
        None => {
            return Err(GitTheseusError::Generic(
                "Missing --is-bare-repository output from git rev-parse".to_string(),
            ));
        }
    };

    let git_dir_str = lines.next().ok_or_else(|| {
        GitTheseusError::Generic("Missing --git-dir output from git rev-parse".to_string())
    })?;
    let command_base_dir = resolve_command_base_dir(global_args)?;
    let git_dir = if Path::new(git_dir_str).is_relative() {
        command_base_dir.join(git_dir_str)
    } else {
        PathBuf::from(git_dir_str)
    };

    if !git_dir.is_dir() {
        return Err(GitTheseusError::Generic(format!(
            "Git directory does not exist: {}",
            git_dir.display()
        )));
    }

    let mut top_level_args = global_args.to_owned();
    top_level_args.push("rev-parse".to_string());
    top_level_args.push("--show-toplevel".to_string());
    let output = exec_git(&top_level_args)?;
    let workdir = PathBuf::from(String::from_utf8(output.stdout)?.trim());

    if !workdir.is_dir() {
        return Err(GitTheseusError::Generic(format!(
            "Work directory does not exist: {}",
            workdir.display()
        )));
    }

    // Ensure all internal git commands use a stable repository root consistently.
    let global_args = vec!["-C".to_string(), workdir.display().to_string()];
    debug_log(&format!(
        "Opened repository at {} (git dir: {})",
        workdir.display(),
        git_dir.display()
    ));

    Ok(Repository {
        global_args,
        workdir,
    })
}

fn resolve_command_base_dir(global_args: &[String]) -> Result<PathBuf, GitTheseusError> {
    let mut base = std::env::current_dir()?;
    let mut idx = 0usize;

    while idx < global_args.len() {
        if global_args[idx] == "-C" {
            let path_arg = global_args.get(idx + 1).ok_or_else(|| {
                GitTheseusError::Generic("Missing path after -C in global git args".to_string())
            })?;

            let next_base = PathBuf::from(path_arg);
            base = if next_base.is_absolute() {
                next_base
            } else {
                base.join(next_base)
            };
            idx += 2;
            continue;
        }
        idx += 1;
    }

    Ok(base)
}

pub fn find_repository_in_path(path: &str) -> Result<Repository, GitTheseusError> {
    let global_args = vec!["-C".to_string(), path.to_string()];
    find_repository(&global_args)
}

fn check_output(output: Output, args: &[String]) -> Result<Output, GitTheseusError> {
    if !output.status.success() {
        let code = output.status.code();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(GitTheseusError::GitCliError {
            code,
            stderr,
            args: args.to_vec(),
        });
    }
    Ok(output)
}

/// Helper to execute a git command
pub fn exec_git(args: &[String]) -> Result<Output, GitTheseusError> {
    debug_log(&format!("git {}", args.join(" ")));
    let output = Command::new(config::Config::get().git_cmd())
        .args(args)
        .output()?;
    check_output(output, args)
}

/// Helper to execute a git command with data provided on stdin
pub fn exec_git_stdin(args: &[String], stdin_data: &[u8]) -> Result<Output, GitTheseusError> {
    exec_git_stdin_with_env(args, &[], stdin_data)
}

/// Helper to execute a git command with data provided on stdin and additional environment variables
pub fn exec_git_stdin_with_env(
    args: &[String],
    env: &[(String, String)],
    stdin_data: &[u8],
) -> Result<Output, GitTheseusError> {
    debug_log(&format!("git {} (with stdin)", args.join(" ")));
    let mut cmd = Command::new(config::Config::get().git_cmd());
    cmd.args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    for (k, v) in env.iter() {
        cmd.env(k, v);
    }

    let mut child = cmd.spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        use std::io::Write;
        stdin.write_all(stdin_data)?;
        // Dropping stdin closes the pipe so git sees EOF.
    }

    let output = child.wait_with_output()?;
    check_output(output, args)
}
