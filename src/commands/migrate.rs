use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::descriptor::Descriptor;
use crate::error::GitTheseusError;
use crate::git::find_repository_in_path;
use crate::replay::driver::{Driver, RunReport};
use crate::replay::ordering::order_commit_ids;
use crate::replay::worktree::DiskWorkTree;
use crate::utils::{debug_log, short_id};

#[derive(Debug, Clone)]
pub struct MigrateOptions {
    pub input_file: PathBuf,
    pub dry_run: bool,
    /// Directory inside the target repository; descriptor paths are taken
    /// relative to that repository's workdir.
    pub repo_dir: String,
}

/// Load the descriptor, open the repository and replay the timeline on disk.
pub fn run_migration(
    options: &MigrateOptions,
    out: &mut dyn Write,
) -> Result<RunReport, GitTheseusError> {
    let bytes = fs::read(&options.input_file)
        .map_err(|e| GitTheseusError::io_at(&options.input_file, e))?;
    let descriptor = Descriptor::parse(&bytes).map_err(|e| match e {
        GitTheseusError::DecodeError(msg) => GitTheseusError::DecodeError(format!(
            "{}: {}",
            options.input_file.display(),
            msg
        )),
        other => other,
    })?;
    debug_log(&format!(
        "Loaded {} entries from {}",
        descriptor.entries().len(),
        options.input_file.display()
    ));

    let mut repo = find_repository_in_path(&options.repo_dir)?;
    let mut tree = DiskWorkTree::new(repo.workdir());

    let timeline = order_commit_ids(&repo, &descriptor.commit_ids())?;
    debug_log(&format!(
        "Timeline: {}",
        timeline
            .iter()
            .map(|entry| short_id(&entry.resolved))
            .collect::<Vec<_>>()
            .join(" -> ")
    ));

    Driver::new(&mut repo, &mut tree, out, options.dry_run).run(&descriptor, &timeline)
}

pub fn handle_migrate(options: &MigrateOptions) {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = run_migration(options, &mut out) {
        eprintln!("git-theseus: {}", e);
        std::process::exit(1);
    }
}
