//! Replays an ordered timeline against a repository: for each original commit,
//! materialize the affected files, stage them, commit (or simulate), then put
//! the working tree back.

use std::io::Write;

use crate::descriptor::Descriptor;
use crate::error::GitTheseusError;
use crate::git::backend::{HistoryBackend, OriginalCommit, Signature};
use crate::replay::accumulator::LineAccumulator;
use crate::replay::materialize::materialize;
use crate::replay::ordering::TimelineEntry;
use crate::replay::snapshot::SnapshotCache;
use crate::replay::worktree::WorkTree;
use crate::utils::{debug_log, debug_performance_log, log_message, short_id};

/// Placeholder id reported for commits that a dry run did not create.
pub const ZERO_COMMIT_ID: &str = "0000000000000000000000000000000000000000";

const MESSAGE_TAG: &str = "[git-theseus]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    PendingSteps,
    Materializing,
    Staging,
    Committing,
    RollingBack,
    Drained,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Full id of the original commit this step was modelled on.
    pub original: String,
    /// Id of the new commit, or `ZERO_COMMIT_ID` in a dry run.
    pub committed: String,
    pub files: Vec<String>,
    pub terminal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub dry_run: bool,
    pub steps: Vec<StepOutcome>,
}

/// Everything that changes over the course of one run.
#[derive(Debug)]
pub struct RunContext {
    pub snapshots: SnapshotCache,
    pub accumulator: LineAccumulator,
    pub step: usize,
    pub state: DriverState,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            snapshots: SnapshotCache::new(),
            accumulator: LineAccumulator::new(),
            step: 0,
            state: DriverState::PendingSteps,
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Driver<'a, B: HistoryBackend + ?Sized, W: WorkTree + ?Sized> {
    backend: &'a mut B,
    tree: &'a mut W,
    out: &'a mut dyn Write,
    dry_run: bool,
    ctx: RunContext,
}

impl<'a, B: HistoryBackend + ?Sized, W: WorkTree + ?Sized> Driver<'a, B, W> {
    /// `out` receives the log-style rendering of each simulated commit in a dry run.
    pub fn new(
        backend: &'a mut B,
        tree: &'a mut W,
        out: &'a mut dyn Write,
        dry_run: bool,
    ) -> Self {
        Self {
            backend,
            tree,
            out,
            dry_run,
            ctx: RunContext::new(),
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Run every step of `timeline`, then restore all captured files.
    ///
    /// A failure mid-run leaves the current step's files as materialized; only
    /// steps that committed successfully have been rolled back.
    pub fn run(
        &mut self,
        descriptor: &Descriptor,
        timeline: &[TimelineEntry],
    ) -> Result<RunReport, GitTheseusError> {
        for path in descriptor.file_paths() {
            self.ctx.snapshots.capture(&*self.tree, &path)?;
        }
        debug_log(&format!(
            "Captured {} pristine file(s); replaying {} commit(s), dry run = {}",
            self.ctx.snapshots.len(),
            timeline.len(),
            self.dry_run
        ));

        let mut steps = Vec::with_capacity(timeline.len());
        for (i, entry) in timeline.iter().enumerate() {
            let terminal = i + 1 >= timeline.len();
            if let Some(outcome) = self.run_step(descriptor, entry, terminal)? {
                steps.push(outcome);
            }
        }

        self.drain()?;

        Ok(RunReport {
            dry_run: self.dry_run,
            steps,
        })
    }

    fn run_step(
        &mut self,
        descriptor: &Descriptor,
        step: &TimelineEntry,
        terminal: bool,
    ) -> Result<Option<StepOutcome>, GitTheseusError> {
        let commit_id = step.resolved.as_str();
        let affected = descriptor.entries_for_any(step.spellings.as_slice());
        if affected.is_empty() {
            debug_log(&format!("No entries for {}, skipping", commit_id));
            return Ok(None);
        }
        let started = std::time::Instant::now();

        let mut touched = Vec::with_capacity(affected.len());
        for (path, lines) in &affected {
            self.ctx.state = DriverState::Materializing;
            let visible = self.ctx.accumulator.accumulate(path, lines);
            let snapshot = self.ctx.snapshots.get(path).ok_or_else(|| {
                GitTheseusError::Generic(format!("No original file contents of '{}'", path))
            })?;
            let content = materialize(&snapshot.bytes, visible);
            self.tree.write(path, &content, snapshot.mode)?;
            touched.push(path.clone());

            self.ctx.state = DriverState::Staging;
            self.backend
                .stage(path)
                .map_err(|e| GitTheseusError::StagingError {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
        }

        self.ctx.state = DriverState::Committing;
        let original = self.backend.original_commit(commit_id).map_err(|e| {
            GitTheseusError::CommitError {
                commit_id: commit_id.to_string(),
                reason: format!("failed to retrieve the original commit: {}", e),
            }
        })?;
        let message = compose_message(&original);

        let committed = if self.dry_run {
            let rendering = render_commit(ZERO_COMMIT_ID, &original.author, &message);
            self.out.write_all(rendering.as_bytes())?;
            self.out.flush()?;
            self.backend
                .unstage_all()
                .map_err(|e| GitTheseusError::StagingError {
                    path: touched.join(", "),
                    reason: format!("failed to discard the staged changes: {}", e),
                })?;
            ZERO_COMMIT_ID.to_string()
        } else {
            self.backend
                .commit(&message, &original.author)
                .map_err(|e| GitTheseusError::CommitError {
                    commit_id: original.id.clone(),
                    reason: e.to_string(),
                })?
        };

        if !terminal {
            self.ctx.state = DriverState::RollingBack;
            for path in &touched {
                self.ctx.snapshots.restore(&mut *self.tree, path)?;
            }
        }

        log_message(&format!("committed: {} (dry-run: {})", committed, self.dry_run));
        debug_performance_log(&format!(
            "step {} ({} -> {}) took {:?}",
            self.ctx.step,
            short_id(&original.id),
            short_id(&committed),
            started.elapsed()
        ));
        self.ctx.step += 1;

        Ok(Some(StepOutcome {
            original: original.id,
            committed,
            files: touched,
            terminal,
        }))
    }

    fn drain(&mut self) -> Result<(), GitTheseusError> {
        self.ctx.state = DriverState::RollingBack;
        if let Err(e) = self.ctx.snapshots.restore_all(&mut *self.tree) {
            log_message(&format!("failed to restore the file on wrap-up: {}", e));
            return Err(e);
        }
        self.ctx.state = DriverState::Drained;
        Ok(())
    }
}

/// Message of a synthesized commit: the original message plus a provenance trailer.
pub fn compose_message(original: &OriginalCommit) -> String {
    format!(
        "{} {}\n\ngit-theseus does this migration commit.\nThe original commit is {}",
        MESSAGE_TAG, original.message, original.id
    )
}

/// Render a commit the way `git log` prints one.
pub fn render_commit(id: &str, author: &Signature, message: &str) -> String {
    let mut rendered = format!(
        "commit {}\nAuthor: {} <{}>\nDate:   {}\n\n",
        id,
        author.name,
        author.email,
        author.log_date()
    );
    for line in message.lines() {
        if line.is_empty() {
            rendered.push('\n');
        } else {
            rendered.push_str("    ");
            rendered.push_str(line);
            rendered.push('\n');
        }
    }
    rendered
}
