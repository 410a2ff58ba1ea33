pub mod accumulator;
pub mod driver;
pub mod materialize;
pub mod ordering;
pub mod snapshot;
pub mod worktree;
