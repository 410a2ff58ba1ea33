use std::collections::{BTreeMap, BTreeSet};

/// Per-file set of visible line numbers. Sets only ever grow during a run.
#[derive(Debug, Default, Clone)]
pub struct LineAccumulator {
    visible: BTreeMap<String, BTreeSet<u64>>,
}

impl LineAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union `lines` into the set for `path` and return the updated set.
    /// Numbers past the end of the file are kept; they just never match.
    pub fn accumulate(&mut self, path: &str, lines: &[u64]) -> &BTreeSet<u64> {
        let set = self.visible.entry(path.to_string()).or_default();
        set.extend(lines.iter().copied());
        set
    }
}
