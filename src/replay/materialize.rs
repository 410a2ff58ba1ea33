use std::collections::BTreeSet;

/// Split into physical lines the way a line scanner does: on `\n`, dropping a
/// trailing `\r`. A final unterminated segment is a line; an empty one is not.
pub fn physical_lines(bytes: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    (!bytes.is_empty())
        .then(|| body.split(|b| *b == b'\n'))
        .into_iter()
        .flatten()
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

/// Keep only the 1-based lines of `pristine` that are in `visible`, in their
/// original order, joined by `\n` with no trailing newline.
pub fn materialize(pristine: &[u8], visible: &BTreeSet<u64>) -> Vec<u8> {
    let mut out = Vec::with_capacity(pristine.len());
    let mut first = true;
    for (idx, line) in physical_lines(pristine).enumerate() {
        if !visible.contains(&(idx as u64 + 1)) {
            continue;
        }
        if !first {
            out.push(b'\n');
        }
        out.extend_from_slice(line);
        first = false;
    }
    out
}
