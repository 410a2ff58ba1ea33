pub mod test_repo;

/// Build a flat descriptor JSON array from `(commit, file, [lines])` triples.
#[macro_export]
macro_rules! descriptor {
    ($(($commit:expr, $file:expr, [$($line:expr),* $(,)?])),* $(,)?) => {
        serde_json::json!([
            $({
                "commit_id": $commit,
                "file_path": $file,
                "line_nums": [$($line),*]
            }),*
        ])
        .to_string()
    };
}
