#[macro_use]
mod repos;
use predicates::prelude::*;
use repos::test_repo::TestRepo;

const ZERO: &str = "0000000000000000000000000000000000000000";

/// Three commits growing `old.txt` by one line each, plus the
/// untracked `new.txt` that should be rebuilt along the same history.
fn abc_repo() -> (TestRepo, [String; 3]) {
    let repo = TestRepo::new();
    repo.write_file("old.txt", "A\n");
    let a = repo.commit_as(
        "First commit",
        "moznion",
        "moznion@mail.moznion.net",
        "2023-09-27T18:56:49+09:00",
    );
    repo.write_file("old.txt", "A\nB\n");
    let b = repo.commit_as(
        "Second commit",
        "dummy",
        "dummy@example.com",
        "2023-09-27T18:57:22+09:00",
    );
    repo.write_file("old.txt", "A\nB\nC\n");
    let c = repo.commit_as(
        "Third commit",
        "moznion",
        "moznion@mail.moznion.net",
        "2023-09-27T18:57:38+09:00",
    );
    repo.write_file("new.txt", "A\nB\nC\n");
    (repo, [a, b, c])
}

#[test]
fn test_rebuilds_file_commit_by_commit() {
    let (repo, [a, b, c]) = abc_repo();
    let json = descriptor![
        (&a, "new.txt", [1]),
        (&b, "new.txt", [1, 2]),
        (&c, "new.txt", [1, 2, 3]),
    ];

    let (mut cmd, _input) = repo.theseus(&json);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("(dry-run: false)").count(3));

    assert_eq!(repo.commit_count(), 6);
    assert_eq!(repo.show_file("HEAD~2", "new.txt"), "A");
    assert_eq!(repo.show_file("HEAD~1", "new.txt"), "A\nB");
    assert_eq!(repo.show_file("HEAD", "new.txt"), "A\nB\nC");

    let git2 = repo.git2();
    let head = git2.head().unwrap().peel_to_commit().unwrap();
    let middle = head.parent(0).unwrap();
    assert_eq!(middle.author().name(), Some("dummy"));
    assert_eq!(middle.author().email(), Some("dummy@example.com"));
    let original_b = git2
        .find_commit(git2::Oid::from_str(&b).unwrap())
        .unwrap();
    assert_eq!(middle.author().when().seconds(), original_b.author().when().seconds());
    assert_eq!(middle.author().when().offset_minutes(), 540);
    assert_eq!(head.committer().name(), Some("Test User"));

    let message = repo.message("HEAD");
    assert!(message.starts_with(
        "[git-theseus] Third commit\n\ngit-theseus does this migration commit.\n"
    ));
    assert!(message.contains(&format!("The original commit is {}", c)));

    assert_eq!(repo.read_file("new.txt").unwrap(), "A\nB\nC\n");
}

#[test]
fn test_dry_run_creates_no_commits() {
    let (repo, [a, b, c]) = abc_repo();
    let json = descriptor![
        (&a, "new.txt", [1]),
        (&b, "new.txt", [1, 2]),
        (&c, "new.txt", [1, 2, 3]),
    ];
    let before = repo.commit_count();

    let (mut cmd, _input) = repo.theseus(&json);
    cmd.arg("--dryrun")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("commit {}", ZERO)).count(3))
        .stdout(predicate::str::contains("Author: dummy <dummy@example.com>"))
        .stdout(predicate::str::contains("Date:   Wed Sep 27 18:57:22 2023 +0900"))
        .stdout(predicate::str::contains(format!(
            "    The original commit is {}",
            a
        )))
        .stderr(predicate::str::contains(format!("committed: {} (dry-run: true)", ZERO)));

    assert_eq!(repo.commit_count(), before);
    assert!(repo.staged_paths().is_empty());
    assert_eq!(repo.read_file("new.txt").unwrap(), "A\nB\nC\n");
}

#[test]
fn test_reverse_ordered_descriptor_gives_same_history() {
    let (repo, [a, b, c]) = abc_repo();
    let json = descriptor![
        (&c, "new.txt", [1, 2, 3]),
        (&b, "new.txt", [1, 2]),
        (&a, "new.txt", [1]),
    ];

    let (mut cmd, _input) = repo.theseus(&json);
    cmd.assert().success();

    assert_eq!(repo.show_file("HEAD~2", "new.txt"), "A");
    assert_eq!(repo.show_file("HEAD~1", "new.txt"), "A\nB");
    assert_eq!(repo.show_file("HEAD", "new.txt"), "A\nB\nC");
    assert!(repo.message("HEAD~2").contains(&a));
}

#[test]
fn test_keyed_descriptor_with_several_files() {
    let (repo, [a, b, c]) = abc_repo();
    repo.write_file("pkg/split.txt", "x1\nx2\r\ny1\n");
    let mut keyed = serde_json::Map::new();
    keyed.insert(a, serde_json::json!({ "new.txt": [1], "pkg/split.txt": [1] }));
    keyed.insert(b, serde_json::json!({ "new.txt": [2] }));
    keyed.insert(c, serde_json::json!({ "new.txt": [3], "pkg/split.txt": [3] }));
    let json = serde_json::Value::Object(keyed).to_string();

    let (mut cmd, _input) = repo.theseus(&json);
    cmd.assert().success();

    assert_eq!(repo.show_file("HEAD~2", "pkg/split.txt"), "x1");
    assert_eq!(repo.show_file("HEAD~1", "pkg/split.txt"), "x1");
    assert_eq!(repo.show_file("HEAD~1", "new.txt"), "A\nB");
    assert_eq!(repo.show_file("HEAD", "pkg/split.txt"), "x1\ny1");
    assert_eq!(repo.read_file("pkg/split.txt").unwrap(), "x1\nx2\r\ny1\n");
}

#[test]
fn test_abbreviated_ids_and_c_flag_from_elsewhere() {
    let (repo, [a, b, c]) = abc_repo();
    let json = descriptor![
        (&a[..10], "new.txt", [1]),
        (&b[..10], "new.txt", [2]),
        (&c, "new.txt", [3]),
    ];
    let elsewhere = tempfile::tempdir().unwrap();

    let (mut cmd, _input) = repo.theseus_from(elsewhere.path(), &json);
    cmd.arg("-C").arg(repo.path()).assert().success();

    assert_eq!(repo.commit_count(), 6);
    assert!(repo.message("HEAD~2").contains(&format!("The original commit is {}", a)));
    assert_eq!(repo.show_file("HEAD", "new.txt"), "A\nB\nC");
}

#[test]
fn test_missing_input_file_flag_is_usage_error() {
    let repo = TestRepo::new();
    assert_cmd::Command::cargo_bin("git-theseus")
        .unwrap()
        .current_dir(repo.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--input-file"));
}

#[test]
fn test_unknown_commit_fails_without_touching_files() {
    let (repo, [a, _, _]) = abc_repo();
    let json = descriptor![
        (&a, "new.txt", [1]),
        ("0123456789abcdef0123456789abcdef01234567", "new.txt", [2]),
    ];
    let before = repo.commit_count();

    let (mut cmd, _input) = repo.theseus(&json);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Ordering error"));

    assert_eq!(repo.commit_count(), before);
    assert_eq!(repo.read_file("new.txt").unwrap(), "A\nB\nC\n");
}

#[test]
fn test_missing_target_file_fails_before_commits() {
    let (repo, [a, _, _]) = abc_repo();
    let json = descriptor![(&a, "absent.txt", [1])];
    let before = repo.commit_count();

    let (mut cmd, _input) = repo.theseus(&json);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("absent.txt"));

    assert_eq!(repo.commit_count(), before);
}

#[test]
fn test_malformed_descriptor_is_decode_error() {
    let repo = TestRepo::new();
    let (mut cmd, _input) = repo.theseus("{\"commit\": 1}");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Decode error"));
}

#[test]
fn test_short_and_full_id_of_one_commit_make_one_commit() {
    let (repo, [a, b, _]) = abc_repo();
    let json = descriptor![
        (&a[..10], "new.txt", [1]),
        (&a, "new.txt", [2]),
        (&b, "new.txt", [3]),
    ];

    let (mut cmd, _input) = repo.theseus(&json);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("(dry-run: false)").count(2));

    assert_eq!(repo.commit_count(), 5);
    assert_eq!(repo.show_file("HEAD~1", "new.txt"), "A\nB");
    assert!(repo.message("HEAD~1").contains(&format!("The original commit is {}", a)));
}
