use insta_cmd::assert_cmd_snapshot;
use rstest::rstest;

use crate::common::{
    TestRepo, merged_branches, repo, repo_with_remote, run_failing, run_ok,
    setup_snapshot_settings, stderr, stdout,
};

#[rstest]
fn test_tidy_deletes_merged_and_squashed(merged_branches: TestRepo) {
    let repo = merged_branches;
    let settings = setup_snapshot_settings(&repo);
    settings.bind(|| {
        assert_cmd_snapshot!(repo.tidybranch(&["tidy"]), @r"
        success: true
        exit_code: 0
        ----- stdout -----

        ----- stderr -----
        ✓ Set tidybranch.default-branch = main
        ✓ Deleted feat-a (already in main)
        ✓ Deleted feat-b (squashed into main as [SHA])
        ○ Kept feat-c (has changes not in main)
        ");
    });
    assert_eq!(repo.branches(), vec!["feat-c", "main"]);
}

#[rstest]
fn test_tidy_twice_deletes_nothing_the_second_time(merged_branches: TestRepo) {
    let repo = merged_branches;
    run_ok(&mut repo.tidybranch(&["tidy"]));

    let output = run_ok(&mut repo.tidybranch(&["tidy"]));
    assert_eq!(
        stderr(&output),
        "○ Kept feat-c (has changes not in main)\n○ No branches have been merged into main\n"
    );
    assert_eq!(repo.branches(), vec!["feat-c", "main"]);
}

#[rstest]
fn test_tidy_dry_run_deletes_nothing(merged_branches: TestRepo) {
    let repo = merged_branches;
    let output = run_ok(&mut repo.tidybranch(&["tidy", "--dry-run"]));
    let err = stderr(&output);
    assert!(err.contains("○ Would delete feat-a (already in main)"), "{err}");
    assert!(err.contains("○ Would delete feat-b (squashed into main as "), "{err}");
    assert!(err.contains("○ Dry run; no branches were deleted"), "{err}");
    assert_eq!(repo.branches(), vec!["feat-a", "feat-b", "feat-c", "main"]);
}

#[rstest]
fn test_tidy_json_summary(merged_branches: TestRepo) {
    let repo = merged_branches;
    let squash_commit = repo.head_sha();
    let output = run_ok(&mut repo.tidybranch(&["tidy", "--no-update", "--format", "json"]));

    let summary: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(summary["command"], "tidy");
    assert_eq!(summary["dry_run"], false);
    assert_eq!(summary["target"]["name"], "main");

    let outcomes = summary["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0]["branch"]["name"], "feat-a");
    assert_eq!(outcomes[0]["kind"], "merged");
    assert_eq!(outcomes[0]["outcome"]["status"], "deleted");
    assert_eq!(outcomes[1]["branch"]["name"], "feat-b");
    assert_eq!(outcomes[1]["kind"], "squashed");
    assert_eq!(outcomes[1]["equivalent_commit"], squash_commit.as_str());

    let kept = summary["kept"].as_array().unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0]["branch"]["name"], "feat-c");
    assert_eq!(kept[0]["kind"], "keep");
    assert_eq!(kept[0]["reason"], "has changes not in main");
}

#[rstest]
fn test_tidy_keeps_checked_out_branch(merged_branches: TestRepo) {
    let repo = merged_branches;
    repo.run_git(&["switch", "-q", "feat-a"]);

    let output = run_ok(&mut repo.tidybranch(&["tidy"]));
    let err = stderr(&output);
    assert!(
        err.contains("▲ Not deleting feat-a (already in main): it is checked out"),
        "{err}"
    );
    assert!(err.contains("✓ Deleted feat-b"), "{err}");
    assert_eq!(repo.branches(), vec!["feat-a", "feat-c", "main"]);
    assert_eq!(repo.current_branch(), "feat-a");
}

#[rstest]
fn test_tidy_skips_branch_in_other_worktree(merged_branches: TestRepo) {
    let repo = merged_branches;
    let worktree = repo.sibling_path("wt-feat-b");
    repo.run_git(&["worktree", "add", "-q", worktree.to_str().unwrap(), "feat-b"]);

    let output = run_ok(&mut repo.tidybranch(&["tidy"]));
    let err = stderr(&output);
    assert!(
        err.contains("▲ Not deleting feat-b (squashed into main as "),
        "{err}"
    );
    assert!(err.contains("checked out in worktree at"), "{err}");
    assert!(err.contains("wt-feat-b"), "{err}");
    assert_eq!(repo.branches(), vec!["feat-b", "feat-c", "main"]);
}

#[rstest]
fn test_tidy_detects_rebased_branch(repo: TestRepo) {
    repo.run_git(&["switch", "-q", "-c", "feat-r"]);
    repo.commit_file("r.txt", "r\n", "Add r");
    let commit = repo.head_sha();
    repo.run_git(&["switch", "-q", "main"]);
    repo.commit_file("m.txt", "m\n", "Unrelated work");
    repo.run_git(&["cherry-pick", commit.as_str()]);

    let output = run_ok(&mut repo.tidybranch(&["tidy"]));
    assert!(
        stderr(&output).contains("✓ Deleted feat-r (every commit has an equivalent in main)"),
        "{}",
        stderr(&output)
    );
    assert_eq!(repo.branches(), vec!["main"]);
}

#[rstest]
fn test_tidy_detached_head(merged_branches: TestRepo) {
    let repo = merged_branches;
    repo.run_git(&["switch", "-q", "--detach", "feat-a"]);

    run_ok(&mut repo.tidybranch(&["tidy"]));
    assert_eq!(repo.branches(), vec!["feat-c", "main"]);
}

#[rstest]
fn test_tidy_uses_remote_target_when_ahead(#[from(repo_with_remote)] repo: TestRepo) {
    repo.merge_upstream("feat-x");
    let settings = setup_snapshot_settings(&repo);
    settings.bind(|| {
        assert_cmd_snapshot!(repo.tidybranch(&["tidy"]), @r"
        success: true
        exit_code: 0
        ----- stdout -----

        ----- stderr -----
        ✓ Set tidybranch.default-branch = main
        ✓ Set tidybranch.default-remote = origin
        ✓ Updated 1 remote: origin
        ✓ Deleted feat-x (same commit as origin/main)
        ");
    });
    assert_eq!(repo.branches(), vec!["main"]);
    // tidy never moves the primary branch
    assert_ne!(
        repo.git_output(&["rev-parse", "main"]),
        repo.git_output(&["rev-parse", "origin/main"])
    );
}

#[rstest]
fn test_tidy_no_update_uses_stale_refs(#[from(repo_with_remote)] repo: TestRepo) {
    repo.merge_upstream("feat-x");

    let output = run_ok(&mut repo.tidybranch(&["tidy", "--no-update"]));
    let err = stderr(&output);
    assert!(!err.contains("Updated"), "{err}");
    assert!(err.contains("○ Kept feat-x (has changes not in main)"), "{err}");
    assert_eq!(repo.branches(), vec!["feat-x", "main"]);
}

#[rstest]
fn test_tidy_failure_names_the_state(repo: TestRepo) {
    repo.run_git(&["config", "--local", "tidybranch.default-branch", "trunk"]);
    repo.run_git(&["branch", "merged"]);

    let output = run_failing(&mut repo.tidybranch(&["tidy", "--no-update"]));
    assert_eq!(
        stderr(&output),
        "✗ Aborted while classifying branches: tidy did not reach Classified\n\
         ✗ Primary branch trunk does not exist\n"
    );
    assert_eq!(repo.branches(), vec!["main", "merged"]);
}
