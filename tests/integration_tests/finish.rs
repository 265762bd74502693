use insta_cmd::assert_cmd_snapshot;
use rstest::rstest;

use crate::common::{
    TestRepo, merged_branches, repo, repo_with_remote, run_failing, run_ok,
    setup_snapshot_settings, stderr,
};

#[rstest]
fn test_finish_syncs_switches_and_deletes(#[from(repo_with_remote)] repo: TestRepo) {
    repo.merge_upstream("feat-x");
    repo.run_git(&["switch", "-q", "feat-x"]);

    let settings = setup_snapshot_settings(&repo);
    settings.bind(|| {
        assert_cmd_snapshot!(repo.tidybranch(&["finish"]), @r"
        success: true
        exit_code: 0
        ----- stdout -----

        ----- stderr -----
        ✓ Set tidybranch.default-branch = main
        ✓ Set tidybranch.default-remote = origin
        ✓ Updated 1 remote: origin
        ✓ Deleted feat-x (same commit as main)
        ");
    });

    assert_eq!(repo.current_branch(), "main");
    assert_eq!(repo.branches(), vec!["main"]);
    assert_eq!(
        repo.git_output(&["rev-parse", "main"]),
        repo.git_output(&["rev-parse", "origin/main"])
    );
    // The working tree moved with the branch
    assert!(repo.root_path().join("feat-x.txt").exists());
}

#[rstest]
fn test_finish_from_primary(#[from(repo_with_remote)] repo: TestRepo) {
    repo.merge_upstream("feat-x");

    run_ok(&mut repo.tidybranch(&["finish"]));
    assert_eq!(repo.current_branch(), "main");
    assert_eq!(repo.branches(), vec!["main"]);
    assert!(repo.root_path().join("feat-x.txt").exists());
}

#[rstest]
fn test_finish_keeps_unmerged_branch(#[from(repo_with_remote)] repo: TestRepo) {
    repo.run_git(&["switch", "-q", "-c", "wip"]);
    repo.commit_file("wip.txt", "wip\n", "Work in progress");

    let output = run_ok(&mut repo.tidybranch(&["finish"]));
    let err = stderr(&output);
    assert!(err.contains("○ Kept wip (has changes not in main)"), "{err}");
    assert_eq!(repo.current_branch(), "main");
    assert_eq!(repo.branches(), vec!["main", "wip"]);
}

#[rstest]
fn test_finish_stops_when_primary_diverged(#[from(repo_with_remote)] repo: TestRepo) {
    repo.merge_upstream("feat-x");
    repo.commit_file("local.txt", "local\n", "Local only");
    repo.run_git(&["switch", "-q", "feat-x"]);

    let output = run_failing(&mut repo.tidybranch(&["finish"]));
    let err = stderr(&output);
    assert!(
        err.contains("Aborted while syncing main: cannot fast-forward to origin/main"),
        "{err}"
    );
    assert!(err.contains("no branches were deleted"), "{err}");
    assert_eq!(repo.current_branch(), "feat-x");
    assert_eq!(repo.branches(), vec!["feat-x", "main"]);
}

#[rstest]
fn test_finish_stops_when_switch_fails(#[from(repo_with_remote)] repo: TestRepo) {
    repo.run_git(&["switch", "-q", "-c", "feat-y"]);
    repo.commit("Change file on feat-y");
    std::fs::write(repo.root_path().join("file.txt"), "uncommitted\n").unwrap();

    let output = run_failing(&mut repo.tidybranch(&["finish"]));
    let err = stderr(&output);
    assert!(err.contains("Aborted while switching to main"), "{err}");
    assert!(err.contains("Commit or stash changes first"), "{err}");
    assert_eq!(repo.current_branch(), "feat-y");
    assert_eq!(repo.branches(), vec!["feat-y", "main"]);
}

#[rstest]
fn test_finish_requires_remote(merged_branches: TestRepo) {
    let repo = merged_branches;
    let output = run_failing(&mut repo.tidybranch(&["finish"]));
    let err = stderr(&output);
    assert!(
        err.contains("Cannot determine default-remote: no remote named upstream or origin"),
        "{err}"
    );
    assert_eq!(repo.branches(), vec!["feat-a", "feat-b", "feat-c", "main"]);
}

#[rstest]
fn test_finish_detached_head(#[from(repo_with_remote)] repo: TestRepo) {
    repo.merge_upstream("feat-x");
    repo.run_git(&["switch", "-q", "--detach", "HEAD"]);

    let output = run_ok(&mut repo.tidybranch(&["finish"]));
    let err = stderr(&output);
    assert!(
        err.contains("▲ Not on a branch (detached HEAD); nothing is deferred\n"),
        "{err}"
    );
    assert_eq!(repo.current_branch(), "main");
    assert_eq!(repo.branches(), vec!["main"]);
}

#[rstest]
fn test_finish_dry_run_still_syncs(#[from(repo_with_remote)] repo: TestRepo) {
    repo.merge_upstream("feat-x");
    repo.run_git(&["switch", "-q", "feat-x"]);

    let output = run_ok(&mut repo.tidybranch(&["finish", "--dry-run"]));
    assert!(
        stderr(&output).contains("○ Would delete feat-x (same commit as main)"),
        "{}",
        stderr(&output)
    );
    assert_eq!(repo.current_branch(), "main");
    assert_eq!(repo.branches(), vec!["feat-x", "main"]);
}

#[rstest]
fn test_finish_prefers_upstream_remote(#[from(repo_with_remote)] mut repo: TestRepo) {
    repo.setup_remote("upstream");
    repo.run_git(&["config", "--local", "tidybranch.default-branch", "main"]);

    run_ok(&mut repo.tidybranch(&["finish"]));
    assert_eq!(
        repo.config("tidybranch.default-remote").as_deref(),
        Some("upstream")
    );
}
