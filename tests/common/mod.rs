//! Shared helpers for integration tests.
//!
//! Every `TestRepo` lives in its own temp directory with an isolated git
//! config, fixed commit dates and a fixed identity, so commit ids are the
//! same on every run.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use insta_cmd::get_cargo_bin;
use tempfile::TempDir;

/// Fixed timestamp for deterministic commits (2025-01-01T00:00:00Z).
pub const TEST_EPOCH: u64 = 1735689600;

#[cfg(unix)]
pub const NULL_DEVICE: &str = "/dev/null";
#[cfg(windows)]
pub const NULL_DEVICE: &str = "NUL";

/// Fresh repository on `main` with one commit.
#[rstest::fixture]
pub fn repo() -> TestRepo {
    TestRepo::new()
}

/// Repository with an `origin` remote that has `main` pushed.
#[rstest::fixture]
pub fn repo_with_remote(mut repo: TestRepo) -> TestRepo {
    repo.setup_remote("origin");
    repo
}

/// The three-branch layout every tidy test starts from:
///
/// - `feat-a`: fast-forward merged into `main`
/// - `feat-b`: two commits, squash-merged into `main` as one commit
/// - `feat-c`: work that never reached `main`
#[rstest::fixture]
pub fn merged_branches(repo: TestRepo) -> TestRepo {
    repo.run_git(&["switch", "-q", "-c", "feat-a"]);
    repo.commit_file("a.txt", "a\n", "Add a");
    repo.run_git(&["switch", "-q", "main"]);
    repo.run_git(&["merge", "-q", "--ff-only", "feat-a"]);

    repo.run_git(&["switch", "-q", "-c", "feat-b"]);
    repo.commit_file("b.txt", "draft\n", "WIP b");
    repo.commit_file("b.txt", "done\n", "Finish b");
    repo.run_git(&["switch", "-q", "main"]);
    repo.run_git(&["merge", "-q", "--squash", "feat-b"]);
    repo.run_git(&["commit", "-q", "-m", "Feature B (#12)"]);

    repo.run_git(&["switch", "-q", "-c", "feat-c", "feat-a"]);
    repo.commit_file("c.txt", "c\n", "Add c");
    repo.run_git(&["switch", "-q", "main"]);
    repo
}

/// Configure a git command with isolated environment for testing.
pub fn configure_git_cmd(cmd: &mut Command, git_config_path: &Path) {
    cmd.env("GIT_CONFIG_GLOBAL", git_config_path);
    cmd.env("GIT_CONFIG_SYSTEM", NULL_DEVICE);
    cmd.env("GIT_AUTHOR_DATE", "2025-01-01T00:00:00Z");
    cmd.env("GIT_COMMITTER_DATE", "2025-01-01T00:00:00Z");
    cmd.env("LC_ALL", "C");
    cmd.env("LANG", "C");
    cmd.env("SOURCE_DATE_EPOCH", TEST_EPOCH.to_string());
    cmd.env("GIT_TERMINAL_PROMPT", "0");
}

/// Prepare a `tidybranch` invocation: host `GIT_*` variables cleared, plain
/// output, warnings logged.
pub fn configure_cli_command(cmd: &mut Command) {
    for (key, _) in std::env::vars() {
        if key.starts_with("GIT_") {
            cmd.env_remove(&key);
        }
    }
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("CLICOLOR_FORCE");
    cmd.env("COLUMNS", "150");
    cmd.env("RUST_LOG", "warn");
}

#[must_use]
pub fn tidybranch_command() -> Command {
    let mut cmd = Command::new(get_cargo_bin("tidybranch"));
    configure_cli_command(&mut cmd);
    cmd
}

pub fn check_git_status(output: &Output, cmd_desc: &str) {
    if !output.status.success() {
        panic!(
            "git {} failed:\nstdout: {}\nstderr: {}",
            cmd_desc,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// Snapshot settings that hide commit ids and this repo's temp directory.
pub fn setup_snapshot_settings(repo: &TestRepo) -> insta::Settings {
    let mut settings = insta::Settings::clone_current();
    settings.add_filter(&repo.temp_dir.path().display().to_string(), "[TMP]");
    if let Ok(canonical) = dunce::canonicalize(repo.temp_dir.path()) {
        settings.add_filter(&canonical.display().to_string(), "[TMP]");
    }
    settings.add_filter(r"\b[0-9a-f]{7,40}\b", "[SHA]");
    settings
}

/// stderr of a finished command, lossily decoded.
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Run and require exit status 0, showing both streams otherwise.
pub fn run_ok(cmd: &mut Command) -> Output {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed ({}):\nstdout: {}\nstderr: {}",
        output.status,
        stdout(&output),
        stderr(&output)
    );
    output
}

/// Run and require exit status 1.
pub fn run_failing(cmd: &mut Command) -> Output {
    let output = cmd.output().unwrap();
    assert_eq!(
        output.status.code(),
        Some(1),
        "expected failure:\nstdout: {}\nstderr: {}",
        stdout(&output),
        stderr(&output)
    );
    output
}

pub struct TestRepo {
    temp_dir: TempDir, // Must keep to ensure cleanup on drop
    root: PathBuf,
    /// Git config file with test settings (identity, default branch)
    git_config_path: PathBuf,
}

impl TestRepo {
    /// Repository on `main` with one commit.
    pub fn new() -> Self {
        let repo = Self::empty();
        repo.commit("Initial commit");
        repo
    }

    /// Repository with no commits and no branches.
    pub fn empty() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("repo");
        std::fs::create_dir(&root).unwrap();
        // Resolve symlinks so paths match what git reports (macOS /var)
        let root = dunce::canonicalize(&root).unwrap();

        let git_config_path = temp_dir.path().join("test-gitconfig");
        std::fs::write(
            &git_config_path,
            "[user]\n\tname = Test User\n\temail = test@example.com\n\
             [advice]\n\tdetachedHead = false\n\
             [init]\n\tdefaultBranch = main\n",
        )
        .unwrap();

        let repo = Self {
            temp_dir,
            root,
            git_config_path,
        };
        repo.run_git(&["init", "-q"]);
        repo
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// Directory next to the repository, for remotes and extra worktrees.
    pub fn sibling_path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    pub fn configure_git_cmd(&self, cmd: &mut Command) {
        configure_git_cmd(cmd, &self.git_config_path);
    }

    #[must_use]
    pub fn git_command(&self) -> Command {
        let mut cmd = Command::new("git");
        self.configure_git_cmd(&mut cmd);
        cmd.current_dir(&self.root);
        cmd
    }

    /// Run a git command in the repo root, panicking on failure.
    pub fn run_git(&self, args: &[&str]) {
        let output = self.git_command().args(args).output().unwrap();
        check_git_status(&output, &args.join(" "));
    }

    pub fn run_git_in(&self, dir: &Path, args: &[&str]) {
        let output = self
            .git_command()
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        check_git_status(&output, &args.join(" "));
    }

    /// Run a git command and return stdout as a trimmed string.
    pub fn git_output(&self, args: &[&str]) -> String {
        let output = self.git_command().args(args).output().unwrap();
        check_git_status(&output, &args.join(" "));
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// `tidybranch` running in the repo root with this repo's git settings.
    #[must_use]
    pub fn tidybranch(&self, args: &[&str]) -> Command {
        let mut cmd = tidybranch_command();
        self.configure_git_cmd(&mut cmd);
        cmd.current_dir(&self.root);
        cmd.args(args);
        cmd
    }

    /// Create a commit that writes `message` to `file.txt`.
    pub fn commit(&self, message: &str) {
        self.commit_file("file.txt", message, message);
    }

    pub fn commit_file(&self, file: &str, content: &str, message: &str) {
        std::fs::write(self.root.join(file), content).unwrap();
        self.run_git(&["add", file]);
        self.run_git(&["commit", "-q", "-m", message]);
    }

    pub fn head_sha(&self) -> String {
        self.git_output(&["rev-parse", "HEAD"])
    }

    pub fn current_branch(&self) -> String {
        self.git_output(&["branch", "--show-current"])
    }

    /// Local branch names, sorted.
    pub fn branches(&self) -> Vec<String> {
        self.git_output(&["for-each-ref", "--format=%(refname:short)", "refs/heads/"])
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn config(&self, key: &str) -> Option<String> {
        let output = self
            .git_command()
            .args(["config", "--local", "--get", key])
            .output()
            .unwrap();
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Create a bare `<name>.git` next to the repo, add it as remote `name`
    /// and push `main` to it.
    pub fn setup_remote(&mut self, name: &str) -> PathBuf {
        self.setup_remote_for(name, "main")
    }

    /// Like [`Self::setup_remote`], pushing `branch` instead of `main`.
    pub fn setup_remote_for(&mut self, name: &str, branch: &str) -> PathBuf {
        let remote_path = self.sibling_path(&format!("{name}.git"));
        std::fs::create_dir(&remote_path).unwrap();
        self.run_git_in(&remote_path, &["init", "-q", "--bare", "--initial-branch", branch]);
        let remote_path = dunce::canonicalize(&remote_path).unwrap();

        self.run_git(&["remote", "add", name, remote_path.to_str().unwrap()]);
        self.run_git(&["push", "-q", name, branch]);
        self.run_git(&["fetch", "-q", name]);
        remote_path
    }

    /// Push a new one-commit `branch` to `origin` and fast-forward the
    /// remote's `main` to it from another clone. Locally, `origin/main` only
    /// moves on the next fetch.
    pub fn merge_upstream(&self, branch: &str) {
        self.run_git(&["switch", "-q", "-c", branch, "main"]);
        self.commit_file(&format!("{branch}.txt"), "x\n", &format!("Add {branch}"));
        self.run_git(&["push", "-q", "origin", branch]);
        self.run_git(&["switch", "-q", "main"]);

        let clone = self.clone_remote("origin");
        self.run_git_in(&clone, &["merge", "-q", "--ff-only", &format!("origin/{branch}")]);
        self.run_git_in(&clone, &["push", "-q", "origin", "main"]);
    }

    /// Second clone of `remote`, for making commits the local repo only sees
    /// after a fetch.
    pub fn clone_remote(&self, remote: &str) -> PathBuf {
        let url = self.git_output(&["remote", "get-url", remote]);
        let clone = self.sibling_path(&format!("{remote}-clone"));
        self.run_git_in(
            self.temp_dir.path(),
            &["clone", "-q", &url, clone.to_str().unwrap()],
        );
        clone
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}
