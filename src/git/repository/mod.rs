use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::OnceLock;

use anyhow::{Context, bail};
use once_cell::sync::OnceCell;

use super::parse::{
    parse_cherry, parse_config_entries, parse_diff_tree, parse_local_branches,
    parse_rev_list_parents, parse_worktree_heads,
};
use super::{CommitInfo, GitError, TreeDelta, WorktreeHead};
use crate::config::ConfigStore;
use crate::tidy::{Branch, RepositoryFacade};

/// Global base path for repository operations, set by -C flag
static BASE_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Initialize the global base path for repository operations.
///
/// This should be called once at program startup from main().
/// If not called, defaults to "." (current directory).
pub fn set_base_path(path: PathBuf) {
    BASE_PATH.set(path).ok();
}

/// Get the base path for repository operations.
fn base_path() -> &'static PathBuf {
    static DEFAULT: OnceLock<PathBuf> = OnceLock::new();
    BASE_PATH
        .get()
        .unwrap_or_else(|| DEFAULT.get_or_init(|| PathBuf::from(".")))
}

/// Cached values for git queries that can't change during a run.
///
/// The checked-out branch is deliberately absent: `finish` switches it.
#[derive(Debug, Default)]
struct RepoCache {
    remotes: OnceCell<Vec<String>>,
}

/// A git repository on disk, driven through the `git` CLI.
///
/// # Examples
///
/// ```no_run
/// use tidybranch::git::Repository;
/// use tidybranch::tidy::RepositoryFacade;
///
/// let repo = Repository::current();
/// let branch = repo.current_branch()?;
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug)]
pub struct Repository {
    path: PathBuf,
    cache: RepoCache,
}

impl Repository {
    /// Create a repository context at the specified path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RepoCache::default(),
        }
    }

    /// Create a repository context for the current directory.
    ///
    /// If the -C flag was used, this uses that path instead of the actual
    /// current directory.
    pub fn current() -> Self {
        Self::at(base_path().clone())
    }

    /// Get the base path this repository was created with.
    pub fn base_path(&self) -> &Path {
        &self.path
    }

    /// Fail with [`GitError::NotARepository`] unless the base path is inside a
    /// git work tree.
    pub fn ensure_repository(&self) -> anyhow::Result<()> {
        // A missing directory fails to spawn; that is not a repository either
        let inside = self
            .run_raw(&["rev-parse", "--is-inside-work-tree"])
            .is_ok_and(|output| {
                output.status.success() && String::from_utf8_lossy(&output.stdout).trim() == "true"
            });
        if inside {
            Ok(())
        } else {
            Err(GitError::NotARepository {
                path: self.path.clone(),
            }
            .into())
        }
    }

    /// Get a short display name for this repository, used in logging context.
    ///
    /// Returns "." for the current directory, or the directory name otherwise.
    fn logging_context(&self) -> String {
        if self.path.to_str() == Some(".") {
            ".".to_string()
        } else {
            self.path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("?")
                .to_string()
        }
    }

    /// Run git and return its raw output, whatever the exit status.
    ///
    /// For commands whose exit code carries an answer (`merge-base`,
    /// `config --get`). Only failing to spawn git is an error.
    fn run_raw(&self, args: &[&str]) -> anyhow::Result<Output> {
        use crate::shell_exec::run;

        let mut cmd = Command::new("git");
        cmd.args(args);
        cmd.current_dir(&self.path);

        run(&mut cmd, Some(&self.logging_context()))
            .with_context(|| format!("Failed to execute: git {}", args.join(" ")))
    }

    /// Run a git command in this repository's context and return stdout.
    ///
    /// A non-zero exit becomes an error carrying git's output.
    pub fn run_command(&self, args: &[&str]) -> anyhow::Result<String> {
        let output = self.run_raw(args)?;

        if !output.status.success() {
            bail!("{}", failure_message(&output));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !stdout.is_empty() {
            // Log output indented
            for line in stdout.trim().lines() {
                log::debug!("  {}", line);
            }
        }
        Ok(stdout)
    }

    /// Run a command whose exit code 1 means "no" and anything above means
    /// something went wrong.
    fn run_command_answer(&self, args: &[&str]) -> anyhow::Result<Option<String>> {
        let output = self.run_raw(args)?;
        match output.status.code() {
            Some(0) => Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned())),
            Some(1) => Ok(None),
            _ => bail!("{}", failure_message(&output)),
        }
    }

    fn rev_parse(&self, rev: &str) -> anyhow::Result<String> {
        Ok(self
            .run_command(&["rev-parse", "--verify", &format!("{rev}^{{commit}}")])?
            .trim()
            .to_string())
    }
}

/// git's error output, normalized for display.
fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    // Git uses \r for progress updates; in non-TTY contexts this garbles output
    let stderr = stderr.replace('\r', "\n");
    for line in stderr.trim().lines() {
        log::debug!("  ! {}", line);
    }
    // Some git commands print errors to stdout
    let stdout = String::from_utf8_lossy(&output.stdout);
    [stderr.trim(), stdout.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

impl RepositoryFacade for Repository {
    fn list_local_branches(&self) -> anyhow::Result<Vec<Branch>> {
        let stdout = self.run_command(&[
            "for-each-ref",
            "--format=%(refname:lstrip=2) %(objectname) %(upstream:short)",
            "refs/heads/",
        ])?;
        Ok(parse_local_branches(&stdout)
            .into_iter()
            .map(|raw| Branch {
                name: raw.name,
                tip: raw.tip,
                upstream: raw.upstream,
            })
            .collect())
    }

    fn list_remotes(&self) -> anyhow::Result<Vec<String>> {
        self.cache
            .remotes
            .get_or_try_init(|| {
                let stdout = self.run_command(&["remote"])?;
                Ok(stdout
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect())
            })
            .cloned()
    }

    fn fetch_and_prune(&self, remote: &str) -> anyhow::Result<()> {
        self.run_command(&["fetch", "--prune", remote])
            .map_err(|e| GitError::FetchFailed {
                remote: remote.to_string(),
                error: e.to_string(),
            })?;
        Ok(())
    }

    fn merge_base(&self, a: &str, b: &str) -> anyhow::Result<Option<String>> {
        Ok(self
            .run_command_answer(&["merge-base", a, b])?
            .map(|out| out.trim().to_string())
            .filter(|id| !id.is_empty()))
    }

    /// See [`--is-ancestor`][1] for details.
    ///
    /// [1]: https://git-scm.com/docs/git-merge-base#Documentation/git-merge-base.txt---is-ancestor
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> anyhow::Result<bool> {
        Ok(self
            .run_command_answer(&["merge-base", "--is-ancestor", ancestor, descendant])?
            .is_some())
    }

    fn commits_between(&self, base: &str, tip: &str) -> anyhow::Result<Vec<CommitInfo>> {
        let range = format!("{base}..{tip}");
        let stdout = self.run_command(&["rev-list", "--parents", &range])?;
        Ok(parse_rev_list_parents(&stdout))
    }

    fn diff_trees(&self, from: &str, to: &str) -> anyhow::Result<TreeDelta> {
        let stdout = self.run_command(&["diff-tree", "-r", "-z", "--no-renames", from, to])?;
        Ok(parse_diff_tree(&stdout)?)
    }

    fn trees_equal(&self, a: &str, b: &str) -> anyhow::Result<bool> {
        // Parse both tree refs in a single git command
        let output =
            self.run_command(&["rev-parse", &format!("{a}^{{tree}}"), &format!("{b}^{{tree}}")])?;
        let mut lines = output.lines();
        let tree_a = lines.next().unwrap_or_default().trim();
        let tree_b = lines.next().unwrap_or_default().trim();
        Ok(!tree_a.is_empty() && tree_a == tree_b)
    }

    fn current_branch(&self) -> anyhow::Result<Option<String>> {
        let stdout = self.run_command(&["branch", "--show-current"])?;
        let branch = stdout.trim();
        Ok((!branch.is_empty()).then(|| branch.to_string()))
    }

    fn checkout(&self, branch: &str) -> anyhow::Result<()> {
        self.run_command(&["switch", branch])
            .map_err(|e| GitError::CheckoutFailed {
                branch: branch.to_string(),
                error: e.to_string(),
            })?;
        Ok(())
    }

    fn delete_branch(&self, branch: &str) -> anyhow::Result<()> {
        self.run_command(&["branch", "-D", branch])?;
        Ok(())
    }

    fn resolve_remote_tracking_tip(
        &self,
        branch: &str,
        remote: &str,
    ) -> anyhow::Result<Option<String>> {
        let spec = format!("refs/remotes/{remote}/{branch}^{{commit}}");
        Ok(self
            .run_command_answer(&["rev-parse", "--verify", "--quiet", &spec])?
            .map(|out| out.trim().to_string())
            .filter(|id| !id.is_empty()))
    }

    fn cherry_all_equivalent(&self, upstream: &str, head: &str) -> anyhow::Result<Option<bool>> {
        let stdout = self.run_command(&["cherry", upstream, head])?;
        Ok(parse_cherry(&stdout))
    }

    fn worktree_branches(&self) -> anyhow::Result<Vec<WorktreeHead>> {
        let stdout = self.run_command(&["worktree", "list", "--porcelain"])?;
        Ok(parse_worktree_heads(&stdout))
    }

    /// With `branch` checked out this is `merge --ff-only`, which also updates
    /// the working tree. Otherwise only the ref moves, guarded by its old
    /// value so a concurrent update is never overwritten.
    fn fast_forward(&self, branch: &str, target: &str) -> anyhow::Result<()> {
        let sync_failed = |e: anyhow::Error| GitError::SyncFailed {
            branch: branch.to_string(),
            upstream: target.to_string(),
            error: e.to_string(),
        };

        if self.current_branch()?.as_deref() == Some(branch) {
            self.run_command(&["merge", "--ff-only", target])
                .map_err(sync_failed)?;
        } else {
            let refname = format!("refs/heads/{branch}");
            let old = self.rev_parse(&refname)?;
            let new = self.rev_parse(target)?;
            self.run_command(&["update-ref", &refname, &new, &old])
                .map_err(sync_failed)?;
        }
        Ok(())
    }
}

impl ConfigStore for Repository {
    fn get_config(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self
            .run_command_answer(&["config", "--local", "--get", key])?
            .map(|value| value.trim().to_string()))
    }

    fn set_config(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.run_command(&["config", "--local", key, value])?;
        Ok(())
    }

    fn unset_config(&self, key: &str) -> anyhow::Result<bool> {
        let output = self.run_raw(&["config", "--local", "--unset", key])?;
        match output.status.code() {
            Some(0) => Ok(true),
            // The key was not set
            Some(5) => Ok(false),
            _ => bail!("{}", failure_message(&output)),
        }
    }

    fn config_entries(&self, section: &str) -> anyhow::Result<Vec<(String, String)>> {
        let pattern = format!("^{section}\\.");
        let stdout = self
            .run_command_answer(&["config", "--local", "--get-regexp", &pattern])?
            .unwrap_or_default();
        Ok(parse_config_entries(&stdout))
    }
}
