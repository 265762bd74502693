//! Persisted configuration for tidybranch
//!
//! The only persisted state is two keys in the repository-local git config:
//!
//! ```text
//! [tidybranch]
//!     default-branch = main
//!     default-remote = origin
//! ```
//!
//! There is no config file of our own. Values are read at the start of each
//! command; a missing value is detected (`main` before `master`, `upstream`
//! before `origin`, nothing else) and written back, so detection runs at
//! most once per repository.

use color_print::cformat;
use strum::IntoEnumIterator;

use crate::git::GitError;
use crate::tidy::{Command, RepositoryContext, RepositoryFacade};

/// Git config section holding every key.
pub const SECTION: &str = "tidybranch";

/// Keys from older releases, removed by `config init`.
const LEGACY_KEYS: [&str; 2] = ["upstream", "mainline"];

const BRANCH_CANDIDATES: [&str; 2] = ["main", "master"];
const REMOTE_CANDIDATES: [&str; 2] = ["upstream", "origin"];

/// Read and write access to the repository-local git config.
///
/// Keys are fully qualified (`tidybranch.default-branch`).
pub trait ConfigStore {
    fn get_config(&self, key: &str) -> anyhow::Result<Option<String>>;

    fn set_config(&self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Returns whether the key existed.
    fn unset_config(&self, key: &str) -> anyhow::Result<bool>;

    /// Every `key value` pair under `section`, keys fully qualified, in file
    /// order.
    fn config_entries(&self, section: &str) -> anyhow::Result<Vec<(String, String)>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumIter, strum::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    DefaultBranch,
    DefaultRemote,
}

impl ConfigKey {
    /// Name within the section, e.g. `default-branch`.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Fully qualified git config key.
    pub fn full(self) -> String {
        format!("{SECTION}.{}", self.name())
    }

    fn candidates(self) -> &'static [&'static str] {
        match self {
            Self::DefaultBranch => &BRANCH_CANDIDATES,
            Self::DefaultRemote => &REMOTE_CANDIDATES,
        }
    }
}

/// A write made to the persisted config, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChange {
    Set { key: String, value: String },
    Removed { key: String },
}

impl std::fmt::Display for ConfigChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Set { key, value } => {
                write!(f, "{}", cformat!("Set <bold>{key}</> = <bold>{value}</>"))
            }
            Self::Removed { key } => {
                write!(f, "{}", cformat!("Removed option <bold>{key}</>"))
            }
        }
    }
}

/// Pick the first candidate present in `available`.
///
/// Priority is fixed by the candidate order, not by the order of
/// `available`.
pub fn detect(key: ConfigKey, available: &[String]) -> Result<String, GitError> {
    if key == ConfigKey::DefaultBranch && available.is_empty() {
        return Err(GitError::ConfigMissing {
            key: key.name().into(),
            reason: "Repository has no branches. Is this a new repository?".into(),
        });
    }
    key.candidates()
        .iter()
        .find(|candidate| available.iter().any(|name| name == *candidate))
        .map(|found| found.to_string())
        .ok_or_else(|| {
            let noun = match key {
                ConfigKey::DefaultBranch => "branch",
                ConfigKey::DefaultRemote => "remote",
            };
            GitError::ConfigMissing {
                key: key.name().into(),
                reason: format!("no {noun} named {}", key.candidates().join(" or ")),
            }
        })
}

fn available<R: RepositoryFacade>(repo: &R, key: ConfigKey) -> anyhow::Result<Vec<String>> {
    Ok(match key {
        ConfigKey::DefaultBranch => repo
            .list_local_branches()?
            .into_iter()
            .map(|b| b.name)
            .collect(),
        ConfigKey::DefaultRemote => repo.list_remotes()?,
    })
}

/// Detect and persist both keys, then drop legacy keys.
///
/// Both values are detected before anything is written, so a failed init
/// leaves the config untouched.
pub fn init<R: ConfigStore + RepositoryFacade>(repo: &R) -> anyhow::Result<Vec<ConfigChange>> {
    let mut detected = Vec::new();
    for key in ConfigKey::iter() {
        detected.push((key, detect(key, &available(repo, key)?)?));
    }

    let mut changes = Vec::new();
    for (key, value) in detected {
        changes.push(set(repo, key, &value)?);
    }
    for legacy in LEGACY_KEYS {
        let key = format!("{SECTION}.{legacy}");
        if repo.unset_config(&key)? {
            changes.push(ConfigChange::Removed { key });
        }
    }
    Ok(changes)
}

/// Overwrite `key` unconditionally. The value is not validated.
pub fn set(store: &impl ConfigStore, key: ConfigKey, value: &str) -> anyhow::Result<ConfigChange> {
    let full = key.full();
    store.set_config(&full, value)?;
    log::info!("Set {full} = {value}");
    Ok(ConfigChange::Set {
        key: full,
        value: value.to_string(),
    })
}

/// The persisted section as git would print it, one `\tkey = value` line per
/// set key. Unset keys are omitted.
pub fn listing(store: &impl ConfigStore) -> anyhow::Result<String> {
    let prefix = format!("{SECTION}.");
    let mut out = format!("[{SECTION}]\n");
    for (key, value) in store.config_entries(SECTION)? {
        let key = key.strip_prefix(&prefix).unwrap_or(&key);
        out.push_str(&format!("\t{key} = {value}\n"));
    }
    Ok(out)
}

/// The repository context for a command, plus whatever auto-initialisation
/// wrote along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub context: RepositoryContext,
    pub changes: Vec<ConfigChange>,
}

/// Read both keys, detecting and persisting any that are missing.
///
/// `finish` needs a remote to sync from; `tidy` carries on without one and
/// classifies against the local primary branch.
pub fn resolve_context<R: ConfigStore + RepositoryFacade>(
    repo: &R,
    command: Command,
) -> anyhow::Result<Resolved> {
    let mut changes = Vec::new();

    let primary = match read(repo, ConfigKey::DefaultBranch)? {
        Some(primary) => primary,
        None => {
            let detected = detect(
                ConfigKey::DefaultBranch,
                &available(repo, ConfigKey::DefaultBranch)?,
            )?;
            changes.push(set(repo, ConfigKey::DefaultBranch, &detected)?);
            detected
        }
    };

    let remote = match read(repo, ConfigKey::DefaultRemote)? {
        Some(remote) => Some(remote),
        None => match detect(
            ConfigKey::DefaultRemote,
            &available(repo, ConfigKey::DefaultRemote)?,
        ) {
            Ok(detected) => {
                changes.push(set(repo, ConfigKey::DefaultRemote, &detected)?);
                Some(detected)
            }
            Err(e) if command == Command::Finish => return Err(e.into()),
            Err(_) => {
                log::info!("No remote detected; using local {primary} only");
                None
            }
        },
    };

    Ok(Resolved {
        context: RepositoryContext {
            primary,
            remote,
            current: repo.current_branch()?,
        },
        changes,
    })
}

fn read(store: &impl ConfigStore, key: ConfigKey) -> anyhow::Result<Option<String>> {
    Ok(store
        .get_config(&key.full())?
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}
