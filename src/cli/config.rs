use clap::Subcommand;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConfigCommand {
    /// Detect and store the primary branch and remote
    ///
    /// Picks `main` before `master` and `upstream` before `origin`, then
    /// writes both to the repository's git config. Also removes options left
    /// by older releases.
    Init,

    /// Set the primary branch
    ///
    /// Overwrites any stored value. The name is not checked against existing
    /// branches.
    DefaultBranch {
        /// Branch name, e.g. `main`
        name: String,
    },

    /// Set the remote to update from and sync with
    ///
    /// Overwrites any stored value. The name is not checked against existing
    /// remotes.
    DefaultRemote {
        /// Remote name, e.g. `origin`
        name: String,
    },
}
