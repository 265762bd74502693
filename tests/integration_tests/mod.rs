// Integration tests drive the real binary against real git repositories and
// rely on Unix paths for remotes and worktrees
#![cfg(unix)]

pub mod finish;
pub mod tidy;
