//! Local branch hygiene for git repositories.
//!
//! tidybranch is a CLI tool. The library exposes the classification and
//! deletion engine (`tidy`) so it can be driven against any
//! [`tidy::RepositoryFacade`], not just a real git checkout.
//!
//! The library API is not stable.

pub mod config;
pub mod git;
pub mod shell_exec;
pub mod styling;
pub mod tidy;
