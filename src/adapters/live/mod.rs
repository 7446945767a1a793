//! Live adapters backed by the real clock, disk, git, and shell.

pub mod clock;
pub mod filesystem;
pub mod git;
pub mod id_gen;
pub mod shell;
