//! Port traits for every boundary the workflow touches.
//!
//! The engine, map builder, and hook runner only ever see these traits.
//! Live implementations live in `src/adapters/live/`; replaying ones in
//! `src/adapters/replaying/`.

pub mod clock;
pub mod filesystem;
pub mod git;
pub mod id_gen;
pub mod shell;

pub use clock::Clock;
pub use filesystem::FileSystem;
pub use git::GitRepo;
pub use id_gen::IdGenerator;
pub use shell::{ShellExecutor, ShellOutput};

/// Boxed error returned by fallible port methods.
pub type PortError = Box<dyn std::error::Error + Send + Sync>;
