//! Cassettes: recorded port interactions replayed by tests.
//!
//! A cassette is a YAML document listing every call made through a port
//! (`git`, `shell`, `fs`, `clock`, `id_gen`) with its output. Replaying a
//! cassette lets the map builder and hook runner be exercised without a
//! repository or subprocesses.

pub mod format;
pub mod recorder;
pub mod replayer;
pub mod session;
