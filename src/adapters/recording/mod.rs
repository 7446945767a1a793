//! Recording adapters: delegate to an inner port and log every call to a
//! shared cassette recorder.
//!
//! Outputs use the same shapes the replaying adapters read, so a recorded
//! session replays without translation.

pub mod clock;
pub mod filesystem;
pub mod git;
pub mod id_gen;
pub mod shell;

use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::{json, Value};

pub use clock::RecordingClock;
pub use filesystem::RecordingFileSystem;
pub use git::RecordingGitRepo;
pub use id_gen::RecordingIdGenerator;
pub use shell::RecordingShellExecutor;

use crate::cassette::recorder::CassetteRecorder;

/// Shared handle to the session recorder.
pub type SharedRecorder = Arc<Mutex<CassetteRecorder>>;

fn to_json<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Records an infallible call.
pub(crate) fn record_interaction<I, O>(recorder: &SharedRecorder, port: &str, method: &str, input: &I, output: &O)
where
    I: Serialize + ?Sized,
    O: Serialize + ?Sized,
{
    let mut guard = recorder.lock().expect("recorder lock poisoned");
    guard.record(port, method, to_json(input), to_json(output));
}

/// Records a fallible call as `{"ok": v}` or `{"err": msg}`.
pub(crate) fn record_result<I, T, E>(
    recorder: &SharedRecorder,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, E>,
) where
    I: Serialize + ?Sized,
    T: Serialize,
    E: std::fmt::Display,
{
    let output = match result {
        Ok(v) => json!({ "ok": to_json(v) }),
        Err(e) => json!({ "err": e.to_string() }),
    };
    let mut guard = recorder.lock().expect("recorder lock poisoned");
    guard.record(port, method, to_json(input), output);
}
