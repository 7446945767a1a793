//! Replaying adapters that serve recorded interactions from a cassette.
//!
//! Fallible methods expect outputs shaped as `{"ok": <value>}` or
//! `{"err": "message"}`; a bare value is treated as `ok`.

pub mod clock;
pub mod filesystem;
pub mod git;
pub mod id_gen;
pub mod shell;

use std::sync::Mutex;

pub use clock::ReplayingClock;
pub use filesystem::ReplayingFileSystem;
pub use git::ReplayingGitRepo;
pub use id_gen::ReplayingIdGenerator;
pub use shell::ReplayingShellExecutor;

use crate::cassette::replayer::CassetteReplayer;
use crate::ports::PortError;

/// Pulls the next recorded output for `port::method`.
pub(crate) fn next_output(
    replayer: &Mutex<CassetteReplayer>,
    port: &str,
    method: &str,
) -> serde_json::Value {
    let mut replayer = replayer.lock().expect("replayer lock poisoned");
    replayer.next_interaction(port, method).output.clone()
}

/// Decodes an `{"ok": v}` / `{"err": msg}` output into a `Result`.
pub(crate) fn replay_result<T: serde::de::DeserializeOwned>(
    output: &serde_json::Value,
    context: &str,
) -> Result<T, PortError> {
    if let Some(err) = output.get("err") {
        let msg = err.as_str().unwrap_or("unknown error").to_string();
        return Err(msg.into());
    }
    let value = output.get("ok").unwrap_or(output);
    serde_json::from_value(value.clone())
        .map_err(|e| format!("{context}: failed to deserialize: {e}").into())
}
