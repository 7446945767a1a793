//! Shared fixtures for unit tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use crate::adapters::live::filesystem::LiveFileSystem;
use crate::cassette::format::{Cassette, Interaction};
use crate::context::ServiceContext;
use crate::ports::clock::Clock;
use crate::ports::id_gen::IdGenerator;

/// A clock that only moves when told to.
#[derive(Clone)]
pub(crate) struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

impl ManualClock {
    pub(crate) fn at(rfc3339: &str) -> Self {
        let t = DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc);
        Self(Arc::new(Mutex::new(t)))
    }

    pub(crate) fn advance_secs(&self, secs: i64) {
        let mut t = self.0.lock().unwrap();
        *t += Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Deterministic ids: `000…01`, `000…02`, …
#[derive(Default)]
pub(crate) struct SequentialIds(AtomicU64);

impl IdGenerator for SequentialIds {
    fn generate_id(&self) -> String {
        let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{n:032x}")
    }
}

/// Builds a cassette from `(port, method, output)` triples.
pub(crate) fn cassette(entries: Vec<(&str, &str, serde_json::Value)>) -> Cassette {
    Cassette {
        name: "test".into(),
        recorded_at: Utc::now(),
        commit: "abc".into(),
        interactions: entries
            .into_iter()
            .enumerate()
            .map(|(seq, (port, method, output))| Interaction {
                seq: seq as u64,
                port: port.into(),
                method: method.into(),
                input: json!({}),
                output,
            })
            .collect(),
    }
}

/// Live filesystem, manual clock, sequential ids; git and shell replay
/// from `replay` (an empty cassette panics on first use).
pub(crate) fn project_context(clock: &ManualClock, replay: &Cassette) -> ServiceContext {
    let mut ctx = ServiceContext::replaying_cassette(replay);
    ctx.fs = Box::new(LiveFileSystem);
    ctx.clock = Box::new(clock.clone());
    ctx.id_gen = Box::new(SequentialIds::default());
    ctx
}

/// A map with no modules or edges, for tests that fill in only what they need.
pub(crate) fn empty_map() -> crate::map::CodebaseMap {
    crate::map::CodebaseMap {
        root: "/p".into(),
        scanned_at: Utc::now(),
        commit: None,
        language: "typescript".into(),
        build_system: "npm".into(),
        modules: std::collections::BTreeMap::new(),
        dependencies: std::collections::BTreeMap::new(),
        change_coupling: None,
        ownership: None,
    }
}
