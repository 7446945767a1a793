//! Service context bundling all port trait objects.

use std::path::Path;

use crate::adapters::recording::{
    RecordingClock, RecordingFileSystem, RecordingGitRepo, RecordingIdGenerator,
    RecordingShellExecutor,
};
use crate::adapters::replaying::{
    ReplayingClock, ReplayingFileSystem, ReplayingGitRepo, ReplayingIdGenerator,
    ReplayingShellExecutor,
};
use crate::cassette::format::Cassette;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::session::RecordingSession;
use crate::ports::clock::Clock;
use crate::ports::filesystem::FileSystem;
use crate::ports::git::GitRepo;
use crate::ports::id_gen::IdGenerator;
use crate::ports::shell::ShellExecutor;

/// Bundles all port trait objects into a single context.
///
/// Fields are public so tests can swap a single port (for example a live
/// filesystem over a temp dir with replayed git history).
pub struct ServiceContext {
    /// Clock for step timings and history timestamps.
    pub clock: Box<dyn Clock>,
    /// Filesystem for state, config, and source scanning.
    pub fs: Box<dyn FileSystem>,
    /// Git repository for coupling and ownership mining.
    pub git: Box<dyn GitRepo>,
    /// Shell executor for `run` hooks.
    pub shell: Box<dyn ShellExecutor>,
    /// ID generator for task ids.
    pub id_gen: Box<dyn IdGenerator>,
}

impl ServiceContext {
    /// Creates a live context backed by the real system.
    #[must_use]
    pub fn live() -> Self {
        use crate::adapters::live::clock::LiveClock;
        use crate::adapters::live::filesystem::LiveFileSystem;
        use crate::adapters::live::git::LiveGitRepo;
        use crate::adapters::live::id_gen::LiveIdGenerator;
        use crate::adapters::live::shell::LiveShellExecutor;

        Self {
            clock: Box::new(LiveClock),
            fs: Box::new(LiveFileSystem),
            git: Box::new(LiveGitRepo),
            shell: Box::new(LiveShellExecutor),
            id_gen: Box::new(LiveIdGenerator),
        }
    }

    /// Creates a live context whose every port call is logged to `session`.
    ///
    /// Drop the context before calling [`RecordingSession::finish`].
    #[must_use]
    pub fn recording(session: &RecordingSession) -> Self {
        let live = Self::live();
        Self {
            clock: Box::new(RecordingClock::new(live.clock, session.recorder())),
            fs: Box::new(RecordingFileSystem::new(live.fs, session.recorder())),
            git: Box::new(RecordingGitRepo::new(live.git, session.recorder())),
            shell: Box::new(RecordingShellExecutor::new(live.shell, session.recorder())),
            id_gen: Box::new(RecordingIdGenerator::new(live.id_gen, session.recorder())),
        }
    }

    /// Creates a replaying context from a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let cassette = Cassette::load(path)?;
        Ok(Self::replaying_cassette(&cassette))
    }

    /// Creates a replaying context from an in-memory cassette.
    ///
    /// Each port gets its own replayer so per-port queues are independent.
    #[must_use]
    pub fn replaying_cassette(cassette: &Cassette) -> Self {
        Self {
            clock: Box::new(ReplayingClock::new(CassetteReplayer::new(cassette))),
            fs: Box::new(ReplayingFileSystem::new(CassetteReplayer::new(cassette))),
            git: Box::new(ReplayingGitRepo::new(CassetteReplayer::new(cassette))),
            shell: Box::new(ReplayingShellExecutor::new(CassetteReplayer::new(cassette))),
            id_gen: Box::new(ReplayingIdGenerator::new(CassetteReplayer::new(cassette))),
        }
    }
}
