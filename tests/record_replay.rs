//! Record-replay round trips through the public API.

use std::path::Path;

use serde_json::json;

use steer::cassette::recorder::CassetteRecorder;
use steer::cassette::session::RecordingSession;
use steer::context::ServiceContext;
use steer::paths::ProjectPaths;
use steer::workflow::defaults::{scaffold, InitOptions};
use steer::workflow::{TaskMode, WorkflowEngine, WorkflowStep};

fn exercise_ports(ctx: &ServiceContext) -> (String, String, bool, String) {
    let time = ctx.clock.now().to_rfc3339();
    let contents = ctx.fs.read_to_string(Path::new("/project/.steer/RULES.md")).unwrap();
    let exists = ctx.fs.exists(Path::new("/project/.steer/state/current-task.json"));
    let id = ctx.id_gen.generate_id();
    (time, contents, exists, id)
}

#[test]
fn hand_built_cassette_replays_deterministically() {
    let dir = tempfile::tempdir().unwrap();
    let cassette_path = dir.path().join("ports.cassette.yaml");

    let mut recorder = CassetteRecorder::new(&cassette_path, "ports", "abc123");
    recorder.record("clock", "now", json!({}), json!("2025-03-15T14:30:00Z"));
    recorder.record(
        "fs",
        "read_to_string",
        json!({"path": "/project/.steer/RULES.md"}),
        json!({"ok": "# Rules\n- Keep diffs small."}),
    );
    recorder.record(
        "fs",
        "exists",
        json!({"path": "/project/.steer/state/current-task.json"}),
        json!(false),
    );
    recorder.record("id_gen", "generate_id", json!({}), json!("7f3a"));
    assert_eq!(recorder.finish().unwrap(), cassette_path);

    let first = exercise_ports(&ServiceContext::replaying(&cassette_path).unwrap());
    assert_eq!(
        first,
        (
            "2025-03-15T14:30:00+00:00".to_string(),
            "# Rules\n- Keep diffs small.".to_string(),
            false,
            "7f3a".to_string()
        )
    );

    let second = exercise_ports(&ServiceContext::replaying(&cassette_path).unwrap());
    assert_eq!(first, second);
}

#[test]
fn recorded_workflow_session_replays_to_the_same_state() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("project");
    std::fs::create_dir_all(project.join("src/auth")).unwrap();
    std::fs::write(project.join("src/auth/login.ts"), "export function login() {}\n").unwrap();
    let paths = ProjectPaths::new(&project);
    scaffold(&ServiceContext::live(), &paths, &InitOptions::default()).unwrap();
    std::fs::write(paths.hooks(), "hooks: {}\n").unwrap();

    let cassette_path = dir.path().join("session.cassette.yaml");
    let session = RecordingSession::new(&cassette_path, "start-task", "unknown");
    let recorded = {
        let ctx = ServiceContext::recording(&session);
        let engine = WorkflowEngine::new(&ctx, &paths);
        let state = engine.create_task(TaskMode::Bugfix).unwrap();
        engine.gather_context(&state, "Login rejects valid tokens @src/auth/login.ts").unwrap().state
    };
    session.finish().unwrap();
    assert_eq!(recorded.current_step, WorkflowStep::Context);

    let ctx = ServiceContext::replaying(&cassette_path).unwrap();
    let engine = WorkflowEngine::new(&ctx, &paths);
    let state = engine.create_task(TaskMode::Bugfix).unwrap();
    let replayed = engine.gather_context(&state, "Login rejects valid tokens @src/auth/login.ts").unwrap().state;

    assert_eq!(replayed.task_id, recorded.task_id);
    assert_eq!(serde_json::to_value(&replayed).unwrap(), serde_json::to_value(&recorded).unwrap());
}
