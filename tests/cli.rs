//! Integration tests for top-level CLI behavior.

use std::path::Path;
use std::process::{Command, Output};

fn run_steer(root: &Path, args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_steer");
    Command::new(bin)
        .arg("--root")
        .arg(root)
        .args(args)
        .env_remove("STEER_RECORD")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run steer binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// A small TypeScript project: `src/routes.ts` imports `src/auth/login.ts`.
fn sample_project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("src/auth")).unwrap();
    std::fs::write(root.join("package.json"), "{}\n").unwrap();
    std::fs::write(root.join("src/auth/login.ts"), "export function login() {}\n").unwrap();
    std::fs::write(root.join("src/auth/login.test.ts"), "import { login } from './login';\n").unwrap();
    std::fs::write(root.join("src/routes.ts"), "import { login } from './auth/login';\nexport const routes = [];\n")
        .unwrap();
    let init = run_steer(
        root,
        &["init", "--critical", "src/auth", "--test-command", "true", "--lint-command", "true", "--no-map"],
    );
    assert!(init.status.success(), "{}", stderr(&init));
    dir
}

#[test]
fn full_task_lifecycle() {
    let project = sample_project();
    let root = project.path();

    let map = run_steer(root, &["map"]);
    assert!(map.status.success(), "{}", stderr(&map));
    assert!(stdout(&map).contains("Build: npm"));

    let start = run_steer(root, &["start", "bugfix", "Login fails for SSO users @login.ts"]);
    assert!(start.status.success(), "{}", stderr(&start));
    let out = stdout(&start);
    assert!(out.contains("Started task task_"));
    assert!(out.contains("Files: src/auth/login.ts"));
    assert!(out.contains("[repro_steps] How do you reproduce this?"));

    let prompt = run_steer(
        root,
        &["prompt", "--answer", "repro_steps=Sign in with SSO", "--answer", "acceptance_criteria=SSO works"],
    );
    assert!(prompt.status.success(), "{}", stderr(&prompt));
    let out = stdout(&prompt);
    assert!(out.contains("CONTEXT: Sign in with SSO"));
    assert!(out.contains("REVIEW: SSO works"));
    assert!(!out.contains("{ticket_context}"));

    let plan = run_steer(root, &["plan", "Fix token parsing", "Add regression test"]);
    assert!(plan.status.success(), "{}", stderr(&plan));
    let out = stdout(&plan);
    assert!(out.contains("Risk: HIGH"));
    assert!(out.contains("Downstream: src/routes.ts"));
    assert!(out.contains("[fail] pre-plan critical_file_guard"));

    for step in [&["approve"][..], &["complete"][..], &["verify", "--pass"][..]] {
        let output = run_steer(root, step);
        assert!(output.status.success(), "{step:?}: {}", stderr(&output));
    }

    let history = std::fs::read_to_string(root.join(".steer/state/history.jsonl")).unwrap();
    assert_eq!(history.lines().count(), 1);
    assert!(history.contains("\"rounds\":1"));

    let resume = run_steer(root, &["resume"]);
    assert!(stdout(&resume).contains("is already complete."));
}

#[test]
fn failed_verification_starts_another_round() {
    let project = sample_project();
    let root = project.path();
    for step in [
        &["start", "feature", "Add CSV export"][..],
        &["prompt"][..],
        &["plan", "Add exporter"][..],
        &["approve"][..],
        &["complete"][..],
    ] {
        let output = run_steer(root, step);
        assert!(output.status.success(), "{step:?}: {}", stderr(&output));
    }

    let verify = run_steer(root, &["verify", "--fail", "--notes", "CSV header missing"]);
    assert!(verify.status.success(), "{}", stderr(&verify));
    assert!(stdout(&verify).contains("Starting round 2"));

    let status = stdout(&run_steer(root, &["status"]));
    assert!(status.contains("Round: 2"));

    let context = run_steer(root, &["context"]);
    assert!(context.status.success(), "{}", stderr(&context));
    assert!(stdout(&context).contains("Gathered context for task task_"));
    assert!(run_steer(root, &["prompt"]).status.success());
}

#[test]
fn blocked_context_is_retried_without_losing_the_task() {
    let project = sample_project();
    let root = project.path();
    std::fs::write(
        root.join(".steer/hooks.yaml"),
        "hooks:\n  pre-context:\n    - check: template_exists\n      on_fail: block\n      message: Add a bugfix template\n",
    )
    .unwrap();
    let template = root.join(".steer/templates/bugfix.md");
    let contents = std::fs::read_to_string(&template).unwrap();
    std::fs::remove_file(&template).unwrap();

    let start = run_steer(root, &["start", "bugfix", "Login fails @src/auth/login.ts"]);
    assert!(start.status.success(), "{}", stderr(&start));
    assert!(stdout(&start).contains("Blocked by pre-context hook: Add a bugfix template"));
    assert!(stdout(&start).contains("run `steer context`"));
    let task_line = stdout(&start).lines().next().unwrap().to_string();

    let refused = run_steer(root, &["prompt"]);
    assert!(!refused.status.success());
    assert!(stderr(&refused).contains("Blocked by pre-context hook"));

    std::fs::write(&template, contents).unwrap();
    let context = run_steer(root, &["context"]);
    assert!(context.status.success(), "{}", stderr(&context));
    let out = stdout(&context);
    assert!(!out.contains("Blocked by"));
    assert!(out.contains("Files: src/auth/login.ts"));
    let task_id = task_line.split_whitespace().nth(2).unwrap();
    assert!(out.contains(task_id));

    let prompt = run_steer(root, &["prompt", "--answer", "repro_steps=Sign in"]);
    assert!(prompt.status.success(), "{}", stderr(&prompt));
    assert!(stdout(&prompt).contains("Step: PROMPT"));
}

#[test]
fn hook_command_blocks_on_open_conflicts() {
    let project = sample_project();
    let root = project.path();
    std::fs::write(
        root.join(".steer/hooks.yaml"),
        "hooks:\n  post-pr:\n    - check: open_conflict\n      on_fail: block\n      message: Conflicting PR open\n",
    )
    .unwrap();

    assert!(run_steer(root, &["hook", "post-pr"]).status.success());

    let blocked = run_steer(root, &["hook", "post-pr", "--conflict", "#41"]);
    assert!(!blocked.status.success());
    assert!(stderr(&blocked).contains("Blocked by post-pr hook: Conflicting PR open"));
}

#[test]
fn suspend_and_resume() {
    let project = sample_project();
    let root = project.path();
    assert!(run_steer(root, &["start", "debug", "Crash on boot"]).status.success());

    let suspend = run_steer(root, &["suspend"]);
    assert!(stdout(&suspend).contains("suspended at CONTEXT"));

    let resume = run_steer(root, &["resume"]);
    assert!(stdout(&resume).contains("at step: CONTEXT"));
}

#[test]
fn out_of_order_command_fails_with_transition() {
    let project = sample_project();
    let root = project.path();
    assert!(run_steer(root, &["start", "refactor", "Split module"]).status.success());

    let approve = run_steer(root, &["approve"]);
    assert!(!approve.status.success());
    assert!(stderr(&approve).contains("Invalid transition: CONTEXT -> EXECUTION"));
}

#[test]
fn command_without_task_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_steer(dir.path(), &["approve"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("No active task"));
}

#[test]
fn status_without_task() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_steer(dir.path(), &["status"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("No active task."));
}

#[test]
fn hook_command_reports_missing_hooks() {
    let project = sample_project();
    let output = run_steer(project.path(), &["hook", "post-commit", "--commit-message", "fix: x"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("No post-commit hooks configured."));
}

#[test]
fn invalid_subcommand_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_steer(dir.path(), &["nonsense"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unrecognized subcommand"));
}
