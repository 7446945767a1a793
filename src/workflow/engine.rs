//! The workflow engine: drives a [`TaskState`] through its phases.
//!
//! Every operation re-reads the persisted snapshot to check the caller's
//! state belongs to the active task, validates the requested transition,
//! works on a copy, and writes the copy back before returning it. A failed
//! operation never touches the snapshot.

use std::collections::{BTreeMap, HashSet};

use super::file_refs::{codemap_excerpt, extract_file_refs, resolve_file_ref};
use super::state::{Question, SimilarTask, TaskHistoryEntry, TaskMode, TaskState};
use super::step::{validate_transition, WorkflowStep};
use super::template::{fallback_prompt, load_template, render_prompt, template_questions, TemplateSpec};
use crate::config::{load_config, load_rules, SteerConfig};
use crate::context::ServiceContext;
use crate::error::{Result, SteerError};
use crate::hooks::runner::run_hooks;
use crate::hooks::{load_hooks, HookContext, HookDefinition, HookOutcome, HookResult, HookTrigger};
use crate::impact::{calculate_impact, find_related_tests, hits_critical, ImpactPreview, RiskLevel};
use crate::map::CodebaseMap;
use crate::paths::ProjectPaths;
use crate::store::TaskStore;

/// At most this many similar past tasks are attached to a new task.
pub const MAX_SIMILAR_TASKS: usize = 3;

/// Fields asked for when a mode has no template.
const DEFAULT_REQUIRED_FIELDS: [&str; 2] = ["goal", "affected_files"];

/// Questions about these fields carry the codebase-map excerpt.
const MAP_AWARE_FIELDS: [&str; 2] = ["affected_files", "scope"];

/// Result of [`WorkflowEngine::gather_context`].
#[derive(Debug, Clone)]
pub struct GatherOutcome {
    pub state: TaskState,
    /// Outstanding required fields, at most three.
    pub questions: Vec<Question>,
    /// `pre-context` and `post-context` results; a blocker is also stored
    /// on `state.blocked_by`.
    pub hook_results: Vec<HookResult>,
    pub template: Option<TemplateSpec>,
}

/// Result of [`WorkflowEngine::build_prompt_step`].
#[derive(Debug, Clone)]
pub struct PromptOutcome {
    pub state: TaskState,
    pub assembled_prompt: String,
}

/// Result of [`WorkflowEngine::create_plan`].
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub state: TaskState,
    pub impact_preview: Option<ImpactPreview>,
    pub hook_results: Vec<HookResult>,
}

/// Result of [`WorkflowEngine::verify`].
#[derive(Debug, Clone)]
pub struct VerifyOutcome {
    pub state: TaskState,
    pub task_complete: bool,
    /// The appended history record, on success.
    pub history_entry: Option<TaskHistoryEntry>,
}

/// Result of [`WorkflowEngine::resume_task`].
#[derive(Debug, Clone)]
pub struct ResumeOutcome {
    pub state: Option<TaskState>,
    pub resume_step: Option<WorkflowStep>,
    pub message: String,
}

/// Extra facts for hooks fired outside the phase operations.
#[derive(Debug, Clone, Default)]
pub struct TriggerInput {
    pub commit_message: Option<String>,
    pub pr_description: Option<String>,
    pub ticket: Option<String>,
    /// Conflicting pull requests or branches, for `open_conflict`.
    pub open_conflicts: Vec<String>,
}

/// Phase operations over one project's `.steer/` directory.
pub struct WorkflowEngine<'a> {
    ctx: &'a ServiceContext,
    paths: &'a ProjectPaths,
}

impl<'a> WorkflowEngine<'a> {
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, paths: &'a ProjectPaths) -> Self {
        Self { ctx, paths }
    }

    fn store(&self) -> TaskStore<'a> {
        TaskStore::new(self.ctx, self.paths)
    }

    /// Checks that `state` is the persisted active task.
    fn ensure_current(&self, state: &TaskState) -> Result<()> {
        match self.store().read_current_task()? {
            None => Err(SteerError::NoActiveTask),
            Some(persisted) if persisted.task_id != state.task_id => Err(SteerError::TaskMismatch {
                expected: state.task_id.clone(),
                found: persisted.task_id,
            }),
            Some(_) => Ok(()),
        }
    }

    fn ensure_unblocked(state: &TaskState) -> Result<()> {
        match &state.blocked_by {
            Some(blocker) => Err(SteerError::HookBlocked(Box::new(blocker.clone()))),
            None => Ok(()),
        }
    }

    fn save(&self, state: &TaskState) -> Result<()> {
        self.store().write_current_task(state)
    }

    fn hook_snapshot(&self, state: &TaskState, config: &SteerConfig) -> HookContext {
        HookContext {
            template_loaded: self.ctx.fs.exists(&self.paths.template(state.mode.as_str())),
            ticket: state.context.ticket.clone(),
            files: state.files.clone(),
            ..project_snapshot(config)
        }
    }

    fn fire(&self, trigger: HookTrigger, hooks: &[HookDefinition], snapshot: &HookContext) -> HookOutcome {
        run_hooks(self.ctx, self.paths.root(), trigger, hooks, snapshot)
    }

    /// Runs hooks whose failure must not stop the workflow.
    fn fire_best_effort(
        &self,
        trigger: HookTrigger,
        hooks: &[HookDefinition],
        snapshot: &HookContext,
    ) -> Vec<HookResult> {
        let outcome = self.fire(trigger, hooks, snapshot);
        if let Some(blocker) = outcome.blocker() {
            tracing::warn!(%trigger, hook = blocker.label(), message = %blocker.message, "Ignoring block from best-effort hook");
        }
        outcome.into_results()
    }

    /// Starts a task: IDLE is marked done and the task enters CONTEXT.
    ///
    /// Any previous snapshot is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    pub fn create_task(&self, mode: TaskMode) -> Result<TaskState> {
        let now = self.ctx.clock.now();
        let task_id = format!("task_{}", self.ctx.id_gen.generate_id());
        let mut state = TaskState::new(task_id, mode, now);
        state.transition(WorkflowStep::Context, now)?;
        self.save(&state)?;
        tracing::info!(task_id = %state.task_id, %mode, "Created task");
        Ok(state)
    }

    /// Loads everything known about the task and asks for what is missing.
    ///
    /// Accepts a task in IDLE or CONTEXT. A blocking `pre-context` or
    /// `post-context` hook is recorded on `blocked_by` rather than raised;
    /// calling this again in CONTEXT re-evaluates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the task is not the active one, is past CONTEXT,
    /// or the snapshot cannot be written.
    pub fn gather_context(&self, state: &TaskState, user_input: &str) -> Result<GatherOutcome> {
        self.ensure_current(state)?;
        if !matches!(state.current_step, WorkflowStep::Idle | WorkflowStep::Context) {
            return Err(SteerError::InvalidTransition { from: state.current_step, to: WorkflowStep::Context });
        }
        let now = self.ctx.clock.now();
        let mut next = state.clone();
        if next.current_step == WorkflowStep::Idle {
            next.transition(WorkflowStep::Context, now)?;
        }

        let config = load_config(self.ctx, self.paths);
        next.add_source("config");
        if let Some(rules) = load_rules(self.ctx, self.paths) {
            next.context.rules = Some(rules);
            next.add_source("rules");
        }
        let template = load_template(self.ctx, self.paths, next.mode);
        if template.is_some() {
            next.add_source("template");
        }
        let map = self.store().load_codebase_map();
        if let Some(map) = &map {
            next.add_source("codemap");
            if map.has_history() {
                next.add_source("git");
            }
        }

        let goal = user_input.trim();
        if !goal.is_empty() {
            next.context.goal = Some(goal.to_string());
        }
        let refs: Vec<String> =
            extract_file_refs(user_input).iter().map(|r| resolve_file_ref(r, map.as_ref())).collect();
        if !refs.is_empty() {
            next.set_files(refs);
            next.context.affected_files.clone_from(&next.files);
        }
        next.context.codemap_excerpt = map.as_ref().and_then(|m| codemap_excerpt(&next.files, m));

        let similar = self.find_similar_tasks(next.mode, &next.files, goal)?;
        if !similar.is_empty() {
            next.add_source("history");
        }
        next.context.similar_tasks = similar;

        let questions = Self::questions_for(&next, template.as_ref());

        let hooks = load_hooks(self.ctx, self.paths);
        let mut snapshot = self.hook_snapshot(&next, &config);
        snapshot.template_loaded = template.is_some();
        let mut hook_results = Vec::new();
        next.blocked_by = None;
        for trigger in [HookTrigger::PreContext, HookTrigger::PostContext] {
            let outcome = self.fire(trigger, &hooks, &snapshot);
            next.blocked_by = outcome.blocker().cloned();
            hook_results.extend(outcome.into_results());
            if next.blocked_by.is_some() {
                break;
            }
        }

        self.save(&next)?;
        Ok(GatherOutcome { state: next, questions, hook_results, template })
    }

    fn questions_for(state: &TaskState, template: Option<&TemplateSpec>) -> Vec<Question> {
        let fallback;
        let spec = if let Some(spec) = template {
            spec
        } else {
            fallback = TemplateSpec {
                required_fields: DEFAULT_REQUIRED_FIELDS.iter().map(|f| (*f).to_string()).collect(),
                ..TemplateSpec::default()
            };
            &fallback
        };

        let mut provided = state.context.answers.clone();
        if let Some(goal) = &state.context.goal {
            provided.insert("goal".to_string(), goal.clone());
        }
        if !state.context.affected_files.is_empty() {
            provided.insert("affected_files".to_string(), state.context.affected_files.join(", "));
        }

        let mut questions = template_questions(spec, &provided);
        if let Some(excerpt) = &state.context.codemap_excerpt {
            for q in questions.iter_mut().filter(|q| MAP_AWARE_FIELDS.contains(&q.id.as_str())) {
                q.context = Some(format!("Codebase map shows: {excerpt}"));
            }
        }
        questions
    }

    /// Merges answers and renders the mode's prompt.
    ///
    /// # Errors
    ///
    /// Returns [`SteerError::HookBlocked`] while a context hook block is
    /// unresolved, or a structural error for a bad call sequence.
    pub fn build_prompt_step(&self, state: &TaskState, answers: &BTreeMap<String, String>) -> Result<PromptOutcome> {
        self.ensure_current(state)?;
        validate_transition(state.current_step, WorkflowStep::Prompt)?;
        Self::ensure_unblocked(state)?;

        let now = self.ctx.clock.now();
        let mut next = state.clone();
        for (key, value) in answers {
            apply_answer(&mut next, key, value);
        }
        next.transition(WorkflowStep::Prompt, now)?;

        let map = self.store().load_codebase_map();
        let prompt = match load_template(self.ctx, self.paths, next.mode) {
            Some(template) if !template.prompt_template.is_empty() => {
                render_prompt(&template.prompt_template, &render_values(&next, map.as_ref()))
            }
            _ => fallback_prompt(&next.context, &next.files),
        };
        next.assembled_prompt = Some(prompt.clone());

        self.save(&next)?;
        Ok(PromptOutcome { state: next, assembled_prompt: prompt })
    }

    /// Stores the plan, previews its impact, and runs the plan hooks.
    ///
    /// A blocking `pre-plan` hook is recorded on `blocked_by`; `post-plan`
    /// only runs when nothing blocked.
    ///
    /// # Errors
    ///
    /// Returns a structural error for a bad call sequence, or an error if
    /// the snapshot cannot be written.
    pub fn create_plan(&self, state: &TaskState, plan_steps: &[String]) -> Result<PlanOutcome> {
        self.ensure_current(state)?;
        validate_transition(state.current_step, WorkflowStep::Planning)?;

        let now = self.ctx.clock.now();
        let mut next = state.clone();
        next.transition(WorkflowStep::Planning, now)?;

        let config = load_config(self.ctx, self.paths);
        let map = self.store().load_codebase_map();
        let critical = &config.defaults.critical_modules;
        let preview = match &map {
            Some(map) if !next.files.is_empty() => Some(calculate_impact(&next.files, map, critical)),
            _ => None,
        };
        next.impact_preview.clone_from(&preview);
        next.approved_plan = Some(plan_steps.to_vec());
        next.completed_plan_steps.clear();

        let (tier, reason) = select_model_tier(&config, &next, map.as_ref());
        next.model_tier = Some(tier);
        next.model_reason = reason;

        let hooks = load_hooks(self.ctx, self.paths);
        let snapshot = self.hook_snapshot(&next, &config);
        let outcome = self.fire(HookTrigger::PrePlan, &hooks, &snapshot);
        next.blocked_by = outcome.blocker().cloned();
        let mut hook_results = outcome.into_results();
        if next.blocked_by.is_none() {
            hook_results.extend(self.fire_best_effort(HookTrigger::PostPlan, &hooks, &snapshot));
        }

        self.save(&next)?;
        Ok(PlanOutcome { state: next, impact_preview: preview, hook_results })
    }

    /// Approves the plan and starts execution.
    ///
    /// # Errors
    ///
    /// Returns [`SteerError::HookBlocked`] while a plan block is unresolved
    /// or when a `pre-execute` hook blocks; the snapshot is left unchanged.
    pub fn approve_plan(&self, state: &TaskState) -> Result<TaskState> {
        self.ensure_current(state)?;
        validate_transition(state.current_step, WorkflowStep::Execution)?;
        Self::ensure_unblocked(state)?;

        let config = load_config(self.ctx, self.paths);
        let hooks = load_hooks(self.ctx, self.paths);
        let outcome = self.fire(HookTrigger::PreExecute, &hooks, &self.hook_snapshot(state, &config));
        if let Some(blocker) = outcome.blocker() {
            return Err(SteerError::HookBlocked(Box::new(blocker.clone())));
        }

        let mut next = state.clone();
        next.transition(WorkflowStep::Execution, self.ctx.clock.now())?;
        self.save(&next)?;
        Ok(next)
    }

    /// Marks execution finished; `post-execute` hooks never block.
    ///
    /// # Errors
    ///
    /// Returns a structural error for a bad call sequence, or an error if
    /// the snapshot cannot be written.
    pub fn complete_execution(&self, state: &TaskState) -> Result<TaskState> {
        self.ensure_current(state)?;
        validate_transition(state.current_step, WorkflowStep::Verification)?;

        let mut next = state.clone();
        next.transition(WorkflowStep::Verification, self.ctx.clock.now())?;
        next.completed_plan_steps = next.approved_plan.clone().unwrap_or_default();

        let config = load_config(self.ctx, self.paths);
        let hooks = load_hooks(self.ctx, self.paths);
        self.fire_best_effort(HookTrigger::PostExecute, &hooks, &self.hook_snapshot(&next, &config));

        self.save(&next)?;
        Ok(next)
    }

    /// Finishes the task or starts another round.
    ///
    /// On success the task moves to DONE and exactly one history entry is
    /// appended. On failure the round is incremented and the task returns
    /// to CONTEXT with every phase pending.
    ///
    /// # Errors
    ///
    /// Returns [`SteerError::TaskComplete`] for a finished task and
    /// [`SteerError::HookBlocked`] when a `pre-verify` hook blocks.
    pub fn verify(&self, state: &TaskState, passed: bool, notes: Option<&str>) -> Result<VerifyOutcome> {
        self.ensure_current(state)?;
        if state.current_step == WorkflowStep::Done {
            return Err(SteerError::TaskComplete(state.task_id.clone()));
        }
        let target = if passed { WorkflowStep::Done } else { WorkflowStep::Context };
        validate_transition(state.current_step, target)?;

        let config = load_config(self.ctx, self.paths);
        let hooks = load_hooks(self.ctx, self.paths);
        let snapshot = self.hook_snapshot(state, &config);
        if let Some(blocker) = self.fire(HookTrigger::PreVerify, &hooks, &snapshot).blocker() {
            return Err(SteerError::HookBlocked(Box::new(blocker.clone())));
        }

        let now = self.ctx.clock.now();
        let mut next = state.clone();
        if let Some(note) = notes.map(str::trim).filter(|n| !n.is_empty()) {
            next.notes.push(note.to_string());
        }

        if !passed {
            next.start_next_round(now)?;
            self.save(&next)?;
            tracing::info!(task_id = %next.task_id, round = next.round, "Verification failed, starting next round");
            return Ok(VerifyOutcome { state: next, task_complete: false, history_entry: None });
        }

        next.transition(WorkflowStep::Done, now)?;
        let entry = TaskHistoryEntry::from_state(&next, now);
        self.store().append_history(&entry)?;
        self.save(&next)?;
        self.fire_best_effort(HookTrigger::PostVerify, &hooks, &snapshot);
        tracing::info!(task_id = %next.task_id, rounds = entry.rounds, total_time = %entry.total_time, "Task complete");
        Ok(VerifyOutcome { state: next, task_complete: true, history_entry: Some(entry) })
    }

    /// Parks the task at its current step.
    ///
    /// # Errors
    ///
    /// Returns an error when the current step cannot be suspended.
    pub fn suspend_task(&self, state: &TaskState) -> Result<TaskState> {
        self.ensure_current(state)?;
        let mut next = state.clone();
        next.suspend()?;
        self.save(&next)?;
        Ok(next)
    }

    /// Picks the persisted task back up.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be read or written.
    pub fn resume_task(&self) -> Result<ResumeOutcome> {
        let Some(mut state) = self.store().read_current_task()? else {
            return Ok(ResumeOutcome { state: None, resume_step: None, message: "No task to resume.".to_string() });
        };
        if state.current_step == WorkflowStep::Done {
            let message = format!("Task {} is already complete.", state.task_id);
            return Ok(ResumeOutcome { state: Some(state), resume_step: None, message });
        }
        let step = state.resume()?;
        self.save(&state)?;
        let message = format!("Resuming task {} ({}) at step: {step}", state.task_id, state.mode);
        Ok(ResumeOutcome { state: Some(state), resume_step: Some(step), message })
    }

    /// Clears a recorded hook block. Returns the cleared result, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the task is not the active one or the snapshot
    /// cannot be written.
    pub fn override_block(&self, state: &TaskState) -> Result<(TaskState, Option<HookResult>)> {
        self.ensure_current(state)?;
        let mut next = state.clone();
        let cleared = next.blocked_by.take();
        if let Some(blocker) = &cleared {
            next.override_used = true;
            tracing::info!(task_id = %next.task_id, hook = blocker.label(), "Hook block overridden");
            self.save(&next)?;
        }
        Ok((next, cleared))
    }

    /// Past tasks resembling this one, best first.
    ///
    /// # Errors
    ///
    /// Returns an error if the history file cannot be read.
    pub fn find_similar_tasks(&self, mode: TaskMode, files: &[String], goal: &str) -> Result<Vec<SimilarTask>> {
        let keywords = goal_keywords(goal);
        let mut scored: Vec<SimilarTask> = self
            .store()
            .read_history()?
            .into_iter()
            .rev()
            .filter_map(|entry| {
                let mut score = 0;
                if entry.mode == mode {
                    score += 2;
                }
                let overlapping = files
                    .iter()
                    .filter(|f| entry.files_changed.iter().any(|c| c.contains(f.as_str()) || f.contains(c.as_str())))
                    .count();
                score += 5 * u32::try_from(overlapping).unwrap_or(u32::MAX / 5);
                if let Some(past_goal) = &entry.goal {
                    let past_goal = past_goal.to_lowercase();
                    score += u32::try_from(keywords.iter().filter(|k| past_goal.contains(k.as_str())).count())
                        .unwrap_or(0);
                }
                (score > 0).then(|| SimilarTask {
                    task_id: entry.task_id,
                    mode: entry.mode,
                    goal: entry.goal,
                    rounds: entry.rounds,
                    total_time: entry.total_time,
                    score,
                })
            })
            .collect();
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(MAX_SIMILAR_TASKS);
        Ok(scored)
    }

    /// Fires `trigger` against the active task (if any) for the CLI.
    #[must_use]
    pub fn run_trigger(&self, trigger: HookTrigger, input: TriggerInput) -> HookOutcome {
        let config = load_config(self.ctx, self.paths);
        let task = self.store().read_current_task().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring unreadable task snapshot");
            None
        });
        let mut snapshot = match &task {
            Some(state) => self.hook_snapshot(state, &config),
            None => project_snapshot(&config),
        };
        snapshot.commit_message = input.commit_message;
        snapshot.pr_description = input.pr_description;
        snapshot.open_conflicts = input.open_conflicts;
        if input.ticket.is_some() {
            snapshot.ticket = input.ticket;
        }
        self.fire(trigger, &load_hooks(self.ctx, self.paths), &snapshot)
    }
}

/// Hook facts that come from the project config alone.
fn project_snapshot(config: &SteerConfig) -> HookContext {
    HookContext {
        critical_modules: config.defaults.critical_modules.clone(),
        test_command: Some(config.defaults.test_command.clone()),
        lint_command: Some(config.defaults.lint_command.clone()),
        ..HookContext::default()
    }
}

/// Lowercase goal words longer than three characters.
fn goal_keywords(goal: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for word in goal.to_lowercase().split_whitespace() {
        if word.chars().count() > 3 && !words.iter().any(|w| w == word) {
            words.push(word.to_string());
        }
    }
    words
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Files from a comma-separated answer.
fn split_files(value: &str) -> Vec<String> {
    value.split(',').filter_map(non_empty).collect()
}

/// Stores a raw answer and maps well-known keys onto their slots.
fn apply_answer(state: &mut TaskState, key: &str, value: &str) {
    state.context.answers.insert(key.to_string(), value.to_string());
    let slot = match key {
        "goal" => &mut state.context.goal,
        "acceptance_criteria" => &mut state.context.acceptance_criteria,
        "repro_steps" => &mut state.context.repro_steps,
        "constraints" => &mut state.context.constraints,
        "user_story" => &mut state.context.user_story,
        "deliverable" => &mut state.context.deliverable,
        "ticket" => &mut state.context.ticket,
        "affected_files" => {
            let files = split_files(value);
            if !files.is_empty() {
                state.set_files(files);
                state.context.affected_files.clone_from(&state.files);
            }
            return;
        }
        _ => return,
    };
    *slot = non_empty(value);
}

/// Placeholder values for prompt rendering.
fn render_values(state: &TaskState, map: Option<&CodebaseMap>) -> BTreeMap<String, String> {
    let context = &state.context;
    let mut values = context.answers.clone();
    let mut set = |key: &str, value: Option<String>| {
        if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
            values.insert(key.to_string(), v);
        }
    };

    set("goal", context.goal.clone());
    set("repro_steps", context.repro_steps.clone());
    set("acceptance_criteria", context.acceptance_criteria.clone());
    set("user_story", context.user_story.clone());
    set("constraints", context.constraints.clone());
    set("deliverable", context.deliverable.clone());
    set("rules_from_RULES_md", context.rules.clone());
    set("codebase_map_excerpt", context.codemap_excerpt.clone());
    set("ticket_context", context.ticket.as_ref().map(|t| format!("TICKET: {t}")));
    let files = (!state.files.is_empty()).then(|| state.files.join(", "));
    set("affected_files", files.clone());
    set("scope", context.constraints.clone().or_else(|| files.map(|f| format!("Files: {f}"))));

    if let Some(map) = map {
        let mut seen = HashSet::new();
        let mut imports = Vec::new();
        let mut consumers = Vec::new();
        for dep in state.files.iter().filter_map(|f| map.dependencies.get(f)) {
            imports.extend(dep.imports.iter().filter(|i| seen.insert(format!("i:{i}"))).cloned());
            consumers.extend(dep.called_by.iter().filter(|c| seen.insert(format!("c:{c}"))).cloned());
        }
        set("dependency_chain", Some(imports.join(", ")));
        set("consumers", Some(consumers.join(", ")));
        set("related_tests_from_codemap", Some(find_related_tests(&state.files, map).join(", ")));
    }
    values
}

/// Total scanned lines across `files`.
fn lines_in_scope(files: &[String], map: &CodebaseMap) -> usize {
    map.modules
        .values()
        .flat_map(|m| m.files.iter())
        .filter(|(path, _)| files.contains(path))
        .map(|(_, info)| info.loc)
        .sum()
}

/// Chooses the model tier from the policy; the reason is `None` for the default tier.
fn select_model_tier(config: &SteerConfig, state: &TaskState, map: Option<&CodebaseMap>) -> (String, Option<String>) {
    let policy = &config.model_policy;
    if state.mode == TaskMode::Design {
        return (policy.design_mode.clone(), Some("design mode".to_string()));
    }
    if state.files.iter().any(|f| hits_critical(f, &config.defaults.critical_modules)) {
        return (policy.critical_modules.clone(), Some("critical module".to_string()));
    }
    if state.impact_preview.as_ref().is_some_and(|p| p.risk_level == RiskLevel::High) {
        return (policy.critical_modules.clone(), Some("high risk".to_string()));
    }
    let file_count = state.files.len();
    if file_count > usize::try_from(policy.file_count_threshold).unwrap_or(usize::MAX) {
        return (policy.critical_modules.clone(), Some(format!("{file_count} files in scope")));
    }
    if let Some(map) = map {
        let loc = lines_in_scope(&state.files, map);
        if loc > usize::try_from(policy.loc_threshold).unwrap_or(usize::MAX) {
            return (policy.critical_modules.clone(), Some(format!("{loc} lines in scope")));
        }
    }
    (policy.default_tier.clone(), None)
}
