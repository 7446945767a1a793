//! Mode templates: frontmatter, follow-up questions, and prompt rendering.
//!
//! A template is a markdown file with a YAML frontmatter block:
//!
//! ```text
//! ---
//! mode: bugfix
//! required_fields: [goal, repro_steps]
//! ---
//!
//! ## Follow-up questions
//! - goal: "What exact behavior must change?"
//!
//! ## Prompt template
//! GOAL: {goal}
//! ```

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::state::{Question, TaskContext, TaskMode};
use crate::context::ServiceContext;
use crate::paths::ProjectPaths;

/// At most this many follow-up questions are asked per gather.
pub const MAX_QUESTIONS: usize = 3;

/// Rules text beyond this many characters is cut from the fallback prompt.
const FALLBACK_RULES_LIMIT: usize = 500;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\{[a-z_]+\}").expect("valid regex"));
static FOLLOW_UP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^-\s+(\w+):\s*"(.+)"\s*$"#).expect("valid regex"));

/// Parsed template for one mode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TemplateSpec {
    pub mode: String,
    pub required_fields: Vec<String>,
    pub optional_fields: Vec<String>,
    pub model_bias: String,
    pub plan_required: bool,
    pub verification_required: bool,
    pub reflection_enabled: bool,
    pub auto_fetch: Vec<String>,
    #[serde(skip)]
    pub follow_up_questions: BTreeMap<String, String>,
    #[serde(skip)]
    pub prompt_template: String,
}

impl Default for TemplateSpec {
    fn default() -> Self {
        Self {
            mode: String::new(),
            required_fields: Vec::new(),
            optional_fields: Vec::new(),
            model_bias: "mid".to_string(),
            plan_required: true,
            verification_required: true,
            reflection_enabled: false,
            auto_fetch: Vec::new(),
            follow_up_questions: BTreeMap::new(),
            prompt_template: String::new(),
        }
    }
}

/// Splits `---`-delimited frontmatter from the body. Without a closed
/// frontmatter block the whole text is body.
fn split_frontmatter(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text.strip_prefix("---").filter(|r| r.starts_with('\n') || r.starts_with("\r\n"))
    else {
        return (None, text);
    };
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim() == "---" && offset > 0 {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, text)
}

/// Lines under a `## <heading>` section, up to the next `##` heading.
fn section<'a>(body: &'a str, matches_heading: impl Fn(&str) -> bool) -> Vec<&'a str> {
    let mut lines = body.lines().skip_while(|l| !(l.starts_with("##") && matches_heading(l)));
    if lines.next().is_none() {
        return Vec::new();
    }
    lines.take_while(|l| !l.starts_with("##")).collect()
}

fn heading_is(line: &str, words: &[&str]) -> bool {
    let heading = line.trim_start_matches('#').trim().to_ascii_lowercase().replace('-', "");
    let normalized: String = words.concat();
    heading.replace(' ', "").starts_with(&normalized)
}

/// Parses template text; `mode` is used when the frontmatter omits it.
#[must_use]
pub fn parse_template(text: &str, mode: TaskMode) -> TemplateSpec {
    let (frontmatter, body) = split_frontmatter(text);
    let mut spec = frontmatter
        .and_then(|yaml| {
            serde_yaml::from_str::<TemplateSpec>(yaml)
                .map_err(|e| tracing::warn!(%mode, error = %e, "Malformed template frontmatter"))
                .ok()
        })
        .unwrap_or_default();
    if spec.mode.is_empty() {
        spec.mode = mode.to_string();
    }

    spec.follow_up_questions = section(body, |l| heading_is(l, &["follow", "up", "questions"]))
        .into_iter()
        .filter_map(|line| FOLLOW_UP.captures(line))
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect();
    spec.prompt_template =
        section(body, |l| heading_is(l, &["prompt", "template"])).join("\n").trim().to_string();
    spec
}

/// Loads the template for `mode` from `.steer/templates/`.
#[must_use]
pub fn load_template(ctx: &ServiceContext, paths: &ProjectPaths, mode: TaskMode) -> Option<TemplateSpec> {
    let path = paths.template(mode.as_str());
    if !ctx.fs.exists(&path) {
        tracing::debug!(%mode, "No template for mode");
        return None;
    }
    match ctx.fs.read_to_string(&path) {
        Ok(text) => Some(parse_template(&text, mode)),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read template");
            None
        }
    }
}

/// Questions for required fields not yet supplied, capped at [`MAX_QUESTIONS`].
#[must_use]
pub fn template_questions(spec: &TemplateSpec, provided: &BTreeMap<String, String>) -> Vec<Question> {
    spec.required_fields
        .iter()
        .filter(|field| !provided.get(*field).is_some_and(|v| !v.trim().is_empty()))
        .take(MAX_QUESTIONS)
        .map(|field| Question {
            id: field.clone(),
            question: spec
                .follow_up_questions
                .get(field)
                .cloned()
                .unwrap_or_else(|| format!("What is the {}?", field.replace('_', " "))),
            required: true,
            context: None,
        })
        .collect()
}

/// Substitutes `{key}` placeholders and removes any left unfilled.
///
/// Lines that only held placeholders are dropped; blank lines already in
/// the template are kept.
#[must_use]
pub fn render_prompt(template: &str, values: &BTreeMap<String, String>) -> String {
    template
        .lines()
        .filter_map(|line| {
            if !PLACEHOLDER.is_match(line) {
                return Some(line.to_string());
            }
            let mut rendered = line.to_string();
            for (key, value) in values {
                rendered = rendered.replace(&format!("{{{key}}}"), value);
            }
            let rendered = PLACEHOLDER.replace_all(&rendered, "").into_owned();
            (!rendered.trim().is_empty()).then_some(rendered)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Five-section prompt used when a mode has no template.
#[must_use]
pub fn fallback_prompt(context: &TaskContext, files: &[String]) -> String {
    let scope = context.constraints.clone().unwrap_or_else(|| format!("Scope: {}", files.join(", ")));
    let rules = context.rules.as_deref().map(|r| {
        let cut: String = r.chars().take(FALLBACK_RULES_LIMIT).collect();
        format!("Rules: {cut}")
    });
    let files_line = (!files.is_empty()).then(|| format!("Files: {}", files.join(", ")));
    let codebase = context.codemap_excerpt.as_deref().map(|e| format!("Codebase: {e}"));

    let sections: [(&str, Vec<Option<String>>); 5] = [
        ("## GOAL", vec![context.goal.clone()]),
        ("## CONTEXT", vec![files_line, codebase, context.repro_steps.clone()]),
        ("## LIMITS", vec![Some(scope), rules]),
        ("## OUTPUT FORMAT", vec![Some("Patch diff + file paths".to_string())]),
        (
            "## REVIEW",
            vec![Some(
                context
                    .acceptance_criteria
                    .clone()
                    .unwrap_or_else(|| "Verify the fix works as expected".to_string()),
            )],
        ),
    ];
    sections
        .into_iter()
        .map(|(heading, body)| {
            let mut lines = vec![heading.to_string()];
            lines.extend(body.into_iter().flatten().filter(|l| !l.trim().is_empty()));
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::defaults::default_template;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn parses_default_bugfix_template() {
        let spec = parse_template(default_template(TaskMode::Bugfix), TaskMode::Bugfix);
        assert_eq!(spec.mode, "bugfix");
        assert_eq!(spec.required_fields, vec!["goal", "affected_files", "repro_steps", "acceptance_criteria"]);
        assert!(spec.reflection_enabled);
        assert_eq!(spec.follow_up_questions["repro_steps"], "How do you reproduce this?");
        assert!(spec.prompt_template.starts_with("GOAL: {goal}"));
        assert!(spec.prompt_template.ends_with("TESTS: {related_tests_from_codemap}"));
    }

    #[test]
    fn every_default_template_parses() {
        for mode in TaskMode::ALL {
            let spec = parse_template(default_template(mode), mode);
            assert_eq!(spec.mode, mode.as_str());
            assert_eq!(spec.required_fields.len(), 4, "{mode}");
            assert!(!spec.prompt_template.is_empty(), "{mode}");
        }
    }

    #[test]
    fn template_without_frontmatter_is_all_body() {
        let spec = parse_template("## Prompt template\nDo {goal}\n", TaskMode::Debug);
        assert_eq!(spec.mode, "debug");
        assert!(spec.required_fields.is_empty());
        assert_eq!(spec.prompt_template, "Do {goal}");
    }

    #[test]
    fn questions_skip_provided_fields_and_cap_at_three() {
        let spec = parse_template(default_template(TaskMode::Bugfix), TaskMode::Bugfix);
        let questions = template_questions(&spec, &values(&[]));
        assert_eq!(questions.len(), 3);

        let questions = template_questions(&spec, &values(&[("goal", "fix login"), ("affected_files", "a.ts")]));
        let ids: Vec<&str> = questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["repro_steps", "acceptance_criteria"]);
    }

    #[test]
    fn question_falls_back_to_field_name() {
        let spec = TemplateSpec { required_fields: vec!["expected_output".into()], ..TemplateSpec::default() };
        let questions = template_questions(&spec, &values(&[]));
        assert_eq!(questions[0].question, "What is the expected output?");
    }

    #[test]
    fn unfilled_placeholders_are_removed() {
        let template = "GOAL: {goal}\n{jira_context}\n\nLIMITS:\n  - {rules_from_RULES_md}\nTESTS: {related_tests}";
        let out = render_prompt(template, &values(&[("goal", "Fix login"), ("rules_from_RULES_md", "Be nice")]));
        assert_eq!(out, "GOAL: Fix login\n\nLIMITS:\n  - Be nice\nTESTS: ");
        assert!(!out.contains("{jira_context}"));
    }

    #[test]
    fn fallback_prompt_has_five_sections() {
        let context = TaskContext {
            goal: Some("Fix login".into()),
            rules: Some("x".repeat(600)),
            ..TaskContext::default()
        };
        let prompt = fallback_prompt(&context, &["src/auth/login.ts".to_string()]);
        for heading in ["## GOAL", "## CONTEXT", "## LIMITS", "## OUTPUT FORMAT", "## REVIEW"] {
            assert!(prompt.contains(heading), "{heading}");
        }
        assert!(prompt.contains("Verify the fix works as expected"));
        assert!(prompt.contains("Scope: src/auth/login.ts"));
        assert!(prompt.contains(&format!("Rules: {}", "x".repeat(500))));
        assert!(!prompt.contains(&"x".repeat(501)));
    }
}
