//! Built-in deterministic hook predicates.

use once_cell::sync::Lazy;
use regex::Regex;

use super::HookContext;

static CONVENTIONAL_COMMIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(fix|feat|refactor|docs|test|chore|style|perf|ci|build)(\([^)]+\))?!?: .+")
        .expect("valid regex")
});

static MENTIONS_TESTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)test").expect("valid regex"));

/// Known predicate kinds; anything else is [`CheckKind::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckKind {
    TemplateExists,
    TicketAttached,
    CriticalFileGuard,
    OpenConflict,
    ConventionalCommitFormat,
    PrHasTests,
    Unknown(String),
}

impl CheckKind {
    /// Maps a `check:` name to its kind.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "template_exists" => Self::TemplateExists,
            "jira_attached" | "ticket_attached" => Self::TicketAttached,
            "critical_file_guard" => Self::CriticalFileGuard,
            "open_pr_conflict" | "open_conflict" => Self::OpenConflict,
            "conventional_commit_format" => Self::ConventionalCommitFormat,
            "pr_has_tests" => Self::PrHasTests,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Evaluates the predicate; `None` for unknown kinds.
    ///
    /// `override_prefixes` replaces the context's critical modules for the
    /// critical-file guard when non-empty.
    #[must_use]
    pub fn evaluate(&self, ctx: &HookContext, override_prefixes: Option<&[String]>) -> Option<bool> {
        let passed = match self {
            Self::TemplateExists => ctx.template_loaded,
            Self::TicketAttached => ctx.ticket.as_deref().is_some_and(|t| !t.trim().is_empty()),
            Self::CriticalFileGuard => {
                let prefixes = override_prefixes
                    .filter(|p| !p.is_empty())
                    .unwrap_or(&ctx.critical_modules);
                !touches_critical(&ctx.files, prefixes)
            }
            Self::OpenConflict => ctx.open_conflicts.is_empty(),
            Self::ConventionalCommitFormat => ctx
                .commit_message
                .as_deref()
                .map_or(true, |m| CONVENTIONAL_COMMIT.is_match(m.trim())),
            Self::PrHasTests => {
                ctx.pr_description.as_deref().map_or(true, |d| MENTIONS_TESTS.is_match(d))
            }
            Self::Unknown(_) => return None,
        };
        Some(passed)
    }
}

/// Whether any file starts with any of the prefixes.
#[must_use]
pub fn touches_critical(files: &[String], prefixes: &[String]) -> bool {
    files.iter().any(|f| prefixes.iter().any(|p| !p.is_empty() && f.starts_with(p.as_str())))
}
