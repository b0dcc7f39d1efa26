//! Diagnostic records produced by the linter.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// Which rule produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    Overlap,
    Fragmentation,
}

impl DiagnosticCode {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Overlap => Severity::Error,
            Self::Fragmentation => Severity::Warning,
        }
    }

    fn hint(&self) -> &'static str {
        match self {
            Self::Overlap => "Move or shorten one of the overlapping events.",
            Self::Fragmentation => {
                "Merge the surrounding events or reserve the gap for a short task."
            }
        }
    }
}

/// A single finding about the schedule. Derived fresh on every lint call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub event_id: Option<String>,
    pub hint: Option<String>,
}

impl Diagnostic {
    pub(crate) fn new(
        code: DiagnosticCode,
        message: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        event_id: &str,
    ) -> Self {
        Self {
            code,
            severity: code.severity(),
            message: message.into(),
            start,
            end: Some(end),
            event_id: Some(event_id.to_string()),
            hint: Some(code.hint().to_string()),
        }
    }
}

/// Maximum number of errors echoed in [`LintSummary::top_blocking_issues`].
pub const TOP_BLOCKING_LIMIT: usize = 3;

/// Roll-up of a lint run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LintSummary {
    /// Count per severity; every severity is present, zero when unseen
    pub severity_counts: BTreeMap<Severity, usize>,
    /// First errors in output order
    pub top_blocking_issues: Vec<Diagnostic>,
}

impl LintSummary {
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        let mut severity_counts: BTreeMap<Severity, usize> =
            [(Severity::Warning, 0), (Severity::Error, 0)].into_iter().collect();
        for diagnostic in diagnostics {
            *severity_counts.entry(diagnostic.severity).or_default() += 1;
        }

        let top_blocking_issues = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .take(TOP_BLOCKING_LIMIT)
            .cloned()
            .collect();

        Self {
            severity_counts,
            top_blocking_issues,
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.severity_counts.get(&severity).copied().unwrap_or(0)
    }

    /// True when no error-level diagnostic was produced
    pub fn is_clean(&self) -> bool {
        self.count(Severity::Error) == 0
    }
}
