//! Schedule linter.
//!
//! Turns a set of events into diagnostics:
//! - `OVERLAP` errors where an event starts before earlier events have ended
//! - `FRAGMENTATION` warnings ("Swiss Cheese Gaps") for free gaps whose length
//!   falls inside a configurable band
//!
//! The linter is a pure function of its inputs. Thresholds are passed with
//! every call; there is no shared default state.

mod diagnostic;
mod rules;

pub use diagnostic::{Diagnostic, DiagnosticCode, LintSummary, Severity, TOP_BLOCKING_LIMIT};
pub use rules::{check_fragmentation, check_overlaps};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::schedule::Event;
use crate::timeline::Timeline;

pub const DEFAULT_FRAGMENTATION_MIN_MINUTES: i64 = 15;
pub const DEFAULT_FRAGMENTATION_MAX_MINUTES: i64 = 45;

/// Fragmentation band, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintConfig {
    #[serde(default = "default_min")]
    pub min_gap_minutes: i64,
    #[serde(default = "default_max")]
    pub max_gap_minutes: i64,
}

fn default_min() -> i64 {
    DEFAULT_FRAGMENTATION_MIN_MINUTES
}
fn default_max() -> i64 {
    DEFAULT_FRAGMENTATION_MAX_MINUTES
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            min_gap_minutes: DEFAULT_FRAGMENTATION_MIN_MINUTES,
            max_gap_minutes: DEFAULT_FRAGMENTATION_MAX_MINUTES,
        }
    }
}

impl LintConfig {
    /// Create a validated band
    ///
    /// # Errors
    /// Returns `InvalidThreshold` unless `0 <= min <= max`
    pub fn new(min_gap_minutes: i64, max_gap_minutes: i64) -> Result<Self, ValidationError> {
        let config = Self {
            min_gap_minutes,
            max_gap_minutes,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min_gap_minutes < 0 || self.min_gap_minutes > self.max_gap_minutes {
            return Err(ValidationError::InvalidThreshold {
                min: self.min_gap_minutes,
                max: self.max_gap_minutes,
            });
        }
        Ok(())
    }

    /// Whether a gap of `minutes` should be reported
    pub fn in_band(&self, minutes: i64) -> bool {
        self.min_gap_minutes <= minutes && minutes <= self.max_gap_minutes
    }
}

/// Diagnostics plus their summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintReport {
    pub diagnostics: Vec<Diagnostic>,
    pub summary: LintSummary,
}

/// Linter bound to one threshold configuration.
#[derive(Debug, Clone)]
pub struct Linter {
    config: LintConfig,
}

impl Linter {
    /// Create a linter with default thresholds (15-45 minutes)
    pub fn new() -> Self {
        Self {
            config: LintConfig::default(),
        }
    }

    /// Create with custom thresholds
    ///
    /// # Errors
    /// Returns `InvalidThreshold` if the band is invalid
    pub fn with_config(config: LintConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LintConfig {
        &self.config
    }

    /// Lint `events`.
    ///
    /// # Returns
    /// Diagnostics ordered by `start`, then `event_id`, then severity. The
    /// result does not depend on the order of `events`.
    ///
    /// # Errors
    /// Returns `MalformedInterval` if any event ends at or before its start
    pub fn lint(&self, events: &[Event]) -> Result<Vec<Diagnostic>, ValidationError> {
        let timeline = Timeline::new(events)?;

        let mut diagnostics = check_overlaps(&timeline);
        diagnostics.extend(check_fragmentation(&timeline, &self.config));
        diagnostics.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then_with(|| a.event_id.cmp(&b.event_id))
                .then_with(|| a.severity.cmp(&b.severity))
        });

        tracing::debug!(
            event_count = events.len(),
            diagnostic_count = diagnostics.len(),
            min_gap = self.config.min_gap_minutes,
            max_gap = self.config.max_gap_minutes,
            "lint executed"
        );

        Ok(diagnostics)
    }

    /// Lint `events` and summarize the result
    pub fn lint_report(&self, events: &[Event]) -> Result<LintReport, ValidationError> {
        let diagnostics = self.lint(events)?;
        let summary = LintSummary::from_diagnostics(&diagnostics);
        Ok(LintReport {
            diagnostics,
            summary,
        })
    }
}

impl Default for Linter {
    fn default() -> Self {
        Self::new()
    }
}

/// Lint with the given thresholds, or the defaults when `None`
pub fn lint_events(
    events: &[Event],
    config: Option<LintConfig>,
) -> Result<Vec<Diagnostic>, ValidationError> {
    Linter::with_config(config.unwrap_or_default())?.lint(events)
}
