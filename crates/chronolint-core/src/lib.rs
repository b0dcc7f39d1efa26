//! # Chronolint Core Library
//!
//! This library provides timeline diagnostics and automatic task planning.
//! It implements a CLI-first philosophy: every operation is available via the
//! standalone `chronolint` binary, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timeline**: Ordered view over events, half-open intervals and free-window
//!   subtraction
//! - **Linter**: Overlap errors and fragmentation ("Swiss Cheese Gap") warnings
//! - **Dependency graph**: Validation and deterministic ordering of task
//!   dependencies
//! - **Planner**: Places flexible tasks into free time around fixed events
//! - **Storage**: TOML-based configuration
//!
//! The algorithms are pure functions of their inputs. Nothing is cached or
//! shared between calls.
//!
//! ## Key Components
//!
//! - [`Linter`]: Schedule linter
//! - [`DependencyGraph`]: Validated task dependency relation
//! - [`Planner`]: Automatic planner
//! - [`Config`]: Application configuration management

pub mod error;
pub mod graph;
pub mod linter;
pub mod schedule;
pub mod scheduler;
pub mod storage;
pub mod task;
pub mod timeline;

pub use error::{ConfigError, CoreError, GraphError, ValidationError};
pub use graph::{order_tasks, DependencyGraph};
pub use linter::{
    lint_events, Diagnostic, DiagnosticCode, LintConfig, LintReport, LintSummary, Linter, Severity,
};
pub use schedule::Event;
pub use scheduler::{
    FocusHours, Plan, PlanWindow, PlannedBlock, Planner, PlannerConfig, ReasonCode, UnscheduledTask,
};
pub use storage::Config;
pub use task::{listing_order, DependencyIds, Task, TaskStatus};
pub use timeline::{Interval, Timeline};
