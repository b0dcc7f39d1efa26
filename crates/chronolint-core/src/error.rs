//! Core error types for chronolint-core.
//!
//! This module defines the error hierarchy using thiserror. Shape and graph
//! errors fail a call outright; per-task planning failures are reported as
//! data by the scheduler and never surface here.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::scheduler::ReasonCode;

/// Core error type for chronolint-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Input shape errors (intervals, thresholds, windows)
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Dependency graph errors
    #[error("Dependency graph error: {0}")]
    Graph(#[from] GraphError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An event whose end is not strictly after its start
    #[error("Malformed interval for event '{event_id}': end_time ({end}) must be greater than start_time ({start})")]
    MalformedInterval {
        event_id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Fragmentation thresholds outside `0 <= min <= max`
    #[error("Invalid fragmentation thresholds: min ({min}) and max ({max}) must satisfy 0 <= min <= max")]
    InvalidThreshold { min: i64, max: i64 },

    /// Planning window whose end is not after its start
    #[error("Invalid planning window: window_end ({end}) must be greater than window_start ({start})")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Focus hours outside `0 <= start < end <= 24`
    #[error("Invalid focus hours: {start}..{end} must satisfy 0 <= start < end <= 24")]
    InvalidFocusHours { start: u32, end: u32 },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Dependency graph errors. Any of these aborts a planning call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A task references a task id that is not in the task set
    #[error("Task '{task_id}' depends on unknown task '{missing_id}'")]
    MissingDependency { task_id: String, missing_id: String },

    /// The dependency relation contains a cycle
    #[error("Cyclic dependency: {}", format_cycle(.cycle))]
    CyclicDependency { cycle: Vec<String> },

    /// Two tasks share an id
    #[error("Duplicate task id '{0}'")]
    DuplicateTask(String),
}

impl GraphError {
    /// Machine-readable reason code for graph-level failures.
    pub fn reason_code(&self) -> Option<ReasonCode> {
        match self {
            Self::MissingDependency { .. } => Some(ReasonCode::MissingDependency),
            Self::CyclicDependency { .. } => Some(ReasonCode::CyclicDependency),
            Self::DuplicateTask(_) => None,
        }
    }
}

fn format_cycle(cycle: &[String]) -> String {
    match cycle.first() {
        Some(first) => format!("{} -> {}", cycle.join(" -> "), first),
        None => String::new(),
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration schema
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
