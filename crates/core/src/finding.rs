//! Finding types that bridge analysis results to host reporters

use crate::location::Location;
use serde::{Deserialize, Serialize};

/// Severity level of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Parse a configuration string (`"error"`, `"warning"`, `"info"`).
    pub fn parse(value: &str) -> Option<Severity> {
        match value {
            "error" => Some(Severity::Error),
            "warning" => Some(Severity::Warning),
            "info" => Some(Severity::Info),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A single finding produced by a detector and accepted by the reporting
/// pipeline (enabled, not suppressed, not ignored by configuration).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Issue identifier (e.g. "DuplicateDefinition")
    pub issue: String,

    /// Severity after per-project configuration overrides
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Where the problem is, possibly with a secondary location chained on
    pub location: Location,

    /// Human-readable remediation suggestion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Summary of an entire analysis run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub files_scanned: usize,
    pub projects_scanned: usize,
    /// Findings filtered out because they matched the baseline.
    pub baseline_filtered: usize,
}

impl AnalysisSummary {
    pub(crate) fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Info => self.infos += 1,
        }
    }
}
