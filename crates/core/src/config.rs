//! Configuration file parsing for .lintra.toml

use crate::finding::Severity;
use crate::issue::Issue;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// An ignore rule scoped to a path glob and/or a message pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnoreRule {
    /// Issue identifier this rule applies to (`"*"` matches every issue)
    pub id: String,

    /// Glob matched against the finding's project-relative path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Regex matched against the finding's message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// Per-issue tuning: enablement, severity overrides and ignore rules
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssuesConfig {
    /// Issues to turn on even when off by default
    #[serde(default)]
    pub enable: Vec<String>,

    /// Issues to turn off entirely
    #[serde(default)]
    pub disable: Vec<String>,

    /// Severity overrides: issue id → "error" | "warning" | "info"
    #[serde(default)]
    pub severity: HashMap<String, String>,

    /// Findings to drop by path or message
    #[serde(default)]
    pub ignore: Vec<IgnoreRule>,
}

/// Analysis-wide switches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Analyze library projects this project depends on
    #[serde(default = "default_true")]
    pub check_dependencies: bool,

    /// Run every source detector on test sources, not just the
    /// test-aware ones
    #[serde(default)]
    pub treat_tests_as_sources: bool,

    /// Include generated source roots in source traversal
    #[serde(default)]
    pub check_generated_sources: bool,
}

fn default_true() -> bool {
    true
}

/// Main configuration structure for .lintra.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintConfig {
    #[serde(default)]
    pub issues: IssuesConfig,

    #[serde(default)]
    pub options: OptionsConfig,
}

impl Default for LintConfig {
    fn default() -> Self {
        toml::from_str("").expect("empty TOML should parse to defaults")
    }
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            check_dependencies: true,
            treat_tests_as_sources: false,
            check_generated_sources: false,
        }
    }
}

impl LintConfig {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: LintConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Find and load .lintra.toml from the given directory or ancestors
    pub fn find_and_load(start_dir: &Path) -> Result<Self> {
        let mut current = start_dir;

        loop {
            let config_path = current.join(".lintra.toml");
            if config_path.exists() {
                return Self::from_file(&config_path);
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        // No config found, use defaults
        Ok(Self::default())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Whether the issue runs under this configuration.
    ///
    /// `disable` wins over `enable`; issues named in neither fall back to
    /// their registered default.
    pub fn is_enabled(&self, issue: &Issue) -> bool {
        if self.issues.disable.iter().any(|id| id == issue.id) {
            return false;
        }
        if self.issues.enable.iter().any(|id| id == issue.id) {
            return true;
        }
        issue.enabled_by_default
    }

    /// Effective severity for the issue, after overrides.
    pub fn severity_for(&self, issue: &Issue) -> Severity {
        self.issues
            .severity
            .get(issue.id)
            .and_then(|value| Severity::parse(value))
            .unwrap_or(issue.severity)
    }

    /// Whether a finding should be dropped by an ignore rule.
    ///
    /// `rel_path` must be relative to the project root so globs behave
    /// consistently across machines. A rule with neither a path nor a
    /// pattern ignores the issue everywhere.
    pub fn is_ignored(&self, issue_id: &str, rel_path: &Path, message: &str) -> bool {
        let path_str = rel_path.to_string_lossy();
        self.issues.ignore.iter().any(|rule| {
            if rule.id != "*" && rule.id != issue_id {
                return false;
            }
            let path_hit = rule.path.as_deref().is_some_and(|p| {
                glob::Pattern::new(p)
                    .map(|pattern| pattern.matches(&path_str))
                    .unwrap_or(false)
            });
            let message_hit = rule.pattern.as_deref().is_some_and(|p| {
                regex::Regex::new(p)
                    .map(|re| re.is_match(message))
                    .unwrap_or(false)
            });
            match (&rule.path, &rule.pattern) {
                (None, None) => true,
                _ => path_hit || message_hit,
            }
        })
    }

    /// Programmatically ignore an issue under a path glob.
    pub fn ignore(&mut self, issue_id: impl Into<String>, path: impl Into<String>) {
        self.issues.ignore.push(IgnoreRule {
            id: issue_id.into(),
            path: Some(path.into()),
            pattern: None,
        });
    }

    /// Programmatically override an issue's severity.
    pub fn set_severity(&mut self, issue_id: impl Into<String>, severity: Severity) {
        self.issues
            .severity
            .insert(issue_id.into(), severity.to_string());
    }

    pub fn enable(&mut self, issue_id: impl Into<String>) {
        self.issues.enable.push(issue_id.into());
    }

    pub fn disable(&mut self, issue_id: impl Into<String>) {
        self.issues.disable.push(issue_id.into());
    }
}
