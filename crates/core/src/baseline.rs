//! Baseline support: snapshot known findings so only new ones are reported

use crate::Finding;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

const BASELINE_FILE: &str = ".lintra/baseline.json";

/// A single baselined finding, keyed by issue + file + message so matching
/// tolerates line shifts from unrelated edits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct BaselineEntry {
    pub issue: String,
    pub file: String,
    pub message: String,
}

/// Full baseline document stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Baseline {
    pub version: String,
    pub created_at: String,
    pub count: usize,
    pub entries: Vec<BaselineEntry>,
}

/// Relativize and normalize a finding path for stable matching across
/// machines and platforms.
fn baseline_path(file: &Path, root: &Path) -> String {
    file.strip_prefix(root)
        .unwrap_or(file)
        .to_string_lossy()
        .replace('\\', "/")
}

impl Baseline {
    /// Build a baseline from a set of findings, relativizing paths against
    /// `root`.
    pub fn from_findings(findings: &[Finding], root: &Path) -> Self {
        let entries: Vec<BaselineEntry> = findings
            .iter()
            .map(|f| BaselineEntry {
                issue: f.issue.clone(),
                file: baseline_path(&f.location.file, root),
                message: f.message.clone(),
            })
            .collect();

        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| format!("{}", d.as_secs()))
            .unwrap_or_default();

        Baseline {
            version: "1".to_string(),
            created_at: now,
            count: entries.len(),
            entries,
        }
    }

    /// Save the baseline to `.lintra/baseline.json`.
    pub fn save(&self, root: &Path) -> Result<()> {
        let path = root.join(BASELINE_FILE);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating baseline dir {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serializing baseline")?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Load a baseline from disk, returning `None` if the file doesn't exist.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let path = root.join(BASELINE_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let data =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let baseline: Baseline =
            serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(baseline))
    }

    /// Delete the baseline file. Returns `true` if a file was actually removed.
    pub fn clear(root: &Path) -> Result<bool> {
        let path = root.join(BASELINE_FILE);
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Whether a finding is already recorded in this baseline.
    pub fn contains(&self, issue: &str, file: &Path, message: &str, root: &Path) -> bool {
        let rel = baseline_path(file, root);
        self.entries
            .iter()
            .any(|e| e.issue == issue && e.file == rel && e.message == message)
    }
}

/// Filter findings against a baseline.
///
/// Returns `(new_findings, baselined)`.
pub fn filter_findings(
    findings: Vec<Finding>,
    baseline: &Baseline,
    root: &Path,
) -> (Vec<Finding>, Vec<Finding>) {
    let lookup: HashSet<(&str, &str, &str)> = baseline
        .entries
        .iter()
        .map(|e| (e.issue.as_str(), e.file.as_str(), e.message.as_str()))
        .collect();

    let mut new_findings = Vec::new();
    let mut baselined = Vec::new();

    for f in findings {
        let rel = baseline_path(&f.location.file, root);
        if lookup.contains(&(f.issue.as_str(), rel.as_str(), f.message.as_str())) {
            baselined.push(f);
        } else {
            new_findings.push(f);
        }
    }

    (new_findings, baselined)
}
