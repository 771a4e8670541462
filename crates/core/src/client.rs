//! Host integration surface
//!
//! Everything environment-specific goes through [`LintClient`]: reporting,
//! logging, file access, bytecode parsing, and read-action bracketing for
//! IDE hosts. The engine itself never prints, and never reads bytecode.

use crate::class::ClassInfo;
use crate::finding::{Finding, Severity};
use crate::project::Project;
use anyhow::Result;
use std::io;
use std::path::Path;

pub trait LintClient {
    /// Deliver one accepted finding. Enablement, suppression, configuration
    /// ignores and the baseline have all been applied by the time this is
    /// called.
    fn report(&mut self, project: &Project, finding: &Finding);

    /// Tool diagnostics (not findings): detector crashes, unreadable files,
    /// deprecation notices.
    fn log(&mut self, severity: Severity, message: &str);

    /// Read a text file. IDE hosts override this to serve unsaved editor
    /// buffers instead of disk contents.
    fn read_file(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    /// Parse one compiled class. `bytes` is the raw class file; `path` is
    /// where it came from, for diagnostics.
    fn parse_class(&mut self, path: &Path, bytes: &[u8]) -> Result<ClassInfo> {
        let _ = bytes;
        Err(anyhow::anyhow!(
            "no class-file reader installed (cannot parse {})",
            path.display()
        ))
    }

    /// Parse every class in a jar library. Hosts without bytecode support
    /// can leave the default, which contributes nothing.
    fn load_jar_classes(&mut self, jar: &Path) -> Result<Vec<ClassInfo>> {
        let _ = jar;
        Ok(Vec::new())
    }

    /// Bracket a computation that touches parsed source structures. IDE
    /// hosts wrap this in their read lock; the default just runs it.
    fn run_read_action(&self, action: &mut dyn FnMut()) {
        action();
    }
}

/// A client that records everything it is given. The default choice for
/// tests and batch embedding.
#[derive(Default)]
pub struct CollectingClient {
    pub findings: Vec<Finding>,
    pub logs: Vec<(Severity, String)>,
}

impl CollectingClient {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LintClient for CollectingClient {
    fn report(&mut self, _project: &Project, finding: &Finding) {
        self.findings.push(finding.clone());
    }

    fn log(&mut self, severity: Severity, message: &str) {
        self.logs.push((severity, message.to_string()));
    }
}
