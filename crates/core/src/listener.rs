//! Progress events for hosts that show analysis state

use crate::project::Project;
use crate::scope::ScopeSet;
use std::path::Path;

/// What the driver is doing right now. Events fire in traversal order, so a
/// progress UI can be driven directly off them.
#[derive(Debug)]
pub enum DriverEvent<'a> {
    /// A project (root or library) was resolved and registered.
    RegisteredProject { project: &'a Project },
    /// Analysis is about to begin.
    Starting,
    /// A repeat was granted; `phase` counts from 1.
    NewPhase { phase: u8, scope: ScopeSet },
    /// Traversal of a root project began.
    ScanningProject { project: &'a Project, phase: u8 },
    /// Traversal of a dependency began.
    ScanningLibraryProject { project: &'a Project },
    /// One file is being visited.
    ScanningFile { file: &'a Path },
    /// Analysis finished normally.
    Completed,
    /// Analysis stopped early because cancellation was requested.
    Canceled,
}

pub trait LintListener {
    fn update(&mut self, event: &DriverEvent<'_>);
}
