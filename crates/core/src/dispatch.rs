//! Scope-to-detector dispatch table
//!
//! Built once per root project per phase: every enabled issue whose scope
//! intersects the active scope contributes its detector, deduplicated by
//! detector type so a type declaring several issues still gets one
//! instance. Lookups are per [`Scope`]; the driver consults the buckets it
//! needs at each traversal step.

use crate::config::LintConfig;
use crate::detector::Detector;
use crate::issue::Issue;
use crate::scope::{Scope, ScopeSet};
use std::any::TypeId;
use std::collections::{HashMap, HashSet};

pub(crate) struct DetectorEntry {
    pub detector: Box<dyn Detector>,
    pub type_id: TypeId,
    pub type_name: &'static str,
}

pub struct DispatchTable {
    entries: Vec<DetectorEntry>,
    buckets: HashMap<Scope, Vec<usize>>,
    /// Type names of detectors still on a deprecated source backend,
    /// sorted; drives the one-time compatibility diagnostic.
    legacy_detectors: Vec<&'static str>,
}

impl DispatchTable {
    /// Build the table for `scope` from the enabled subset of `issues`.
    pub fn build(issues: &[&'static Issue], config: &LintConfig, scope: ScopeSet) -> DispatchTable {
        Self::build_with(issues, config, scope, None, HashMap::new())
    }

    /// Rebuild for a repeat phase: only detectors in `requesting` are kept,
    /// and surviving instances are carried over so their state persists.
    pub(crate) fn rebuild_for_repeat(
        self,
        issues: &[&'static Issue],
        config: &LintConfig,
        scope: ScopeSet,
        requesting: &HashSet<TypeId>,
    ) -> DispatchTable {
        let mut existing: HashMap<TypeId, Box<dyn Detector>> = self
            .entries
            .into_iter()
            .map(|e| (e.type_id, e.detector))
            .collect();
        Self::build_with(issues, config, scope, Some(requesting), {
            // Keep only the instances that will be reused.
            existing.retain(|id, _| requesting.contains(id));
            existing
        })
    }

    fn build_with(
        issues: &[&'static Issue],
        config: &LintConfig,
        scope: ScopeSet,
        only: Option<&HashSet<TypeId>>,
        mut reuse: HashMap<TypeId, Box<dyn Detector>>,
    ) -> DispatchTable {
        let mut table = DispatchTable {
            entries: Vec::new(),
            buckets: HashMap::new(),
            legacy_detectors: Vec::new(),
        };
        let mut index_by_type: HashMap<TypeId, usize> = HashMap::new();

        for issue in issues {
            if !config.is_enabled(issue) {
                continue;
            }
            let implementation = &issue.implementation;
            let registered = implementation.scope.intersection(scope);
            if registered.is_empty() {
                continue;
            }
            let type_id = implementation.detector_id();
            if let Some(only) = only {
                if !only.contains(&type_id) {
                    continue;
                }
            }

            let index = *index_by_type.entry(type_id).or_insert_with(|| {
                let detector = reuse
                    .remove(&type_id)
                    .unwrap_or_else(|| implementation.new_detector());
                table.entries.push(DetectorEntry {
                    detector,
                    type_id,
                    type_name: implementation.detector_name(),
                });
                table.entries.len() - 1
            });

            for scope in registered.iter() {
                let bucket = table.buckets.entry(scope).or_default();
                if !bucket.contains(&index) {
                    bucket.push(index);
                }
                debug_check_capability(&mut table.entries[index], scope);
            }
        }

        for entry in &mut table.entries {
            if entry.detector.as_legacy_ast_scanner().is_some()
                || entry.detector.as_line_scanner().is_some()
            {
                table.legacy_detectors.push(entry.type_name);
            }
        }
        table.legacy_detectors.sort_unstable();
        table.legacy_detectors.dedup();

        table
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn bucket(&self, scope: Scope) -> Vec<usize> {
        self.buckets.get(&scope).cloned().unwrap_or_default()
    }

    /// Union of several buckets, first occurrence wins, order preserved.
    pub(crate) fn merged_bucket(&self, scopes: &[Scope]) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for scope in scopes {
            for index in self.bucket(*scope) {
                if seen.insert(index) {
                    merged.push(index);
                }
            }
        }
        merged
    }

    pub(crate) fn entry_mut(&mut self, index: usize) -> &mut DetectorEntry {
        &mut self.entries[index]
    }

    pub(crate) fn entries_mut(&mut self) -> impl Iterator<Item = &mut DetectorEntry> {
        self.entries.iter_mut()
    }

    pub(crate) fn legacy_detectors(&self) -> &[&'static str] {
        &self.legacy_detectors
    }
}

/// A detector registered under a scope it cannot actually scan is a wiring
/// bug in the detector's Implementation; catch it in debug builds.
fn debug_check_capability(entry: &mut DetectorEntry, scope: Scope) {
    if cfg!(debug_assertions) {
        let detector = &mut entry.detector;
        let ok = match scope {
            Scope::ResourceFile | Scope::AllResourceFiles | Scope::Manifest => {
                detector.as_xml_scanner().is_some()
            }
            Scope::JavaFile | Scope::AllJavaFiles => {
                detector.as_ast_scanner().is_some()
                    || detector.as_legacy_ast_scanner().is_some()
                    || detector.as_line_scanner().is_some()
            }
            Scope::ClassFile | Scope::AllClassFiles => detector.as_class_scanner().is_some(),
            Scope::GradleFile => detector.as_gradle_scanner().is_some(),
            Scope::BinaryResourceFile => detector.as_binary_resource_scanner().is_some(),
            Scope::ResourceFolder => detector.as_resource_folder_scanner().is_some(),
            Scope::Other => detector.as_other_file_scanner().is_some(),
            // Covered by the base `run` hook or by the buckets above.
            Scope::ProguardFile
            | Scope::PropertyFile
            | Scope::TestSources
            | Scope::JavaLibraries => true,
        };
        debug_assert!(
            ok,
            "{} is registered under {:?} but lacks the matching scanner capability",
            entry.type_name, scope
        );
    }
}
