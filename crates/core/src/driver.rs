//! The analysis driver
//!
//! One [`LintDriver`] runs one analysis: it resolves the requested inputs
//! into a project graph, computes the active scope, and walks each root
//! project in the fixed traversal order (manifest, resources, sources,
//! classes, build scripts, other files, proguard, properties), dispatching
//! the detectors registered for each step. Detectors can request bounded
//! repeat phases; findings flow through the per-visit contexts and are
//! baseline-filtered here before reaching the host.

use crate::baseline::Baseline;
use crate::cache::FileCache;
use crate::class::ClassInfo;
use crate::client::LintClient;
use crate::context::{
    BinaryContext, ClassContext, Context, ContextPayload, GradleContext, RepeatRequest,
    ResourceFolderContext, SourceContext, XmlContext,
};
use crate::discovery;
use crate::dispatch::DispatchTable;
use crate::dom::XmlDocument;
use crate::finding::{AnalysisSummary, Finding, Severity};
use crate::issue::Issue;
use crate::listener::{DriverEvent, LintListener};
use crate::location::Location;
use crate::parser::legacy::LegacyAst;
use crate::parser::{self, SourceLanguage, SourceParser};
use crate::project::{find_project_root, Project, ProjectRegistry, MANIFEST_FILE};
use crate::registry::{IssueRegistry, LINT_ERROR, MISSING_CLASS_OUTPUT};
use crate::scope::{ResourceFolderKind, Scope, ScopeSet};
use anyhow::{bail, Result};
use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Hard bound on analysis phases per root project.
pub const MAX_PHASES: u8 = 3;

/// After this many detector crashes the synthetic findings stop; the run
/// itself keeps going.
const MAX_REPORTED_CRASHES: usize = 20;

const SOURCE_EXTENSIONS: &[&str] = &["java", "kt", "kts"];
const PROGUARD_FILES: &[&str] = &["proguard.cfg", "proguard-project.txt", "proguard-rules.pro"];
const PROPERTY_FILES: &[&str] = &["local.properties", "gradle/wrapper/gradle-wrapper.properties"];

/// Longest a panic payload echoed into a finding may get.
const MAX_CRASH_MESSAGE: usize = 200;

/// Panic payload a host may throw from a callback to cancel the whole run
/// without a diagnostic.
pub struct HostCancelled;

/// Panic payload a host may throw when its indexes are not ready; the
/// current file is abandoned silently.
pub struct HostNotReady;

/// What to analyze: project directories and/or individual files.
#[derive(Debug, Default)]
pub struct LintRequest {
    pub inputs: Vec<PathBuf>,
    /// Explicit scope; when absent it is inferred (directory inputs get the
    /// full scope, pure file lists get the scope their kinds imply).
    pub scope: Option<ScopeSet>,
    pub baseline: Option<Baseline>,
}

impl LintRequest {
    pub fn new(inputs: Vec<PathBuf>) -> LintRequest {
        LintRequest {
            inputs,
            scope: None,
            baseline: None,
        }
    }

    pub fn with_scope(mut self, scope: ScopeSet) -> LintRequest {
        self.scope = Some(scope);
        self
    }

    pub fn with_baseline(mut self, baseline: Baseline) -> LintRequest {
        self.baseline = Some(baseline);
        self
    }
}

/// Cooperative cancellation flag; safe to flip from another thread. The
/// driver polls it between files, projects and phases, never mid-visit.
#[derive(Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Phase bookkeeping, threaded through the traversal instead of stored on
/// the driver so a stale phase can never leak across roots.
#[derive(Clone, Copy)]
struct PhaseState {
    phase: u8,
    scope: ScopeSet,
}

/// Everything one phase of one root project carries through the traversal:
/// the dispatch table, the phase counter and scope, and the repeat requests
/// collected so far.
struct Traversal<'t> {
    table: &'t mut DispatchTable,
    state: PhaseState,
    repeats: &'t mut Vec<RepeatRequest>,
}

/// Drives one analysis run. Not reentrant: `analyze` consumes the request
/// and refuses a second call.
pub struct LintDriver<'c> {
    registry: Box<dyn IssueRegistry>,
    client: &'c mut dyn LintClient,
    request: Option<LintRequest>,
    projects: ProjectRegistry,
    listeners: Vec<Box<dyn LintListener>>,
    cancel: CancelHandle,
    parser: SourceParser,
    contents: FileCache<String>,
    summary: AnalysisSummary,
    baseline: Option<Baseline>,
    subset: Option<Vec<PathBuf>>,
    crashes: usize,
    legacy_noticed: bool,
}

impl<'c> LintDriver<'c> {
    pub fn new(
        registry: Box<dyn IssueRegistry>,
        client: &'c mut dyn LintClient,
        request: LintRequest,
    ) -> LintDriver<'c> {
        LintDriver {
            registry,
            client,
            request: Some(request),
            projects: ProjectRegistry::new(),
            listeners: Vec::new(),
            cancel: CancelHandle::default(),
            parser: SourceParser::new(),
            contents: FileCache::new(),
            summary: AnalysisSummary::default(),
            baseline: None,
            subset: None,
            crashes: 0,
            legacy_noticed: false,
        }
    }

    /// Start from a pre-warmed contents cache, typically one taken from an
    /// earlier run with [`take_file_cache`](Self::take_file_cache).
    pub fn with_file_cache(mut self, cache: FileCache<String>) -> Self {
        self.contents = cache;
        self
    }

    /// Hand the contents cache back to the host for reuse across runs.
    pub fn take_file_cache(&mut self) -> FileCache<String> {
        std::mem::take(&mut self.contents)
    }

    pub fn add_listener(&mut self, listener: Box<dyn LintListener>) {
        self.listeners.push(listener);
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// The registered project whose directory contains `file`. Available
    /// once `analyze` has resolved the inputs.
    pub fn find_project_for(&self, file: &Path) -> Option<Rc<Project>> {
        self.projects.find_containing(file)
    }

    /// Run the analysis and return the run summary. Findings and log lines
    /// go to the client as they are produced.
    pub fn analyze(&mut self) -> Result<AnalysisSummary> {
        let Some(request) = self.request.take() else {
            bail!("this driver already ran; create a new one per analysis");
        };
        self.baseline = request.baseline;

        // Resolve inputs into root projects plus an optional file subset.
        let mut roots: Vec<Rc<Project>> = Vec::new();
        let mut subset: Vec<PathBuf> = Vec::new();
        let mut deferred: Vec<(Rc<Project>, PathBuf, String)> = Vec::new();
        let mut diag_cursor = 0;
        let mut files_only = true;
        for input in &request.inputs {
            let Ok(input) = input.canonicalize() else {
                self.client.log(
                    Severity::Warning,
                    &format!("skipping {}: not found", input.display()),
                );
                continue;
            };
            let root_dir = if input.is_dir() {
                files_only = false;
                input.clone()
            } else {
                subset.push(input.clone());
                match find_project_root(&input) {
                    Some(dir) => dir,
                    None => {
                        self.client.log(
                            Severity::Warning,
                            &format!("skipping {}: no enclosing project found", input.display()),
                        );
                        continue;
                    }
                }
            };
            let root = self.projects.load(&root_dir)?;
            for diag in &self.projects.diagnostics()[diag_cursor..] {
                deferred.push((root.clone(), diag.dir.clone(), diag.message.clone()));
            }
            diag_cursor = self.projects.diagnostics().len();
            if !roots.iter().any(|r| Rc::ptr_eq(r, &root)) {
                roots.push(root);
            }
        }
        if roots.is_empty() {
            bail!("no projects to analyze");
        }

        for project in self.projects.projects().to_vec() {
            if let Some(error) = &project.config_error {
                self.client.log(
                    Severity::Warning,
                    &format!(
                        "{}: configuration ignored, using defaults: {}",
                        project.name, error
                    ),
                );
            }
            self.notify(&DriverEvent::RegisteredProject { project: &project });
        }

        // A subset only restricts the traversal when every input was a file;
        // once a whole directory is requested the roots are walked in full.
        let subset_mode = files_only && !subset.is_empty();
        let scope = match (request.scope, subset_mode) {
            (Some(scope), false) => scope,
            (Some(scope), true) => scope.intersection(infer_scope(&subset)),
            (None, true) => infer_scope(&subset),
            (None, false) => ScopeSet::all(),
        };
        self.subset = if subset_mode { Some(subset) } else { None };

        let issues = self.registry.issues();
        self.notify(&DriverEvent::Starting);

        for (root, dir, message) in deferred {
            self.report_synthetic(&root, &root, &LINT_ERROR, Location::file_level(dir), message);
        }

        for root in &roots {
            if self.canceled() {
                break;
            }
            let outcome =
                catch_unwind(AssertUnwindSafe(|| self.check_project_root(root, &issues, scope)));
            match outcome {
                Ok(result) => result?,
                Err(panic) => {
                    let dir = root.dir.clone();
                    self.handle_panic(root, root, &dir, panic);
                }
            }
        }

        if self.canceled() {
            self.notify(&DriverEvent::Canceled);
        } else {
            self.notify(&DriverEvent::Completed);
        }
        Ok(self.summary.clone())
    }

    fn canceled(&self) -> bool {
        self.cancel.is_canceled()
    }

    fn notify(&mut self, event: &DriverEvent<'_>) {
        for listener in &mut self.listeners {
            listener.update(event);
        }
    }

    fn in_subset(&self, file: &Path) -> bool {
        match &self.subset {
            Some(files) => files.iter().any(|f| f == file),
            None => true,
        }
    }

    fn folder_in_subset(&self, folder: &Path) -> bool {
        match &self.subset {
            Some(files) => files.iter().any(|f| f.parent() == Some(folder)),
            None => true,
        }
    }

    /// Run the bounded phase loop over one root project.
    fn check_project_root(
        &mut self,
        main: &Rc<Project>,
        issues: &[&'static Issue],
        initial_scope: ScopeSet,
    ) -> Result<()> {
        let mut state = PhaseState {
            phase: 1,
            scope: initial_scope,
        };
        let mut table = DispatchTable::build(issues, &main.config, state.scope);
        self.log_legacy_notice(&table);

        loop {
            self.notify(&DriverEvent::ScanningProject {
                project: main,
                phase: state.phase,
            });
            let repeats = self.run_phase(main, &mut table, state);
            if repeats.is_empty() || self.canceled() || state.phase >= MAX_PHASES {
                // Requests past the bound are dropped without a diagnostic.
                break;
            }

            // A repeat narrows the scope to the union of the hints, unless
            // any requester left the hint out, which keeps the full scope.
            let mut hinted = ScopeSet::empty();
            let mut unhinted = false;
            for request in &repeats {
                match request.scope {
                    Some(scope) => hinted = hinted.union(scope),
                    None => unhinted = true,
                }
            }
            let next_scope = if unhinted {
                state.scope
            } else {
                state.scope.intersection(hinted)
            };
            if next_scope.is_empty() {
                break;
            }

            state.phase += 1;
            state.scope = next_scope;
            let requesting: HashSet<TypeId> = repeats.iter().map(|r| r.detector).collect();
            table = table.rebuild_for_repeat(issues, &main.config, state.scope, &requesting);
            if table.is_empty() {
                break;
            }
            self.notify(&DriverEvent::NewPhase {
                phase: state.phase,
                scope: state.scope,
            });
        }
        Ok(())
    }

    /// One full phase: main project, then its libraries, then the project
    /// teardown hooks. Returns the repeat requests collected on the way.
    fn run_phase(
        &mut self,
        main: &Rc<Project>,
        table: &mut DispatchTable,
        state: PhaseState,
    ) -> Vec<RepeatRequest> {
        let mut repeats = Vec::new();
        let mut scan = Traversal {
            table,
            state,
            repeats: &mut repeats,
        };

        self.run_project_hook(main, main, &mut scan, ProjectHook::Before);
        if state.phase == 1 {
            self.summary.projects_scanned += 1;
        }
        self.check_project(main, main, &mut scan);

        let check_libraries = main.config.options.check_dependencies
            && has_whole_program_scope(state.scope)
            && !self.canceled();
        if check_libraries {
            for library in main.all_libraries() {
                if self.canceled() {
                    break;
                }
                self.notify(&DriverEvent::ScanningLibraryProject { project: &library });
                self.run_project_hook(&library, main, &mut scan, ProjectHook::Before);
                if state.phase == 1 {
                    self.summary.projects_scanned += 1;
                }
                self.check_project(&library, main, &mut scan);
                self.run_project_hook(&library, main, &mut scan, ProjectHook::AfterLibrary);
            }
        }

        self.run_project_hook(main, main, &mut scan, ProjectHook::After);
        repeats
    }

    /// The fixed traversal. Library projects stop after the class step.
    fn check_project(&mut self, project: &Project, main: &Project, scan: &mut Traversal<'_>) {
        let is_main = std::ptr::eq(project, main);

        // 1. Manifest
        if scan.state.scope.contains(Scope::Manifest) {
            if let Some(manifest) = project.manifest_file.clone() {
                if self.in_subset(&manifest) {
                    self.visit_xml_file(project, main, scan, &manifest, None);
                }
            }
        }
        if self.canceled() {
            return;
        }

        // 2. Resources
        self.check_resources(project, main, scan);
        if self.canceled() {
            return;
        }

        // 3. Sources
        self.check_sources(project, main, scan);
        if self.canceled() {
            return;
        }

        // 4. Classes
        self.check_classes(project, main, scan);
        if self.canceled() || !is_main {
            return;
        }

        // 5. Build scripts
        self.check_gradle(project, main, scan);
        if self.canceled() {
            return;
        }

        // 6. Other files
        self.check_other(project, main, scan);
        if self.canceled() {
            return;
        }

        // 7, 8. Proguard and property files
        self.check_raw_files(project, main, scan, Scope::ProguardFile, PROGUARD_FILES);
        self.check_raw_files(project, main, scan, Scope::PropertyFile, PROPERTY_FILES);
    }

    fn check_resources(&mut self, project: &Project, main: &Project, scan: &mut Traversal<'_>) {
        let scope = scan.state.scope;
        let wants_files =
            scope.contains(Scope::ResourceFile) || scope.contains(Scope::AllResourceFiles);
        let wants_binary = scope.contains(Scope::BinaryResourceFile);
        let wants_folders = scope.contains(Scope::ResourceFolder);
        if !(wants_files || wants_binary || wants_folders) {
            return;
        }

        for root in &project.resource_roots {
            for folder in discovery::sorted_dirs(root) {
                if self.canceled() {
                    return;
                }
                let Some(name) = folder.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                let Some(kind) = ResourceFolderKind::from_folder_name(name) else {
                    continue;
                };

                if wants_folders && self.folder_in_subset(&folder) {
                    self.visit_resource_folder(project, main, scan, &folder, kind);
                }

                for file in discovery::sorted_files(&folder) {
                    if self.canceled() {
                        return;
                    }
                    if !self.in_subset(&file) {
                        continue;
                    }
                    let is_xml = file.extension().and_then(|e| e.to_str()) == Some("xml");
                    if is_xml && wants_files {
                        self.visit_xml_file(project, main, scan, &file, Some(kind));
                    } else if !is_xml && wants_binary {
                        self.visit_binary_resource(project, main, scan, &file, kind);
                    }
                }
            }
        }
    }

    fn check_sources(&mut self, project: &Project, main: &Project, scan: &mut Traversal<'_>) {
        let scope = scan.state.scope;
        let wants_sources = scope.contains(Scope::JavaFile) || scope.contains(Scope::AllJavaFiles);
        let wants_tests = scope.contains(Scope::TestSources)
            || (wants_sources && main.config.options.treat_tests_as_sources);

        if wants_sources {
            let mut roots: Vec<&PathBuf> = project.source_roots.iter().collect();
            if main.config.options.check_generated_sources {
                roots.extend(project.generated_roots.iter());
            }
            for root in roots {
                for file in discovery::files_with_extensions(root, SOURCE_EXTENSIONS) {
                    if self.canceled() {
                        return;
                    }
                    if self.in_subset(&file) {
                        self.visit_source(project, main, scan, &file, false);
                    }
                }
            }
        }

        if wants_tests {
            for root in &project.test_roots {
                for file in discovery::files_with_extensions(root, SOURCE_EXTENSIONS) {
                    if self.canceled() {
                        return;
                    }
                    if self.in_subset(&file) {
                        self.visit_source(project, main, scan, &file, true);
                    }
                }
            }
        }
    }

    fn check_classes(&mut self, project: &Project, main: &Project, scan: &mut Traversal<'_>) {
        let scope = scan.state.scope;
        // Library bytecode goes to the class detectors too, so a detector
        // registered only for libraries still sees jar classes.
        let jar_bucket = scan.table.merged_bucket(&[
            Scope::JavaLibraries,
            Scope::ClassFile,
            Scope::AllClassFiles,
        ]);
        let class_bucket = scan
            .table
            .merged_bucket(&[Scope::ClassFile, Scope::AllClassFiles]);
        let wants_jars = scope.contains(Scope::JavaLibraries) && !jar_bucket.is_empty();
        let wants_classes = (scope.contains(Scope::ClassFile)
            || scope.contains(Scope::AllClassFiles))
            && !class_bucket.is_empty();

        // Bundled jars first, so detectors see library types before the
        // classes that use them.
        if wants_jars {
            let mut entries: Vec<(PathBuf, ClassInfo)> = Vec::new();
            for jar in &project.jar_paths {
                match self.client.load_jar_classes(jar) {
                    Ok(classes) => {
                        entries.extend(classes.into_iter().map(|mut class| {
                            class.from_library = true;
                            (jar.clone(), class)
                        }));
                    }
                    Err(e) => self.client.log(
                        Severity::Warning,
                        &format!("could not read {}: {}", jar.display(), e),
                    ),
                }
            }
            self.visit_class_set(project, main, scan, entries, &jar_bucket);
        }

        if !wants_classes {
            return;
        }
        if project.class_roots.is_empty() {
            if self.subset.is_none() {
                self.report_synthetic(
                    main,
                    project,
                    &MISSING_CLASS_OUTPUT,
                    Location::file_level(&project.dir),
                    format!(
                        "no compiled class output found for {}; class checks were skipped",
                        project.name
                    ),
                );
            }
            return;
        }

        let mut entries: Vec<(PathBuf, ClassInfo)> = Vec::new();
        for root in &project.class_roots {
            for file in discovery::files_with_extensions(root, &["class"]) {
                if self.canceled() {
                    return;
                }
                if !self.in_subset(&file) {
                    continue;
                }
                let bytes = match fs::read(&file) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        self.client.log(
                            Severity::Warning,
                            &format!("could not read {}: {}", file.display(), e),
                        );
                        continue;
                    }
                };
                match self.client.parse_class(&file, &bytes) {
                    Ok(class) => entries.push((file, class)),
                    Err(e) => self.client.log(
                        Severity::Warning,
                        &format!("could not parse {}: {}", file.display(), e),
                    ),
                }
            }
        }
        self.visit_class_set(project, main, scan, entries, &class_bucket);
    }

    /// Visit a batch of classes in internal-name order, maintaining the
    /// stack of enclosing classes keyed by the `$` nesting prefix.
    fn visit_class_set(
        &mut self,
        project: &Project,
        main: &Project,
        scan: &mut Traversal<'_>,
        mut entries: Vec<(PathBuf, ClassInfo)>,
        bucket: &[usize],
    ) {
        entries.sort_by(|a, b| a.1.internal_name.cmp(&b.1.internal_name));
        let (paths, classes): (Vec<PathBuf>, Vec<ClassInfo>) = entries.into_iter().unzip();

        let mut stack: Vec<usize> = Vec::new();
        for index in 0..classes.len() {
            if self.canceled() {
                return;
            }
            while let Some(&top) = stack.last() {
                if encloses(&classes[top].internal_name, &classes[index].internal_name) {
                    break;
                }
                stack.pop();
            }
            let outer: Vec<&ClassInfo> = stack.iter().rev().map(|&i| &classes[i]).collect();
            let file = &paths[index];

            self.notify(&DriverEvent::ScanningFile { file });
            self.summary.files_scanned += 1;
            let context = Context::new(
                project,
                main,
                file.clone(),
                None,
                scan.state.phase,
                scan.state.scope,
                false,
            );
            let mut ctx = ClassContext::new(context, &classes[index], &outer);
            let result = catch_unwind(AssertUnwindSafe(|| {
                for &entry_index in bucket {
                    let entry = scan.table.entry_mut(entry_index);
                    ctx.context.current_detector = Some((entry.type_id, entry.type_name));
                    entry.detector.before_check_file(&mut ctx.context);
                    if let Some(scanner) = entry.detector.as_class_scanner() {
                        scanner.visit_class(&mut ctx);
                    }
                    entry.detector.after_check_file(&mut ctx.context);
                }
                ctx.context.current_detector = None;
                ctx.context.into_payload()
            }));
            self.handle_visit_result(main, project, file, result, scan.repeats);

            stack.push(index);
        }
    }

    fn check_gradle(&mut self, project: &Project, main: &Project, scan: &mut Traversal<'_>) {
        if !scan.state.scope.contains(Scope::GradleFile) {
            return;
        }
        let bucket = scan.table.bucket(Scope::GradleFile);
        if bucket.is_empty() {
            return;
        }
        for file in discovery::gradle_files(&project.dir) {
            if self.canceled() {
                return;
            }
            if !self.in_subset(&file) {
                continue;
            }
            let Some(contents) = self.read_contents(&file) else {
                continue;
            };
            self.notify(&DriverEvent::ScanningFile { file: &file });
            self.summary.files_scanned += 1;

            let context = Context::new(
                project,
                main,
                file.clone(),
                Some(contents),
                scan.state.phase,
                scan.state.scope,
                false,
            );
            let mut ctx = GradleContext { context };
            let result = catch_unwind(AssertUnwindSafe(|| {
                for &index in &bucket {
                    let entry = scan.table.entry_mut(index);
                    ctx.context.current_detector = Some((entry.type_id, entry.type_name));
                    entry.detector.before_check_file(&mut ctx.context);
                    if let Some(scanner) = entry.detector.as_gradle_scanner() {
                        scanner.visit_build_script(&mut ctx);
                    }
                    entry.detector.after_check_file(&mut ctx.context);
                }
                ctx.context.current_detector = None;
                ctx.context.into_payload()
            }));
            self.handle_visit_result(main, project, &file, result, scan.repeats);
        }
    }

    fn check_other(&mut self, project: &Project, main: &Project, scan: &mut Traversal<'_>) {
        let bucket = scan.table.bucket(Scope::Other);
        if bucket.is_empty() {
            return;
        }
        for file in self.discover_all(project, main) {
            if self.canceled() {
                return;
            }
            if !self.in_subset(&file) {
                continue;
            }
            // Binary files simply yield no contents.
            let contents = self.read_contents_quiet(&file);
            self.notify(&DriverEvent::ScanningFile { file: &file });
            self.summary.files_scanned += 1;

            let mut ctx = Context::new(
                project,
                main,
                file.clone(),
                contents,
                scan.state.phase,
                scan.state.scope,
                project.is_test_file(&file),
            );
            let result = catch_unwind(AssertUnwindSafe(|| {
                for &index in &bucket {
                    let entry = scan.table.entry_mut(index);
                    ctx.current_detector = Some((entry.type_id, entry.type_name));
                    entry.detector.before_check_file(&mut ctx);
                    if let Some(scanner) = entry.detector.as_other_file_scanner() {
                        scanner.visit_other_file(&mut ctx);
                    }
                    entry.detector.after_check_file(&mut ctx);
                }
                ctx.current_detector = None;
                ctx.into_payload()
            }));
            self.handle_visit_result(main, project, &file, result, scan.repeats);
        }
    }

    /// Everything the fixed traversal could discover for the project,
    /// whether or not the active scope asked for those categories.
    fn discover_all(&self, project: &Project, main: &Project) -> Vec<PathBuf> {
        let mut files = Vec::new();
        if let Some(manifest) = &project.manifest_file {
            files.push(manifest.clone());
        }
        for root in &project.resource_roots {
            for folder in discovery::sorted_dirs(root) {
                files.extend(discovery::sorted_files(&folder));
            }
        }
        let mut source_roots: Vec<&PathBuf> = project.source_roots.iter().collect();
        if main.config.options.check_generated_sources {
            source_roots.extend(project.generated_roots.iter());
        }
        source_roots.extend(project.test_roots.iter());
        for root in source_roots {
            files.extend(discovery::files_with_extensions(root, SOURCE_EXTENSIONS));
        }
        for root in &project.class_roots {
            files.extend(discovery::files_with_extensions(root, &["class"]));
        }
        files.sort();
        files.dedup();
        files
    }

    fn check_raw_files(
        &mut self,
        project: &Project,
        main: &Project,
        scan: &mut Traversal<'_>,
        scope: Scope,
        names: &[&str],
    ) {
        if !scan.state.scope.contains(scope) {
            return;
        }
        let bucket = scan.table.bucket(scope);
        if bucket.is_empty() {
            return;
        }
        for name in names {
            if self.canceled() {
                return;
            }
            let file = project.dir.join(name);
            if !file.is_file() || !self.in_subset(&file) {
                continue;
            }
            let Some(contents) = self.read_contents(&file) else {
                continue;
            };
            self.notify(&DriverEvent::ScanningFile { file: &file });
            self.summary.files_scanned += 1;

            let mut ctx = Context::new(
                project,
                main,
                file.clone(),
                Some(contents),
                scan.state.phase,
                scan.state.scope,
                false,
            );
            let result = catch_unwind(AssertUnwindSafe(|| {
                for &index in &bucket {
                    let entry = scan.table.entry_mut(index);
                    ctx.current_detector = Some((entry.type_id, entry.type_name));
                    entry.detector.before_check_file(&mut ctx);
                    entry.detector.run(&mut ctx);
                    entry.detector.after_check_file(&mut ctx);
                }
                ctx.current_detector = None;
                ctx.into_payload()
            }));
            self.handle_visit_result(main, project, &file, result, scan.repeats);
        }
    }

    fn visit_xml_file(
        &mut self,
        project: &Project,
        main: &Project,
        scan: &mut Traversal<'_>,
        file: &Path,
        folder_kind: Option<ResourceFolderKind>,
    ) {
        let scopes: &[Scope] = if folder_kind.is_some() {
            &[Scope::ResourceFile, Scope::AllResourceFiles]
        } else {
            &[Scope::Manifest]
        };
        let bucket = scan.table.merged_bucket(scopes);
        if bucket.is_empty() {
            return;
        }
        let Some(contents) = self.read_contents(file) else {
            return;
        };
        let document = match XmlDocument::parse(&contents) {
            Ok(document) => document,
            Err(e) => {
                self.report_synthetic(
                    main,
                    project,
                    &LINT_ERROR,
                    Location::file_level(file),
                    format!("failed to parse {}: {}", file.display(), e),
                );
                return;
            }
        };
        self.notify(&DriverEvent::ScanningFile { file });
        self.summary.files_scanned += 1;

        let context = Context::new(
            project,
            main,
            file.to_path_buf(),
            Some(contents),
            scan.state.phase,
            scan.state.scope,
            false,
        );
        let mut ctx = XmlContext {
            context,
            document: &document,
            folder_kind,
        };
        let result = catch_unwind(AssertUnwindSafe(|| {
            for &index in &bucket {
                let entry = scan.table.entry_mut(index);
                ctx.context.current_detector = Some((entry.type_id, entry.type_name));
                entry.detector.before_check_file(&mut ctx.context);
                if let Some(scanner) = entry.detector.as_xml_scanner() {
                    let applies = folder_kind.map_or(true, |kind| scanner.applies_to(kind));
                    if applies {
                        scanner.visit_document(&mut ctx);
                        let filter = scanner.applicable_elements();
                        for element in document.iter_elements() {
                            let matches = filter
                                .map_or(true, |names| names.iter().any(|n| *n == element.name()));
                            if matches {
                                scanner.visit_element(&mut ctx, element);
                            }
                        }
                    }
                }
                entry.detector.after_check_file(&mut ctx.context);
            }
            ctx.context.current_detector = None;
            ctx.context.into_payload()
        }));
        self.handle_visit_result(main, project, file, result, scan.repeats);
    }

    fn visit_source(
        &mut self,
        project: &Project,
        main: &Project,
        scan: &mut Traversal<'_>,
        file: &Path,
        is_test: bool,
    ) {
        let Some(language) = SourceLanguage::from_path(file) else {
            return;
        };
        let bucket = if is_test && !main.config.options.treat_tests_as_sources {
            scan.table.bucket(Scope::TestSources)
        } else if is_test {
            scan.table
                .merged_bucket(&[Scope::JavaFile, Scope::AllJavaFiles, Scope::TestSources])
        } else {
            scan.table
                .merged_bucket(&[Scope::JavaFile, Scope::AllJavaFiles])
        };
        if bucket.is_empty() {
            return;
        }
        let Some(contents) = self.read_contents(file) else {
            return;
        };
        let tree = match self.parser.parse(&contents, language) {
            Ok(tree) => tree,
            Err(e) => {
                self.report_synthetic(
                    main,
                    project,
                    &LINT_ERROR,
                    Location::file_level(file),
                    format!("failed to parse {}: {}", file.display(), e),
                );
                return;
            }
        };
        self.notify(&DriverEvent::ScanningFile { file });
        self.summary.files_scanned += 1;

        let needs_legacy = bucket.iter().any(|&index| {
            let entry = scan.table.entry_mut(index);
            entry.detector.as_legacy_ast_scanner().is_some()
                || entry.detector.as_line_scanner().is_some()
        });
        let legacy_ast = if needs_legacy {
            Some(LegacyAst::from_tree(&tree, &contents, language))
        } else {
            None
        };

        let source: &str = contents.as_str();
        let context = Context::new(
            project,
            main,
            file.to_path_buf(),
            Some(contents.clone()),
            scan.state.phase,
            scan.state.scope,
            is_test,
        );
        let mut ctx = SourceContext::new(context, language, source);
        let client: &dyn LintClient = &*self.client;
        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut action = || {
                for &index in &bucket {
                    let entry = scan.table.entry_mut(index);
                    ctx.context.current_detector = Some((entry.type_id, entry.type_name));
                    entry.detector.before_check_file(&mut ctx.context);
                    if let Some(scanner) = entry.detector.as_ast_scanner() {
                        scanner.visit_tree(&mut ctx, &tree);
                        let kinds = scanner.applicable_node_kinds();
                        parser::for_each_node(tree.root_node(), &mut |node| {
                            if kinds.map_or(true, |ks| ks.contains(&node.kind())) {
                                scanner.visit_node(&mut ctx, node);
                            }
                        });
                    }
                    if let Some(ast) = legacy_ast.as_ref() {
                        if let Some(scanner) = entry.detector.as_legacy_ast_scanner() {
                            scanner.visit_unit(&mut ctx, ast);
                        }
                    }
                    if let Some(scanner) = entry.detector.as_line_scanner() {
                        for (number, line) in source.lines().enumerate() {
                            scanner.visit_line(&mut ctx, number, line);
                        }
                    }
                    entry.detector.after_check_file(&mut ctx.context);
                }
                ctx.context.current_detector = None;
            };
            client.run_read_action(&mut action);
            ctx.context.into_payload()
        }));
        self.handle_visit_result(main, project, file, result, scan.repeats);
    }

    fn visit_binary_resource(
        &mut self,
        project: &Project,
        main: &Project,
        scan: &mut Traversal<'_>,
        file: &Path,
        kind: ResourceFolderKind,
    ) {
        let bucket = scan.table.bucket(Scope::BinaryResourceFile);
        if bucket.is_empty() {
            return;
        }
        self.notify(&DriverEvent::ScanningFile { file });
        self.summary.files_scanned += 1;

        let context = Context::new(
            project,
            main,
            file.to_path_buf(),
            None,
            scan.state.phase,
            scan.state.scope,
            false,
        );
        let mut ctx = BinaryContext {
            context,
            folder_kind: Some(kind),
        };
        let result = catch_unwind(AssertUnwindSafe(|| {
            for &index in &bucket {
                let entry = scan.table.entry_mut(index);
                ctx.context.current_detector = Some((entry.type_id, entry.type_name));
                entry.detector.before_check_file(&mut ctx.context);
                if let Some(scanner) = entry.detector.as_binary_resource_scanner() {
                    if scanner.applies_to(kind) {
                        scanner.visit_binary_resource(&mut ctx);
                    }
                }
                entry.detector.after_check_file(&mut ctx.context);
            }
            ctx.context.current_detector = None;
            ctx.context.into_payload()
        }));
        self.handle_visit_result(main, project, file, result, scan.repeats);
    }

    fn visit_resource_folder(
        &mut self,
        project: &Project,
        main: &Project,
        scan: &mut Traversal<'_>,
        folder: &Path,
        kind: ResourceFolderKind,
    ) {
        let bucket = scan.table.bucket(Scope::ResourceFolder);
        if bucket.is_empty() {
            return;
        }
        let context = Context::new(
            project,
            main,
            folder.to_path_buf(),
            None,
            scan.state.phase,
            scan.state.scope,
            false,
        );
        let mut ctx = ResourceFolderContext {
            context,
            folder_kind: Some(kind),
        };
        let result = catch_unwind(AssertUnwindSafe(|| {
            for &index in &bucket {
                let entry = scan.table.entry_mut(index);
                ctx.context.current_detector = Some((entry.type_id, entry.type_name));
                entry.detector.before_check_file(&mut ctx.context);
                if let Some(scanner) = entry.detector.as_resource_folder_scanner() {
                    scanner.visit_resource_folder(&mut ctx);
                }
                entry.detector.after_check_file(&mut ctx.context);
            }
            ctx.context.current_detector = None;
            ctx.context.into_payload()
        }));
        self.handle_visit_result(main, project, folder, result, scan.repeats);
    }

    fn run_project_hook(
        &mut self,
        project: &Project,
        main: &Project,
        scan: &mut Traversal<'_>,
        hook: ProjectHook,
    ) {
        let mut ctx = Context::new(
            project,
            main,
            project.dir.clone(),
            None,
            scan.state.phase,
            scan.state.scope,
            false,
        );
        let result = catch_unwind(AssertUnwindSafe(|| {
            for entry in scan.table.entries_mut() {
                ctx.current_detector = Some((entry.type_id, entry.type_name));
                match hook {
                    ProjectHook::Before => entry.detector.before_check_project(&mut ctx),
                    ProjectHook::After => entry.detector.after_check_project(&mut ctx),
                    ProjectHook::AfterLibrary => {
                        entry.detector.after_check_library_project(&mut ctx)
                    }
                }
            }
            ctx.current_detector = None;
            ctx.into_payload()
        }));
        let dir = project.dir.clone();
        self.handle_visit_result(main, project, &dir, result, scan.repeats);
    }

    fn read_contents(&mut self, file: &Path) -> Option<Arc<String>> {
        let client: &dyn LintClient = &*self.client;
        let result = self
            .contents
            .get_or_load(file, |path| client.read_file(path));
        match result {
            Ok(contents) => Some(contents),
            Err(e) => {
                self.client.log(
                    Severity::Warning,
                    &format!("could not read {}: {}", file.display(), e),
                );
                None
            }
        }
    }

    /// Like [`read_contents`](Self::read_contents) but silent: used where
    /// unreadable (binary) files are expected.
    fn read_contents_quiet(&mut self, file: &Path) -> Option<Arc<String>> {
        let client: &dyn LintClient = &*self.client;
        self.contents
            .get_or_load(file, |path| client.read_file(path))
            .ok()
    }

    fn handle_visit_result(
        &mut self,
        main: &Project,
        project: &Project,
        file: &Path,
        result: std::thread::Result<ContextPayload>,
        repeats: &mut Vec<RepeatRequest>,
    ) {
        match result {
            Ok(payload) => {
                for (severity, message) in payload.logs {
                    self.client.log(severity, &message);
                }
                repeats.extend(payload.repeats);
                for finding in payload.findings {
                    self.deliver(main, project, finding);
                }
            }
            Err(panic) => self.handle_panic(main, project, file, panic),
        }
    }

    fn handle_panic(
        &mut self,
        main: &Project,
        project: &Project,
        file: &Path,
        panic: Box<dyn Any + Send>,
    ) {
        if panic.downcast_ref::<HostCancelled>().is_some() {
            self.cancel.cancel();
            return;
        }
        if panic.downcast_ref::<HostNotReady>().is_some() {
            return;
        }
        self.crashes += 1;
        if self.crashes > MAX_REPORTED_CRASHES {
            return;
        }
        self.report_synthetic(
            main,
            project,
            &LINT_ERROR,
            Location::file_level(file),
            format!(
                "unexpected failure while checking {}: {}",
                file.display(),
                panic_message(panic.as_ref())
            ),
        );
    }

    /// Baseline filtering happens here, after every other gate, so a
    /// baselined finding never reaches the client.
    fn deliver(&mut self, main: &Project, project: &Project, finding: Finding) {
        if let Some(baseline) = &self.baseline {
            if baseline.contains(
                &finding.issue,
                &finding.location.file,
                &finding.message,
                &main.dir,
            ) {
                self.summary.baseline_filtered += 1;
                return;
            }
        }
        self.summary.record(finding.severity);
        self.client.report(project, &finding);
    }

    /// Findings the driver itself produces (crashes, missing class output,
    /// project-graph problems). Enablement, ignores and severity overrides
    /// apply like for any detector finding; suppression has no node to
    /// consult.
    fn report_synthetic(
        &mut self,
        main: &Project,
        project: &Project,
        issue: &'static Issue,
        location: Location,
        message: String,
    ) {
        if !main.config.is_enabled(issue) {
            return;
        }
        let rel = location
            .file
            .strip_prefix(&main.dir)
            .unwrap_or(&location.file);
        if main.config.is_ignored(issue.id, rel, &message) {
            return;
        }
        let severity = main.config.severity_for(issue);
        self.deliver(
            main,
            project,
            Finding {
                issue: issue.id.to_string(),
                severity,
                message,
                location,
                suggestion: None,
            },
        );
    }

    fn log_legacy_notice(&mut self, table: &DispatchTable) {
        if self.legacy_noticed || table.legacy_detectors().is_empty() {
            return;
        }
        self.legacy_noticed = true;
        self.client.log(
            Severity::Warning,
            &format!(
                "running deprecated-backend compatibility pass for: {}",
                table.legacy_detectors().join(", ")
            ),
        );
    }
}

#[derive(Clone, Copy)]
enum ProjectHook {
    Before,
    After,
    AfterLibrary,
}

/// Libraries are traversed only when the scope can use whole-program
/// results.
fn has_whole_program_scope(scope: ScopeSet) -> bool {
    scope.contains(Scope::AllResourceFiles)
        || scope.contains(Scope::AllJavaFiles)
        || scope.contains(Scope::AllClassFiles)
        || scope.contains(Scope::JavaLibraries)
}

/// Scope inference for explicit file lists. Anything unrecognized widens to
/// the full scope.
fn infer_scope(files: &[PathBuf]) -> ScopeSet {
    let mut scope = ScopeSet::empty();
    for file in files {
        let name = file.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name == MANIFEST_FILE {
            scope.insert(Scope::Manifest);
            continue;
        }
        if name.ends_with(".gradle") || name.ends_with(".gradle.kts") {
            scope.insert(Scope::GradleFile);
            continue;
        }
        match file.extension().and_then(|e| e.to_str()).unwrap_or("") {
            "xml" => scope.insert(Scope::ResourceFile),
            "java" | "kt" | "kts" => scope.insert(Scope::JavaFile),
            "class" => scope.insert(Scope::ClassFile),
            "jar" => scope.insert(Scope::JavaLibraries),
            "pro" | "cfg" => scope.insert(Scope::ProguardFile),
            "properties" => scope.insert(Scope::PropertyFile),
            "png" | "jpg" | "jpeg" | "gif" | "webp" => scope.insert(Scope::BinaryResourceFile),
            _ => return ScopeSet::all(),
        }
    }
    scope
}

/// Does `outer` directly or transitively enclose `inner`, judging by
/// internal names? `Foo$Bar` is enclosed by `Foo`.
fn encloses(outer: &str, inner: &str) -> bool {
    inner.starts_with(outer) && inner.as_bytes().get(outer.len()) == Some(&b'$')
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let mut message = if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    if message.len() > MAX_CRASH_MESSAGE {
        let mut end = MAX_CRASH_MESSAGE;
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        message.truncate(end);
        message.push_str("...");
    }
    message
}
