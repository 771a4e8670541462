//! Project model: directories, manifest metadata, roots and the library graph

use crate::config::LintConfig;
use crate::dom::XmlDocument;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

pub const MANIFEST_FILE: &str = "AndroidManifest.xml";
const PROJECT_PROPERTIES: &str = "project.properties";

/// Files whose presence marks a directory as a project root.
const ROOT_MARKERS: &[&str] = &[
    MANIFEST_FILE,
    PROJECT_PROPERTIES,
    "build.gradle",
    "build.gradle.kts",
    ".lintra.toml",
];

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("project directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("circular library dependency at {0}")]
    CircularDependency(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A non-fatal problem met while resolving the project graph. The driver
/// reports these once analysis starts instead of aborting construction.
#[derive(Debug, Clone)]
pub struct ProjectDiagnostic {
    pub dir: PathBuf,
    pub message: String,
}

/// One analyzable project: a root the user asked about, or a library another
/// project references.
#[derive(Debug)]
pub struct Project {
    pub dir: PathBuf,
    /// Directory name, for display.
    pub name: String,
    /// Marked `android.library=true` in project.properties.
    pub is_library: bool,
    pub manifest_file: Option<PathBuf>,
    pub package_name: Option<String>,
    pub min_sdk: Option<u32>,
    pub target_sdk: Option<u32>,
    pub source_roots: Vec<PathBuf>,
    pub test_roots: Vec<PathBuf>,
    pub generated_roots: Vec<PathBuf>,
    pub resource_roots: Vec<PathBuf>,
    pub class_roots: Vec<PathBuf>,
    /// Bundled jar libraries, sorted by name.
    pub jar_paths: Vec<PathBuf>,
    /// Library references as written in project.properties, relative to
    /// `dir`, in reference order. Resolved by [`ProjectRegistry`].
    pub library_dirs: Vec<PathBuf>,
    pub direct_libraries: Vec<Rc<Project>>,
    pub config: LintConfig,
    /// Set when the project's configuration file existed but failed to
    /// parse; the defaults are in effect.
    pub config_error: Option<String>,
}

impl Project {
    /// Read a project from disk. Library references are recorded but not
    /// resolved; that is the registry's job, so cycles can be detected
    /// across the whole graph.
    pub fn create(dir: &Path) -> Result<Project, ProjectError> {
        if !dir.is_dir() {
            return Err(ProjectError::MissingDirectory(dir.to_path_buf()));
        }

        let (config, config_error) = match LintConfig::find_and_load(dir) {
            Ok(config) => (config, None),
            Err(e) => (LintConfig::default(), Some(e.to_string())),
        };

        let mut project = Project {
            dir: dir.to_path_buf(),
            name: dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| dir.display().to_string()),
            is_library: false,
            manifest_file: None,
            package_name: None,
            min_sdk: None,
            target_sdk: None,
            source_roots: Vec::new(),
            test_roots: Vec::new(),
            generated_roots: Vec::new(),
            resource_roots: Vec::new(),
            class_roots: Vec::new(),
            jar_paths: Vec::new(),
            library_dirs: Vec::new(),
            direct_libraries: Vec::new(),
            config,
            config_error,
        };

        project.read_properties();
        project.locate_manifest();
        project.locate_roots();
        Ok(project)
    }

    /// Transitive library closure in breadth-first reference order, each
    /// project once.
    pub fn all_libraries(&self) -> Vec<Rc<Project>> {
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut queue: VecDeque<Rc<Project>> = self.direct_libraries.iter().cloned().collect();
        let mut result = Vec::new();
        while let Some(lib) = queue.pop_front() {
            if !seen.insert(lib.dir.clone()) {
                continue;
            }
            queue.extend(lib.direct_libraries.iter().cloned());
            result.push(lib);
        }
        result
    }

    pub fn contains_file(&self, path: &Path) -> bool {
        path.starts_with(&self.dir)
    }

    /// Is the file under one of this project's test roots?
    pub fn is_test_file(&self, path: &Path) -> bool {
        self.test_roots.iter().any(|root| path.starts_with(root))
    }

    fn read_properties(&mut self) {
        let path = self.dir.join(PROJECT_PROPERTIES);
        let Ok(contents) = fs::read_to_string(&path) else {
            return;
        };
        // Library references are numbered; collect then order by index.
        let mut refs: Vec<(u32, PathBuf)> = Vec::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            if key == "android.library" {
                self.is_library = value == "true";
            } else if let Some(index) = key.strip_prefix("android.library.reference.") {
                if let Ok(index) = index.parse::<u32>() {
                    refs.push((index, PathBuf::from(value)));
                }
            }
        }
        refs.sort_by_key(|(index, _)| *index);
        self.library_dirs = refs.into_iter().map(|(_, path)| path).collect();
    }

    fn locate_manifest(&mut self) {
        for candidate in [
            self.dir.join(MANIFEST_FILE),
            self.dir.join("src/main").join(MANIFEST_FILE),
        ] {
            if candidate.is_file() {
                self.read_manifest_metadata(&candidate);
                self.manifest_file = Some(candidate);
                return;
            }
        }
    }

    fn read_manifest_metadata(&mut self, manifest: &Path) {
        let Ok(contents) = fs::read_to_string(manifest) else {
            return;
        };
        // Malformed manifests are reported during traversal, not here.
        let Ok(document) = XmlDocument::parse(&contents) else {
            return;
        };
        if let Some(root) = document.root_element() {
            self.package_name = root.attribute("package").map(|s| s.to_string());
        }
        for element in document.iter_elements() {
            if element.name() == "uses-sdk" {
                self.min_sdk = element
                    .attribute("android:minSdkVersion")
                    .and_then(|v| v.parse().ok());
                self.target_sdk = element
                    .attribute("android:targetSdkVersion")
                    .and_then(|v| v.parse().ok());
            }
        }
    }

    fn locate_roots(&mut self) {
        let existing = |candidates: &[&str]| -> Vec<PathBuf> {
            candidates
                .iter()
                .map(|c| self.dir.join(c))
                .filter(|p| p.is_dir())
                .collect()
        };

        // Gradle-style layout wins; a bare `src` tree is the fallback so the
        // two never overlap.
        self.source_roots = existing(&["src/main/java", "src/main/kotlin"]);
        if self.source_roots.is_empty() {
            self.source_roots = existing(&["src"]);
        }
        self.test_roots = existing(&[
            "src/test/java",
            "src/test/kotlin",
            "src/androidTest/java",
            "src/androidTest/kotlin",
            "test",
        ]);
        self.generated_roots = existing(&["gen", "build/generated/source"]);
        self.resource_roots = existing(&["src/main/res"]);
        if self.resource_roots.is_empty() {
            self.resource_roots = existing(&["res"]);
        }
        self.class_roots = existing(&["build/classes", "bin/classes"]);

        let libs = self.dir.join("libs");
        if let Ok(entries) = fs::read_dir(&libs) {
            let mut jars: Vec<PathBuf> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("jar"))
                .collect();
            jars.sort();
            self.jar_paths = jars;
        }
    }
}

/// Walk up from a file to the nearest directory that looks like a project
/// root.
pub fn find_project_root(file: &Path) -> Option<PathBuf> {
    let start = if file.is_dir() { file } else { file.parent()? };
    for dir in start.ancestors() {
        if ROOT_MARKERS.iter().any(|m| dir.join(m).is_file()) {
            return Some(dir.to_path_buf());
        }
    }
    None
}

/// Loads projects and wires their library graphs.
///
/// Construction is two-phase: a project's own data is read first, then its
/// library references are resolved through the registry. A reference cycle
/// is broken by dropping the closing edge and recording a diagnostic against
/// the offending directory, so analysis can still run on the rest of the
/// graph.
#[derive(Default)]
pub struct ProjectRegistry {
    projects: HashMap<PathBuf, Rc<Project>>,
    building: HashSet<PathBuf>,
    order: Vec<Rc<Project>>,
    diagnostics: Vec<ProjectDiagnostic>,
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load (or return the cached) project at `dir`, with its transitive
    /// libraries resolved.
    pub fn load(&mut self, dir: &Path) -> Result<Rc<Project>, ProjectError> {
        let dir = dir
            .canonicalize()
            .map_err(|_| ProjectError::MissingDirectory(dir.to_path_buf()))?;

        if let Some(project) = self.projects.get(&dir) {
            return Ok(project.clone());
        }
        if !self.building.insert(dir.clone()) {
            return Err(ProjectError::CircularDependency(dir));
        }

        let mut project = match Project::create(&dir) {
            Ok(project) => project,
            Err(e) => {
                self.building.remove(&dir);
                return Err(e);
            }
        };

        for reference in project.library_dirs.clone() {
            let resolved = dir.join(&reference);
            match self.load(&resolved) {
                Ok(library) => project.direct_libraries.push(library),
                Err(ProjectError::CircularDependency(at)) => {
                    self.diagnostics.push(ProjectDiagnostic {
                        dir: at.clone(),
                        message: format!(
                            "circular library dependency involving {}; reference from {} dropped",
                            at.display(),
                            dir.display()
                        ),
                    });
                }
                Err(e) => {
                    self.diagnostics.push(ProjectDiagnostic {
                        dir: resolved,
                        message: format!("library reference could not be resolved: {}", e),
                    });
                }
            }
        }

        self.building.remove(&dir);
        let project = Rc::new(project);
        self.projects.insert(dir, project.clone());
        self.order.push(project.clone());
        Ok(project)
    }

    /// Every project registered so far, in registration order.
    pub fn projects(&self) -> &[Rc<Project>] {
        &self.order
    }

    /// The registered project whose directory most specifically contains
    /// `file`.
    pub fn find_containing(&self, file: &Path) -> Option<Rc<Project>> {
        self.order
            .iter()
            .filter(|p| file.starts_with(&p.dir))
            .max_by_key(|p| p.dir.components().count())
            .cloned()
    }

    pub fn diagnostics(&self) -> &[ProjectDiagnostic] {
        &self.diagnostics
    }
}
