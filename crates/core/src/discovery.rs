//! File discovery for the traversal steps
//!
//! Uses the `ignore` crate's walker. The standard git filters are off:
//! these walks start from roots the project model already named (source
//! roots, class output, resource folders), so everything inside them is
//! analysis input even when the build tree is gitignored. Results are
//! sorted, which is what keeps the traversal order stable across runs.

use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};

/// Files under `root` (recursively) whose extension is in `extensions`,
/// sorted. Unreadable entries are skipped.
pub(crate) fn files_with_extensions(root: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder.standard_filters(false);

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.into_path();
        if has_extension(&path, extensions) {
            files.push(path);
        }
    }

    files.sort();
    files
}

/// Immediate subdirectories of `dir`, sorted by name.
pub(crate) fn sorted_dirs(dir: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect(),
        Err(_) => Vec::new(),
    };
    dirs.sort();
    dirs
}

/// Immediate files of `dir`, sorted by name.
pub(crate) fn sorted_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect(),
        Err(_) => Vec::new(),
    };
    files.sort();
    files
}

/// Build scripts directly in `dir`: `build.gradle`, `settings.gradle` and
/// any `*.gradle.kts`, sorted.
pub(crate) fn gradle_files(dir: &Path) -> Vec<PathBuf> {
    sorted_files(dir)
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| {
                    name == "build.gradle"
                        || name == "settings.gradle"
                        || name.ends_with(".gradle.kts")
                })
        })
        .collect()
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => extensions.contains(&ext),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn walk_is_sorted_and_recursive() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/nested")).unwrap();
        fs::write(dir.path().join("b/nested/Z.java"), "class Z {}").unwrap();
        fs::write(dir.path().join("A.java"), "class A {}").unwrap();
        fs::write(dir.path().join("skip.txt"), "").unwrap();

        let files = files_with_extensions(dir.path(), &["java"]);
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("A.java"));
        assert!(files[1].ends_with("Z.java"));
    }

    #[test]
    fn gradle_files_match_known_names() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("build.gradle"), "").unwrap();
        fs::write(dir.path().join("settings.gradle.kts"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let files = gradle_files(dir.path());
        assert_eq!(files.len(), 2);
    }
}
