//! Project model: root detection, manifest metadata, source/resource root
//! layout and the library reference graph.

use lintra_core::project::{find_project_root, ProjectError, ProjectRegistry};
use lintra_core::Project;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, contents).unwrap();
    path
}

fn mkdir(root: &Path, rel: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(&path).unwrap();
    path
}

#[test]
fn test_manifest_metadata_at_root() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "AndroidManifest.xml",
        "<manifest package=\"com.example.app\">\n    \
         <uses-sdk android:minSdkVersion=\"21\" android:targetSdkVersion=\"34\"/>\n\
         </manifest>\n",
    );

    let project = Project::create(tmp.path()).unwrap();
    assert_eq!(project.manifest_file, Some(tmp.path().join("AndroidManifest.xml")));
    assert_eq!(project.package_name.as_deref(), Some("com.example.app"));
    assert_eq!(project.min_sdk, Some(21));
    assert_eq!(project.target_sdk, Some(34));
    assert!(!project.is_library);
}

#[test]
fn test_manifest_found_under_src_main() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "build.gradle", "apply plugin: 'com.android.application'\n");
    write(
        tmp.path(),
        "src/main/AndroidManifest.xml",
        "<manifest package=\"com.example.app\"/>",
    );

    let project = Project::create(tmp.path()).unwrap();
    assert_eq!(
        project.manifest_file,
        Some(tmp.path().join("src/main/AndroidManifest.xml"))
    );
    assert_eq!(project.package_name.as_deref(), Some("com.example.app"));
}

#[test]
fn test_gradle_layout_wins_over_bare_src() {
    let tmp = TempDir::new().unwrap();
    let java = mkdir(tmp.path(), "src/main/java");
    let kotlin = mkdir(tmp.path(), "src/main/kotlin");

    let project = Project::create(tmp.path()).unwrap();
    assert_eq!(project.source_roots, vec![java, kotlin]);
}

#[test]
fn test_bare_src_is_the_fallback_root() {
    let tmp = TempDir::new().unwrap();
    let src = mkdir(tmp.path(), "src");
    write(tmp.path(), "src/App.java", "class App {}\n");

    let project = Project::create(tmp.path()).unwrap();
    assert_eq!(project.source_roots, vec![src]);
}

#[test]
fn test_resource_root_prefers_gradle_layout() {
    let tmp = TempDir::new().unwrap();
    let gradle_res = mkdir(tmp.path(), "src/main/res");
    mkdir(tmp.path(), "res");

    let project = Project::create(tmp.path()).unwrap();
    assert_eq!(project.resource_roots, vec![gradle_res]);
}

#[test]
fn test_eclipse_style_res_fallback() {
    let tmp = TempDir::new().unwrap();
    let res = mkdir(tmp.path(), "res");

    let project = Project::create(tmp.path()).unwrap();
    assert_eq!(project.resource_roots, vec![res]);
}

#[test]
fn test_test_roots_and_is_test_file() {
    let tmp = TempDir::new().unwrap();
    mkdir(tmp.path(), "src/main/java");
    let unit = mkdir(tmp.path(), "src/test/java");
    let instrumented = mkdir(tmp.path(), "src/androidTest/kotlin");

    let project = Project::create(tmp.path()).unwrap();
    assert_eq!(project.test_roots, vec![unit.clone(), instrumented]);
    assert!(project.is_test_file(&unit.join("com/example/AppTest.java")));
    assert!(!project.is_test_file(&tmp.path().join("src/main/java/com/example/App.java")));
}

#[test]
fn test_class_roots_and_sorted_jars() {
    let tmp = TempDir::new().unwrap();
    let gradle_out = mkdir(tmp.path(), "build/classes");
    let eclipse_out = mkdir(tmp.path(), "bin/classes");
    write(tmp.path(), "libs/zebra.jar", "");
    write(tmp.path(), "libs/alpha.jar", "");
    write(tmp.path(), "libs/readme.txt", "not a jar\n");

    let project = Project::create(tmp.path()).unwrap();
    assert_eq!(project.class_roots, vec![gradle_out, eclipse_out]);
    assert_eq!(
        project.jar_paths,
        vec![
            tmp.path().join("libs/alpha.jar"),
            tmp.path().join("libs/zebra.jar"),
        ]
    );
}

#[test]
fn test_library_references_ordered_by_index() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "project.properties",
        "# header comment\n\
         android.library.reference.10=../ten\n\
         android.library.reference.2=../two\n\
         android.library=true\n",
    );

    let project = Project::create(tmp.path()).unwrap();
    assert!(project.is_library);
    assert_eq!(
        project.library_dirs,
        vec![PathBuf::from("../two"), PathBuf::from("../ten")]
    );
}

#[test]
fn test_missing_directory_is_an_error() {
    let error = Project::create(Path::new("/definitely/not/here")).unwrap_err();
    assert!(matches!(error, ProjectError::MissingDirectory(_)));
}

#[test]
fn test_find_project_root_walks_ancestors() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "app/build.gradle.kts", "plugins { id(\"java\") }\n");
    let deep = write(
        tmp.path(),
        "app/src/main/java/com/example/App.java",
        "class App {}\n",
    );

    assert_eq!(find_project_root(&deep), Some(tmp.path().join("app")));
    assert_eq!(find_project_root(&tmp.path().join("app/src")), Some(tmp.path().join("app")));
}

#[test]
fn test_find_project_root_requires_a_marker() {
    let tmp = TempDir::new().unwrap();
    let stray = write(tmp.path(), "notes.txt", "no markers here\n");
    assert_eq!(find_project_root(&stray), None);
}

#[test]
fn test_registry_caches_by_canonical_directory() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "app/AndroidManifest.xml",
        "<manifest package=\"com.example.app\"/>",
    );

    let mut registry = ProjectRegistry::new();
    let first = registry.load(&tmp.path().join("app")).unwrap();
    let second = registry.load(&tmp.path().join("app/../app")).unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(registry.projects().len(), 1);
}

#[test]
fn test_library_graph_breadth_first_without_duplicates() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "main/AndroidManifest.xml",
        "<manifest package=\"com.example.app\"/>",
    );
    write(
        tmp.path(),
        "main/project.properties",
        "android.library.reference.1=../liba\nandroid.library.reference.2=../libb\n",
    );
    for (name, refs) in [
        ("liba", "android.library=true\nandroid.library.reference.1=../libc\n"),
        ("libb", "android.library=true\nandroid.library.reference.1=../libc\n"),
        ("libc", "android.library=true\n"),
    ] {
        write(
            tmp.path(),
            &format!("{}/AndroidManifest.xml", name),
            "<manifest package=\"com.example.lib\"/>",
        );
        write(tmp.path(), &format!("{}/project.properties", name), refs);
    }

    let mut registry = ProjectRegistry::new();
    let main = registry.load(&tmp.path().join("main")).unwrap();
    let names: Vec<String> = main
        .all_libraries()
        .iter()
        .map(|lib| lib.name.clone())
        .collect();
    assert_eq!(names, vec!["liba", "libb", "libc"]);
    assert!(registry.diagnostics().is_empty());
}

#[test]
fn test_find_containing_picks_the_most_specific_project() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "outer/AndroidManifest.xml",
        "<manifest package=\"com.example.outer\"/>",
    );
    write(
        tmp.path(),
        "outer/inner/AndroidManifest.xml",
        "<manifest package=\"com.example.inner\"/>",
    );

    let mut registry = ProjectRegistry::new();
    let outer_dir = tmp.path().join("outer").canonicalize().unwrap();
    registry.load(&outer_dir).unwrap();
    registry.load(&outer_dir.join("inner")).unwrap();

    let inner_hit = registry
        .find_containing(&outer_dir.join("inner/res/layout/main.xml"))
        .unwrap();
    assert_eq!(inner_hit.name, "inner");
    let outer_hit = registry
        .find_containing(&outer_dir.join("res/layout/main.xml"))
        .unwrap();
    assert_eq!(outer_hit.name, "outer");
    assert!(registry.find_containing(Path::new("/elsewhere/file.xml")).is_none());
}
