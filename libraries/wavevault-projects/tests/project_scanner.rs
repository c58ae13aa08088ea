//! Integration tests for the project-file scanner


use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wavevault_core::VersionKind;
use test_helpers::init_tracing;
use wavevault_projects::{MemoryBackend, ProjectScanner, ProjectStore};

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"FLhd").unwrap();
}

fn project_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "loose idea.flp");
    touch(dir.path(), "EP1/Song A/song a v1.flp");
    touch(dir.path(), "EP1/Song A/song a v2.FLP");
    touch(dir.path(), "EP1/Song A/Backup/song a (autosave).flp");
    touch(dir.path(), "EP1/stems.zip");
    touch(dir.path(), "EP1/render.wav");
    touch(dir.path(), ".trash/old.flp");
    touch(dir.path(), "tools/node_modules/pkg/x.flp");
    dir
}

#[test]
fn finds_project_files_and_skips_noise() {
    init_tracing();
    let dir = project_tree();
    let found = ProjectScanner::new().scan(dir.path());

    let mut names: Vec<&str> = found.iter().map(|p| p.version.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["loose idea", "song a v1", "song a v2", "stems"]);
}

#[test]
fn versions_describe_the_file() {
    let dir = project_tree();
    let found = ProjectScanner::new().scan(dir.path());

    let stems = found.iter().find(|p| p.version.name == "stems").unwrap();
    assert_eq!(stems.version.kind, VersionKind::Zip);
    assert_eq!(stems.version.path, dir.path().join("EP1/stems.zip"));
    assert!(stems.version.id.as_str().starts_with("VER-"));
    assert!(stems.version.last_modified > 0);
    assert_eq!(stems.album_hint.as_deref(), Some("EP1"));

    let v2 = found.iter().find(|p| p.version.name == "song a v2").unwrap();
    assert_eq!(v2.version.kind, VersionKind::Flp);
    assert_eq!(v2.album_hint.as_deref(), Some("EP1"));

    let loose = found.iter().find(|p| p.version.name == "loose idea").unwrap();
    assert_eq!(loose.album_hint, None);
}

#[test]
fn ids_are_distinct_per_file() {
    let dir = project_tree();
    let found = ProjectScanner::new().scan(dir.path());

    let mut ids: Vec<&str> = found.iter().map(|p| p.version.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), found.len());
}

#[test]
fn missing_root_yields_nothing() {
    let dir = TempDir::new().unwrap();
    let found = ProjectScanner::new().scan(&dir.path().join("not-there"));
    assert!(found.is_empty());
}

#[test]
fn import_is_idempotent() {
    let dir = project_tree();
    let backend = MemoryBackend::new();
    let mut store = ProjectStore::new(backend.clone());
    let scanner = ProjectScanner::new();

    let first = scanner.import_into(dir.path(), &mut store);
    assert_eq!(first.scanned.len(), 4);
    assert_eq!(first.added, 4);

    let second = scanner.import_into(dir.path(), &mut store);
    assert_eq!(second.scanned.len(), 4);
    assert_eq!(second.added, 0);

    assert_eq!(store.db().unorganized.len(), 4);
    assert_eq!(backend.write_count(), 4);
}

#[cfg(unix)]
#[test]
fn non_utf8_file_names_do_not_block_later_saves() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    init_tracing();

    let dir = TempDir::new().unwrap();
    touch(dir.path(), "good.flp");
    let odd = dir.path().join(OsStr::from_bytes(b"beat\xff.flp"));
    // Some filesystems refuse non UTF-8 names outright
    if fs::write(&odd, b"FLhd").is_err() {
        return;
    }

    let backend = MemoryBackend::new();
    let mut store = ProjectStore::new(backend.clone());
    let summary = ProjectScanner::new().import_into(dir.path(), &mut store);

    assert_eq!(summary.scanned.len(), 1);
    assert_eq!(summary.added, 1);
    assert_eq!(store.db().unorganized[0].name, "good");
    assert_eq!(backend.write_count(), 1);

    store.create_album("EP1", "Artist");
    assert_eq!(backend.write_count(), 2);
    assert!(backend.contents().unwrap().contains("\"EP1\""));
}
