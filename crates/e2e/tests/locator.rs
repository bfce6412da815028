//! Driver discovery precedence and ordering

use std::fs;
use std::path::{Path, PathBuf};

use aot_e2e::{resolve, DriverEnv, E2eError, PlatformProfile};
use tempfile::TempDir;

fn touch(path: &Path) -> PathBuf {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"#!/bin/sh\n").unwrap();
    path.to_path_buf()
}

fn join_dirs(platform: PlatformProfile, dirs: &[&Path]) -> String {
    dirs.iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join(&platform.path_list_delimiter().to_string())
}

fn env(override_path: Option<&Path>, search: String, cwd: &Path) -> DriverEnv {
    DriverEnv {
        override_path: override_path.map(|p| p.display().to_string()),
        search_path: Some(search),
        cwd: cwd.to_path_buf(),
    }
}

fn snapshot(root: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.path().to_path_buf())
        .collect();
    entries.sort();
    entries
}

#[test]
fn override_beats_search_path() {
    let root = TempDir::new().unwrap();
    let pinned = touch(&root.path().join("pinned/tauri-driver"));
    let on_path = root.path().join("bin");
    touch(&on_path.join("tauri-driver"));

    for platform in [PlatformProfile::Posix, PlatformProfile::Windows] {
        if platform == PlatformProfile::Windows {
            touch(&on_path.join("tauri-driver.exe"));
        }
        let search = join_dirs(platform, &[&on_path]);
        let found = resolve(&env(Some(&pinned), search, root.path()), platform).unwrap();
        assert_eq!(found.path(), pinned);
    }
}

#[test]
fn first_directory_wins() {
    let root = TempDir::new().unwrap();
    let first = root.path().join("first");
    let second = root.path().join("second");
    touch(&first.join("tauri-driver"));
    touch(&second.join("tauri-driver"));

    let platform = PlatformProfile::Posix;
    let found = resolve(
        &env(None, join_dirs(platform, &[&first, &second]), root.path()),
        platform,
    )
    .unwrap();
    assert_eq!(found.path(), first.join("tauri-driver"));
}

#[test]
fn cmd_shim_in_earlier_directory_beats_later_exe() {
    let root = TempDir::new().unwrap();
    let early = root.path().join("early");
    let late = root.path().join("late");
    touch(&early.join("tauri-driver.cmd"));
    touch(&late.join("tauri-driver.exe"));

    let platform = PlatformProfile::Windows;
    let found = resolve(
        &env(None, join_dirs(platform, &[&early, &late]), root.path()),
        platform,
    )
    .unwrap();
    assert_eq!(found.path(), early.join("tauri-driver.cmd"));
}

#[test]
fn suffix_order_within_a_directory() {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("bin");
    touch(&dir.join("tauri-driver.bat"));
    touch(&dir.join("tauri-driver.cmd"));

    let platform = PlatformProfile::Windows;
    let found = resolve(&env(None, join_dirs(platform, &[&dir]), root.path()), platform).unwrap();
    assert_eq!(found.path(), dir.join("tauri-driver.cmd"));

    touch(&dir.join("tauri-driver.exe"));
    let found = resolve(&env(None, join_dirs(platform, &[&dir]), root.path()), platform).unwrap();
    assert_eq!(found.path(), dir.join("tauri-driver.exe"));
}

#[test]
fn moving_a_candidate_earlier_never_picks_a_later_one() {
    let root = TempDir::new().unwrap();
    let dirs: Vec<PathBuf> = (0..4).map(|i| root.path().join(format!("d{}", i))).collect();
    for dir in &dirs {
        fs::create_dir_all(dir).unwrap();
    }
    let valid = touch(&dirs[3].join("tauri-driver"));
    touch(&dirs[2].join("tauri-driver"));

    let platform = PlatformProfile::Posix;
    let order = |ids: &[usize]| {
        let picked: Vec<&Path> = ids.iter().map(|&i| dirs[i].as_path()).collect();
        resolve(&env(None, join_dirs(platform, &picked), root.path()), platform)
            .unwrap()
            .into_path()
    };

    assert_eq!(order(&[0, 1, 2, 3]), dirs[2].join("tauri-driver"));
    // d3 moved ahead of d2
    assert_eq!(order(&[0, 3, 1, 2]), valid);
    assert_eq!(order(&[3, 0, 1, 2]), valid);
}

#[test]
fn not_found_is_deterministic_and_touches_nothing() {
    let root = TempDir::new().unwrap();
    let empty = root.path().join("empty");
    fs::create_dir_all(&empty).unwrap();
    let before = snapshot(root.path());

    for _ in 0..2 {
        let err = resolve(
            &env(None, join_dirs(PlatformProfile::Posix, &[&empty]), root.path()),
            PlatformProfile::Posix,
        )
        .unwrap_err();
        assert!(matches!(err, E2eError::DriverNotFound));
        assert!(err.to_string().contains("cargo install tauri-driver"));
    }

    assert_eq!(snapshot(root.path()), before);
}

#[test]
fn missing_override_is_fatal_even_with_path_candidate() {
    let root = TempDir::new().unwrap();
    let bin = root.path().join("bin");
    touch(&bin.join("tauri-driver"));

    let err = resolve(
        &env(
            Some(&root.path().join("nope/tauri-driver")),
            join_dirs(PlatformProfile::Posix, &[&bin]),
            root.path(),
        ),
        PlatformProfile::Posix,
    )
    .unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("nope"));
}

#[test]
fn unset_search_path_is_not_found() {
    let root = TempDir::new().unwrap();
    let env = DriverEnv {
        override_path: None,
        search_path: None,
        cwd: root.path().to_path_buf(),
    };
    assert!(matches!(
        resolve(&env, PlatformProfile::Posix),
        Err(E2eError::DriverNotFound)
    ));
}
