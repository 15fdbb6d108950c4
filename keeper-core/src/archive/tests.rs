use super::*;
use std::io::Write;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

fn write_file(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// 直接用 zip crate 构造包含任意条目名的压缩包
fn raw_zip(path: &Path, entries: &[(&str, &str)]) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    for (name, content) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(*name, SimpleFileOptions::default())
                .unwrap();
        } else {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
    }
    writer.finish().unwrap();
}

fn set_mtime(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

#[test]
fn test_roundtrip_flattens_directories() {
    let temp_dir = tempdir().unwrap();
    let src = temp_dir.path().join("src");
    let a = src.join("world").join("world.sav");
    let b = src.join("players.dat");
    write_file(&a, b"world data");
    write_file(&b, &[0u8, 1, 2, 3, 255]);

    let engine = ArchiveEngine::default();
    let created = engine
        .create_archive(&temp_dir.path().join("out"), &[&a, &b])
        .unwrap();
    assert_eq!(created.path, temp_dir.path().join("out.zip"));
    assert_eq!(created.entry_count, 2);

    let dest = temp_dir.path().join("restored");
    let report = engine
        .extract_archive(&created.path, Some(&dest), false)
        .unwrap();

    assert_eq!(report.files.len(), 2);
    assert_eq!(fs::read(dest.join("world.sav")).unwrap(), b"world data");
    assert_eq!(fs::read(dest.join("players.dat")).unwrap(), vec![0u8, 1, 2, 3, 255]);
    assert!(!dest.join("world").exists());
}

#[test]
fn test_output_extension_normalization() {
    let temp_dir = tempdir().unwrap();
    let input = temp_dir.path().join("a.txt");
    write_file(&input, b"a");
    let engine = ArchiveEngine::new(9);

    let upper = engine
        .create_archive(&temp_dir.path().join("out.ZIP"), &[&input])
        .unwrap();
    assert_eq!(upper.path, temp_dir.path().join("out.ZIP"));
    assert!(upper.path.exists());
    assert!(!temp_dir.path().join("out.ZIP.zip").exists());

    assert_eq!(
        normalize_output_path(Path::new("backups/server")).unwrap(),
        PathBuf::from("backups/server.zip")
    );
    assert!(matches!(
        normalize_output_path(Path::new("")),
        Err(KeeperError::InvalidOutputPath)
    ));
}

#[test]
fn test_create_archive_creates_parent_dir() {
    let temp_dir = tempdir().unwrap();
    let input = temp_dir.path().join("a.txt");
    write_file(&input, b"a");

    let created = ArchiveEngine::default()
        .create_archive(&temp_dir.path().join("nested").join("out"), &[&input])
        .unwrap();
    assert!(created.path.exists());
}

#[test]
fn test_create_archive_failure_removes_output() {
    let temp_dir = tempdir().unwrap();
    let missing = temp_dir.path().join("missing.txt");
    let output = temp_dir.path().join("out.zip");

    let err = ArchiveEngine::default()
        .create_archive(&output, &[&missing])
        .unwrap_err();
    assert!(matches!(err, KeeperError::Io(_)));
    assert!(!output.exists());
}

#[test]
fn test_duplicate_base_names_rejected() {
    let temp_dir = tempdir().unwrap();
    let a = temp_dir.path().join("one").join("same.txt");
    let b = temp_dir.path().join("two").join("same.txt");
    write_file(&a, b"1");
    write_file(&b, b"2");
    let output = temp_dir.path().join("out.zip");

    let err = ArchiveEngine::default()
        .create_archive(&output, &[&a, &b])
        .unwrap_err();
    assert!(matches!(err, KeeperError::Zip(_)));
    assert!(!output.exists());
}

#[test]
fn test_compression_level_clamped() {
    assert_eq!(ArchiveEngine::new(0).compression_level(), 1);
    assert_eq!(ArchiveEngine::new(42).compression_level(), 9);
    assert_eq!(ArchiveEngine::default().compression_level(), 4);
}

#[test]
fn test_parent_dir_entry_rejected() {
    let temp_dir = tempdir().unwrap();
    let container = temp_dir.path().join("evil.zip");
    raw_zip(&container, &[("ok.txt", "fine"), ("../evil.txt", "pwned")]);
    let dest = temp_dir.path().join("dest");

    let err = ArchiveEngine::default()
        .extract_archive(&container, Some(&dest), true)
        .unwrap_err();

    assert!(matches!(err, KeeperError::PathTraversal { ref entry } if entry == "../evil.txt"));
    assert!(!temp_dir.path().join("evil.txt").exists());
    // 之前的条目已写出，不做回滚
    assert!(dest.join("ok.txt").exists());
}

#[cfg(unix)]
#[test]
fn test_absolute_entry_rejected() {
    let temp_dir = tempdir().unwrap();
    let container = temp_dir.path().join("evil.zip");
    let target = temp_dir.path().join("abs-evil.txt");
    let name = target.to_string_lossy().to_string();
    raw_zip(&container, &[(name.as_str(), "pwned")]);

    let err = ArchiveEngine::default()
        .extract_archive(&container, Some(&temp_dir.path().join("dest")), false)
        .unwrap_err();

    assert!(matches!(err, KeeperError::PathTraversal { .. }));
    assert!(!target.exists());
}

#[cfg(unix)]
#[test]
fn test_absolute_entry_inside_destination_rejected() {
    let temp_dir = tempdir().unwrap();
    let container = temp_dir.path().join("evil.zip");
    let dest = temp_dir.path().join("dest");
    fs::create_dir_all(&dest).unwrap();
    let target = fs::canonicalize(&dest).unwrap().join("abs.txt");
    let name = target.to_string_lossy().to_string();
    raw_zip(&container, &[(name.as_str(), "pwned")]);

    let err = ArchiveEngine::default()
        .extract_archive(&container, Some(&dest), false)
        .unwrap_err();

    assert!(matches!(err, KeeperError::PathTraversal { .. }));
    assert!(!target.exists());
}

#[cfg(unix)]
#[test]
fn test_file_blocking_parent_dir_reports_create_failure() {
    let temp_dir = tempdir().unwrap();
    let container = temp_dir.path().join("c.zip");
    raw_zip(&container, &[("blocker/x.txt", "x")]);
    let dest = temp_dir.path().join("dest");
    write_file(&dest.join("blocker"), b"file");
    let expected = fs::canonicalize(&dest).unwrap().join("blocker");

    let err = ArchiveEngine::default()
        .extract_archive(&container, Some(&dest), false)
        .unwrap_err();

    assert!(matches!(err, KeeperError::DirectoryCreateFailed { ref path, .. } if *path == expected));
    assert_eq!(fs::read(dest.join("blocker")).unwrap(), b"file");
}

#[cfg(unix)]
#[test]
fn test_file_blocking_directory_entry_reports_create_failure() {
    let temp_dir = tempdir().unwrap();
    let container = temp_dir.path().join("c.zip");
    raw_zip(&container, &[("blocker/sub/", "")]);
    let dest = temp_dir.path().join("dest");
    write_file(&dest.join("blocker"), b"file");
    let expected = fs::canonicalize(&dest).unwrap().join("blocker").join("sub");

    let err = ArchiveEngine::default()
        .extract_archive(&container, Some(&dest), false)
        .unwrap_err();

    assert!(matches!(err, KeeperError::DirectoryCreateFailed { ref path, .. } if *path == expected));
}

#[test]
fn test_sibling_prefix_directory_rejected() {
    let temp_dir = tempdir().unwrap();
    let container = temp_dir.path().join("evil.zip");
    raw_zip(&container, &[("../dest-evil/x.txt", "pwned")]);

    let err = ArchiveEngine::default()
        .extract_archive(&container, Some(&temp_dir.path().join("dest")), false)
        .unwrap_err();

    assert!(matches!(err, KeeperError::PathTraversal { .. }));
    assert!(!temp_dir.path().join("dest-evil").exists());
}

#[test]
fn test_directory_entries_and_nested_files() {
    let temp_dir = tempdir().unwrap();
    let container = temp_dir.path().join("tree.zip");
    raw_zip(
        &container,
        &[
            ("config/", ""),
            ("config/server.ini", "port=1"),
            ("maps/a/b.map", "map"),
        ],
    );
    let dest = temp_dir.path().join("dest");

    let report = ArchiveEngine::default()
        .extract_archive(&container, Some(&dest), false)
        .unwrap();

    assert_eq!(report.directories, 1);
    assert_eq!(report.files.len(), 2);
    assert_eq!(fs::read(dest.join("config/server.ini")).unwrap(), b"port=1");
    assert_eq!(fs::read(dest.join("maps/a/b.map")).unwrap(), b"map");
}

#[test]
fn test_extract_overwrites_existing_file() {
    let temp_dir = tempdir().unwrap();
    let container = temp_dir.path().join("c.zip");
    raw_zip(&container, &[("a.txt", "new")]);
    let dest = temp_dir.path().join("dest");
    write_file(&dest.join("a.txt"), b"old content that is longer");

    ArchiveEngine::default()
        .extract_archive(&container, Some(&dest), false)
        .unwrap();
    assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"new");
}

#[test]
fn test_propagate_container_timestamp() {
    let temp_dir = tempdir().unwrap();
    let src = temp_dir.path().join("a.txt");
    write_file(&src, b"a");
    set_mtime(&src, SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000_000));

    let engine = ArchiveEngine::default();
    let created = engine
        .create_archive(&temp_dir.path().join("out"), &[&src])
        .unwrap();
    let container_time = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    set_mtime(&created.path, container_time);
    let expected = fs::metadata(&created.path).unwrap().modified().unwrap();

    let dest = temp_dir.path().join("with-time");
    engine
        .extract_archive(&created.path, Some(&dest), true)
        .unwrap();
    let extracted_time = fs::metadata(dest.join("a.txt")).unwrap().modified().unwrap();
    assert_eq!(extracted_time, expected);

    let dest = temp_dir.path().join("without-time");
    engine
        .extract_archive(&created.path, Some(&dest), false)
        .unwrap();
    let extracted_time = fs::metadata(dest.join("a.txt")).unwrap().modified().unwrap();
    assert_ne!(extracted_time, expected);
}

#[test]
fn test_default_destination_is_container_dir() {
    let temp_dir = tempdir().unwrap();
    let container = temp_dir.path().join("c.zip");
    raw_zip(&container, &[("a.txt", "a")]);

    let report = ArchiveEngine::default()
        .extract_archive(&container, None, false)
        .unwrap();

    assert_eq!(report.destination, fs::canonicalize(temp_dir.path()).unwrap());
    assert!(temp_dir.path().join("a.txt").exists());

    ArchiveEngine::default()
        .extract_archive(&container, Some(Path::new("")), false)
        .unwrap();
}

#[test]
fn test_missing_container() {
    let temp_dir = tempdir().unwrap();
    let dest = temp_dir.path().join("dest");
    let engine = ArchiveEngine::default();

    let err = engine
        .extract_archive(&temp_dir.path().join("nope.zip"), Some(&dest), true)
        .unwrap_err();
    assert!(matches!(err, KeeperError::ContainerNotFound(_)));
    assert!(!dest.exists());

    assert!(matches!(
        engine.verify_archive(&temp_dir.path().join("nope.zip")),
        Err(KeeperError::ContainerNotFound(_))
    ));
}

#[test]
fn test_verify_archive() {
    let temp_dir = tempdir().unwrap();
    let container = temp_dir.path().join("c.zip");
    raw_zip(&container, &[("a.txt", "a"), ("dir/", ""), ("dir/b.txt", "b")]);
    assert_eq!(ArchiveEngine::default().verify_archive(&container).unwrap(), 3);

    let garbage = temp_dir.path().join("garbage.zip");
    write_file(&garbage, b"definitely not a zip file");
    assert!(matches!(
        ArchiveEngine::default().verify_archive(&garbage),
        Err(KeeperError::Zip(_))
    ));
}
