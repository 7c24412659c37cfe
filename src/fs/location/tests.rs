#![cfg(test)]

use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use super::copy::{self, CopyOptions, CopyStrategy, CopyTechnique};
use super::*;
use crate::fs::OsError;
use crate::fs::dir::DirMgr;
use crate::fs::path::AbsPath;
use crate::fs::perm::FilePermission;

fn location_in(dir: &Path, name: &str) -> FileLocation {
    FileLocation::new(dir.join(name)).unwrap()
}

fn source_with(dir: &Path, name: &str, data: &[u8]) -> FileLocation {
    fs::write(dir.join(name), data).unwrap();
    location_in(dir, name)
}

#[test]
fn test_decomposition() {
    let loc = FileLocation::new("/tmp/./data//report.tar.gz").unwrap();
    assert_eq!(loc.absolute_path().as_bytes(), b"/tmp/data/report.tar.gz");
    assert_eq!(loc.dir().path().as_bytes(), b"/tmp/data");
    assert_eq!(loc.file_name(), "report.tar");
    assert_eq!(loc.extension(), ".gz", "Only the last extension should be split off.");
    assert_eq!(loc.file_name_ext(), "report.tar.gz");
    assert_eq!(loc.original_path(), "/tmp/./data//report.tar.gz");

    let hidden = FileLocation::new("/tmp/.profile").unwrap();
    assert_eq!(hidden.file_name(), ".profile", "A leading dot is not an extension.");
    assert_eq!(hidden.extension(), "");

    assert!(FileLocation::new("/").is_err(), "The root has no file name.");
    assert!(FileLocation::new("  ").is_err());
}

#[test]
fn test_from_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = DirMgr::new(tmp.path()).unwrap();
    let loc = FileLocation::from_dir(&dir, "notes.txt").unwrap();

    assert_eq!(loc.dir().path(), dir.path());
    assert_eq!(loc.absolute_path().as_path(), tmp.path().join("notes.txt"));
    assert!(loc.equal_abs_paths(&location_in(tmp.path(), "notes.txt")));
    assert!(loc.equal_file_name_ext(&FileLocation::new("/elsewhere/notes.txt").unwrap()));
    assert!(!loc.equal_abs_paths(&FileLocation::new("/elsewhere/notes.txt").unwrap()));
}

#[test]
fn test_exists_and_populated() {
    let tmp = tempfile::tempdir().unwrap();
    let loc = location_in(tmp.path(), "later.txt");

    assert!(!loc.exists(), "A file that was never created should not exist.");
    assert!(!loc.is_abs_path_populated());
    assert!(!loc.is_file_name_populated());
    assert!(loc.metadata().unwrap_err().is_not_found());

    loc.create().unwrap();
    assert!(loc.exists());
    assert!(loc.is_abs_path_populated());
    assert!(loc.is_file_name_populated());
    assert_eq!(loc.size().unwrap(), 0);
    assert!(!loc.is_open(), "Create should leave the handle closed.");
}

#[test]
fn test_write_then_read_all() {
    let tmp = tempfile::tempdir().unwrap();
    let loc = location_in(tmp.path(), "hello.txt");

    assert_eq!(loc.write_str("hello", true).unwrap(), 5);
    assert_eq!(loc.state(), HandleState::OpenForWrite);
    assert_eq!(loc.read_all().unwrap(), b"hello", "Reading should see buffered writes.");
    assert_eq!(loc.state(), HandleState::OpenForRead);
    assert_eq!(loc.read_all().unwrap(), b"", "The end of the file is not an error.");
    loc.close().unwrap();

    assert_eq!(fs::read(tmp.path().join("hello.txt")).unwrap(), b"hello");
    assert_eq!(loc.bytes_written(), 5);
}

#[test]
fn test_append_and_truncate() {
    let tmp = tempfile::tempdir().unwrap();
    let loc = location_in(tmp.path(), "log.txt");

    loc.write_str("first\n", true).unwrap();
    loc.close().unwrap();
    loc.write_str("second\n", false).unwrap();
    loc.close().unwrap();
    assert_eq!(loc.read_all_string().unwrap(), "first\nsecond\n");

    loc.write_str("third\n", true).unwrap();
    loc.close().unwrap();
    assert_eq!(loc.read_all_string().unwrap(), "third\n", "Truncation should drop old contents.");
    assert_eq!(loc.bytes_written(), 19, "The counter spans every open.");
}

#[test]
fn test_read_delimited() {
    let tmp = tempfile::tempdir().unwrap();
    let loc = source_with(tmp.path(), "lines.txt", b"one\ntwo");

    let first = loc.read_delimited_string(b'\n').unwrap();
    assert_eq!(first.data, "one\n");
    assert!(!first.at_eof);

    let second = loc.read_delimited_string(b'\n').unwrap();
    assert_eq!(second.data, "two", "The last line has no delimiter.");
    assert!(second.at_eof, "Running into the end should be flagged, not raised.");

    let third = loc.read_delimited(b'\n').unwrap();
    assert!(third.data.is_empty());
    assert!(third.at_eof);
}

#[test]
fn test_read_bytes_and_encoding() {
    let tmp = tempfile::tempdir().unwrap();
    let loc = source_with(tmp.path(), "bin", &[b'o', b'k', 0xff, 0xfe]);

    let mut buf = [0; 2];
    assert_eq!(loc.read_bytes(&mut buf).unwrap(), 2);
    assert_eq!(&buf, b"ok");
    loc.close().unwrap();

    match loc.read_all_string() {
        Err(FileError::Encoding(e)) => assert_eq!(e.valid_up_to, 2),
        other => panic!("expected an encoding error, got {other:?}"),
    }
}

#[test]
fn test_read_missing_file() {
    let tmp = tempfile::tempdir().unwrap();
    let loc = location_in(tmp.path(), "absent.txt");

    let err = loc.read_all().unwrap_err();
    assert!(matches!(err, FileError::NotFound(_)), "got {err:?}");
    assert!(err.is_not_found());
    assert_eq!(loc.state(), HandleState::Unopened, "A failed read should not open anything.");
}

#[test]
fn test_state_transitions() {
    let tmp = tempfile::tempdir().unwrap();
    let loc = source_with(tmp.path(), "state.txt", b"abc");

    assert_eq!(loc.state(), HandleState::Unopened);
    loc.open_read_only().unwrap();
    assert_eq!(loc.state(), HandleState::OpenForRead);
    loc.close().unwrap();
    assert_eq!(loc.state(), HandleState::Closed);
    loc.close().expect("Closing twice should be harmless.");

    loc.open_read_write().expect("Reopening from closed should be allowed.");
    assert_eq!(loc.state(), HandleState::OpenForReadWrite);
    loc.open_write_only_append().expect("Opening again should replace the handle.");
    assert_eq!(loc.state(), HandleState::OpenForWrite);
    loc.close().unwrap();
    assert!(loc.state().is_closed());
}

#[test]
fn test_read_write_handle() {
    let tmp = tempfile::tempdir().unwrap();
    let loc = source_with(tmp.path(), "rw.txt", b"abcdef");

    loc.open_read_write().unwrap();
    let mut buf = [0; 2];
    loc.read_bytes(&mut buf).unwrap();
    assert_eq!(&buf, b"ab");
    loc.write_str("XY", false).unwrap();
    loc.flush().unwrap();
    loc.close().unwrap();

    assert_eq!(
        fs::read(tmp.path().join("rw.txt")).unwrap(),
        b"abXYef",
        "Writes should land at the logical read position, not after the read-ahead."
    );
}

#[test]
fn test_open_creates_dirs() {
    let tmp = tempfile::tempdir().unwrap();
    let loc = location_in(tmp.path(), "a/b/c.txt");

    loc.open_write_only_truncate().unwrap();
    assert!(tmp.path().join("a/b").is_dir(), "Opening to create should build the directory tree.");
    loc.close().unwrap();

    let missing = location_in(tmp.path(), "x/y.txt");
    assert!(missing.open_read_only().unwrap_err().is_not_found());
    assert!(!tmp.path().join("x").exists(), "Read-only opens never create directories.");
}

#[test]
fn test_buffer_sizes() {
    let tmp = tempfile::tempdir().unwrap();
    let loc = location_in(tmp.path(), "buffered.txt");

    assert_eq!(loc.reader_buffer_size(), DEFAULT_BUFFER_SIZE);
    loc.set_reader_buffer_size(16);
    loc.set_writer_buffer_size(0);
    assert_eq!(loc.reader_buffer_size(), 16);
    assert_eq!(loc.writer_buffer_size(), DEFAULT_BUFFER_SIZE, "Zero should select the default.");

    loc.set_writer_buffer_size(4);
    let text = "more than four bytes";
    loc.write_str(text, true).unwrap();
    assert_eq!(loc.read_all_string().unwrap(), text);
}

#[test]
fn test_permissions() {
    let tmp = tempfile::tempdir().unwrap();
    let loc = location_in(tmp.path(), "perm.txt");
    loc.create().unwrap();

    loc.change_permission(FilePermission::from_octal_digits(600).unwrap()).unwrap();
    let perm = loc.permission().unwrap();
    assert_eq!(perm.permission_bits(), 0o600);
    assert!(perm.is_regular());
    assert_eq!(perm.symbolic(), "-rw-------");
    assert_eq!(perm.octal_digits(), 600, "A real file's type bits should not leak into its digits.");
    assert_eq!(FilePermission::from_symbolic(&perm.symbolic()).unwrap(), perm);

    loc.change_permission(FilePermission::from_symbolic("-rw-r-----").unwrap()).unwrap();
    assert_eq!(loc.permission().unwrap().octal_digits(), 640);
    assert_eq!(loc.permission().unwrap().mode(), 0o640);
    assert_eq!(fs::metadata(tmp.path().join("perm.txt")).unwrap().mode() & 0o777, 0o600);

    let missing = location_in(tmp.path(), "none.txt");
    assert!(missing.change_permission(FilePermission::DEFAULT_FILE).unwrap_err().is_not_found());
}

#[test]
fn test_delete() {
    let tmp = tempfile::tempdir().unwrap();
    let loc = source_with(tmp.path(), "gone.txt", b"x");

    loc.open_read_only().unwrap();
    loc.delete().unwrap();
    assert!(!loc.exists());
    assert!(!loc.is_open(), "Delete should close the handle first.");
    loc.delete().expect("Deleting a missing file should succeed.");
}

#[test]
fn test_copy_strategies() {
    let tmp = tempfile::tempdir().unwrap();
    let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
    let source = source_with(tmp.path(), "source.bin", &data);

    let strategies = [
        CopyStrategy::Stream,
        CopyStrategy::StreamWithBuffer(7),
        CopyStrategy::HardLink,
        CopyStrategy::StreamThenLink,
        CopyStrategy::LinkThenStream,
    ];
    for (i, strategy) in strategies.into_iter().enumerate() {
        let target = location_in(tmp.path(), &format!("out/copy{i}.bin"));
        source.copy_to(&target, strategy, CopyOptions::default()).unwrap();

        assert!(target.exists(), "{strategy:?} should create the destination.");
        assert_eq!(target.read_all().unwrap(), data, "{strategy:?} should copy every byte.");
        assert!(source.exists(), "{strategy:?} should keep the source.");
    }
}

#[test]
fn test_copy_existing_destination() {
    let tmp = tempfile::tempdir().unwrap();
    let source = source_with(tmp.path(), "src.txt", b"new");
    let target = source_with(tmp.path(), "dst.txt", b"old and longer");

    let keep = CopyOptions {
        create_dir: true,
        delete_existing: false,
    };
    assert!(source.copy_to(&target, CopyStrategy::HardLink, keep).is_err());
    source.copy_to(&target, CopyStrategy::Stream, keep).unwrap();
    assert_eq!(target.read_all().unwrap(), b"new", "A stream copy should truncate the old file.");

    source.copy_to(&target, CopyStrategy::HardLink, CopyOptions::default()).unwrap();
    assert_eq!(
        fs::metadata(tmp.path().join("dst.txt")).unwrap().ino(),
        fs::metadata(tmp.path().join("src.txt")).unwrap().ino()
    );
}

#[test]
fn test_copy_preconditions() {
    let tmp = tempfile::tempdir().unwrap();
    let source = source_with(tmp.path(), "src.txt", b"data");

    assert!(matches!(
        source.copy_to(&source, CopyStrategy::Stream, CopyOptions::default()),
        Err(FileError::SameFile(_))
    ));
    let alias = location_in(tmp.path(), "./src.txt");
    assert!(matches!(
        source.copy_to(&alias, CopyStrategy::Stream, CopyOptions::default()),
        Err(FileError::SameFile(_))
    ));
    fs::hard_link(tmp.path().join("src.txt"), tmp.path().join("link.txt")).unwrap();
    let link = location_in(tmp.path(), "link.txt");
    assert!(matches!(
        source.copy_to(&link, CopyStrategy::Stream, CopyOptions::default()),
        Err(FileError::SameFile(_))
    ));
    assert_eq!(link.read_all().unwrap(), b"data", "A refused copy should not touch either file.");

    let missing = location_in(tmp.path(), "missing.txt");
    let target = location_in(tmp.path(), "target.txt");
    let err = missing.copy_to(&target, CopyStrategy::Stream, CopyOptions::default()).unwrap_err();
    assert!(matches!(err, FileError::NotFound(_)), "got {err:?}");

    let dir_source = location_in(tmp.path(), "sub");
    fs::create_dir(tmp.path().join("sub")).unwrap();
    assert!(matches!(
        dir_source.copy_to(&target, CopyStrategy::Stream, CopyOptions::default()),
        Err(FileError::NotRegular(_))
    ));

    let no_dir = CopyOptions {
        create_dir: false,
        delete_existing: true,
    };
    let nested = location_in(tmp.path(), "deep/er/target.txt");
    assert!(matches!(
        source.copy_to(&nested, CopyStrategy::Stream, no_dir),
        Err(FileError::MissingDir(_))
    ));
    source.copy_to(&nested, CopyStrategy::Stream, CopyOptions::default()).unwrap();
    assert_eq!(nested.read_all().unwrap(), b"data");
}

#[test]
fn test_copy_to_path_and_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let source = source_with(tmp.path(), "a.txt", b"payload");

    let copied = source
        .copy_to_path(tmp.path().join("b.txt"), CopyStrategy::default(), CopyOptions::default())
        .unwrap();
    assert_eq!(copied.file_name_ext(), "b.txt");
    assert_eq!(copied.read_all().unwrap(), b"payload");

    let dir = DirMgr::new(tmp.path().join("backup")).unwrap();
    let copied = source.copy_to_dir(&dir, CopyStrategy::HardLink, CopyOptions::default()).unwrap();
    assert_eq!(copied.absolute_path().as_path(), tmp.path().join("backup/a.txt"));
    assert!(copied.exists());
}

#[test]
fn test_fallback_policy() {
    let mut attempts = Vec::new();
    copy::run_strategy(CopyStrategy::LinkThenStream, |technique| {
        attempts.push(technique);
        Ok(())
    })
    .unwrap();
    assert_eq!(attempts, [CopyTechnique::HardLink], "A successful first attempt ends the copy.");

    let mut attempts = Vec::new();
    copy::run_strategy(CopyStrategy::StreamThenLink, |technique| {
        attempts.push(technique);
        if technique.is_stream() {
            Err(MissingDirError {
                path: AbsPath::root(),
            })?
        }
        Ok(())
    })
    .unwrap();
    assert_eq!(attempts.len(), 2);
    assert!(attempts[1].is_hard_link(), "The fallback should run after a failure.");

    let err = copy::run_strategy(CopyStrategy::LinkThenStream, |technique| match technique {
        CopyTechnique::HardLink => Err(NotRegularError {
            path: AbsPath::root(),
        }
        .into()),
        CopyTechnique::Stream { .. } => Err(MissingDirError {
            path: AbsPath::root(),
        }
        .into()),
    })
    .unwrap_err();
    match err {
        FileError::Fallback(e) => {
            assert!(matches!(*e.first, FileError::NotRegular(_)));
            assert!(matches!(*e.second, FileError::MissingDir(_)), "The second failure leads.");
        },
        other => panic!("expected a fallback error, got {other:?}"),
    }

    let err = copy::run_strategy(CopyStrategy::HardLink, |_| {
        Err(NotRegularError {
            path: AbsPath::root(),
        }
        .into())
    })
    .unwrap_err();
    assert!(matches!(err, FileError::NotRegular(_)), "Single strategies are not wrapped.");
}

#[test]
fn test_cross_device_fallback() {
    let tmp = tempfile::tempdir().unwrap();
    let shm = Path::new("/dev/shm");
    if !shm.is_dir()
        || fs::metadata(shm).unwrap().dev() == fs::metadata(tmp.path()).unwrap().dev()
    {
        eprintln!("skipped: /dev/shm is missing or on the same device as the temp dir");
        return;
    }
    let Ok(other) = tempfile::tempdir_in(shm) else {
        eprintln!("skipped: cannot create a directory under /dev/shm");
        return;
    };

    let source = source_with(tmp.path(), "src.txt", b"across");
    let target = location_in(other.path(), "dst.txt");

    match source.copy_to(&target, CopyStrategy::HardLink, CopyOptions::default()) {
        Err(FileError::OsPair(e)) => assert!(e.is_cross_device()),
        other => panic!("expected a cross-device error, got {other:?}"),
    }
    source.copy_to(&target, CopyStrategy::LinkThenStream, CopyOptions::default()).unwrap();
    assert_eq!(target.read_all().unwrap(), b"across", "The stream fallback should complete the copy.");
}

#[test]
fn test_link_falls_back_to_stream() {
    let tmp = tempfile::tempdir().unwrap();
    let source = source_with(tmp.path(), "src.txt", b"fresh contents");
    let target = source_with(tmp.path(), "dst.txt", b"old");

    let keep = CopyOptions {
        create_dir: true,
        delete_existing: false,
    };
    source.copy_to(&target, CopyStrategy::LinkThenStream, keep).unwrap();

    assert_eq!(target.read_all().unwrap(), b"fresh contents", "The stream fallback should finish the copy.");
    assert_ne!(
        fs::metadata(tmp.path().join("dst.txt")).unwrap().ino(),
        fs::metadata(tmp.path().join("src.txt")).unwrap().ino(),
        "The link must have failed on the existing destination."
    );
    assert_eq!(source.size().unwrap(), target.size().unwrap());
}

#[test]
fn test_existing_destination_kept_on_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = location_in(tmp.path(), "vanished.txt");
    let target = source_with(tmp.path(), "dst.txt", b"precious user data");

    let (mut from, mut to) = missing.lock_pair(&target);
    let err = copy::stream_copy(&mut from, &mut to, 8, 5).unwrap_err();
    drop((from, to));

    assert!(err.is_not_found(), "got {err:?}");
    assert_eq!(
        target.read_all().unwrap(),
        b"precious user data",
        "A copy that never opened the destination must leave it alone."
    );
    target.close().unwrap();

    let source = source_with(tmp.path(), "src.txt", b"twelve bytes");
    let (mut from, mut to) = source.lock_pair(&target);
    let err = copy::stream_copy(&mut from, &mut to, 4, 100).unwrap_err();
    drop((from, to));

    assert!(matches!(err, FileError::ShortCopy(_)), "got {err:?}");
    assert!(target.exists(), "A destination that existed before the copy is never removed.");
}

#[test]
fn test_partial_destination_removed() {
    let tmp = tempfile::tempdir().unwrap();
    let source = source_with(tmp.path(), "src.txt", b"twelve bytes");
    let target = location_in(tmp.path(), "dst.txt");

    let (mut from, mut to) = source.lock_pair(&target);
    let err = copy::stream_copy(&mut from, &mut to, 4, 100).unwrap_err();
    drop((from, to));

    match err {
        FileError::ShortCopy(e) => {
            assert_eq!(e.copied, 12);
            assert_eq!(e.expected, 100);
        },
        other => panic!("expected a short copy error, got {other:?}"),
    }
    assert!(!target.exists(), "A failed stream copy should not leave a partial destination.");
    assert!(source.exists());
}

#[test]
fn test_move() {
    let tmp = tempfile::tempdir().unwrap();
    let source = source_with(tmp.path(), "from.txt", b"moving");
    let target = location_in(tmp.path(), "to/to.txt");

    source.move_to(&target).unwrap();
    assert!(!source.exists(), "A move should remove the source.");
    assert_eq!(target.read_all().unwrap(), b"moving");

    let dir = DirMgr::new(tmp.path().join("final")).unwrap();
    let moved = target.move_to_dir(&dir).unwrap();
    assert_eq!(moved.file_name_ext(), "to.txt");
    assert!(moved.exists());
    assert!(!target.exists());

    let renamed = moved.move_to_path(tmp.path().join("renamed.txt")).unwrap();
    assert_eq!(renamed.file_name_ext(), "renamed.txt");
    assert_eq!(renamed.read_all().unwrap(), b"moving");
    assert!(!moved.exists());

    let err = source.move_to(&location_in(tmp.path(), "never.txt")).unwrap_err();
    assert!(err.is_not_found(), "Moving a missing file should fail before copying.");
    assert!(matches!(renamed.move_to(&renamed), Err(FileError::SameFile(_))));
}

#[test]
fn test_move_source_not_removed() {
    let tmp = tempfile::tempdir().unwrap();
    let source = source_with(tmp.path(), "from.txt", b"stuck");
    let target = location_in(tmp.path(), "to.txt");

    let (mut from, mut to) = source.lock_pair(&target);
    let err = copy::move_file(&mut from, &mut to, |inner| {
        Err(OsError::from_errno("unlink", &inner.path, libc::EACCES))
    })
    .unwrap_err();
    drop((from, to));

    assert!(matches!(err, FileError::SourceNotRemoved(_)), "got {err:?}");
    assert!(source.exists(), "Nothing should be rolled back.");
    assert_eq!(target.read_all().unwrap(), b"stuck");
}

#[test]
fn test_concurrent_writes() {
    let tmp = tempfile::tempdir().unwrap();
    let loc = Arc::new(location_in(tmp.path(), "shared.txt"));
    loc.create().unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let loc = Arc::clone(&loc);
            thread::spawn(move || {
                for _ in 0..50 {
                    loc.write_str("line\n", false).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    loc.close().unwrap();

    assert_eq!(loc.bytes_written(), 4 * 50 * 5);
    let text = loc.read_all_string().unwrap();
    assert_eq!(text.lines().count(), 200);
    assert!(text.lines().all(|line| line == "line"), "Writes should never interleave.");
}

#[test]
fn test_opposing_copies_do_not_deadlock() {
    let tmp = tempfile::tempdir().unwrap();
    let a = Arc::new(source_with(tmp.path(), "a.txt", b"ping"));
    let b = Arc::new(source_with(tmp.path(), "b.txt", b"ping"));

    let forward = {
        let (a, b) = (Arc::clone(&a), Arc::clone(&b));
        thread::spawn(move || {
            for _ in 0..25 {
                a.copy_to(&b, CopyStrategy::Stream, CopyOptions::default()).unwrap();
            }
        })
    };
    let backward = {
        let (a, b) = (Arc::clone(&a), Arc::clone(&b));
        thread::spawn(move || {
            for _ in 0..25 {
                b.copy_to(&a, CopyStrategy::Stream, CopyOptions::default()).unwrap();
            }
        })
    };
    forward.join().unwrap();
    backward.join().unwrap();

    assert_eq!(a.read_all().unwrap(), b"ping");
    assert_eq!(b.read_all().unwrap(), b"ping");
}
