//! Integration tests for extracting AA01 archives to disk.

#![allow(clippy::unwrap_used)]

use std::fs;
use std::sync::Arc;

use aa01::aa01::{ExtractOptions, ExtractOutcome, OverwritePolicy, write_payload};
use aa01::test_utils::{ArchiveBuilder, RecordBuilder, dir_record, file_record};
use aa01::{Aa01Archive, Aa01Error, Aa01Extractor, MemoryReader};
use tempfile::TempDir;

fn archive(bytes: Vec<u8>) -> Aa01Archive {
    Aa01Archive::new(Arc::new(MemoryReader::new(bytes)))
}

#[test]
fn test_extract_creates_nested_directories() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    let payload = b"\x00\x01\x02\x03\x04\x05\x06\x07\x08\x09";

    let bytes = ArchiveBuilder::new()
        .data_section(vec![file_record("a/b/c.bin", payload)])
        .build();

    let stats = Aa01Extractor::new(&out)
        .extract_all(archive(bytes).entries())
        .unwrap();

    assert_eq!(stats.files, 1);
    assert_eq!(stats.bytes, 10);
    assert!(out.join("a").is_dir());
    assert!(out.join("a").join("b").is_dir());
    assert_eq!(fs::read(out.join("a/b/c.bin")).unwrap(), payload);
}

#[test]
fn test_metadata_and_directories_write_nothing() {
    let temp = TempDir::new().unwrap();

    let bytes = ArchiveBuilder::new()
        .metadata_section(vec![RecordBuilder::new()
            .text("PAT", "meta-only")
            .uint("MOD", 0o755)
            .build()])
        .data_section(vec![
            dir_record("empty-dir"),
            RecordBuilder::new()
                .char_field("TYP", 'F')
                .text("PAT", "zero.bin")
                .size("DAT", 0)
                .build(),
        ])
        .build();

    let stats = Aa01Extractor::new(temp.path())
        .extract_all(archive(bytes).entries())
        .unwrap();

    assert_eq!(stats.files, 0);
    assert!(!temp.path().join("meta-only").exists());
    assert!(!temp.path().join("empty-dir").exists());
    assert!(!temp.path().join("zero.bin").exists());
}

#[test]
fn test_traversal_paths_are_rejected() {
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("dest");

    let bytes = ArchiveBuilder::new()
        .data_section(vec![file_record("../escape.txt", b"nope")])
        .build();

    let result = Aa01Extractor::new(&dest).extract_all(archive(bytes).entries());

    assert!(matches!(result, Err(Aa01Error::UnsafePath { ref path }) if path == "../escape.txt"));
    assert!(!temp.path().join("escape.txt").exists());
}

#[test]
fn test_never_overwrite_skips_existing_files() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("keep.txt"), b"original").unwrap();

    let bytes = ArchiveBuilder::new()
        .data_section(vec![
            file_record("keep.txt", b"replacement"),
            file_record("new.txt", b"fresh"),
        ])
        .build();

    let extractor = Aa01Extractor::with_options(
        temp.path(),
        ExtractOptions {
            overwrite: OverwritePolicy::Never,
        },
    );
    let stats = extractor.extract_all(archive(bytes).entries()).unwrap();

    assert_eq!(stats.files, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(fs::read(temp.path().join("keep.txt")).unwrap(), b"original");
    assert_eq!(fs::read(temp.path().join("new.txt")).unwrap(), b"fresh");
}

#[test]
fn test_default_policy_overwrites() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("f.txt"), b"a much longer original").unwrap();

    let bytes = ArchiveBuilder::new()
        .data_section(vec![file_record("f.txt", b"short")])
        .build();
    let archive = archive(bytes);
    let record = archive.data_records().next().unwrap().unwrap();

    let outcome = Aa01Extractor::new(temp.path())
        .extract_record(&record)
        .unwrap();

    assert_eq!(
        outcome,
        ExtractOutcome::Written {
            path: temp.path().join("f.txt"),
            bytes: 5
        }
    );
    assert_eq!(fs::read(temp.path().join("f.txt")).unwrap(), b"short");
}

#[test]
fn test_unwritable_destination_names_the_path() {
    let temp = TempDir::new().unwrap();
    // A regular file where a directory is needed.
    fs::write(temp.path().join("blocker"), b"").unwrap();

    let bytes = ArchiveBuilder::new()
        .data_section(vec![file_record("blocker/inner.bin", b"x")])
        .build();

    match Aa01Extractor::new(temp.path()).extract_all(archive(bytes).entries()) {
        Err(Aa01Error::Extract { path, .. }) => assert!(path.starts_with(temp.path())),
        other => panic!("expected Extract error, got {other:?}"),
    }
}

#[test]
fn test_extract_from_local_file() {
    let temp = TempDir::new().unwrap();
    let archive_path = temp.path().join("patch.aa");
    let contents: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();

    let bytes = ArchiveBuilder::new()
        .data_section(vec![file_record("big/blob.bin", &contents)])
        .build();
    fs::write(&archive_path, bytes).unwrap();

    let archive = Aa01Archive::open(&archive_path).unwrap();
    let out = temp.path().join("out");
    Aa01Extractor::new(&out)
        .extract_all(archive.entries())
        .unwrap();

    assert_eq!(fs::read(out.join("big/blob.bin")).unwrap(), contents);
}

#[test]
fn test_write_payload_to_memory() {
    let bytes = ArchiveBuilder::new()
        .data_section(vec![dir_record("d"), file_record("d/f", b"payload")])
        .build();
    let archive = archive(bytes);
    let records: Vec<_> = archive.data_records().map(|r| r.unwrap()).collect();

    let mut out = Vec::new();
    assert_eq!(write_payload(&records[0], &mut out).unwrap(), 0);
    assert_eq!(write_payload(&records[1], &mut out).unwrap(), 7);
    assert_eq!(out, b"payload");
}
