//! Integration tests for SourceManager caching and cleanup
//!
//! Local-path and archive sources exercise the full fetch/cache/cleanup cycle
//! without touching the network.

mod common;

use common::*;
use filetime::FileTime;
use vectorweight_sources::{
    FetchCause, ProvenanceDescriptor, ProvenanceMode, SourceError, SourceManager, Verification,
    cache_key,
};

// =============================================================================
// Local Path
// =============================================================================

#[test]
fn test_local_directory_scenario() {
    let env = TestEnv::new();
    let charts = env.inputs.join("charts");
    write_tree(&charts, &[("a.txt", "alpha\n")]);

    let mut manager = env.manager();
    let desc = ProvenanceDescriptor::local(&charts);

    let first = manager.fetch_source(&desc).unwrap();
    assert_eq!(first.source_type, "local");
    assert!(first.origin_location.is_none());
    assert_eq!(
        std::fs::read_to_string(first.local_path.join("charts/a.txt")).unwrap(),
        "alpha\n"
    );

    let second = manager.fetch_source(&desc).unwrap();
    assert_eq!(second.local_path, first.local_path);
    assert_eq!(manager.fetch_count(), 1);
}

#[test]
fn test_local_file_is_byte_identical() {
    let env = TestEnv::new();
    let src = env.inputs.join("blob.bin");
    let bytes: Vec<u8> = (0..100_000u32).map(|i| (i * 31 % 251) as u8).collect();
    std::fs::write(&src, &bytes).unwrap();

    let mut manager = env.manager();
    let meta = manager.fetch_source(&ProvenanceDescriptor::local(&src)).unwrap();
    assert_eq!(std::fs::read(meta.local_path.join("blob.bin")).unwrap(), bytes);
}

#[test]
fn test_cache_hit_does_not_rewrite_files() {
    let env = TestEnv::new();
    let charts = env.inputs.join("charts");
    write_tree(&charts, &[("a.txt", "alpha\n")]);

    let mut manager = env.manager();
    let desc = ProvenanceDescriptor::local(&charts);
    let meta = manager.fetch_source(&desc).unwrap();

    let copied = meta.local_path.join("charts/a.txt");
    let old = FileTime::from_unix_time(1_000_000_000, 0);
    filetime::set_file_mtime(&copied, old).unwrap();

    manager.fetch_source(&desc).unwrap();
    let after = FileTime::from_last_modification_time(&std::fs::metadata(&copied).unwrap());
    assert_eq!(after, old);
    assert_eq!(manager.fetch_count(), 1);
}

#[test]
fn test_missing_local_path_is_not_cached() {
    let env = TestEnv::new();
    let mut manager = env.manager();
    let desc = ProvenanceDescriptor::local(env.inputs.join("does-not-exist"));

    let err = manager.fetch_source(&desc).unwrap_err();
    assert!(matches!(
        err,
        SourceError::Fetch {
            mode: ProvenanceMode::LocalPath,
            cause: FetchCause::NotFound(_),
        }
    ));
    assert!(manager.cached(&desc).is_none());
    assert!(!manager.scratch_root().join(format!("source_{}", cache_key(&desc))).exists());
}

#[test]
fn test_deleted_cache_entry_is_refetched() {
    let env = TestEnv::new();
    let charts = env.inputs.join("charts");
    write_tree(&charts, &[("a.txt", "alpha\n")]);

    let mut manager = env.manager();
    let desc = ProvenanceDescriptor::local(&charts);
    let first = manager.fetch_source(&desc).unwrap();
    std::fs::remove_dir_all(&first.local_path).unwrap();

    let second = manager.fetch_source(&desc).unwrap();
    assert_eq!(manager.fetch_count(), 2);
    assert!(second.local_path.join("charts/a.txt").is_file());
}

#[test]
fn test_distinct_sources_get_distinct_directories() {
    let env = TestEnv::new();
    let a = env.inputs.join("a");
    let b = env.inputs.join("b");
    write_tree(&a, &[("x", "1")]);
    write_tree(&b, &[("y", "2")]);

    let mut manager = env.manager();
    let meta_a = manager.fetch_source(&ProvenanceDescriptor::local(&a)).unwrap();
    let meta_b = manager.fetch_source(&ProvenanceDescriptor::local(&b)).unwrap();
    assert_ne!(meta_a.local_path, meta_b.local_path);
    assert_eq!(manager.fetch_count(), 2);
}

// =============================================================================
// Archive
// =============================================================================

#[test]
fn test_archive_mismatch_extracts_nothing() {
    let env = TestEnv::new();
    let archive = env.inputs.join("charts.tar.gz");
    write_tar_gz(&archive, &[("charts/a.txt", "alpha\n")]);

    let mut manager = env.manager();
    let desc = ProvenanceDescriptor::new(ProvenanceMode::Archive)
        .with_path(&archive)
        .with_verification(Verification::sha256("deadbeef"));

    let err = manager.fetch_source(&desc).unwrap_err();
    match err {
        SourceError::Verification {
            expected, actual, ..
        } => {
            assert_eq!(expected, "deadbeef");
            assert_eq!(actual, sha256_hex(&archive));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(manager.cached(&desc).is_none());
    assert!(!manager.scratch_root().join(format!("source_{}", cache_key(&desc))).exists());
}

#[test]
fn test_archive_with_matching_checksum() {
    let env = TestEnv::new();
    let archive = env.inputs.join("charts.zip");
    write_zip(&archive, &[("charts/Chart.yaml", "name: demo\n")]);

    let verification = Verification::sha256(sha256_hex(&archive));
    let desc = ProvenanceDescriptor::new(ProvenanceMode::Archive)
        .with_path(&archive)
        .with_verification(verification.clone());

    let mut manager = env.manager();
    let meta = manager.fetch_source(&desc).unwrap();
    assert_eq!(meta.source_type, "archive");
    assert_eq!(meta.verification, Some(verification));
    assert!(meta.local_path.join("charts/Chart.yaml").is_file());
}

#[test]
fn test_rar_archive_is_unsupported() {
    let env = TestEnv::new();
    let archive = env.inputs.join("charts.rar");
    std::fs::write(&archive, b"Rar!\x1a\x07\x00").unwrap();

    let mut manager = env.manager();
    let err = manager
        .fetch_source(&ProvenanceDescriptor::new(ProvenanceMode::Archive).with_path(&archive))
        .unwrap_err();
    match err {
        SourceError::Fetch {
            cause: FetchCause::UnsupportedExtension(ext),
            ..
        } => assert_eq!(ext, "rar"),
        other => panic!("unexpected error: {other:?}"),
    }
}

// =============================================================================
// Cleanup
// =============================================================================

#[test]
fn test_cleanup_then_fresh_fetch() {
    let env = TestEnv::new();
    let charts = env.inputs.join("charts");
    write_tree(&charts, &[("a.txt", "alpha\n")]);

    let mut manager = env.manager();
    let desc = ProvenanceDescriptor::local(&charts);
    manager.fetch_source(&desc).unwrap();

    let root = manager.scratch_root().to_path_buf();
    manager.cleanup().unwrap();
    assert!(!root.exists());
    assert!(env.scratch.is_dir());

    let meta = manager.fetch_source(&desc).unwrap();
    assert_eq!(manager.fetch_count(), 2);
    assert!(meta.local_path.join("charts/a.txt").is_file());
}

#[test]
fn test_drop_removes_scratch_root() {
    let env = TestEnv::new();
    let charts = env.inputs.join("charts");
    write_tree(&charts, &[("a.txt", "alpha\n")]);

    let root = {
        let mut manager = env.manager();
        manager.fetch_source(&ProvenanceDescriptor::local(&charts)).unwrap();
        assert!(manager.scratch_root().is_dir());
        manager.scratch_root().to_path_buf()
    };
    assert!(!root.exists());
    // inputs are untouched
    assert!(charts.join("a.txt").is_file());
}

#[test]
fn test_drop_cleans_up_while_unwinding() {
    let env = TestEnv::new();
    let scratch = env.scratch.clone();

    let result = std::panic::catch_unwind(|| {
        let mut manager = SourceManager::with_scratch_root(&scratch).unwrap();
        manager.fetch_source(&ProvenanceDescriptor::direct()).unwrap();
        panic!("caller failed mid-run");
    });
    assert!(result.is_err());
    assert_eq!(std::fs::read_dir(&env.scratch).unwrap().count(), 0);
}

#[test]
fn test_into_scratch_root_keeps_content() {
    let env = TestEnv::new();
    let charts = env.inputs.join("charts");
    write_tree(&charts, &[("a.txt", "alpha\n")]);

    let mut manager = env.manager();
    let meta = manager.fetch_source(&ProvenanceDescriptor::local(&charts)).unwrap();
    let root = manager.into_scratch_root();

    assert_eq!(root.parent(), Some(env.scratch.as_path()));
    assert!(meta.local_path.starts_with(&root));
    assert!(meta.local_path.join("charts/a.txt").is_file());
}

#[test]
fn test_cleanup_preserves_preexisting_scratch_content() {
    let env = TestEnv::new();
    std::fs::create_dir_all(env.scratch.join("notes")).unwrap();
    std::fs::write(env.scratch.join("precious.txt"), "keep me\n").unwrap();
    std::fs::write(env.scratch.join("notes/todo.md"), "- ship\n").unwrap();

    let mut manager = env.manager();
    manager.fetch_source(&ProvenanceDescriptor::direct()).unwrap();
    manager.cleanup().unwrap();
    assert!(env.scratch.join("precious.txt").is_file());
    assert!(env.scratch.join("notes/todo.md").is_file());

    manager.fetch_source(&ProvenanceDescriptor::direct()).unwrap();
    drop(manager);
    assert_eq!(
        std::fs::read_to_string(env.scratch.join("precious.txt")).unwrap(),
        "keep me\n"
    );
    assert!(env.scratch.join("notes/todo.md").is_file());
    // only the pre-existing entries remain
    assert_eq!(std::fs::read_dir(&env.scratch).unwrap().count(), 2);
}

#[test]
fn test_managers_sharing_a_directory_stay_apart() {
    let env = TestEnv::new();
    let mut first = env.manager();
    let mut second = env.manager();
    assert_ne!(first.scratch_root(), second.scratch_root());

    let kept = first.fetch_source(&ProvenanceDescriptor::direct()).unwrap();
    second.fetch_source(&ProvenanceDescriptor::direct()).unwrap();
    drop(second);
    assert!(kept.local_path.is_dir());
}
