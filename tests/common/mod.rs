//! Common test utilities for source fetching integration tests.

#![allow(dead_code)]

mod fixtures;

pub use fixtures::*;

use std::path::PathBuf;
use tempfile::TempDir;
use vectorweight_sources::SourceManager;

/// A temp directory holding both input fixtures and the manager's scratch root.
pub struct TestEnv {
    _dir: TempDir,
    /// Where fixtures are written.
    pub inputs: PathBuf,
    /// Directory the manager allocates its scratch root in.
    pub scratch: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let inputs = dir.path().join("inputs");
        let scratch = dir.path().join("scratch");
        std::fs::create_dir_all(&inputs).unwrap();
        Self {
            _dir: dir,
            inputs,
            scratch,
        }
    }

    pub fn manager(&self) -> SourceManager {
        SourceManager::with_scratch_root(&self.scratch).unwrap()
    }
}
