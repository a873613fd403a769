//! [`TestLedger`] builder for data-directory scenarios without git.

use std::fs;
use std::path::{Path, PathBuf};

use tab_fs::NormalizedPath;
use tempfile::TempDir;

use crate::fixtures;

/// A temporary data directory pre-filled with the fixture files.
///
/// # Example
///
/// ```rust,no_run
/// use tab_test_utils::TestLedger;
///
/// let ledger = TestLedger::new();
/// ledger.write("static/products.yml", "[]");
/// ledger.assert_file_contains("bartab.ledger", "open Assets:Cash:Bar");
/// ```
pub struct TestLedger {
    temp_dir: TempDir,
}

impl Default for TestLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLedger {
    /// Create a data directory holding the fixture ledger and catalog.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fixtures::write_data_dir(temp_dir.path());
        Self { temp_dir }
    }

    /// Return the data directory root.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Return the data directory root as a [`NormalizedPath`].
    pub fn normalized_root(&self) -> NormalizedPath {
        NormalizedPath::new(self.root())
    }

    /// Absolute path of `rel` inside the data directory.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Overwrite `rel` with `content`.
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    /// Append `content` to `rel`.
    pub fn append(&self, rel: &str, content: &str) {
        let mut existing = fs::read_to_string(self.path(rel)).unwrap_or_default();
        existing.push_str(content);
        self.write(rel, &existing);
    }

    /// Read `rel` as text.
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel))
            .unwrap_or_else(|_| panic!("Could not read file: {}", self.path(rel).display()))
    }

    /// Assert that the file at `rel` contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, rel: &str, content: &str) {
        let file_content = self.read(rel);
        assert!(
            file_content.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            rel,
            content,
            file_content
        );
    }
}
