// Reads an Allure results directory back
//
// Unreadable or malformed files do not abort a read; they are recorded as
// ReadErrors and skipped.

use crate::model::{
    ATTACHMENT_FILE_SUFFIX, TEST_RESULT_CONTAINER_FILE_SUFFIX, TEST_RESULT_FILE_SUFFIX, TestResult,
    TestResultContainer,
};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadError {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug)]
pub struct ResultsReader {
    results_dir: PathBuf,
    errors: Vec<ReadError>,
}

impl ResultsReader {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
            errors: Vec::new(),
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    pub fn read_test_results(&mut self) -> Vec<TestResult> {
        self.read_all(TEST_RESULT_FILE_SUFFIX)
    }

    pub fn read_containers(&mut self) -> Vec<TestResultContainer> {
        self.read_all(TEST_RESULT_CONTAINER_FILE_SUFFIX)
    }

    /// File names of all attachments in the directory, sorted
    pub fn find_attachments(&mut self) -> Vec<String> {
        self.list_files(|name| name.contains(ATTACHMENT_FILE_SUFFIX))
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().to_string())
            .collect()
    }

    pub fn read_attachment(&self, source: &str) -> std::io::Result<Vec<u8>> {
        fs::read(self.results_dir.join(source))
    }

    pub fn errors(&self) -> &[ReadError] {
        &self.errors
    }

    fn read_all<T: DeserializeOwned>(&mut self, suffix: &str) -> Vec<T> {
        let files = self.list_files(|name| name.ends_with(suffix));
        files
            .into_iter()
            .filter_map(|path| self.read_one(&path))
            .collect()
    }

    fn read_one<T: DeserializeOwned>(&mut self, path: &Path) -> Option<T> {
        let parsed = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));
        match parsed {
            Ok(value) => Some(value),
            Err(message) => {
                warn!("Could not read {}: {}", path.display(), message);
                self.errors.push(ReadError {
                    path: path.to_path_buf(),
                    message,
                });
                None
            }
        }
    }

    fn list_files(&mut self, matches: impl Fn(&str) -> bool) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.results_dir).min_depth(1).max_depth(1) {
            match entry {
                Ok(entry) => {
                    let wanted = entry.file_type().is_file()
                        && matches(&entry.file_name().to_string_lossy());
                    if wanted {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => self.errors.push(ReadError {
                    path: e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.results_dir.clone()),
                    message: e.to_string(),
                }),
            }
        }
        files.sort();
        files
    }
}
