use crate::config::ResultsConfig;
use crate::error::StoreError;
use crate::model::{TEST_RESULT_CONTAINER_FILE_SUFFIX, TEST_RESULT_FILE_SUFFIX, TestResult, TestResultContainer};
use serde::Serialize;
use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;
use uuid::Uuid;

use super::ResultStore;

/// Writes the Allure results directory layout
///
/// One `{uuid}-result.json` per test result, one `{uuid}-container.json` per
/// container, and one raw file per attachment named exactly by its source.
#[derive(Debug)]
pub struct FileSystemStore {
    output_dir: PathBuf,
    indent: bool,
    clean: bool,
    cleaned: AtomicBool,
}

impl FileSystemStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            indent: false,
            clean: false,
            cleaned: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &ResultsConfig) -> Self {
        Self::new(config.directory.clone())
            .with_indent(config.indent)
            .with_clean(config.clean)
    }

    /// Pretty-print JSON output
    pub fn with_indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    /// Delete the output directory once, before the first write
    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn prepare_dir(&self) -> Result<(), StoreError> {
        if self.clean && !self.cleaned.swap(true, Ordering::SeqCst) {
            debug!("Cleaning results directory {}", self.output_dir.display());
            match fs::remove_dir_all(&self.output_dir) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(StoreError::Io {
                        path: self.output_dir.clone(),
                        source,
                    });
                }
            }
        }
        fs::create_dir_all(&self.output_dir).map_err(|source| StoreError::Io {
            path: self.output_dir.clone(),
            source,
        })
    }

    fn write_json<T: Serialize>(
        &self,
        file_name: String,
        value: &T,
        what: &'static str,
    ) -> Result<(), StoreError> {
        self.prepare_dir()?;
        let path = self.output_dir.join(file_name);
        let file = fs::File::create(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let mut writer = BufWriter::new(file);

        let serialized = if self.indent {
            serde_json::to_writer_pretty(&mut writer, value)
        } else {
            serde_json::to_writer(&mut writer, value)
        };
        serialized.map_err(|source| StoreError::Serialize { what, source })?;

        writer
            .flush()
            .map_err(|source| StoreError::Io { path: path.clone(), source })?;
        debug!("Wrote {} to {}", what, path.display());
        Ok(())
    }
}

fn file_name(uuid: &str, suffix: &str) -> String {
    if uuid.is_empty() {
        format!("{}{}", Uuid::new_v4(), suffix)
    } else {
        format!("{}{}", uuid, suffix)
    }
}

impl ResultStore for FileSystemStore {
    fn write_test_result(&self, result: &TestResult) -> Result<(), StoreError> {
        self.write_json(
            file_name(&result.uuid, TEST_RESULT_FILE_SUFFIX),
            result,
            "test result",
        )
    }

    fn write_container(&self, container: &TestResultContainer) -> Result<(), StoreError> {
        self.write_json(
            file_name(&container.uuid, TEST_RESULT_CONTAINER_FILE_SUFFIX),
            container,
            "test result container",
        )
    }

    fn write_attachment(&self, source: &str, content: &mut dyn Read) -> Result<(), StoreError> {
        self.prepare_dir()?;
        let path = self.output_dir.join(source);
        let io_err = |source: io::Error| StoreError::Io {
            path: path.clone(),
            source,
        };

        let mut file = fs::File::create(&path).map_err(io_err)?;
        io::copy(content, &mut file).map_err(io_err)?;
        debug!("Wrote attachment {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Stage, Status, StepResult};
    use tempfile::TempDir;

    #[test]
    fn test_writes_result_file_named_by_uuid() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileSystemStore::new(temp_dir.path().join("allure-results"));
        let mut result = TestResult::new("abc").with_name("works");
        result.status = Some(Status::Passed);
        result.stage = Some(Stage::Finished);

        store.write_test_result(&result).unwrap();

        let path = temp_dir.path().join("allure-results/abc-result.json");
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["uuid"], "abc");
        assert_eq!(value["status"], "passed");
        assert_eq!(value["stage"], "finished");
        assert!(value.get("statusDetails").is_none());
    }

    #[test]
    fn test_empty_uuid_gets_generated_file_name() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileSystemStore::new(temp_dir.path());

        store.write_container(&TestResultContainer::default()).unwrap();

        let names: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with("-container.json"));
        assert!(names[0].len() > "-container.json".len());
    }

    #[test]
    fn test_indent_toggle() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let compact = FileSystemStore::new(temp_dir.path().join("compact"));
        let pretty = FileSystemStore::new(temp_dir.path().join("pretty")).with_indent(true);
        let result = TestResult::new("t").with_step(StepResult::named("s"));

        compact.write_test_result(&result).unwrap();
        pretty.write_test_result(&result).unwrap();

        let compact_text = fs::read_to_string(temp_dir.path().join("compact/t-result.json")).unwrap();
        let pretty_text = fs::read_to_string(temp_dir.path().join("pretty/t-result.json")).unwrap();
        assert!(!compact_text.contains('\n'));
        assert!(pretty_text.contains('\n'));
    }

    #[test]
    fn test_attachment_written_under_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileSystemStore::new(temp_dir.path());

        store
            .write_attachment("x-attachment.txt", &mut "hello".as_bytes())
            .unwrap();

        let body = fs::read_to_string(temp_dir.path().join("x-attachment.txt")).unwrap();
        assert_eq!(body, "hello");
    }

    #[test]
    fn test_clean_removes_previous_run_once() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let dir = temp_dir.path().join("results");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("stale-result.json"), "{}").unwrap();
        let store = FileSystemStore::new(&dir).with_clean(true);

        store.write_test_result(&TestResult::new("first")).unwrap();
        store.write_test_result(&TestResult::new("second")).unwrap();

        assert!(!dir.join("stale-result.json").exists());
        assert!(dir.join("first-result.json").exists());
        assert!(dir.join("second-result.json").exists());
    }

    #[test]
    fn test_unwritable_directory_is_io_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let blocker = temp_dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();
        let store = FileSystemStore::new(blocker.join("results"));

        let err = store.write_test_result(&TestResult::new("t")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
