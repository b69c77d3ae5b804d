use crate::error::StoreError;
use crate::model::{TestResult, TestResultContainer};
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use super::ResultStore;

/// Keeps everything written to it in memory
///
/// Meant for integration tests of adapters: run the framework, then assert
/// on what the lifecycle handed to the store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    results: Mutex<Vec<TestResult>>,
    containers: Mutex<Vec<TestResultContainer>>,
    attachments: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Written test results, in write order
    pub fn results(&self) -> Vec<TestResult> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn containers(&self) -> Vec<TestResultContainer> {
        self.containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn test_result(&self, uuid: &str) -> Option<TestResult> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|r| r.uuid == uuid)
            .cloned()
    }

    pub fn container(&self, uuid: &str) -> Option<TestResultContainer> {
        self.containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|c| c.uuid == uuid)
            .cloned()
    }

    pub fn attachment(&self, source: &str) -> Option<Vec<u8>> {
        self.attachments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(source)
            .cloned()
    }

    /// Sources of all written attachments, sorted
    pub fn attachment_sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = self
            .attachments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        sources.sort();
        sources
    }
}

impl ResultStore for InMemoryStore {
    fn write_test_result(&self, result: &TestResult) -> Result<(), StoreError> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result.clone());
        Ok(())
    }

    fn write_container(&self, container: &TestResultContainer) -> Result<(), StoreError> {
        self.containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(container.clone());
        Ok(())
    }

    fn write_attachment(&self, source: &str, content: &mut dyn Read) -> Result<(), StoreError> {
        let mut body = Vec::new();
        content
            .read_to_end(&mut body)
            .map_err(|source_err| StoreError::Io {
                path: PathBuf::from(source),
                source: source_err,
            })?;
        self.attachments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(source.to_string(), body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_writes() {
        let store = InMemoryStore::new();
        store.write_test_result(&TestResult::new("t1")).unwrap();
        store
            .write_container(&TestResultContainer::new("c1"))
            .unwrap();
        store
            .write_attachment("a-attachment.txt", &mut "body".as_bytes())
            .unwrap();

        assert_eq!(store.results().len(), 1);
        assert!(store.test_result("t1").is_some());
        assert!(store.container("c1").is_some());
        assert_eq!(store.attachment("a-attachment.txt"), Some(b"body".to_vec()));
        assert_eq!(store.attachment_sources(), vec!["a-attachment.txt".to_string()]);
    }
}
