// Store module - persistence sinks for finished entities

pub mod filesystem;
pub mod memory;
pub mod reader;

use crate::error::StoreError;
use crate::model::{TestResult, TestResultContainer};
use std::io::Read;
use std::sync::Arc;

pub use filesystem::FileSystemStore;
pub use memory::InMemoryStore;
pub use reader::{ReadError, ResultsReader};

/// Write sink for finished results, containers and attachment content
///
/// The lifecycle calls these synchronously and never inspects what was
/// stored. Implementations own their concurrency: the lifecycle adds no
/// locking, retries or timeouts around them.
pub trait ResultStore: Send + Sync {
    /// Persist one finished test result
    fn write_test_result(&self, result: &TestResult) -> Result<(), StoreError>;

    /// Persist one finished container, fixtures included
    fn write_container(&self, container: &TestResultContainer) -> Result<(), StoreError>;

    /// Persist raw attachment content under `source`
    fn write_attachment(&self, source: &str, content: &mut dyn Read) -> Result<(), StoreError>;
}

impl<S: ResultStore + ?Sized> ResultStore for Arc<S> {
    fn write_test_result(&self, result: &TestResult) -> Result<(), StoreError> {
        (**self).write_test_result(result)
    }

    fn write_container(&self, container: &TestResultContainer) -> Result<(), StoreError> {
        (**self).write_container(container)
    }

    fn write_attachment(&self, source: &str, content: &mut dyn Read) -> Result<(), StoreError> {
        (**self).write_attachment(source, content)
    }
}
