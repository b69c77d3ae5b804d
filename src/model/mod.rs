// Model module - Allure result entities
// Plain data records handed from the lifecycle engine to result stores

pub mod common;
pub mod result;
pub mod status;

pub use common::{Attachment, Label, Link, Parameter, ParameterMode, StatusDetails};
pub use result::{ExecutableItem, FixtureResult, StepResult, TestResult, TestResultContainer};
pub use status::{Stage, Status};

/// Suffix of serialized test result files
pub const TEST_RESULT_FILE_SUFFIX: &str = "-result.json";

/// Suffix of serialized container files
pub const TEST_RESULT_CONTAINER_FILE_SUFFIX: &str = "-container.json";

/// Marker embedded in every attachment source key
pub const ATTACHMENT_FILE_SUFFIX: &str = "-attachment";
