// Test results, containers, fixtures and steps

use super::common::{Attachment, Label, Link, Parameter, StatusDetails};
use super::status::{Stage, Status};
use serde::{Deserialize, Serialize};

/// Shape shared by test results, fixtures and steps
pub trait ExecutableItem {
    fn name(&self) -> Option<&str>;
    fn status(&self) -> Option<Status>;
    fn stage(&self) -> Option<Stage>;
    fn set_status(&mut self, status: Status);
    fn set_status_details(&mut self, details: StatusDetails);
    fn set_stage(&mut self, stage: Stage);
    fn set_start(&mut self, millis: i64);
    fn set_stop(&mut self, millis: i64);
    fn steps(&self) -> &[StepResult];
    fn steps_mut(&mut self) -> &mut Vec<StepResult>;
    fn attachments(&self) -> &[Attachment];
    fn attachments_mut(&mut self) -> &mut Vec<Attachment>;
    fn parameters_mut(&mut self) -> &mut Vec<Parameter>;
}

macro_rules! impl_executable_item {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ExecutableItem for $ty {
                fn name(&self) -> Option<&str> {
                    self.name.as_deref()
                }

                fn status(&self) -> Option<Status> {
                    self.status
                }

                fn stage(&self) -> Option<Stage> {
                    self.stage
                }

                fn set_status(&mut self, status: Status) {
                    self.status = Some(status);
                }

                fn set_status_details(&mut self, details: StatusDetails) {
                    self.status_details = Some(details);
                }

                fn set_stage(&mut self, stage: Stage) {
                    self.stage = Some(stage);
                }

                fn set_start(&mut self, millis: i64) {
                    self.start = Some(millis);
                }

                fn set_stop(&mut self, millis: i64) {
                    self.stop = Some(millis);
                }

                fn steps(&self) -> &[StepResult] {
                    &self.steps
                }

                fn steps_mut(&mut self) -> &mut Vec<StepResult> {
                    &mut self.steps
                }

                fn attachments(&self) -> &[Attachment] {
                    &self.attachments
                }

                fn attachments_mut(&mut self) -> &mut Vec<Attachment> {
                    &mut self.attachments
                }

                fn parameters_mut(&mut self) -> &mut Vec<Parameter> {
                    &mut self.parameters
                }
            }

            impl $ty {
                pub fn with_name(mut self, name: impl Into<String>) -> Self {
                    self.name = Some(name.into());
                    self
                }

                pub fn with_status(mut self, status: Status) -> Self {
                    self.status = Some(status);
                    self
                }

                pub fn with_status_details(mut self, details: StatusDetails) -> Self {
                    self.status_details = Some(details);
                    self
                }

                pub fn with_description(mut self, description: impl Into<String>) -> Self {
                    self.description = Some(description.into());
                    self
                }

                pub fn with_step(mut self, step: StepResult) -> Self {
                    self.steps.push(step);
                    self
                }

                pub fn with_parameter(mut self, parameter: Parameter) -> Self {
                    self.parameters.push(parameter);
                    self
                }
            }
        )+
    };
}

/// A single test case execution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    #[serde(default)]
    pub uuid: String,
    /// Fingerprint for cross-run correlation, computed by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_case_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rerun_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_details: Option<StatusDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_html: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepResult>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<i64>,
}

impl TestResult {
    /// Create a result with the given uuid; an empty uuid is replaced on scheduling
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            ..Self::default()
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn with_history_id(mut self, history_id: impl Into<String>) -> Self {
        self.history_id = Some(history_id.into());
        self
    }

    pub fn with_test_case_id(mut self, test_case_id: impl Into<String>) -> Self {
        self.test_case_id = Some(test_case_id.into());
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }
}

/// Groups test results and nested containers with their setup/teardown fixtures
///
/// Containers have no stage: being present in the live registry means open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultContainer {
    #[serde(default)]
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_html: Option<String>,
    #[serde(default)]
    pub befores: Vec<FixtureResult>,
    #[serde(default)]
    pub afters: Vec<FixtureResult>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<i64>,
}

impl TestResultContainer {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_child(mut self, uuid: impl Into<String>) -> Self {
        self.children.push(uuid.into());
        self
    }
}

/// One setup or teardown action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_details: Option<StatusDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_html: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepResult>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<i64>,
    /// Registry id while the fixture runs; never serialized
    #[serde(skip)]
    pub live_id: Option<String>,
}

impl FixtureResult {
    pub fn named(name: impl Into<String>) -> Self {
        Self::default().with_name(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_details: Option<StatusDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_html: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepResult>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<i64>,
    /// Registry id while the step runs; never serialized
    #[serde(skip)]
    pub live_id: Option<String>,
}

impl StepResult {
    pub fn named(name: impl Into<String>) -> Self {
        Self::default().with_name(name)
    }
}

impl_executable_item!(TestResult, FixtureResult, StepResult);
