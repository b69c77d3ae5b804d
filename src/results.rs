// Helpers for building labels, links and status details
//
// Translators use these to fill in the fields every result carries: host and
// thread labels, the standard BDD labels, and failure details from a Rust
// error or a caught panic.

use crate::model::{Label, Link, Parameter, StatusDetails};
use std::any::Any;
use std::error::Error;
use uuid::Uuid;

pub const ALLURE_HOST_NAME_ENV: &str = "ALLURE_HOST_NAME";
pub const ALLURE_THREAD_NAME_ENV: &str = "ALLURE_THREAD_NAME";

pub const EPIC_LABEL: &str = "epic";
pub const FEATURE_LABEL: &str = "feature";
pub const STORY_LABEL: &str = "story";
pub const SUITE_LABEL: &str = "suite";
pub const SEVERITY_LABEL: &str = "severity";
pub const TAG_LABEL: &str = "tag";
pub const OWNER_LABEL: &str = "owner";
pub const HOST_LABEL: &str = "host";
pub const THREAD_LABEL: &str = "thread";
pub const LANGUAGE_LABEL: &str = "language";
pub const FRAMEWORK_LABEL: &str = "framework";

pub const ISSUE_LINK_TYPE: &str = "issue";
pub const TMS_LINK_TYPE: &str = "tms";

/// Severity levels understood by the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Blocker,
    Critical,
    Normal,
    Minor,
    Trivial,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Blocker => "blocker",
            Severity::Critical => "critical",
            Severity::Normal => "normal",
            Severity::Minor => "minor",
            Severity::Trivial => "trivial",
        }
    }
}

pub fn epic_label(value: impl Into<String>) -> Label {
    Label::new(EPIC_LABEL, value)
}

pub fn feature_label(value: impl Into<String>) -> Label {
    Label::new(FEATURE_LABEL, value)
}

pub fn story_label(value: impl Into<String>) -> Label {
    Label::new(STORY_LABEL, value)
}

pub fn suite_label(value: impl Into<String>) -> Label {
    Label::new(SUITE_LABEL, value)
}

pub fn severity_label(severity: Severity) -> Label {
    Label::new(SEVERITY_LABEL, severity.as_str())
}

pub fn tag_label(value: impl Into<String>) -> Label {
    Label::new(TAG_LABEL, value)
}

pub fn owner_label(value: impl Into<String>) -> Label {
    Label::new(OWNER_LABEL, value)
}

pub fn host_label() -> Label {
    Label::new(HOST_LABEL, host_name())
}

pub fn thread_label() -> Label {
    Label::new(THREAD_LABEL, thread_name())
}

pub fn language_label() -> Label {
    Label::new(LANGUAGE_LABEL, "rust")
}

pub fn framework_label(framework: impl Into<String>) -> Label {
    Label::new(FRAMEWORK_LABEL, framework)
}

pub fn issue_link(name: impl Into<String>, url: impl Into<String>) -> Link {
    Link::new(name, url).with_type(ISSUE_LINK_TYPE)
}

pub fn tms_link(name: impl Into<String>, url: impl Into<String>) -> Link {
    Link::new(name, url).with_type(TMS_LINK_TYPE)
}

/// Host name for the `host` label
///
/// `ALLURE_HOST_NAME` wins, then the `HOSTNAME`/`COMPUTERNAME` variables.
pub fn host_name() -> String {
    [ALLURE_HOST_NAME_ENV, "HOSTNAME", "COMPUTERNAME"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| "default".to_string())
}

/// Name of the calling thread for the `thread` label
pub fn thread_name() -> String {
    if let Ok(name) = std::env::var(ALLURE_THREAD_NAME_ENV)
        && !name.is_empty()
    {
        return name;
    }
    let current = std::thread::current();
    match current.name() {
        Some(name) => format!("{}({:?})", name, current.id()),
        None => format!("{:?}", current.id()),
    }
}

/// Status details for an error: its message plus the `source()` chain as trace
pub fn status_details_from_error(error: &(dyn Error + 'static)) -> StatusDetails {
    let mut trace = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        trace.push_str("\nCaused by: ");
        trace.push_str(&cause.to_string());
        source = cause.source();
    }
    StatusDetails::default()
        .with_message(error.to_string())
        .with_trace(trace)
}

/// Status details for a payload caught with `std::panic::catch_unwind`
pub fn status_details_from_panic(payload: &(dyn Any + Send)) -> StatusDetails {
    let message = panic_message(payload).unwrap_or("panicked with a non-string payload");
    StatusDetails::default().with_message(message)
}

fn panic_message(payload: &(dyn Any + Send)) -> Option<&str> {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
}

/// First value that is present and non-empty
pub fn first_non_empty<'a, I>(values: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    values.into_iter().flatten().find(|value| !value.is_empty())
}

/// Stable history id for a test: the same full name and parameters always
/// map to the same id, so reruns are grouped together
///
/// Excluded parameters do not take part.
pub fn history_id(full_name: &str, parameters: &[Parameter]) -> String {
    let mut key = full_name.to_string();
    let mut included: Vec<&Parameter> = parameters.iter().filter(|p| p.excluded != Some(true)).collect();
    included.sort_by(|a, b| a.name.cmp(&b.name));
    for parameter in included {
        key.push('\u{1f}');
        key.push_str(parameter.name.as_deref().unwrap_or_default());
        key.push('=');
        key.push_str(parameter.value.as_deref().unwrap_or_default());
    }
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
}
