// Single-call step helpers built on start_step/stop_step

use super::Lifecycle;
use crate::error::Result;
use crate::model::{Status, StepResult};
use crate::results::{status_details_from_error, status_details_from_panic};
use std::error::Error;
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;
use uuid::Uuid;

impl Lifecycle {
    /// Record a passed step with no body under the current entity
    pub fn step(&self, name: impl Into<String>) -> Result<()> {
        self.step_with_status(name, Status::Passed)
    }

    pub fn step_with_status(&self, name: impl Into<String>, status: Status) -> Result<()> {
        let uuid = Uuid::new_v4().to_string();
        self.start_step(&uuid, StepResult::named(name).with_status(status))?;
        self.stop_step(&uuid)
    }

    /// Run `body` inside a new step
    ///
    /// The step is passed when `body` returns `Ok` and broken when it returns
    /// `Err`, with the error chain as status details. A panic marks the step
    /// failed, stops it, and always resumes unwinding with the original
    /// payload; lifecycle failures on that path are logged. The outer `Result` carries
    /// lifecycle failures, the inner one is `body`'s own result.
    pub fn run_step<T, E>(
        &self,
        name: impl Into<String>,
        body: impl FnOnce() -> std::result::Result<T, E>,
    ) -> Result<std::result::Result<T, E>>
    where
        E: Error + 'static,
    {
        let uuid = Uuid::new_v4().to_string();
        self.start_step(&uuid, StepResult::named(name))?;

        let outcome = match panic::catch_unwind(AssertUnwindSafe(body)) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let details = status_details_from_panic(payload.as_ref());
                if let Err(e) = self.update_step(&uuid, |step| {
                    step.status = Some(Status::Failed);
                    step.status_details = Some(details);
                }) {
                    warn!("Could not mark panicking step {} failed: {}", uuid, e);
                }
                if let Err(e) = self.stop_step(&uuid) {
                    warn!("Could not stop panicking step {}: {}", uuid, e);
                }
                panic::resume_unwind(payload);
            }
        };

        match &outcome {
            Ok(_) => self.update_step(&uuid, |step| step.status = Some(Status::Passed))?,
            Err(e) => {
                let details = status_details_from_error(e);
                self.update_step(&uuid, |step| {
                    step.status = Some(Status::Broken);
                    step.status_details = Some(details);
                })?
            }
        }
        self.stop_step(&uuid)?;
        Ok(outcome)
    }
}
