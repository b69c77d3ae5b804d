// Lifecycle listeners
// Hooks invoked around every lifecycle transition

use crate::model::{FixtureResult, StepResult, TestResult, TestResultContainer};
use std::sync::Arc;

/// Observer of lifecycle transitions
///
/// All hooks default to no-ops. `before_*` hooks receive the entity mutably
/// and may enrich it (for example with host or thread labels). Hooks run while
/// the entity is locked and must not call back into the lifecycle.
#[allow(unused_variables)]
pub trait LifecycleListener: Send + Sync {
    fn before_test_schedule(&self, result: &mut TestResult) {}
    fn after_test_schedule(&self, result: &TestResult) {}
    fn before_test_start(&self, result: &mut TestResult) {}
    fn after_test_start(&self, result: &TestResult) {}
    fn before_test_update(&self, result: &mut TestResult) {}
    fn after_test_update(&self, result: &TestResult) {}
    fn before_test_stop(&self, result: &mut TestResult) {}
    fn after_test_stop(&self, result: &TestResult) {}
    fn before_test_write(&self, result: &mut TestResult) {}
    fn after_test_write(&self, result: &TestResult) {}

    fn before_container_start(&self, container: &mut TestResultContainer) {}
    fn after_container_start(&self, container: &TestResultContainer) {}
    fn before_container_update(&self, container: &mut TestResultContainer) {}
    fn after_container_update(&self, container: &TestResultContainer) {}
    fn before_container_stop(&self, container: &mut TestResultContainer) {}
    fn after_container_stop(&self, container: &TestResultContainer) {}
    fn before_container_write(&self, container: &mut TestResultContainer) {}
    fn after_container_write(&self, container: &TestResultContainer) {}

    fn before_fixture_start(&self, fixture: &mut FixtureResult) {}
    fn after_fixture_start(&self, fixture: &FixtureResult) {}
    fn before_fixture_update(&self, fixture: &mut FixtureResult) {}
    fn after_fixture_update(&self, fixture: &FixtureResult) {}
    fn before_fixture_stop(&self, fixture: &mut FixtureResult) {}
    fn after_fixture_stop(&self, fixture: &FixtureResult) {}

    fn before_step_start(&self, step: &mut StepResult) {}
    fn after_step_start(&self, step: &StepResult) {}
    fn before_step_update(&self, step: &mut StepResult) {}
    fn after_step_update(&self, step: &StepResult) {}
    fn before_step_stop(&self, step: &mut StepResult) {}
    fn after_step_stop(&self, step: &StepResult) {}
}

/// Fans each hook out to the registered listeners in registration order
#[derive(Default, Clone)]
pub(crate) struct Notifier {
    listeners: Vec<Arc<dyn LifecycleListener>>,
}

impl Notifier {
    pub(crate) fn add(&mut self, listener: Arc<dyn LifecycleListener>) {
        self.listeners.push(listener);
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn each(&self, mut f: impl FnMut(&dyn LifecycleListener)) {
        for listener in &self.listeners {
            f(listener.as_ref());
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
