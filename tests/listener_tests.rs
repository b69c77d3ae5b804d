use allure_lifecycle::model::{FixtureResult, StepResult, TestResult, TestResultContainer};
use allure_lifecycle::results::{host_label, thread_label};
use allure_lifecycle::store::InMemoryStore;
use allure_lifecycle::{Lifecycle, LifecycleListener};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl LifecycleListener for Recorder {
    fn before_test_schedule(&self, result: &mut TestResult) {
        result.labels.push(host_label());
        result.labels.push(thread_label());
        self.record("before_test_schedule");
    }

    fn after_test_start(&self, result: &TestResult) {
        self.record(format!("after_test_start {}", result.uuid));
    }

    fn before_test_write(&self, _result: &mut TestResult) {
        self.record("before_test_write");
    }

    fn after_test_write(&self, _result: &TestResult) {
        self.record("after_test_write");
    }

    fn before_step_start(&self, step: &mut StepResult) {
        step.description = Some("enriched".to_string());
    }

    fn after_step_stop(&self, step: &StepResult) {
        self.record(format!("after_step_stop {}", step.name.as_deref().unwrap_or("")));
    }

    fn after_fixture_stop(&self, fixture: &FixtureResult) {
        self.record(format!("after_fixture_stop {}", fixture.name.as_deref().unwrap_or("")));
    }

    fn after_container_write(&self, container: &TestResultContainer) {
        self.record(format!("after_container_write {}", container.uuid));
    }
}

#[test]
fn test_hooks_fire_in_order_and_can_enrich() {
    let recorder = Recorder::default();
    let store = Arc::new(InMemoryStore::new());
    let lifecycle = Lifecycle::new(store.clone()).with_listener(recorder.clone());

    lifecycle.schedule_test_case(TestResult::new("t1")).unwrap();
    lifecycle.start_test_case("t1").unwrap();
    lifecycle.step("check").unwrap();
    lifecycle.stop_test_case("t1").unwrap();
    lifecycle.write_test_case("t1").unwrap();

    assert_eq!(
        recorder.events(),
        vec![
            "before_test_schedule",
            "after_test_start t1",
            "after_step_stop check",
            "before_test_write",
            "after_test_write",
        ]
    );

    let result = store.test_result("t1").unwrap();
    let label_names: Vec<_> = result.labels.iter().filter_map(|l| l.name.as_deref()).collect();
    assert_eq!(label_names, vec!["host", "thread"]);
    assert_eq!(result.steps[0].description.as_deref(), Some("enriched"));
}

#[test]
fn test_container_and_fixture_hooks() {
    let recorder = Recorder::default();
    let lifecycle =
        Lifecycle::new(InMemoryStore::new()).with_listener(recorder.clone());

    lifecycle
        .start_test_container(TestResultContainer::new("c1"))
        .unwrap();
    lifecycle
        .start_before_fixture("c1", "f1", FixtureResult::named("setup"))
        .unwrap();
    lifecycle.stop_fixture("f1").unwrap();
    lifecycle.write_test_container("c1").unwrap();

    assert_eq!(
        recorder.events(),
        vec!["after_fixture_stop setup", "after_container_write c1"]
    );
}

#[test]
fn test_no_write_hooks_when_lookup_fails() {
    let recorder = Recorder::default();
    let lifecycle =
        Lifecycle::new(InMemoryStore::new()).with_listener(recorder.clone());

    assert!(lifecycle.write_test_case("missing").is_err());
    assert!(recorder.events().is_empty());
}
