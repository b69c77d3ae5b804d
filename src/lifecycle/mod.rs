// Lifecycle module - tracks in-flight test cases, containers, fixtures and steps
//
// Entities are begun, mutated and finished through a Lifecycle instance from
// any number of threads. Each thread has its own context stack that decides
// which entity receives steps and attachments when no parent is named.
// Finished test results and containers are handed to the result store once.

pub mod context;
pub mod listener;
pub mod registry;
pub mod step;

pub use context::{ContextSnapshot, ThreadContext};
pub use listener::LifecycleListener;
pub use registry::{EntityKind, Handle, LiveEntity, Registry};

use crate::config::Config;
use crate::error::{LifecycleError, Result, StoreError};
use crate::model::{
    ATTACHMENT_FILE_SUFFIX, Attachment, FixtureResult, Stage, StepResult, TestResult,
    TestResultContainer,
};
use crate::store::{FileSystemStore, ResultStore};
use crate::time::now_unix_millis;
use listener::Notifier;
use registry::{Root, Segment};
use std::future::Future;
use std::io::Read;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Result lifecycle engine
///
/// Owns its registry and per-thread context stacks; two instances never
/// share state. Share one instance between threads with an `Arc`.
pub struct Lifecycle {
    store: Box<dyn ResultStore>,
    registry: Registry,
    context: ThreadContext,
    notifier: Notifier,
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("live", &self.registry.len())
            .field("listeners", &self.notifier.len())
            .finish()
    }
}

fn ensure_id(id: &str) -> Result<()> {
    if id.is_empty() {
        Err(LifecycleError::NullIdentifier)
    } else {
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Storage key for a new attachment: `{uuid}-attachment{.ext}`
pub fn attachment_source(file_extension: &str) -> String {
    let extension = match file_extension {
        "" => String::new(),
        ext if ext.starts_with('.') => ext.to_string(),
        ext => format!(".{}", ext),
    };
    format!("{}{}{}", Uuid::new_v4(), ATTACHMENT_FILE_SUFFIX, extension)
}

impl Lifecycle {
    pub fn new(store: impl ResultStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            registry: Registry::new(),
            context: ThreadContext::new(),
            notifier: Notifier::default(),
        }
    }

    /// Lifecycle writing to the results directory named by `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(FileSystemStore::from_config(&config.results))
    }

    pub fn with_listener(mut self, listener: impl LifecycleListener + 'static) -> Self {
        self.notifier.add(Arc::new(listener));
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn context(&self) -> &ThreadContext {
        &self.context
    }

    /// Uuid of the test case (or fixture) owning this thread's context
    pub fn current_test_case(&self) -> Option<String> {
        self.context.root()
    }

    /// Uuid of the innermost running test case, fixture or step on this thread
    pub fn current_test_case_or_step(&self) -> Option<String> {
        self.context.current()
    }

    /// Copy of this thread's context, for attaching on a worker thread
    pub fn context_snapshot(&self) -> ContextSnapshot {
        self.context.snapshot()
    }

    /// Spawn a thread that starts with a copy of the caller's context
    pub fn spawn<F, T>(&self, f: F) -> JoinHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let snapshot = self.context.snapshot();
        std::thread::spawn(move || {
            snapshot.attach();
            f()
        })
    }

    fn persist(&self, what: &str, id: &str, outcome: std::result::Result<(), StoreError>) -> Result<()> {
        outcome.map_err(|e| {
            warn!("Could not write {} {}: {}", what, id, e);
            LifecycleError::from(e)
        })
    }

    // Containers

    pub fn start_test_container(&self, mut container: TestResultContainer) -> Result<()> {
        ensure_id(&container.uuid)?;
        self.notifier.each(|l| l.before_container_start(&mut container));
        container.start = Some(now_unix_millis());
        self.notifier.each(|l| l.after_container_start(&container));

        let uuid = container.uuid.clone();
        self.registry
            .put(&uuid, LiveEntity::detached(Root::Container(container)))?;
        debug!("Started test container {}", uuid);
        Ok(())
    }

    /// Start a container nested in `parent_id`, appending it to the parent's children
    pub fn start_test_container_in(&self, parent_id: &str, container: TestResultContainer) -> Result<()> {
        ensure_id(&container.uuid)?;
        let parent = self.registry.get::<TestResultContainer>(parent_id)?;
        parent.with(|p| p.children.push(container.uuid.clone()))?;
        self.start_test_container(container)
    }

    pub fn update_test_container(
        &self,
        id: &str,
        update: impl FnOnce(&mut TestResultContainer),
    ) -> Result<()> {
        let handle = self.registry.get::<TestResultContainer>(id)?;
        handle.with(|container| {
            self.notifier.each(|l| l.before_container_update(container));
            update(container);
            self.notifier.each(|l| l.after_container_update(container));
        })
    }

    /// Record the stop time; the container stays live until written
    pub fn stop_test_container(&self, id: &str) -> Result<()> {
        let handle = self.registry.get::<TestResultContainer>(id)?;
        handle.with(|container| {
            self.notifier.each(|l| l.before_container_stop(container));
            container.stop = Some(now_unix_millis());
            self.notifier.each(|l| l.after_container_stop(container));
        })?;
        debug!("Stopped test container {}", id);
        Ok(())
    }

    /// Remove the container from the registry and persist it with its fixtures
    pub fn write_test_container(&self, id: &str) -> Result<()> {
        let handle = self.registry.remove::<TestResultContainer>(id)?;
        let container = handle.with(|container| {
            self.notifier.each(|l| l.before_container_write(container));
            container.clone()
        })?;
        self.persist("test container", id, self.store.write_container(&container))?;
        self.notifier.each(|l| l.after_container_write(&container));
        debug!("Wrote test container {}", id);
        Ok(())
    }

    // Test cases

    /// Register a test case as scheduled and return its uuid
    ///
    /// An empty uuid is replaced with a generated one.
    pub fn schedule_test_case(&self, mut result: TestResult) -> Result<String> {
        if result.uuid.is_empty() {
            result.uuid = Uuid::new_v4().to_string();
        }
        self.notifier.each(|l| l.before_test_schedule(&mut result));
        result.stage = Some(Stage::Scheduled);
        self.notifier.each(|l| l.after_test_schedule(&result));

        let uuid = result.uuid.clone();
        self.registry
            .put(&uuid, LiveEntity::detached(Root::TestResult(result)))?;
        debug!("Scheduled test case {}", uuid);
        Ok(uuid)
    }

    /// Schedule a test case and append it to the children of `container_id`
    pub fn schedule_test_case_in(&self, container_id: &str, mut result: TestResult) -> Result<String> {
        if result.uuid.is_empty() {
            result.uuid = Uuid::new_v4().to_string();
        }
        let container = self.registry.get::<TestResultContainer>(container_id)?;
        container.with(|c| c.children.push(result.uuid.clone()))?;
        self.schedule_test_case(result)
    }

    /// Mark a scheduled test case running and make it this thread's context root
    ///
    /// The thread's context is cleared first, since worker threads are reused
    /// across test cases.
    pub fn start_test_case(&self, id: &str) -> Result<()> {
        self.context.reset();
        let handle = self.registry.get::<TestResult>(id)?;
        handle.with(|result| {
            self.notifier.each(|l| l.before_test_start(result));
            result.stage = Some(Stage::Running);
            result.start = Some(now_unix_millis());
            self.notifier.each(|l| l.after_test_start(result));
        })?;
        self.context.push(id);
        debug!("Started test case {}", id);
        Ok(())
    }

    pub fn update_test_case(&self, id: &str, update: impl FnOnce(&mut TestResult)) -> Result<()> {
        let handle = self.registry.get::<TestResult>(id)?;
        handle.with(|result| {
            self.notifier.each(|l| l.before_test_update(result));
            update(result);
            self.notifier.each(|l| l.after_test_update(result));
        })
    }

    /// Update the test case owning this thread's context
    pub fn update_current_test_case(&self, update: impl FnOnce(&mut TestResult)) -> Result<()> {
        let id = self
            .context
            .root()
            .ok_or_else(|| LifecycleError::empty_context("update test case"))?;
        self.update_test_case(&id, update)
    }

    /// Mark the test case finished and clear this thread's context
    pub fn stop_test_case(&self, id: &str) -> Result<()> {
        let handle = self.registry.get::<TestResult>(id)?;
        handle.with(|result| {
            self.notifier.each(|l| l.before_test_stop(result));
            result.stage = Some(Stage::Finished);
            result.stop = Some(now_unix_millis());
            self.notifier.each(|l| l.after_test_stop(result));
        })?;
        self.context.reset();
        debug!("Stopped test case {}", id);
        Ok(())
    }

    /// Remove the test case from the registry and persist it
    ///
    /// Removal happens first: if the store fails, the result is gone from the
    /// registry and the error is returned to the caller.
    pub fn write_test_case(&self, id: &str) -> Result<()> {
        let handle = self.registry.remove::<TestResult>(id)?;
        let result = handle.with(|result| {
            self.notifier.each(|l| l.before_test_write(result));
            result.clone()
        })?;
        self.persist("test case", id, self.store.write_test_result(&result))?;
        self.notifier.each(|l| l.after_test_write(&result));
        debug!("Wrote test case {}", id);
        Ok(())
    }

    // Fixtures

    /// Start a setup fixture inside the container's befores
    pub fn start_before_fixture(&self, container_id: &str, id: &str, fixture: FixtureResult) -> Result<()> {
        self.start_fixture(container_id, id, fixture, true)
    }

    /// Start a teardown fixture inside the container's afters
    pub fn start_after_fixture(&self, container_id: &str, id: &str, fixture: FixtureResult) -> Result<()> {
        self.start_fixture(container_id, id, fixture, false)
    }

    fn start_fixture(
        &self,
        container_id: &str,
        id: &str,
        mut fixture: FixtureResult,
        before: bool,
    ) -> Result<()> {
        ensure_id(id)?;
        let container = self.registry.get::<TestResultContainer>(container_id)?;

        self.notifier.each(|l| l.before_fixture_start(&mut fixture));
        fixture.stage = Some(Stage::Running);
        fixture.start = Some(now_unix_millis());
        fixture.live_id = Some(id.to_string());
        self.notifier.each(|l| l.after_fixture_start(&fixture));

        let segment = container.with(|c| {
            if before {
                c.befores.push(fixture);
                Segment::Before(id.to_string())
            } else {
                c.afters.push(fixture);
                Segment::After(id.to_string())
            }
        })?;
        self.registry
            .put(id, container.entity().child(EntityKind::Fixture, segment))?;

        self.context.reset();
        self.context.push(id);
        debug!("Started fixture {} in container {}", id, container_id);
        Ok(())
    }

    pub fn update_fixture(&self, id: &str, update: impl FnOnce(&mut FixtureResult)) -> Result<()> {
        let handle = self.registry.get::<FixtureResult>(id)?;
        handle.with(|fixture| {
            self.notifier.each(|l| l.before_fixture_update(fixture));
            update(fixture);
            self.notifier.each(|l| l.after_fixture_update(fixture));
        })
    }

    /// Update the fixture owning this thread's context
    pub fn update_current_fixture(&self, update: impl FnOnce(&mut FixtureResult)) -> Result<()> {
        let id = self
            .context
            .root()
            .ok_or_else(|| LifecycleError::empty_context("update fixture"))?;
        self.update_fixture(&id, update)
    }

    /// Finish a fixture and drop it from the registry
    ///
    /// Fixtures are never written on their own: they reach the store inside
    /// their container when `write_test_container` runs. The context is
    /// cleared even when a mutator already removed the fixture from its
    /// container.
    pub fn stop_fixture(&self, id: &str) -> Result<()> {
        let handle = self.registry.remove::<FixtureResult>(id)?;
        self.context.reset();
        handle.with(|fixture| {
            self.notifier.each(|l| l.before_fixture_stop(fixture));
            fixture.stage = Some(Stage::Finished);
            fixture.stop = Some(now_unix_millis());
            fixture.live_id = None;
            self.notifier.each(|l| l.after_fixture_stop(fixture));
        })?;
        debug!("Stopped fixture {}", id);
        Ok(())
    }

    // Steps

    /// Start a step under the innermost running entity of this thread
    pub fn start_step(&self, id: &str, step: StepResult) -> Result<()> {
        let parent = self
            .context
            .current()
            .ok_or_else(|| LifecycleError::empty_context("start step"))?;
        self.start_step_in(Some(&parent), id, step)
    }

    /// Start a step under an explicit parent, or as a detached root step
    ///
    /// The step becomes the top of this thread's context either way.
    pub fn start_step_in(&self, parent_id: Option<&str>, id: &str, mut step: StepResult) -> Result<()> {
        ensure_id(id)?;
        self.notifier.each(|l| l.before_step_start(&mut step));
        step.stage = Some(Stage::Running);
        step.start = Some(now_unix_millis());
        step.live_id = Some(id.to_string());
        self.notifier.each(|l| l.after_step_start(&step));

        let entity = match parent_id {
            Some(parent_id) => {
                let parent = self.registry.running(parent_id)?;
                parent.with_item(parent_id, |item| item.steps_mut().push(step))?;
                parent.child(EntityKind::Step, Segment::Step(id.to_string()))
            }
            None => LiveEntity::detached(Root::Step(step)),
        };
        self.registry.put(id, entity)?;
        self.context.push(id);
        debug!("Started step {} (parent: {:?})", id, parent_id);
        Ok(())
    }

    pub fn update_step(&self, id: &str, update: impl FnOnce(&mut StepResult)) -> Result<()> {
        let handle = self.registry.get::<StepResult>(id)?;
        handle.with(|step| {
            self.notifier.each(|l| l.before_step_update(step));
            update(step);
            self.notifier.each(|l| l.after_step_update(step));
        })
    }

    /// Update the innermost running step of this thread
    pub fn update_current_step(&self, update: impl FnOnce(&mut StepResult)) -> Result<()> {
        let id = self
            .context
            .current()
            .ok_or_else(|| LifecycleError::empty_context("update step"))?;
        self.update_step(&id, update)
    }

    /// Finish a step, drop it from the registry and pop this thread's context
    ///
    /// The step itself stays embedded in its parent. The context is popped
    /// even when a mutator already removed the step from its parent.
    pub fn stop_step(&self, id: &str) -> Result<()> {
        let handle = self.registry.remove::<StepResult>(id)?;
        if self.context.pop().is_err() {
            debug!("Stopping step {} with an empty context", id);
        }
        handle.with(|step| {
            self.notifier.each(|l| l.before_step_stop(step));
            step.stage = Some(Stage::Finished);
            step.stop = Some(now_unix_millis());
            step.live_id = None;
            self.notifier.each(|l| l.after_step_stop(step));
        })?;
        debug!("Stopped step {}", id);
        Ok(())
    }

    /// Stop the innermost running step of this thread
    pub fn stop_current_step(&self) -> Result<()> {
        let id = self
            .context
            .current()
            .ok_or_else(|| LifecycleError::empty_context("stop step"))?;
        self.stop_step(&id)
    }

    /// Append a finished step to the innermost running entity, bypassing the registry
    pub fn add_step(&self, step: StepResult) -> Result<()> {
        let current = self
            .context
            .current()
            .ok_or_else(|| LifecycleError::empty_context("add step"))?;
        let target = self.registry.running(&current)?;
        target.with_item(&current, |item| item.steps_mut().push(step))
    }

    // Attachments

    /// Attach `body` to the innermost running entity and persist it
    ///
    /// Returns the generated source key.
    pub fn add_attachment(
        &self,
        name: &str,
        content_type: &str,
        file_extension: &str,
        body: impl AsRef<[u8]>,
    ) -> Result<String> {
        let source = self.prepare_attachment(name, content_type, file_extension)?;
        self.write_attachment(&source, &mut body.as_ref())?;
        Ok(source)
    }

    pub fn add_attachment_from_reader(
        &self,
        name: &str,
        content_type: &str,
        file_extension: &str,
        mut content: impl Read,
    ) -> Result<String> {
        let source = self.prepare_attachment(name, content_type, file_extension)?;
        self.write_attachment(&source, &mut content)?;
        Ok(source)
    }

    /// Record an attachment on the innermost running entity without writing content
    ///
    /// Persist the content later with [`Lifecycle::write_attachment`].
    pub fn prepare_attachment(&self, name: &str, content_type: &str, file_extension: &str) -> Result<String> {
        let current = self
            .context
            .current()
            .ok_or_else(|| LifecycleError::empty_context("add attachment"))?;
        let source = attachment_source(file_extension);
        let attachment = Attachment {
            name: non_empty(name),
            source: source.clone(),
            content_type: non_empty(content_type),
        };
        let target = self.registry.running(&current)?;
        target.with_item(&current, |item| item.attachments_mut().push(attachment))?;
        Ok(source)
    }

    pub fn write_attachment(&self, source: &str, content: &mut dyn Read) -> Result<()> {
        self.persist("attachment", source, self.store.write_attachment(source, content))
    }

    /// Record an attachment now and persist its content when `body` resolves
    ///
    /// The record is added on the calling thread, so the attachment lands on
    /// the entity that was running when this was called, wherever the returned
    /// future is polled.
    pub fn add_attachment_async<'a, F, B>(
        &'a self,
        name: &str,
        content_type: &str,
        file_extension: &str,
        body: F,
    ) -> Result<impl Future<Output = Result<String>> + use<'a, F, B>>
    where
        F: Future<Output = B> + 'a,
        B: AsRef<[u8]>,
    {
        let source = self.prepare_attachment(name, content_type, file_extension)?;
        Ok(async move {
            let body = body.await;
            self.write_attachment(&source, &mut body.as_ref())?;
            Ok(source)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn lifecycle() -> (Arc<InMemoryStore>, Lifecycle) {
        let store = Arc::new(InMemoryStore::new());
        (store.clone(), Lifecycle::new(store))
    }

    #[test]
    fn test_attachment_source_normalizes_extension() {
        assert!(attachment_source("txt").ends_with("-attachment.txt"));
        assert!(attachment_source(".json").ends_with("-attachment.json"));
        assert!(attachment_source("").ends_with("-attachment"));
    }

    #[test]
    fn test_schedule_generates_missing_uuid() {
        let (_, lifecycle) = lifecycle();
        let uuid = lifecycle.schedule_test_case(TestResult::default()).unwrap();

        assert!(!uuid.is_empty());
        assert!(lifecycle.registry().contains(&uuid));
    }

    #[test]
    fn test_start_container_rejects_empty_uuid() {
        let (_, lifecycle) = lifecycle();
        let err = lifecycle
            .start_test_container(TestResultContainer::default())
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NullIdentifier));
    }

    #[test]
    fn test_current_accessors_follow_context() {
        let (_, lifecycle) = lifecycle();
        lifecycle.schedule_test_case(TestResult::new("t1")).unwrap();
        lifecycle.start_test_case("t1").unwrap();
        lifecycle.start_step("s1", StepResult::named("step")).unwrap();

        assert_eq!(lifecycle.current_test_case().as_deref(), Some("t1"));
        assert_eq!(lifecycle.current_test_case_or_step().as_deref(), Some("s1"));

        lifecycle.stop_step("s1").unwrap();
        assert_eq!(lifecycle.current_test_case_or_step().as_deref(), Some("t1"));
    }

    #[test]
    fn test_update_current_test_case_targets_root_inside_step() {
        let (_, lifecycle) = lifecycle();
        lifecycle.schedule_test_case(TestResult::new("t1")).unwrap();
        lifecycle.start_test_case("t1").unwrap();
        lifecycle.start_step("s1", StepResult::named("step")).unwrap();

        lifecycle
            .update_current_test_case(|r| r.description = Some("from inside a step".into()))
            .unwrap();

        let description = lifecycle
            .registry()
            .get::<TestResult>("t1")
            .unwrap()
            .with(|r| r.description.clone())
            .unwrap();
        assert_eq!(description.as_deref(), Some("from inside a step"));
    }

    #[test]
    fn test_stop_current_step_with_test_on_top_is_wrong_kind() {
        let (_, lifecycle) = lifecycle();
        lifecycle.schedule_test_case(TestResult::new("t1")).unwrap();
        lifecycle.start_test_case("t1").unwrap();

        let err = lifecycle.stop_current_step().unwrap_err();
        assert!(matches!(err, LifecycleError::WrongKind { .. }));
        assert!(lifecycle.registry().contains("t1"));
    }

    #[test]
    fn test_step_under_container_is_rejected() {
        let (_, lifecycle) = lifecycle();
        lifecycle
            .start_test_container(TestResultContainer::new("c1"))
            .unwrap();

        let err = lifecycle
            .start_step_in(Some("c1"), "s1", StepResult::named("step"))
            .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::NotExecutable {
                ref id,
                found: EntityKind::Container,
            } if id == "c1"
        ));
        assert!(err.to_string().contains("test container"));
        assert!(!lifecycle.registry().contains("s1"));
    }

    #[test]
    fn test_step_under_unknown_parent_is_not_running() {
        let (_, lifecycle) = lifecycle();

        let err = lifecycle
            .start_step_in(Some("t-missing"), "s1", StepResult::named("step"))
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NotRunning { ref id } if id == "t-missing"));
        assert!(err.to_string().starts_with("no running"));
        assert_eq!(lifecycle.context().depth(), 0);
    }

    #[test]
    fn test_debug_reports_live_entities() {
        let (_, lifecycle) = lifecycle();
        lifecycle.schedule_test_case(TestResult::new("t1")).unwrap();
        assert!(format!("{:?}", lifecycle).contains("live: 1"));
    }
}
