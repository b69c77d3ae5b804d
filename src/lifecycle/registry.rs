// Live registry of in-flight entities
//
// Containers, test results and detached steps are owned by the registry
// entry itself. Fixtures and steps started under a parent live inside that
// parent's befores/afters/steps and are addressed by a path from the owning
// top-level entity, so the parent always holds the only copy. Each hop
// matches the child's live id, so mutators that reorder or insert siblings
// cannot redirect a lookup to another entity.

use crate::error::{LifecycleError, Result};
use crate::model::{ExecutableItem, FixtureResult, StepResult, TestResult, TestResultContainer};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// Kind of a live entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    TestResult,
    Container,
    Fixture,
    Step,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::TestResult => "test result",
            EntityKind::Container => "test container",
            EntityKind::Fixture => "fixture",
            EntityKind::Step => "step",
        };
        f.write_str(name)
    }
}

/// Top-level entity owning a subtree of fixtures and steps
#[derive(Debug)]
pub enum Root {
    TestResult(TestResult),
    Container(TestResultContainer),
    Fixture(FixtureResult),
    Step(StepResult),
}

impl Root {
    fn kind(&self) -> EntityKind {
        match self {
            Root::TestResult(_) => EntityKind::TestResult,
            Root::Container(_) => EntityKind::Container,
            Root::Fixture(_) => EntityKind::Fixture,
            Root::Step(_) => EntityKind::Step,
        }
    }

    fn as_node(&mut self) -> Node<'_> {
        match self {
            Root::TestResult(r) => Node::TestResult(r),
            Root::Container(c) => Node::Container(c),
            Root::Fixture(f) => Node::Fixture(f),
            Root::Step(s) => Node::Step(s),
        }
    }
}

/// One hop from a parent entity to the embedded child with this live id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Before(String),
    After(String),
    Step(String),
}

/// Mutable view of a resolved entity
pub enum Node<'a> {
    TestResult(&'a mut TestResult),
    Container(&'a mut TestResultContainer),
    Fixture(&'a mut FixtureResult),
    Step(&'a mut StepResult),
}

impl<'a> Node<'a> {
    /// The executable item behind this node; containers have none
    pub fn into_item(self) -> Option<&'a mut dyn ExecutableItem> {
        match self {
            Node::TestResult(r) => Some(r),
            Node::Fixture(f) => Some(f),
            Node::Step(s) => Some(s),
            Node::Container(_) => None,
        }
    }

    fn descend(self, segment: &Segment) -> Option<Node<'a>> {
        match (self, segment) {
            (Node::Container(c), Segment::Before(id)) => {
                live(&mut c.befores, id, |f| &f.live_id).map(Node::Fixture)
            }
            (Node::Container(c), Segment::After(id)) => {
                live(&mut c.afters, id, |f| &f.live_id).map(Node::Fixture)
            }
            (node, Segment::Step(id)) => {
                live(node.into_item()?.steps_mut(), id, |s| &s.live_id).map(Node::Step)
            }
            _ => None,
        }
    }
}

fn live<'a, T>(
    children: &'a mut Vec<T>,
    id: &str,
    live_id: impl Fn(&T) -> &Option<String>,
) -> Option<&'a mut T> {
    children
        .iter_mut()
        .rev()
        .find(|child| live_id(child).as_deref() == Some(id))
}

/// Entity types that can be looked up in the registry
pub trait Tracked {
    const KIND: EntityKind;

    fn select(node: Node<'_>) -> Option<&mut Self>;
}

impl Tracked for TestResult {
    const KIND: EntityKind = EntityKind::TestResult;

    fn select(node: Node<'_>) -> Option<&mut Self> {
        match node {
            Node::TestResult(r) => Some(r),
            _ => None,
        }
    }
}

impl Tracked for TestResultContainer {
    const KIND: EntityKind = EntityKind::Container;

    fn select(node: Node<'_>) -> Option<&mut Self> {
        match node {
            Node::Container(c) => Some(c),
            _ => None,
        }
    }
}

impl Tracked for FixtureResult {
    const KIND: EntityKind = EntityKind::Fixture;

    fn select(node: Node<'_>) -> Option<&mut Self> {
        match node {
            Node::Fixture(f) => Some(f),
            _ => None,
        }
    }
}

impl Tracked for StepResult {
    const KIND: EntityKind = EntityKind::Step;

    fn select(node: Node<'_>) -> Option<&mut Self> {
        match node {
            Node::Step(s) => Some(s),
            _ => None,
        }
    }
}

/// Registry entry: a shared owner plus the path to the entity inside it
#[derive(Debug, Clone)]
pub struct LiveEntity {
    kind: EntityKind,
    root: Arc<Mutex<Root>>,
    path: Vec<Segment>,
}

impl LiveEntity {
    /// Entity owned by its own registry entry
    pub fn detached(root: Root) -> Self {
        Self {
            kind: root.kind(),
            root: Arc::new(Mutex::new(root)),
            path: Vec::new(),
        }
    }

    /// Entity embedded in this one at `segment`
    pub fn child(&self, kind: EntityKind, segment: Segment) -> Self {
        let mut path = self.path.clone();
        path.push(segment);
        Self {
            kind,
            root: Arc::clone(&self.root),
            path,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    fn lock(&self) -> MutexGuard<'_, Root> {
        self.root.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` on the resolved entity while holding its owner's lock
    ///
    /// Returns `None` when a mutator removed the entity from its parent.
    pub fn with_node<R>(&self, f: impl FnOnce(Node<'_>) -> R) -> Option<R> {
        let mut guard = self.lock();
        let mut node = guard.as_node();
        for segment in &self.path {
            node = node.descend(segment)?;
        }
        Some(f(node))
    }

    /// Run `f` on the entity as an executable item (test result, fixture or step)
    pub fn with_item<R>(&self, id: &str, f: impl FnOnce(&mut dyn ExecutableItem) -> R) -> Result<R> {
        let kind = self.kind;
        match self.with_node(|node| node.into_item().map(f)) {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(LifecycleError::NotExecutable {
                id: id.to_string(),
                found: kind,
            }),
            None => Err(LifecycleError::not_found(id, kind)),
        }
    }
}

/// Typed handle returned by registry lookups
#[derive(Debug)]
pub struct Handle<T> {
    id: String,
    entity: LiveEntity,
    _kind: PhantomData<fn() -> T>,
}

impl<T: Tracked> Handle<T> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn entity(&self) -> &LiveEntity {
        &self.entity
    }

    /// Apply `f` to the entity in place
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        self.entity
            .with_node(|node| T::select(node).map(f))
            .flatten()
            .ok_or_else(|| LifecycleError::not_found(self.id.as_str(), T::KIND))
    }
}

/// Thread-safe map from identifier to live entity
#[derive(Debug, Default)]
pub struct Registry {
    entries: RwLock<HashMap<String, LiveEntity>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entity registered under `id`
    pub fn put(&self, id: &str, entity: LiveEntity) -> Result<LiveEntity> {
        if id.is_empty() {
            return Err(LifecycleError::NullIdentifier);
        }
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), entity.clone());
        Ok(entity)
    }

    /// Look up an entity of any kind
    pub fn entity(&self, id: &str, expected: EntityKind) -> Result<LiveEntity> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| LifecycleError::not_found(id, expected))
    }

    /// Look up the test case, fixture or step that steps and attachments go to
    ///
    /// Containers are returned too; [`LiveEntity::with_item`] rejects them.
    pub fn running(&self, id: &str) -> Result<LiveEntity> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| LifecycleError::NotRunning { id: id.to_string() })
    }

    pub fn get<T: Tracked>(&self, id: &str) -> Result<Handle<T>> {
        let entity = self.entity(id, T::KIND)?;
        Self::typed(id, entity)
    }

    /// Remove the entity; a wrong-kind entry is left in place
    pub fn remove<T: Tracked>(&self, id: &str) -> Result<Handle<T>> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let found = entries
            .get(id)
            .map(LiveEntity::kind)
            .ok_or_else(|| LifecycleError::not_found(id, T::KIND))?;
        if found != T::KIND {
            return Err(LifecycleError::WrongKind {
                id: id.to_string(),
                expected: T::KIND,
                found,
            });
        }
        let entity = entries
            .remove(id)
            .ok_or_else(|| LifecycleError::not_found(id, T::KIND))?;
        Ok(Handle {
            id: id.to_string(),
            entity,
            _kind: PhantomData,
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn typed<T: Tracked>(id: &str, entity: LiveEntity) -> Result<Handle<T>> {
        if entity.kind() != T::KIND {
            return Err(LifecycleError::WrongKind {
                id: id.to_string(),
                expected: T::KIND,
                found: entity.kind(),
            });
        }
        Ok(Handle {
            id: id.to_string(),
            entity,
            _kind: PhantomData,
        })
    }
}
