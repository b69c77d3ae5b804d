// Per-thread execution context
//
// Each thread keeps one stack of "current" identifiers per lifecycle
// instance. Stacks are never shared between threads; a child thread gets a
// copy of its parent's stack only when a snapshot is attached explicitly.

use crate::error::{LifecycleError, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static STACKS: RefCell<HashMap<u64, Vec<String>>> = RefCell::new(HashMap::new());
}

/// Stack of running test case, fixture and step identifiers for the calling thread
///
/// A thread holds an entry only while its stack is non-empty: popping the
/// last identifier or resetting removes it, and reads never create one.
/// Dropping the context removes the dropping thread's entry; a non-empty
/// stack left on another thread lives until that thread exits.
#[derive(Debug)]
pub struct ThreadContext {
    id: u64,
}

impl Default for ThreadContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadContext {
    pub fn new() -> Self {
        Self {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    fn read_stack<R>(&self, f: impl FnOnce(&[String]) -> R) -> R {
        STACKS.with(|stacks| {
            let stacks = stacks.borrow();
            f(stacks.get(&self.id).map(Vec::as_slice).unwrap_or_default())
        })
    }

    fn with_stack<R>(&self, f: impl FnOnce(&mut Vec<String>) -> R) -> R {
        STACKS.with(|stacks| {
            let mut stacks = stacks.borrow_mut();
            let stack = stacks.entry(self.id).or_default();
            let value = f(stack);
            if stack.is_empty() {
                stacks.remove(&self.id);
            }
            value
        })
    }

    /// Make `id` the new top of this thread's stack
    pub fn push(&self, id: impl Into<String>) {
        let id = id.into();
        self.with_stack(|stack| stack.push(id));
    }

    pub fn pop(&self) -> Result<String> {
        self.with_stack(Vec::pop)
            .ok_or_else(|| LifecycleError::empty_context("pop execution context"))
    }

    pub fn peek(&self) -> Result<String> {
        self.current()
            .ok_or_else(|| LifecycleError::empty_context("peek execution context"))
    }

    /// Most recently pushed identifier
    pub fn current(&self) -> Option<String> {
        self.read_stack(|stack| stack.last().cloned())
    }

    /// Oldest identifier: the test case or fixture owning the stack
    pub fn root(&self) -> Option<String> {
        self.read_stack(|stack| stack.first().cloned())
    }

    pub fn depth(&self) -> usize {
        self.read_stack(|stack| stack.len())
    }

    /// Clear this thread's stack
    pub fn reset(&self) {
        STACKS.with(|stacks| {
            stacks.borrow_mut().remove(&self.id);
        });
    }

    /// Copy of this thread's stack, to be attached on another thread
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            context: self.id,
            ids: self.read_stack(<[String]>::to_vec),
        }
    }
}

impl Drop for ThreadContext {
    fn drop(&mut self) {
        // Only the dropping thread's entry is reachable here.
        let _ = STACKS.try_with(|stacks| {
            if let Ok(mut stacks) = stacks.try_borrow_mut() {
                stacks.remove(&self.id);
            }
        });
    }
}

/// Copy of one thread's context stack
///
/// Attaching it on another thread replaces that thread's stack with the copy.
/// Later pushes and pops on either thread are not visible to the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSnapshot {
    context: u64,
    ids: Vec<String>,
}

impl ContextSnapshot {
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Install the copied stack on the calling thread
    pub fn attach(&self) {
        STACKS.with(|stacks| {
            let mut stacks = stacks.borrow_mut();
            if self.ids.is_empty() {
                stacks.remove(&self.context);
            } else {
                stacks.insert(self.context, self.ids.clone());
            }
        });
    }
}

#[cfg(test)]
fn live_entries() -> usize {
    STACKS.with(|stacks| stacks.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emptied_stack_leaves_no_entry() {
        let before = live_entries();
        let context = ThreadContext::new();

        for _ in 0..100 {
            context.push("test");
            context.push("step");
            context.pop().unwrap();
            context.pop().unwrap();
        }
        assert!(context.current().is_none());
        assert!(context.pop().is_err());
        assert_eq!(context.depth(), 0);
        assert_eq!(live_entries(), before);

        context.push("left-running");
        assert_eq!(live_entries(), before + 1);
        drop(context);
        assert_eq!(live_entries(), before);
    }

    #[test]
    fn test_short_lived_contexts_do_not_accumulate() {
        let before = live_entries();
        for _ in 0..100 {
            let context = ThreadContext::new();
            context.push("test");
            context.reset();
            let _ = context.current();
            context.snapshot().attach();
        }
        assert_eq!(live_entries(), before);
    }

    #[test]
    fn test_push_peek_pop() {
        let context = ThreadContext::new();
        context.push("test");
        context.push("step");

        assert_eq!(context.peek().unwrap(), "step");
        assert_eq!(context.root().as_deref(), Some("test"));
        assert_eq!(context.pop().unwrap(), "step");
        assert_eq!(context.pop().unwrap(), "test");
        assert_eq!(context.depth(), 0);
    }

    #[test]
    fn test_empty_stack_errors() {
        let context = ThreadContext::new();

        assert!(matches!(
            context.pop(),
            Err(LifecycleError::EmptyContext { .. })
        ));
        assert!(matches!(
            context.peek(),
            Err(LifecycleError::EmptyContext { .. })
        ));
        assert!(context.root().is_none());
    }

    #[test]
    fn test_reset_clears_stack() {
        let context = ThreadContext::new();
        context.push("a");
        context.push("b");
        context.reset();

        assert!(context.current().is_none());
    }

    #[test]
    fn test_contexts_do_not_share_stacks() {
        let first = ThreadContext::new();
        let second = ThreadContext::new();
        first.push("only-in-first");

        assert!(second.current().is_none());
        assert_eq!(first.depth(), 1);
    }

    #[test]
    fn test_other_threads_start_empty() {
        let context = ThreadContext::new();
        context.push("main");

        std::thread::scope(|s| {
            s.spawn(|| assert!(context.current().is_none()));
        });
    }

    #[test]
    fn test_snapshot_is_copied_not_shared() {
        let context = ThreadContext::new();
        context.push("test");
        context.push("step");
        let snapshot = context.snapshot();

        std::thread::scope(|s| {
            s.spawn(|| {
                snapshot.attach();
                assert_eq!(context.current().as_deref(), Some("step"));
                context.push("child-step");
                assert_eq!(context.depth(), 3);
            });
        });

        assert_eq!(context.depth(), 2);
        assert_eq!(snapshot.ids(), ["test".to_string(), "step".to_string()]);
    }
}
