//! Tracking Context
//!
//! The tracking context records which computation is currently running.
//! This enables automatic dependency tracking: when a signal or store is
//! read, the dependency graph can register the current computation as a
//! subscriber of the slot that was read.
//!
//! # Implementation
//!
//! We use a thread-local stack to track the currently executing computation.
//! When entering a tracking context (e.g., running an effect or recomputing
//! a computed value), we push the subscriber onto the stack. When the
//! computation completes, we pop it.
//!
//! This design supports nested computations (e.g., a component render effect
//! that mounts a child component whose own render effect runs inside it):
//! reads always attribute to the innermost entry, which is the
//! single-current-effect discipline the dependency graph relies on.

use std::cell::RefCell;

use super::subscriber::SubscriberId;

/// The tracking context stack.
///
/// Each thread has its own stack to track which computation is running.
/// This thread-local approach avoids the need for synchronization in the
/// common case of single-threaded reactivity.
thread_local! {
    static CONTEXT_STACK: RefCell<Vec<SubscriberId>> = RefCell::new(Vec::new());
}

/// Guard that pops the context when dropped.
///
/// This ensures the context stack is properly maintained even if
/// the computation panics.
pub struct ReactiveContext {
    subscriber_id: SubscriberId,
}

impl ReactiveContext {
    /// Enter a new tracking context for the given subscriber.
    ///
    /// While this context is active, any reactive slot that is read will
    /// register the subscriber as a dependent.
    ///
    /// The context is automatically exited when the returned guard is dropped.
    pub fn enter(subscriber_id: SubscriberId) -> Self {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(subscriber_id);
        });

        Self { subscriber_id }
    }

    /// Check if there is an active tracking context.
    pub fn is_active() -> bool {
        CONTEXT_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// Get the current subscriber ID, if any.
    ///
    /// Reads outside any context return `None` and are simply not tracked;
    /// this is the expected no-op path for non-reactive reads.
    pub fn current_subscriber() -> Option<SubscriberId> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().copied())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            // Verify we're popping the right context.
            // This helps catch bugs where contexts are mismatched.
            if let Some(id) = popped {
                debug_assert_eq!(
                    id, self.subscriber_id,
                    "ReactiveContext mismatch: expected {:?}, got {:?}",
                    self.subscriber_id, id
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_tracks_subscriber() {
        let id = SubscriberId::new();

        assert!(!ReactiveContext::is_active());
        assert!(ReactiveContext::current_subscriber().is_none());

        {
            let _ctx = ReactiveContext::enter(id);

            assert!(ReactiveContext::is_active());
            assert_eq!(ReactiveContext::current_subscriber(), Some(id));
        }

        // Context should be cleaned up after drop
        assert!(!ReactiveContext::is_active());
        assert!(ReactiveContext::current_subscriber().is_none());
    }

    #[test]
    fn nested_contexts_attribute_to_innermost() {
        let id1 = SubscriberId::new();
        let id2 = SubscriberId::new();

        {
            let _ctx1 = ReactiveContext::enter(id1);
            assert_eq!(ReactiveContext::current_subscriber(), Some(id1));

            {
                let _ctx2 = ReactiveContext::enter(id2);
                assert_eq!(ReactiveContext::current_subscriber(), Some(id2));
            }

            // After inner context drops, outer should be current
            assert_eq!(ReactiveContext::current_subscriber(), Some(id1));
        }

        assert!(ReactiveContext::current_subscriber().is_none());
    }
}
