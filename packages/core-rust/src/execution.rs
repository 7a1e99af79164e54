//! Execution-context identity.
//!
//! An execution context is either a tokio task-local scope entered with
//! [`enter_scope`] or, outside any scope, the calling OS thread. Tokio tasks
//! migrate between worker threads, so async code must run inside a scope to
//! get a stable identity; plain threads get one for free.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_EXECUTION_ID: AtomicU64 = AtomicU64::new(1);

tokio::task_local! {
    static TASK_EXECUTION: ExecutionId;
}

thread_local! {
    static THREAD_EXECUTION: ExecutionId = ExecutionId::next();
}

/// Opaque token naming one execution context. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExecutionId(u64);

impl ExecutionId {
    /// Allocates a fresh token.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_EXECUTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Resolves the token of the caller: the innermost task-local scope if
    /// there is one, otherwise the current thread.
    #[must_use]
    pub fn current() -> Self {
        TASK_EXECUTION
            .try_with(|id| *id)
            .unwrap_or_else(|_| THREAD_EXECUTION.with(|id| *id))
    }

    /// True when the caller runs inside a task-local scope.
    #[must_use]
    pub fn in_scope() -> bool {
        TASK_EXECUTION.try_with(|_| ()).is_ok()
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exec-{}", self.0)
    }
}

/// Runs `fut` as the execution context `id`.
pub async fn enter_scope<F: Future>(id: ExecutionId, fut: F) -> F::Output {
    TASK_EXECUTION.scope(id, fut).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_identity_is_stable() {
        assert_eq!(ExecutionId::current(), ExecutionId::current());
        assert!(!ExecutionId::in_scope());
    }

    #[test]
    fn threads_get_distinct_identities() {
        let here = ExecutionId::current();
        let there = std::thread::spawn(ExecutionId::current).join().unwrap();
        assert_ne!(here, there);
    }

    #[tokio::test]
    async fn in_scope_only_inside_enter_scope() {
        assert!(!ExecutionId::in_scope());
        let id = ExecutionId::next();
        let inside = enter_scope(id, async { ExecutionId::in_scope() }).await;
        assert!(inside);
        assert!(!ExecutionId::in_scope());
    }

    #[tokio::test]
    async fn async_scope_survives_await_points() {
        let id = ExecutionId::next();
        let (before, after) = enter_scope(id, async {
            let before = ExecutionId::current();
            tokio::task::yield_now().await;
            (before, ExecutionId::current())
        })
        .await;
        assert_eq!(before, id);
        assert_eq!(after, id);
    }

    #[tokio::test]
    async fn nested_scopes_use_innermost_identity() {
        let outer = ExecutionId::next();
        let inner = ExecutionId::next();
        enter_scope(outer, async move {
            enter_scope(inner, async move {
                assert_eq!(ExecutionId::current(), inner);
            })
            .await;
            assert_eq!(ExecutionId::current(), outer);
        })
        .await;
    }

    #[test]
    fn display_is_prefixed() {
        assert!(ExecutionId::next().to_string().starts_with("exec-"));
    }
}
