//! The country context: per-execution stacks plus the name lookup.
//!
//! [`CountryContext`] is the explicit, injectable form. The free functions at
//! the bottom of this module operate on a process-wide instance that is either
//! installed at startup with [`install`] or lazily built from `DEFAULT_COUNTRY`
//! and the built-in ISO table on first use.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use tracing::{debug, error};

use crate::config::CountryContextConfig;
use crate::error::CountryContextError;
use crate::execution::{self, ExecutionId};
use crate::names::{CountryNames, CountryTable};
use crate::registry::ContextRegistry;
use crate::stack::CountryContextStack;
use crate::types::{CountryCode, CountryName};

// ---------------------------------------------------------------------------
// CountryContext
// ---------------------------------------------------------------------------

/// Tracks the current country of every execution context.
///
/// Every operation acts on the stack of the calling execution context (see
/// [`ExecutionId::current`]); contexts never observe each other's state.
pub struct CountryContext {
    registry: ContextRegistry,
    names: Arc<dyn CountryNames>,
}

impl CountryContext {
    pub fn new(config: CountryContextConfig, names: impl CountryNames + 'static) -> Self {
        Self {
            registry: ContextRegistry::new(config.default_country),
            names: Arc::new(names),
        }
    }

    /// Builds a context from `DEFAULT_COUNTRY` and the ISO 3166 table.
    ///
    /// # Errors
    ///
    /// Returns [`CountryContextError::MissingDefaultCountry`] if the variable is
    /// not set.
    pub fn from_env() -> Result<Self, CountryContextError> {
        Ok(Self::new(CountryContextConfig::from_env()?, CountryTable::iso3166()))
    }

    #[must_use]
    pub fn default_country(&self) -> &CountryCode {
        self.registry.default_country()
    }

    #[must_use]
    pub fn registry(&self) -> &ContextRegistry {
        &self.registry
    }

    /// Makes `code` the current country of the calling execution context.
    pub fn activate(&self, code: impl Into<CountryCode>) {
        self.activate_in(ExecutionId::current(), code.into());
    }

    /// Restores the country that was current before the matching `activate`.
    ///
    /// # Errors
    ///
    /// Returns [`CountryContextError::UnbalancedContext`] if there is no
    /// matching `activate`. The current country is unchanged in that case.
    pub fn deactivate(&self) -> Result<CountryCode, CountryContextError> {
        self.deactivate_in(ExecutionId::current())
    }

    /// Current country of the calling execution context.
    #[must_use]
    pub fn current_code(&self) -> CountryCode {
        self.registry.peek_current(ExecutionId::current())
    }

    /// Name of the current country.
    ///
    /// # Errors
    ///
    /// Returns [`CountryContextError::UnknownCountry`] if the current code is
    /// missing from the name table.
    pub fn current_name(&self) -> Result<CountryName, CountryContextError> {
        let code = self.current_code();
        self.names
            .name_of(&code)
            .ok_or(CountryContextError::UnknownCountry { code })
    }

    /// Live handle on the calling context's stack, registering it if absent.
    ///
    /// The handle is bound to the execution context it was created in.
    #[must_use]
    pub fn current_stack(&self) -> CurrentStack<'_> {
        let id = ExecutionId::current();
        self.registry.with_stack(id, |_| ());
        CurrentStack { context: self, id }
    }

    /// Runs `f` with mutable access to the calling context's stack.
    ///
    /// `f` must not call back into this context.
    pub fn with_current_stack<R>(&self, f: impl FnOnce(&mut CountryContextStack) -> R) -> R {
        self.registry.with_stack(ExecutionId::current(), f)
    }

    /// Clears the calling context's history and restores the default.
    pub fn reset_current(&self) {
        self.with_current_stack(CountryContextStack::reset);
    }

    /// Activates `code` and returns a guard that deactivates it on drop.
    ///
    /// The guard is bound to the execution context it was created in and
    /// always restores that context's stack, wherever it is dropped.
    pub fn enter(&self, code: impl Into<CountryCode>) -> CountryGuard<'_> {
        let id = ExecutionId::current();
        let code = code.into();
        self.activate_in(id, code.clone());
        CountryGuard {
            context: self,
            id,
            code,
            armed: true,
        }
    }

    /// Runs `f` with `code` as the current country.
    ///
    /// The previous country is restored on every exit path, including panics.
    /// An `Err` returned by `f` is passed through untouched inside `Ok`.
    ///
    /// # Errors
    ///
    /// Returns [`CountryContextError::UnbalancedContext`] if `f` left the stack
    /// with fewer entries than it found.
    pub fn with_country<R>(
        &self,
        code: impl Into<CountryCode>,
        f: impl FnOnce() -> R,
    ) -> Result<R, CountryContextError> {
        let guard = self.enter(code);
        let out = f();
        guard.exit()?;
        Ok(out)
    }

    /// Async form of [`with_country`](Self::with_country).
    ///
    /// Outside a [`scope`](Self::scope) the body runs in a fresh one, since
    /// other tasks polled on the same thread would otherwise share its stack.
    /// Dropping the returned future before it completes also restores the
    /// previous country.
    ///
    /// # Errors
    ///
    /// Same as [`with_country`](Self::with_country).
    pub async fn with_country_async<F: Future>(
        &self,
        code: impl Into<CountryCode>,
        fut: F,
    ) -> Result<F::Output, CountryContextError> {
        let code = code.into();
        if ExecutionId::in_scope() {
            self.run_entered(code, fut).await
        } else {
            self.scope(self.run_entered(code, fut)).await
        }
    }

    async fn run_entered<F: Future>(
        &self,
        code: CountryCode,
        fut: F,
    ) -> Result<F::Output, CountryContextError> {
        let guard = self.enter(code);
        let out = fut.await;
        guard.exit()?;
        Ok(out)
    }

    /// Runs `fut` as a fresh execution context with its own default stack.
    ///
    /// The stack is released from the registry once `fut` completes or is
    /// dropped.
    pub async fn scope<F: Future>(&self, fut: F) -> F::Output {
        let id = ExecutionId::next();
        let _release = ScopeRelease {
            registry: &self.registry,
            id,
        };
        execution::enter_scope(id, fut).await
    }

    fn activate_in(&self, id: ExecutionId, code: CountryCode) {
        let depth = self.registry.with_stack(id, |stack| {
            stack.activate(code.clone());
            stack.depth()
        });
        debug!(execution = %id, country = %code, depth, "activated country");
    }

    fn deactivate_in(&self, id: ExecutionId) -> Result<CountryCode, CountryContextError> {
        let (result, current) = self
            .registry
            .with_stack(id, |stack| (stack.deactivate(), stack.current().clone()));
        let previous = result?;
        debug!(execution = %id, country = %previous, restored = %current, "deactivated country");
        Ok(previous)
    }
}

impl fmt::Debug for CountryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountryContext")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// CurrentStack
// ---------------------------------------------------------------------------

/// Handle on the stack of one execution context, returned by
/// [`CountryContext::current_stack`].
///
/// Every call goes to the registry entry, so changes are seen by the context
/// itself. Use [`snapshot`](Self::snapshot) for a detached copy.
#[derive(Clone, Copy)]
pub struct CurrentStack<'a> {
    context: &'a CountryContext,
    id: ExecutionId,
}

impl CurrentStack<'_> {
    #[must_use]
    pub fn execution(&self) -> ExecutionId {
        self.id
    }

    pub fn activate(&self, code: impl Into<CountryCode>) {
        self.context.activate_in(self.id, code.into());
    }

    /// # Errors
    ///
    /// Returns [`CountryContextError::UnbalancedContext`] when the history is
    /// empty.
    pub fn deactivate(&self) -> Result<CountryCode, CountryContextError> {
        self.context.deactivate_in(self.id)
    }

    #[must_use]
    pub fn current(&self) -> CountryCode {
        self.context.registry.peek_current(self.id)
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.with(|stack| stack.depth())
    }

    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.with(|stack| stack.is_balanced())
    }

    pub fn reset(&self) {
        self.with(CountryContextStack::reset);
    }

    /// Read-only copy of the stack as it is now.
    #[must_use]
    pub fn snapshot(&self) -> CountryContextStack {
        self.context.registry.snapshot(self.id)
    }

    fn with<R>(&self, f: impl FnOnce(&mut CountryContextStack) -> R) -> R {
        self.context.registry.with_stack(self.id, f)
    }
}

impl fmt::Debug for CurrentStack<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentStack")
            .field("execution", &self.id)
            .field("stack", &self.snapshot())
            .finish()
    }
}

/// Releases a task-local scope's stack when the scope ends.
struct ScopeRelease<'a> {
    registry: &'a ContextRegistry,
    id: ExecutionId,
}

impl Drop for ScopeRelease<'_> {
    fn drop(&mut self) {
        self.registry.release(self.id);
    }
}

// ---------------------------------------------------------------------------
// CountryGuard
// ---------------------------------------------------------------------------

/// RAII activation created by [`CountryContext::enter`].
///
/// Dropping the guard deactivates; a failure at that point cannot propagate
/// and is logged instead. Call [`exit`](Self::exit) to observe it.
#[must_use = "dropping the guard immediately deactivates the country"]
pub struct CountryGuard<'a> {
    context: &'a CountryContext,
    id: ExecutionId,
    code: CountryCode,
    armed: bool,
}

impl CountryGuard<'_> {
    /// Deactivates now and reports the outcome.
    ///
    /// Returns the guard's own code without touching the registry when the
    /// owning scope has already discarded the stack.
    ///
    /// # Errors
    ///
    /// Returns [`CountryContextError::UnbalancedContext`] if code running under
    /// the guard deactivated more often than it activated.
    pub fn exit(mut self) -> Result<CountryCode, CountryContextError> {
        self.armed = false;
        if self.scope_ended() {
            return Ok(self.code.clone());
        }
        self.context.deactivate_in(self.id)
    }

    /// Execution context this guard restores.
    #[must_use]
    pub fn execution(&self) -> ExecutionId {
        self.id
    }

    fn scope_ended(&self) -> bool {
        let ended = !self.context.registry.contains(self.id);
        if ended {
            debug!(execution = %self.id, "execution scope ended before guard");
        }
        ended
    }
}

impl Drop for CountryGuard<'_> {
    fn drop(&mut self) {
        if !self.armed || self.scope_ended() {
            return;
        }
        if let Err(err) = self.context.deactivate_in(self.id) {
            error!(execution = %self.id, error = %err, "failed to restore country on drop");
        }
    }
}

// ---------------------------------------------------------------------------
// Process-wide context
// ---------------------------------------------------------------------------

static GLOBAL: OnceLock<CountryContext> = OnceLock::new();

/// Installs `context` as the process-wide context used by the free functions.
///
/// # Errors
///
/// Returns [`CountryContextError::AlreadyInstalled`] if a context was already
/// installed or lazily created.
pub fn install(context: CountryContext) -> Result<&'static CountryContext, CountryContextError> {
    let mut installed = false;
    let ctx = GLOBAL.get_or_init(|| {
        installed = true;
        context
    });
    if installed {
        Ok(ctx)
    } else {
        Err(CountryContextError::AlreadyInstalled)
    }
}

/// Returns the process-wide context, creating it from the environment on
/// first use if none was installed.
///
/// # Errors
///
/// Returns [`CountryContextError::MissingDefaultCountry`] when lazy creation
/// finds no `DEFAULT_COUNTRY`.
pub fn global() -> Result<&'static CountryContext, CountryContextError> {
    if let Some(ctx) = GLOBAL.get() {
        return Ok(ctx);
    }
    let ctx = CountryContext::from_env()?;
    Ok(GLOBAL.get_or_init(|| ctx))
}

/// Activates `code` for the calling execution context.
///
/// Reserved for framework entry hooks; ordinary call sites use [`with_country`].
///
/// # Errors
///
/// Fails only if the process-wide context cannot be created.
pub fn activate_country(code: impl Into<CountryCode>) -> Result<(), CountryContextError> {
    global()?.activate(code);
    Ok(())
}

/// Restores the previous country for the calling execution context.
///
/// # Errors
///
/// Returns [`CountryContextError::UnbalancedContext`] without a matching
/// activation.
pub fn deactivate_country() -> Result<CountryCode, CountryContextError> {
    global()?.deactivate()
}

/// # Errors
///
/// Fails only if the process-wide context cannot be created.
pub fn get_current_country_code() -> Result<CountryCode, CountryContextError> {
    Ok(global()?.current_code())
}

/// # Errors
///
/// Returns [`CountryContextError::UnknownCountry`] if the current code has no
/// name in the table.
pub fn get_current_country_name() -> Result<CountryName, CountryContextError> {
    global()?.current_name()
}

/// The stack bound to the calling execution context, registering it if
/// absent. Changes made through the handle are visible to the context.
///
/// # Errors
///
/// Fails only if the process-wide context cannot be created.
pub fn get_context_for_current_execution() -> Result<CurrentStack<'static>, CountryContextError> {
    Ok(global()?.current_stack())
}

/// Runs `f` with `code` as the current country, restoring the previous one
/// on every exit path.
///
/// # Errors
///
/// See [`CountryContext::with_country`].
pub fn with_country<R>(
    code: impl Into<CountryCode>,
    f: impl FnOnce() -> R,
) -> Result<R, CountryContextError> {
    global()?.with_country(code, f)
}

/// # Errors
///
/// See [`CountryContext::with_country_async`].
pub async fn with_country_async<F: Future>(
    code: impl Into<CountryCode>,
    fut: F,
) -> Result<F::Output, CountryContextError> {
    global()?.with_country_async(code, fut).await
}

/// Runs `fut` as a fresh execution context of the process-wide context.
///
/// # Errors
///
/// Fails only if the process-wide context cannot be created.
pub async fn scope<F: Future>(fut: F) -> Result<F::Output, CountryContextError> {
    Ok(global()?.scope(fut).await)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};
    use std::thread;
    use std::time::Duration;

    use super::*;

    fn table() -> CountryTable {
        [("EG", "Egypt"), ("US", "United States"), ("FR", "France")]
            .into_iter()
            .collect()
    }

    fn context() -> CountryContext {
        CountryContext::new(CountryContextConfig::new("EG"), table())
    }

    #[test]
    fn fresh_context_reads_default() {
        let ctx = context();
        assert_eq!(ctx.current_code(), "EG");
        assert!(ctx.current_stack().is_balanced());
    }

    #[test]
    fn activate_and_deactivate_round_trip() {
        let ctx = context();
        ctx.activate("FR");
        ctx.activate("DE");
        assert_eq!(ctx.current_code(), "DE");

        assert_eq!(ctx.deactivate().unwrap(), "DE");
        assert_eq!(ctx.current_code(), "FR");

        assert_eq!(ctx.deactivate().unwrap(), "FR");
        assert_eq!(ctx.current_code(), "EG");

        assert!(matches!(
            ctx.deactivate(),
            Err(CountryContextError::UnbalancedContext { .. })
        ));
        assert_eq!(ctx.current_code(), "EG");
    }

    #[test]
    fn current_name_follows_activation() {
        let ctx = context();
        assert_eq!(ctx.current_name().unwrap(), "Egypt");

        ctx.activate("US");
        assert_eq!(ctx.current_name().unwrap(), "United States");

        ctx.activate("XX");
        assert_eq!(
            ctx.current_name().unwrap_err(),
            CountryContextError::UnknownCountry {
                code: CountryCode::from("XX")
            }
        );

        ctx.deactivate().unwrap();
        ctx.deactivate().unwrap();
    }

    #[test]
    fn with_country_restores_after_normal_return() {
        let ctx = context();
        let seen = ctx.with_country("FR", || ctx.current_code()).unwrap();
        assert_eq!(seen, "FR");
        assert_eq!(ctx.current_code(), "EG");
    }

    #[test]
    fn with_country_restores_after_inner_error() {
        let ctx = context();
        ctx.activate("US");

        let out: Result<(), &str> = ctx.with_country("FR", || Err("boom")).unwrap();
        assert_eq!(out, Err("boom"));
        assert_eq!(ctx.current_code(), "US");

        ctx.deactivate().unwrap();
    }

    #[test]
    fn with_country_restores_after_early_return() {
        fn lookup(ctx: &CountryContext, bail: bool) -> Option<CountryName> {
            let name = ctx
                .with_country("US", || {
                    if bail {
                        return None;
                    }
                    ctx.current_name().ok()
                })
                .ok()??;
            Some(name)
        }

        let ctx = context();
        assert!(lookup(&ctx, true).is_none());
        assert_eq!(ctx.current_code(), "EG");
        assert_eq!(lookup(&ctx, false).unwrap(), "United States");
        assert_eq!(ctx.current_code(), "EG");
    }

    #[test]
    fn with_country_restores_after_panic() {
        let ctx = context();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            ctx.with_country("FR", || panic!("handler blew up"))
        }));
        assert!(result.is_err());
        assert_eq!(ctx.current_code(), "EG");
        assert!(ctx.current_stack().is_balanced());
    }

    #[test]
    fn with_country_reports_unbalanced_body() {
        let ctx = context();
        let err = ctx
            .with_country("FR", || {
                ctx.deactivate().unwrap();
            })
            .unwrap_err();
        assert!(matches!(err, CountryContextError::UnbalancedContext { .. }));
        assert_eq!(ctx.current_code(), "EG");
    }

    #[test]
    fn nested_helpers_unwind_in_order() {
        let ctx = context();
        ctx.with_country("FR", || {
            ctx.with_country("US", || assert_eq!(ctx.current_code(), "US"))
                .unwrap();
            assert_eq!(ctx.current_code(), "FR");
        })
        .unwrap();
        assert_eq!(ctx.current_code(), "EG");
    }

    #[test]
    fn guard_exit_reports_deactivated_code() {
        let ctx = context();
        let guard = ctx.enter("US");
        assert_eq!(guard.execution(), ExecutionId::current());
        assert_eq!(ctx.current_code(), "US");
        assert_eq!(guard.exit().unwrap(), "US");
        assert_eq!(ctx.current_code(), "EG");
    }

    #[test]
    fn guard_drop_restores_previous() {
        let ctx = context();
        {
            let _guard = ctx.enter("FR");
            assert_eq!(ctx.current_code(), "FR");
        }
        assert_eq!(ctx.current_code(), "EG");
    }

    #[test]
    fn reset_current_discards_history() {
        let ctx = context();
        ctx.activate("FR");
        ctx.activate("US");
        ctx.reset_current();
        assert_eq!(ctx.current_code(), "EG");
        assert!(ctx.deactivate().is_err());
    }

    #[test]
    fn threads_are_isolated() {
        let ctx = Arc::new(context());
        let barrier = Arc::new(std::sync::Barrier::new(2));

        let spawn = |code: &'static str| {
            let ctx = Arc::clone(&ctx);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                ctx.activate(code);
                barrier.wait();
                thread::sleep(Duration::from_millis(10));
                let seen = ctx.current_code();
                ctx.deactivate().unwrap();
                seen
            })
        };

        let a = spawn("EG");
        let b = spawn("US");
        assert_eq!(a.join().unwrap(), "EG");
        assert_eq!(b.join().unwrap(), "US");
        assert_eq!(ctx.current_code(), "EG");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn task_scopes_are_isolated() {
        let ctx = Arc::new(context());
        let barrier = Arc::new(tokio::sync::Barrier::new(2));

        let spawn = |code: &'static str| {
            let ctx = Arc::clone(&ctx);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                ctx.scope(async {
                    ctx.activate(code);
                    barrier.wait().await;
                    tokio::task::yield_now().await;
                    let seen = ctx.current_code();
                    ctx.deactivate().unwrap();
                    seen
                })
                .await
            })
        };

        let a = spawn("EG");
        let b = spawn("US");
        assert_eq!(a.await.unwrap(), "EG");
        assert_eq!(b.await.unwrap(), "US");
        assert!(ctx.registry().is_empty());
    }

    #[tokio::test]
    async fn scope_starts_from_default_and_releases() {
        let ctx = context();
        ctx.activate("FR");

        let inside = ctx
            .scope(async {
                let fresh = ctx.current_code();
                ctx.activate("US");
                fresh
            })
            .await;

        assert_eq!(inside, "EG");
        assert_eq!(ctx.current_code(), "FR");
        // Only the test thread's own stack remains.
        assert_eq!(ctx.registry().len(), 1);
        ctx.deactivate().unwrap();
    }

    #[tokio::test]
    async fn async_helper_restores_after_completion() {
        let ctx = context();
        let name = ctx
            .with_country_async("US", async {
                tokio::task::yield_now().await;
                ctx.current_name()
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(name, "United States");
        assert_eq!(ctx.current_code(), "EG");
    }

    #[tokio::test]
    async fn async_helper_restores_on_cancellation() {
        let ctx = context();
        let slow = ctx.with_country_async("FR", tokio::time::sleep(Duration::from_secs(60)));
        let timed_out = tokio::time::timeout(Duration::from_millis(10), slow).await;
        assert!(timed_out.is_err());
        assert_eq!(ctx.current_code(), "EG");
        assert!(ctx.current_stack().is_balanced());
    }

    #[tokio::test]
    async fn guard_outliving_its_scope_is_harmless() {
        let ctx = context();
        let escaped = ctx.scope(async { ctx.enter("US") }).await;
        assert!(!ctx.registry().contains(escaped.execution()));
        drop(escaped);
        assert!(ctx.registry().is_empty());
    }

    #[tokio::test]
    async fn guard_exit_after_scope_ended_leaves_no_entry() {
        let ctx = context();
        let escaped = ctx.scope(async { ctx.enter("US") }).await;
        assert_eq!(escaped.exit().unwrap(), "US");
        assert!(ctx.registry().is_empty());
    }

    #[tokio::test]
    async fn async_helper_isolates_tasks_sharing_a_thread() {
        let ctx = Arc::new(context());
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let waiting = {
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move {
                ctx.with_country_async("FR", async {
                    rx.await.unwrap();
                    ctx.current_code()
                })
                .await
            })
        };
        let signalling = {
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move {
                ctx.with_country_async("US", async {
                    tx.send(()).unwrap();
                    tokio::task::yield_now().await;
                    ctx.current_code()
                })
                .await
            })
        };

        assert_eq!(waiting.await.unwrap().unwrap(), "FR");
        assert_eq!(signalling.await.unwrap().unwrap(), "US");
        assert!(ctx.registry().is_empty());
    }

    #[tokio::test]
    async fn async_helper_reuses_enclosing_scope() {
        let ctx = context();
        ctx.scope(async {
            ctx.activate("FR");
            let depth = ctx
                .with_country_async("US", async { ctx.current_stack().depth() })
                .await
                .unwrap();
            assert_eq!(depth, 2);
            assert_eq!(ctx.current_code(), "FR");
            assert_eq!(ctx.registry().len(), 1);
        })
        .await;
    }

    #[test]
    fn current_stack_handle_changes_the_live_stack() {
        let ctx = context();
        let stack = ctx.current_stack();
        assert_eq!(stack.execution(), ExecutionId::current());

        stack.activate("US");
        assert_eq!(ctx.current_code(), "US");
        assert_eq!(stack.current(), "US");
        assert_eq!(stack.depth(), 1);

        let copy = stack.snapshot();
        ctx.activate("FR");
        assert_eq!(copy.current(), &"US");
        assert_eq!(stack.depth(), 2);

        stack.reset();
        assert_eq!(ctx.current_code(), "EG");
        assert!(stack.is_balanced());
        assert!(stack.deactivate().is_err());
    }

    mod process_wide {
        use super::*;

        fn installed() -> &'static CountryContext {
            let _ = install(CountryContext::new(CountryContextConfig::new("EG"), table()));
            global().unwrap()
        }

        #[test]
        fn free_functions_follow_the_scenario() {
            installed();
            assert_eq!(get_current_country_code().unwrap(), "EG");

            activate_country("FR").unwrap();
            activate_country("DE").unwrap();
            assert_eq!(get_current_country_code().unwrap(), "DE");

            deactivate_country().unwrap();
            assert_eq!(get_current_country_code().unwrap(), "FR");
            deactivate_country().unwrap();
            assert_eq!(get_current_country_code().unwrap(), "EG");

            assert!(matches!(
                deactivate_country(),
                Err(CountryContextError::UnbalancedContext { .. })
            ));
        }

        #[test]
        fn free_name_lookup() {
            installed();
            assert_eq!(get_current_country_name().unwrap(), "Egypt");
            let name = with_country("US", get_current_country_name).unwrap().unwrap();
            assert_eq!(name, "United States");
            assert!(get_context_for_current_execution().unwrap().is_balanced());
        }

        #[test]
        fn registry_accessor_changes_current_country() {
            installed();
            let stack = get_context_for_current_execution().unwrap();
            stack.activate("US");
            assert_eq!(get_current_country_code().unwrap(), "US");

            assert_eq!(deactivate_country().unwrap(), "US");
            assert_eq!(stack.current(), "EG");
        }

        #[test]
        fn second_install_is_rejected() {
            installed();
            let err = install(CountryContext::new(CountryContextConfig::new("US"), table()))
                .unwrap_err();
            assert_eq!(err, CountryContextError::AlreadyInstalled);
            assert_eq!(global().unwrap().default_country(), "EG");
        }

        #[tokio::test]
        async fn free_scope_isolates_task() {
            installed();
            activate_country("FR").unwrap();
            let inner = scope(async { get_current_country_code().unwrap() })
                .await
                .unwrap();
            assert_eq!(inner, "EG");

            let seen = with_country_async("US", async { get_current_country_code().unwrap() })
                .await
                .unwrap();
            assert_eq!(seen, "US");

            assert_eq!(deactivate_country().unwrap(), "FR");
        }
    }
}
