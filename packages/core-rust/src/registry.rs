use dashmap::DashMap;

use crate::execution::ExecutionId;
use crate::stack::CountryContextStack;
use crate::types::CountryCode;

// ---------------------------------------------------------------------------
// ContextRegistry
// ---------------------------------------------------------------------------

/// Maps each execution context to its own [`CountryContextStack`].
///
/// Stacks are created on first access with the registry's default country and
/// reused afterwards. Insert-if-absent goes through `DashMap`'s per-shard lock,
/// so concurrent first access from different contexts is safe. A stack is only
/// ever touched by the context that owns it; the shard lock is held for the
/// duration of one stack operation and nothing else.
#[derive(Debug)]
pub struct ContextRegistry {
    default_country: CountryCode,
    stacks: DashMap<ExecutionId, CountryContextStack>,
}

impl ContextRegistry {
    /// Creates an empty registry whose stacks start at `default_country`.
    #[must_use]
    pub fn new(default_country: CountryCode) -> Self {
        Self {
            default_country,
            stacks: DashMap::new(),
        }
    }

    #[must_use]
    pub fn default_country(&self) -> &CountryCode {
        &self.default_country
    }

    /// Runs `f` against the stack of `id`, creating the stack if needed.
    ///
    /// `f` must not call back into this registry: the stack's shard stays
    /// locked while it runs.
    pub fn with_stack<R>(
        &self,
        id: ExecutionId,
        f: impl FnOnce(&mut CountryContextStack) -> R,
    ) -> R {
        let mut entry = self
            .stacks
            .entry(id)
            .or_insert_with(|| CountryContextStack::new(self.default_country.clone()));
        f(entry.value_mut())
    }

    /// Returns a detached copy of the stack bound to `id`, creating the stack
    /// if absent. Changes to the copy do not reach the registry.
    #[must_use]
    pub fn snapshot(&self, id: ExecutionId) -> CountryContextStack {
        self.with_stack(id, |stack| stack.clone())
    }

    /// Reads the current code of `id` without registering a stack for it.
    #[must_use]
    pub fn peek_current(&self, id: ExecutionId) -> CountryCode {
        self.stacks
            .get(&id)
            .map_or_else(|| self.default_country.clone(), |s| s.current().clone())
    }

    /// Forgets the stack of a finished execution context.
    pub fn release(&self, id: ExecutionId) -> Option<CountryContextStack> {
        self.stacks.remove(&id).map(|(_, stack)| stack)
    }

    #[must_use]
    pub fn contains(&self, id: ExecutionId) -> bool {
        self.stacks.contains_key(&id)
    }

    /// Number of execution contexts with a registered stack.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
