//! Per-execution-context stack of country codes.

use std::collections::VecDeque;
use std::mem;

use crate::error::CountryContextError;
use crate::types::CountryCode;

/// The current country for one execution context plus the codes it displaced.
///
/// `current` is not part of `history`. `history` holds the values to restore,
/// newest first, so an `activate`/`deactivate` pair always leaves the stack
/// exactly as it found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryContextStack {
    default: CountryCode,
    current: CountryCode,
    history: VecDeque<CountryCode>,
}

impl CountryContextStack {
    /// Creates a stack whose current value is `default` and whose history is empty.
    #[must_use]
    pub fn new(default: CountryCode) -> Self {
        Self {
            current: default.clone(),
            default,
            history: VecDeque::new(),
        }
    }

    /// Makes `code` current, remembering the previous value for `deactivate`.
    ///
    /// Accepts any code. Every call must be matched by exactly one `deactivate`.
    pub fn activate(&mut self, code: CountryCode) {
        let previous = mem::replace(&mut self.current, code);
        self.history.push_front(previous);
    }

    /// Restores the value displaced by the most recent `activate` and returns
    /// the code that was current until now.
    ///
    /// # Errors
    ///
    /// Returns [`CountryContextError::UnbalancedContext`] when there is nothing
    /// to restore. The current value is left untouched in that case.
    pub fn deactivate(&mut self) -> Result<CountryCode, CountryContextError> {
        let Some(previous) = self.history.pop_front() else {
            return Err(CountryContextError::UnbalancedContext {
                current: self.current.clone(),
            });
        };
        Ok(mem::replace(&mut self.current, previous))
    }

    #[must_use]
    pub fn current(&self) -> &CountryCode {
        &self.current
    }

    /// The value this stack was created with.
    #[must_use]
    pub fn default_country(&self) -> &CountryCode {
        &self.default
    }

    /// Number of pending restorations.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.history.len()
    }

    /// True when every `activate` has been matched by a `deactivate`.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.history.is_empty()
    }

    /// Drops all pending restorations and makes the default current again.
    ///
    /// For frameworks that reuse pooled threads and want a clean slate on reuse.
    pub fn reset(&mut self) {
        self.history.clear();
        self.current = self.default.clone();
    }
}
