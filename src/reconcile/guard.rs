//! Request-scoped recursion guard.
//!
//! The authoritative source for index pages may itself go through the
//! customized listing. The guard lives on the `RequestContext`, so only
//! re-entry from the same request is detected; concurrent requests each carry
//! their own.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::domain::{DomainError, DomainResult, SourceElement, UserId};

/// Per-request state threaded through every engine call
pub struct RequestContext {
    user: UserId,
    guard: RecursionGuard,
}

impl RequestContext {
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            guard: RecursionGuard::default(),
        }
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn guard(&self) -> &RecursionGuard {
        &self.guard
    }
}

/// Re-entrancy flag plus the snapshots the running reconciliation has fetched
#[derive(Default)]
pub struct RecursionGuard {
    held: AtomicBool,
    snapshots: Mutex<HashMap<String, Vec<SourceElement>>>,
}

impl RecursionGuard {
    /// Take the guard, or fail with `RecursionDetected` if it is already taken
    pub fn try_acquire(&self) -> DomainResult<GuardToken<'_>> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| DomainError::RecursionDetected)?;
        Ok(GuardToken { guard: self })
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }

    /// Remember a snapshot so re-entrant calls can answer without the source
    pub fn record_snapshot(&self, key: &str, snapshot: &[SourceElement]) {
        if let Ok(mut snapshots) = self.snapshots.lock() {
            snapshots.insert(key.to_string(), snapshot.to_vec());
        }
    }

    pub fn snapshot(&self, key: &str) -> Option<Vec<SourceElement>> {
        self.snapshots
            .lock()
            .ok()
            .and_then(|snapshots| snapshots.get(key).cloned())
    }

    fn release(&self) {
        if let Ok(mut snapshots) = self.snapshots.lock() {
            snapshots.clear();
        }
        self.held.store(false, Ordering::Release);
    }
}

/// Held guard; released on drop, including on early error returns
pub struct GuardToken<'a> {
    guard: &'a RecursionGuard,
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.release();
    }
}
