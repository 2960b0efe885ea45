//! Background Execution Implementation
//!
//! Desktop processes are never suspended for playing audio, so allowances are
//! always granted. They are still tracked so leaks show up in logs and tests.

use bridge_traits::background::{BackgroundTaskHandler, BackgroundTaskId, LifecycleState};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Background allowance tracker for desktop.
pub struct DesktopBackgroundHandler {
    next_id: AtomicU64,
    active: Mutex<HashSet<BackgroundTaskId>>,
    state: Mutex<LifecycleState>,
}

impl DesktopBackgroundHandler {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            active: Mutex::new(HashSet::new()),
            state: Mutex::new(LifecycleState::Foreground),
        }
    }

    /// Number of allowances that were begun but not ended.
    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    /// Hosts that track window visibility can report it here.
    pub fn set_lifecycle_state(&self, state: LifecycleState) {
        *self.state.lock() = state;
    }
}

impl Default for DesktopBackgroundHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundTaskHandler for DesktopBackgroundHandler {
    fn begin_background_task(&self) -> Option<BackgroundTaskId> {
        let id = BackgroundTaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.active.lock().insert(id);
        debug!(task_id = id.0, "Background allowance granted");
        Some(id)
    }

    fn end_background_task(&self, id: BackgroundTaskId) {
        if self.active.lock().remove(&id) {
            debug!(task_id = id.0, "Background allowance released");
        } else {
            warn!(task_id = id.0, "Released unknown background allowance");
        }
    }

    fn lifecycle_state(&self) -> LifecycleState {
        *self.state.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowances_are_tracked() {
        let handler = DesktopBackgroundHandler::new();

        let first = handler.begin_background_task().unwrap();
        let second = handler.begin_background_task().unwrap();
        assert_ne!(first, second);
        assert_eq!(handler.active_count(), 2);

        handler.end_background_task(first);
        handler.end_background_task(first);
        assert_eq!(handler.active_count(), 1);

        handler.end_background_task(second);
        assert_eq!(handler.active_count(), 0);
    }

    #[test]
    fn test_lifecycle_state_defaults_to_foreground() {
        let handler = DesktopBackgroundHandler::default();
        assert_eq!(handler.lifecycle_state(), LifecycleState::Foreground);

        handler.set_lifecycle_state(LifecycleState::Background);
        assert_eq!(handler.lifecycle_state(), LifecycleState::Background);
    }
}
