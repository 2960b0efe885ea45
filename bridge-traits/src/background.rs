//! Background Execution Allowance
//!
//! Lets the playback core ask the host to keep the process alive while it is
//! buffering or paused in the background.

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Application is in the foreground and active
    Foreground,
    /// Application is in the background
    Background,
    /// Application is being suspended
    Suspended,
}

impl LifecycleState {
    pub fn is_foreground(&self) -> bool {
        matches!(self, LifecycleState::Foreground)
    }
}

/// Opaque identifier of a granted background allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackgroundTaskId(pub u64);

/// Background task handler trait
///
/// Abstracts the platform's "finish what you're doing" allowance:
/// - **iOS**: `beginBackgroundTask` / `endBackgroundTask`
/// - **Android**: foreground service or wake lock
/// - **Desktop**: No background limits; implementations only track state
///
/// The core never holds more than one allowance at a time and always ends the
/// one it began.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::background::BackgroundTaskHandler;
///
/// fn buffer_in_background(handler: &dyn BackgroundTaskHandler) {
///     if let Some(id) = handler.begin_background_task() {
///         // ... wait for the engine to become ready ...
///         handler.end_background_task(id);
///     }
/// }
/// ```
pub trait BackgroundTaskHandler: Send + Sync {
    /// Request a background execution allowance.
    ///
    /// Returns `None` when the platform refuses the request.
    fn begin_background_task(&self) -> Option<BackgroundTaskId>;

    /// Release an allowance obtained from [`begin_background_task`](Self::begin_background_task).
    fn end_background_task(&self, id: BackgroundTaskId);

    /// Current application lifecycle state
    fn lifecycle_state(&self) -> LifecycleState {
        LifecycleState::Foreground
    }
}
