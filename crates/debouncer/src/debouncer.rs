use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use tokio::task::JoinHandle;
use tracing::trace;

/// What [`Debouncer::cancel`] does to the current window besides clearing the
/// pending timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CancelMode {
    /// Clear the timer but leave the window marked armed. A call made after a
    /// cancel finds the window still armed and schedules nothing, and since
    /// only an elapsing timer disarms the window, the controller never fires
    /// again. Kept as the default because existing callers were written
    /// against exactly this behavior.
    #[default]
    KeepArmed,
    /// Disarm the window as well, so a later call arms a fresh timer.
    Disarm,
}

/// Delays invocation of a callback until a full quiet window has passed,
/// always delivering the payload from the most recent [`call`](Self::call).
///
/// Constructing a debouncer has no side effects; no timer exists until the
/// first call. Each instance owns its own state, so independent debouncers
/// never interfere with each other.
pub struct Debouncer<T> {
    state: Arc<DebounceState<T>>,
    timeout: Duration,
    cancel_mode: CancelMode,
}

struct DebounceState<T> {
    /// Most recent payload. Overwritten on every call, consumed at fire time.
    latest: Mutex<Option<T>>,
    /// True while a delayed invocation is outstanding. Only the timer task
    /// elapsing sets this back to false.
    armed: AtomicBool,
    timer: Mutex<Option<JoinHandle<()>>>,
    callback: Mutex<Box<dyn FnMut(T) + Send>>,
}

impl<T> Debug for Debouncer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("is_pending", &self.state.armed.load(Ordering::SeqCst))
            .field("timeout", &self.timeout)
            .field("cancel_mode", &self.cancel_mode)
            .finish()
    }
}

impl<T: Send + 'static> Debouncer<T> {
    /// Creates a debouncer that waits `timeout` before invoking `callback`,
    /// with the default [`CancelMode::KeepArmed`] cancellation behavior.
    pub fn new<F>(timeout: Duration, callback: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        Self::with_cancel_mode(timeout, callback, CancelMode::default())
    }

    /// Like [`new`](Self::new), but with an explicit [`CancelMode`].
    pub fn with_cancel_mode<F>(timeout: Duration, callback: F, cancel_mode: CancelMode) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        Self {
            state: Arc::new(DebounceState {
                latest: Mutex::new(None),
                armed: AtomicBool::new(false),
                timer: Mutex::new(None),
                callback: Mutex::new(Box::new(callback)),
            }),
            timeout,
            cancel_mode,
        }
    }

    /// Schedules an invocation with `payload`.
    ///
    /// The payload unconditionally replaces whatever a previous call supplied,
    /// so among all calls landing in one window, the last one wins. If no
    /// window is open, a timer for the full `timeout` is armed; if one is
    /// already open, its deadline is left untouched. The callback runs from a
    /// spawned task once the timer elapses, so this must be called from within
    /// a tokio runtime.
    ///
    /// Fire and forget: nothing is returned, and neither completion nor the
    /// callback's result can be observed.
    pub fn call(&self, payload: T) {
        *self.state.latest.lock().expect("lock is valid") = Some(payload);

        if self.state.armed.swap(true, Ordering::SeqCst) {
            trace!("window already armed, payload updated");
            return;
        }

        trace!("arming {:?} window", self.timeout);
        let state = self.state.clone();
        let timeout = self.timeout;
        let handle = tokio::task::spawn(async move {
            tokio::time::sleep(timeout).await;
            // disarm before invoking so a call made from inside the callback
            // can open the next window
            state.armed.store(false, Ordering::SeqCst);
            let payload = state.latest.lock().expect("lock is valid").take();
            if let Some(payload) = payload {
                trace!("window elapsed, invoking callback");
                // a callback that panicked in an earlier window poisons this
                // lock; the boxed closure holds no half-mutated state the
                // debouncer relies on, so recover and keep delivering
                let mut callback = state
                    .callback
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                (*callback)(payload);
            }
        });
        *self.state.timer.lock().expect("lock is valid") = Some(handle);
    }

    /// Suppresses the pending invocation, if any.
    ///
    /// Best effort and never fails observably: aborting a timer that already
    /// fired, or cancelling when nothing is pending, is a silent no-op. The
    /// stored handle is reset either way. Whether the window itself is
    /// disarmed depends on the [`CancelMode`] this debouncer was built with.
    pub fn cancel(&self) {
        if let Some(timer) = self.state.timer.lock().expect("lock is valid").take() {
            timer.abort();
            trace!("pending window cancelled");
        }
        if self.cancel_mode == CancelMode::Disarm {
            self.state.armed.store(false, Ordering::SeqCst);
        }
    }
}
