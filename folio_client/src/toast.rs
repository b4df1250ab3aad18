use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::task::JoinHandle;
use tracing::trace;

use crate::form::{Notification, Notifier};

pub const DEFAULT_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToastState {
    Hidden,
    Visible(Notification),
}

/// A transient notification that hides itself after a fixed duration.
///
/// Showing a new notification replaces the current one and restarts the
/// timer. Dropping the toast cancels a pending timer. Must be used from
/// within a tokio runtime.
#[derive(Debug)]
pub struct Toast {
    duration: Duration,
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug)]
struct Inner {
    state: ToastState,
    timer: Option<JoinHandle<()>>,
    generation: u64,
}

impl Default for Toast {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION)
    }
}

impl Toast {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            inner: Arc::new(Mutex::new(Inner {
                state: ToastState::Hidden,
                timer: None,
                generation: 0,
            })),
        }
    }

    pub fn show(&self, notification: Notification) {
        let mut inner = lock(&self.inner);
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }

        inner.generation += 1;
        inner.state = ToastState::Visible(notification);

        let generation = inner.generation;
        let shared = Arc::clone(&self.inner);
        let duration = self.duration;
        inner.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let mut inner = lock(&shared);
            // a newer notification owns the toast now
            if inner.generation == generation {
                trace!("hiding toast");
                inner.state = ToastState::Hidden;
                inner.timer = None;
            }
        }));
    }

    pub fn hide(&self) {
        let mut inner = lock(&self.inner);
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
        inner.state = ToastState::Hidden;
    }

    pub fn state(&self) -> ToastState {
        lock(&self.inner).state.clone()
    }
}

impl Notifier for Toast {
    fn notify(&self, notification: Notification) {
        self.show(notification);
    }
}

impl Drop for Toast {
    fn drop(&mut self) {
        if let Some(timer) = lock(&self.inner).timer.take() {
            timer.abort();
        }
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}
