//! Fire-and-forget work that shutdown waits for.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::Notify;
use tracing::{debug, error, warn};

use crate::middleware::recover::panic_message;

#[derive(Debug, Default)]
struct Inner {
    active: AtomicUsize,
    idle: Notify,
}

/// Tracks spawned background tasks so they can be drained on shutdown.
///
/// A panicking task is logged and counted as finished; it never takes the
/// process down.
#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    inner: Arc<Inner>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.inner.active.fetch_add(1, Ordering::SeqCst);
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            if let Err(panic) = AssertUnwindSafe(task).catch_unwind().await {
                error!(task = name, panic_message = %panic_message(panic.as_ref()), "Background task panicked");
            }
            if inner.active.fetch_sub(1, Ordering::SeqCst) == 1 {
                inner.idle.notify_waiters();
            }
        });
    }

    /// Number of tasks still running.
    pub fn active(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Waits for every tracked task to finish, up to `grace`.
    ///
    /// Returns `false` if tasks were still running when the grace period ran out.
    pub async fn drain(&self, grace: Duration) -> bool {
        let wait = async {
            loop {
                let idle = self.inner.idle.notified();
                if self.active() == 0 {
                    return;
                }
                idle.await;
            }
        };

        match tokio::time::timeout(grace, wait).await {
            Ok(()) => {
                debug!("Background tasks drained");
                true
            }
            Err(_) => {
                warn!(remaining = self.active(), "Background tasks still running after grace period");
                false
            }
        }
    }
}
