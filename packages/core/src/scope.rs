//! Subscription scopes.
//!
//! A [`Scope`] owns every task a state container spawns to consume its
//! inputs. Cancelling the scope aborts those tasks and trips the shared
//! [`CancellationToken`] that gates the container's sinks. Cancellation
//! happens once; later calls are no-ops.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// An owning collection of active subscriptions, cancelled as a unit.
pub struct Scope {
    label: &'static str,
    token: CancellationToken,
    tasks: Mutex<Vec<AbortHandle>>,
    drained: AtomicBool,
}

impl Scope {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            token: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
            drained: AtomicBool::new(false),
        }
    }

    /// The token that trips when this scope is cancelled. Hand it to sinks
    /// so their writes stop at teardown.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Spawn a subscription task owned by this scope.
    ///
    /// Must be called from within a tokio runtime. Spawning into a cancelled
    /// scope drops `task` without running it.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_cancelled() {
            debug!("scope {}: spawn after cancel ignored", self.label);
            return;
        }

        let handle = tokio::spawn(task);
        let mut tasks = self.tasks.lock();
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle.abort_handle());
    }

    /// Cancel every registered subscription.
    ///
    /// Returns `true` only for the call that actually drained the scope.
    pub fn cancel(&self) -> bool {
        if self.drained.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.token.cancel();
        let tasks = std::mem::take(&mut *self.tasks.lock());
        debug!("scope {}: cancelling {} subscriptions", self.label, tasks.len());
        for task in tasks {
            task.abort();
        }
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.drained.load(Ordering::SeqCst)
    }

    /// Subscriptions that are still running.
    pub fn active(&self) -> usize {
        self.tasks
            .lock()
            .iter()
            .filter(|task| !task.is_finished())
            .count()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.cancel();
    }
}
