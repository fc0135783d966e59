//! Trailing-edge debouncer
//!
//! Each [`Debouncer::call`] replaces the pending invocation, so only the last
//! call of a burst runs once input has been quiet for the configured delay.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::task::JoinHandle;
use tracing::trace;

type Operation<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

/// Delays an async operation until calls stop arriving
///
/// Must be used from within a tokio runtime. Dropping the debouncer cancels
/// the pending timer. An operation whose timer already fired runs to
/// completion on its own task.
pub struct Debouncer<T> {
    delay: Duration,
    op: Operation<T>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F, Fut>(delay: Duration, op: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let op: Operation<T> = Arc::new(move |args: T| op(args).boxed());
        Self {
            delay,
            op,
            pending: None,
        }
    }

    /// Schedule `op(args)` after the delay, superseding any pending call
    pub fn call(&mut self, args: T) {
        if self.cancel() {
            trace!("Superseded pending debounced call");
        }

        let op = Arc::clone(&self.op);
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(op(args));
        }));
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T> Debouncer<T> {
    /// Cancel the pending call. Returns true if a timer was still armed.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                let armed = !handle.is_finished();
                handle.abort();
                armed
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<T> std::fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish()
    }
}
