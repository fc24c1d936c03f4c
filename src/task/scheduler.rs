//! Delayed-task facility shared by every operation of a client.

use std::future::Future;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{SdkError, SdkResult};

/// Spawns lifecycles and parks them between exchanges without blocking a
/// thread.
#[derive(Debug, Clone)]
pub struct Scheduler {
    handle: Handle,
}

impl Scheduler {
    /// Use the runtime the caller is running on.
    pub fn current() -> SdkResult<Self> {
        Handle::try_current()
            .map(Self::from_handle)
            .map_err(|_| {
                SdkError::Config(
                    "no tokio runtime available; build the client inside a runtime or pass one with `runtime()`"
                        .to_string(),
                )
            })
    }

    pub fn from_handle(handle: Handle) -> Self {
        Self { handle }
    }

    pub(crate) fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }

    /// Wait `duration`, or fail with `Cancelled` as soon as `cancel` fires.
    pub(crate) async fn delay(&self, duration: Duration, cancel: &CancellationToken) -> SdkResult<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SdkError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}
