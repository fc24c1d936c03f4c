//! Caller-facing handle for a running operation.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{SdkError, SdkResult};

/// Single-assignment result of an operation.
///
/// Await it to get the value or the terminal error. [`cancel`](Self::cancel)
/// aborts the in-flight exchange or the pending retry/poll delay, whichever
/// is outstanding; it is a no-op once the operation has finished. Dropping an
/// unfinished handle cancels the operation.
pub struct ResultHandle<T> {
    task: JoinHandle<SdkResult<T>>,
    cancel: CancellationToken,
}

impl<T> ResultHandle<T> {
    pub(crate) fn new(task: JoinHandle<SdkResult<T>>, cancel: CancellationToken) -> Self {
        Self { task, cancel }
    }

    /// Request cancellation. Safe to call any number of times, in any state.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the operation reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Await the result for at most `timeout`, cancelling the operation if
    /// it is still running by then.
    pub async fn wait_timeout(mut self, timeout: Duration) -> SdkResult<T> {
        match tokio::time::timeout(timeout, &mut self).await {
            Ok(result) => result,
            Err(_) => {
                self.cancel();
                Err(SdkError::DeadlineExceeded)
            }
        }
    }
}

impl<T> Future for ResultHandle<T> {
    type Output = SdkResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match ready!(Pin::new(&mut this.task).poll(cx)) {
            Ok(result) => Poll::Ready(result),
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            // Runtime shut down underneath the operation.
            Err(_) => Poll::Ready(Err(SdkError::Cancelled)),
        }
    }
}

impl<T> Drop for ResultHandle<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<T> fmt::Debug for ResultHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultHandle")
            .field("finished", &self.is_finished())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn spawn_with_token<F>(make: impl FnOnce(CancellationToken) -> F) -> ResultHandle<u32>
    where
        F: Future<Output = SdkResult<u32>> + Send + 'static,
    {
        let token = CancellationToken::new();
        let task = tokio::spawn(make(token.clone()));
        ResultHandle::new(task, token)
    }

    #[tokio::test]
    async fn test_handle_resolves_value() {
        let handle = spawn_with_token(|_| async { Ok(7) });
        assert_eq!(assert_ok!(handle.await), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_propagates_to_work() {
        let handle = spawn_with_token(|token| async move {
            tokio::select! {
                _ = token.cancelled() => Err(SdkError::Cancelled),
                _ = tokio::time::sleep(Duration::from_secs(60)) => Ok(1),
            }
        });
        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
        let err = assert_err!(handle.await);
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_after_completion_is_noop() {
        let handle = spawn_with_token(|_| async { Ok(3) });
        tokio::task::yield_now().await;
        while !handle.is_finished() {
            tokio::task::yield_now().await;
        }
        handle.cancel();
        assert_eq!(assert_ok!(handle.await), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_timeout_cancels_work() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let handle = spawn_with_token(|token| async move {
            token.cancelled().await;
            let _ = tx.send(());
            Err(SdkError::Cancelled)
        });

        let err = assert_err!(handle.wait_timeout(Duration::from_secs(5)).await);
        assert!(matches!(err, SdkError::DeadlineExceeded));
        assert_ok!(rx.await);
    }

    #[tokio::test]
    async fn test_drop_cancels_work() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let handle = spawn_with_token(|token| async move {
            token.cancelled().await;
            let _ = tx.send(());
            Ok(0)
        });
        drop(handle);
        assert_ok!(rx.await);
    }
}
