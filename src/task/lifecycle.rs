//! Request lifecycle state machine.
//!
//! One logical call becomes a strictly sequential series of exchanges:
//!
//! ```text
//! Dispatching ──► Retrying ──► Dispatching (original request)
//!      │    └───► Polling  ──► Dispatching (server location)
//!      ├────────► Completed(T)
//!      └────────► Failed(SdkError)
//! ```
//!
//! The lifecycle owns its [`Operation`] and runs inside a single spawned
//! task, so the retry counter is mutated without synchronization. Every
//! suspension point (exchange in flight, scheduled delay) races against the
//! operation's cancellation token.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{SdkError, SdkResult};
use crate::http::backoff::BackoffCalculator;
use crate::http::exchange::{Exchange, RequestExchanger};
use crate::task::operation::Operation;
use crate::task::scheduler::Scheduler;

/// Current phase of an operation.
#[derive(Debug)]
pub(crate) enum Phase<T> {
    Dispatching(Url),
    Retrying(Duration),
    Polling { location: Url, delay: Duration },
    Completed(T),
    Failed(SdkError),
}

pub(crate) struct TaskLifecycle<T> {
    exchanger: Arc<RequestExchanger>,
    scheduler: Scheduler,
    backoff: BackoffCalculator,
    max_retries: u32,
    operation: Operation,
    cancel: CancellationToken,
    _result: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned + Send + 'static> TaskLifecycle<T> {
    pub(crate) fn new(
        exchanger: Arc<RequestExchanger>,
        scheduler: Scheduler,
        backoff: BackoffCalculator,
        max_retries: u32,
        operation: Operation,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            exchanger,
            scheduler,
            backoff,
            max_retries,
            operation,
            cancel,
            _result: PhantomData,
        }
    }

    /// Drive the operation to a terminal phase.
    pub(crate) async fn run(mut self) -> SdkResult<T> {
        let mut phase = Phase::Dispatching(self.operation.target().clone());
        loop {
            phase = match phase {
                Phase::Dispatching(url) => {
                    let outcome = self.dispatch(&url).await;
                    self.transition(outcome)
                }
                Phase::Retrying(delay) => {
                    self.scheduler.delay(delay, &self.cancel).await?;
                    Phase::Dispatching(self.operation.target().clone())
                }
                Phase::Polling { location, delay } => {
                    self.scheduler.delay(delay, &self.cancel).await?;
                    Phase::Dispatching(location)
                }
                Phase::Completed(value) => return Ok(value),
                Phase::Failed(err) => return Err(err),
            };
        }
    }

    async fn dispatch(&self, url: &Url) -> SdkResult<Exchange<T>> {
        if self.cancel.is_cancelled() {
            return Err(SdkError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SdkError::Cancelled),
            outcome = self.exchanger.exchange::<T>(url) => outcome,
        }
    }

    /// Decide the next phase from one exchange outcome.
    pub(crate) fn transition(&mut self, outcome: SdkResult<Exchange<T>>) -> Phase<T> {
        match outcome {
            Err(err) => Phase::Failed(err),

            Ok(Exchange::Retryable { status, path }) => {
                let retries = self.operation.retries();
                if retries >= self.max_retries {
                    tracing::debug!(status, path = %path, retries, "Retry budget exhausted");
                    return Phase::Failed(SdkError::RetryBudgetExhausted {
                        status,
                        path,
                        retries,
                    });
                }

                let retries = self.operation.record_retry();
                let delay = self.backoff.delay(retries, None);
                tracing::debug!(
                    status,
                    path = %path,
                    retries,
                    max_retries = self.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying request after transient error"
                );
                Phase::Retrying(delay)
            }

            Ok(Exchange::Pending {
                location,
                retry_after,
            }) => {
                self.operation.reset_retries();
                let delay = self.backoff.delay(0, Some(retry_after));
                tracing::debug!(
                    location = %location,
                    delay_ms = delay.as_millis() as u64,
                    "Result not ready, polling"
                );
                Phase::Polling { location, delay }
            }

            Ok(Exchange::Decoded {
                status,
                path,
                envelope,
            }) => match envelope.into_result(status, &path) {
                Ok(value) => Phase::Completed(value),
                Err(err) => Phase::Failed(err),
            },

            Ok(Exchange::TransportFailure(err)) => Phase::Failed(err.into()),
        }
    }

    #[cfg(test)]
    pub(crate) fn retries(&self) -> u32 {
        self.operation.retries()
    }
}
