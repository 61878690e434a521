//! Time source for the node's fixed-interval waits
//!
//! Both long-running loops only ever wait through a `Clock`, so tests can
//! swap in a clock that records the requested delays instead of sleeping.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub trait Clock: Clone + Send + Sync + 'static {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Wall-clock waits on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Sleep for `duration` unless `cancel` fires first.
///
/// Returns `false` when the caller should stop its loop.
pub async fn pause<C: Clock>(clock: &C, duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = clock.sleep(duration) => true,
    }
}
