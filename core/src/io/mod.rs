//! I/O utilities

use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::*;
use std::time::Duration;

pin_project! {
    /// Cancellable accepts a param `future` for I/O,
    /// abort the I/O waiting when `cancel_future` returns.
    ///
    /// The `cancel_future` can be timer or notification channel recv()
    pub struct Cancellable<F, C> {
        #[pin]
        future: F,
        #[pin]
        cancel_future: C,
    }
}

impl<F: Future, C: Future> Cancellable<F, C> {
    pub fn new(future: F, cancel_future: C) -> Self {
        Self { future, cancel_future }
    }
}

impl<F: Future, C: Future> Future for Cancellable<F, C> {
    type Output = Result<F::Output, ()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        if let Poll::Ready(output) = this.future.poll(cx) {
            return Poll::Ready(Ok(output));
        }
        if let Poll::Ready(_) = this.cancel_future.poll(cx) {
            return Poll::Ready(Err(()));
        }
        return Poll::Pending;
    }
}

/// Run `func` with a timer, a zero duration means no timeout.
///
/// Returns Err(()) when the timer fires first.
#[inline]
pub async fn timeout<F: Future>(d: Duration, func: F) -> Result<F::Output, ()> {
    if d.is_zero() {
        return Ok(func.await);
    }
    let r = Cancellable::new(func, tokio::time::sleep(d)).await;
    if r.is_err() {
        trace!("io timeout after {:?}", d);
    }
    r
}

/// Because timeout function return () as error, this macro convert to io::Error
#[macro_export]
macro_rules! io_with_timeout {
    ($timeout: expr, $f: expr) => {{
        match $crate::io::timeout($timeout, $f).await {
            Ok(Ok(r)) => Ok(r),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(std::io::Error::from(std::io::ErrorKind::TimedOut)),
        }
    }};
}
pub use crate::io_with_timeout;
