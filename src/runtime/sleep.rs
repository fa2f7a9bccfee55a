//! Sleep implementation using browser timers

use gloo_timers::future::TimeoutFuture;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// A future that resolves after a specified duration
pub struct WasmSleep {
    timer: TimeoutFuture,
}

impl WasmSleep {
    /// Create a new sleep future
    pub fn new(duration: Duration) -> Self {
        // setTimeout takes a 32-bit delay
        let millis = duration.as_millis().min(u32::MAX as u128) as u32;

        Self {
            timer: TimeoutFuture::new(millis),
        }
    }
}

impl Future for WasmSleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.timer).poll(cx)
    }
}
