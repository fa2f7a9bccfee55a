//! Browser host capabilities
//!
//! The render scheduler needs exactly two things from its environment:
//! timers and whether the page is currently hidden. Both sit behind the
//! [`Host`] trait so the retry logic can run against a manual clock in tests.

use futures::future::LocalBoxFuture;
use std::time::Duration;

mod sleep;
mod visibility;

pub use sleep::WasmSleep;
pub use visibility::document_hidden;

/// Timers and page visibility as seen by the scheduler
pub trait Host {
    /// A future that resolves after `duration`
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;

    /// Whether the hosting page is in the background
    fn is_hidden(&self) -> bool;
}

impl<H: Host + ?Sized> Host for &H {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        (**self).sleep(duration)
    }

    fn is_hidden(&self) -> bool {
        (**self).is_hidden()
    }
}

/// Host backed by browser timers and `document.hidden`
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserHost;

impl BrowserHost {
    pub fn new() -> Self {
        Self
    }
}

impl Host for BrowserHost {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(WasmSleep::new(duration))
    }

    fn is_hidden(&self) -> bool {
        document_hidden()
    }
}
