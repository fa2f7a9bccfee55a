//! Deterministic fakes for the engine, host and display.

use futures::channel::oneshot;
use futures::future::{self, LocalBoxFuture};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::display::FingerprintDisplay;
use crate::engine::{
    AudioEngine, ContextState, RenderCompletion, RenderContext, RenderRequest, SampleBuffer,
};
use crate::error::{FingerprintError, Result};
use crate::runtime::Host;

/// Host with a virtual clock: every sleep resolves immediately and advances it.
pub(crate) struct ManualHost {
    clock: Cell<Duration>,
    sleeps: RefCell<Vec<Duration>>,
    hidden: Cell<bool>,
    hidden_checks: Cell<u32>,
}

impl ManualHost {
    pub fn new() -> Self {
        Self {
            clock: Cell::new(Duration::ZERO),
            sleeps: RefCell::new(Vec::new()),
            hidden: Cell::new(false),
            hidden_checks: Cell::new(0),
        }
    }

    pub fn set_hidden(&self, hidden: bool) {
        self.hidden.set(hidden);
    }

    /// Report the page as hidden for the next `checks` visibility queries
    pub fn hide_for_checks(&self, checks: u32) {
        self.hidden_checks.set(checks);
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.get()
    }
}

impl Host for ManualHost {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        self.sleeps.borrow_mut().push(duration);
        self.clock.set(self.clock.get() + duration);
        Box::pin(future::ready(()))
    }

    fn is_hidden(&self) -> bool {
        let remaining = self.hidden_checks.get();
        if remaining > 0 {
            self.hidden_checks.set(remaining - 1);
            return true;
        }
        self.hidden.get()
    }
}

type SharedSender = Rc<RefCell<Option<oneshot::Sender<Result<SampleBuffer>>>>>;

/// Context that reports a scripted state after each start request.
///
/// The last scripted state repeats forever. The scripted output is delivered
/// on the start call that first observes `Running`.
pub(crate) struct ScriptedContext {
    states: Vec<ContextState>,
    start_calls: Cell<u32>,
    output: RefCell<Option<Result<SampleBuffer>>>,
    deliver_while_suspended: bool,
    fail_start: bool,
    sender: SharedSender,
    completion: Option<RenderCompletion>,
}

/// Lets a test fire the engine's completion by hand
pub(crate) struct CompletionHandle {
    sender: SharedSender,
}

impl CompletionHandle {
    /// Returns whether anyone was still waiting for the buffer
    pub fn deliver(&self, buffer: SampleBuffer) -> bool {
        match self.sender.borrow_mut().take() {
            Some(tx) => tx.send(Ok(buffer)).is_ok(),
            None => false,
        }
    }
}

impl ScriptedContext {
    pub fn new(states: Vec<ContextState>) -> Self {
        assert!(!states.is_empty(), "script needs at least one state");
        let (tx, rx) = oneshot::channel();
        Self {
            states,
            start_calls: Cell::new(0),
            output: RefCell::new(None),
            deliver_while_suspended: false,
            fail_start: false,
            sender: Rc::new(RefCell::new(Some(tx))),
            completion: Some(rx),
        }
    }

    pub fn completes_with(self, samples: Vec<f32>) -> Self {
        self.completes_with_buffer(SampleBuffer::mono(44100.0, samples))
    }

    pub fn completes_with_buffer(self, buffer: SampleBuffer) -> Self {
        *self.output.borrow_mut() = Some(Ok(buffer));
        self
    }

    /// Deliver an engine-side failure instead of a buffer
    pub fn completes_with_error(self, err: FingerprintError) -> Self {
        *self.output.borrow_mut() = Some(Err(err));
        self
    }

    pub fn delivers_while_suspended(mut self) -> Self {
        self.deliver_while_suspended = true;
        self
    }

    pub fn fails_to_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Drop the sending side so the completion resolves as cancelled
    pub fn drops_completion(self) -> Self {
        self.sender.borrow_mut().take();
        self
    }

    pub fn completion_handle(&self) -> CompletionHandle {
        CompletionHandle {
            sender: Rc::clone(&self.sender),
        }
    }

    pub fn start_calls(&self) -> u32 {
        self.start_calls.get()
    }

    fn current_state(&self) -> ContextState {
        let index = (self.start_calls.get() as usize)
            .saturating_sub(1)
            .min(self.states.len() - 1);
        self.states[index]
    }
}

impl RenderContext for ScriptedContext {
    fn start_rendering(&self) -> Result<()> {
        if self.fail_start {
            return Err(FingerprintError::Engine("scripted start failure".into()));
        }
        self.start_calls.set(self.start_calls.get() + 1);

        let deliver = match self.current_state() {
            ContextState::Running => true,
            ContextState::Suspended => self.deliver_while_suspended,
            ContextState::Closed => false,
        };
        if deliver {
            if let Some(output) = self.output.borrow_mut().take() {
                if let Some(tx) = self.sender.borrow_mut().take() {
                    let _ = tx.send(output);
                }
            }
        }
        Ok(())
    }

    fn state(&self) -> ContextState {
        self.current_state()
    }

    fn take_completion(&mut self) -> Option<RenderCompletion> {
        self.completion.take()
    }
}

/// Engine whose contexts come from a per-request script
pub(crate) struct ScriptedEngine {
    script: Box<dyn Fn(&RenderRequest) -> ScriptedContext>,
    requests: RefCell<Vec<RenderRequest>>,
}

impl ScriptedEngine {
    pub fn new(script: impl Fn(&RenderRequest) -> ScriptedContext + 'static) -> Self {
        Self {
            script: Box::new(script),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Fingerprint renders get `fingerprint`, single-sample renders get `fudge`
    pub fn split(
        fingerprint: impl Fn() -> ScriptedContext + 'static,
        fudge: impl Fn() -> ScriptedContext + 'static,
    ) -> Self {
        Self::new(move |request| {
            if request.length == 1 {
                fudge()
            } else {
                fingerprint()
            }
        })
    }

    pub fn requests(&self) -> Vec<RenderRequest> {
        self.requests.borrow().clone()
    }
}

impl AudioEngine for ScriptedEngine {
    type Context = ScriptedContext;

    fn create_context(&self, request: &RenderRequest) -> Result<ScriptedContext> {
        request.validate()?;
        self.requests.borrow_mut().push(request.clone());
        Ok((self.script)(request))
    }
}

/// Display that remembers what it was shown
#[derive(Default)]
pub(crate) struct RecordingDisplay {
    shown: RefCell<Vec<f64>>,
}

impl RecordingDisplay {
    pub fn shown(&self) -> Vec<f64> {
        self.shown.borrow().clone()
    }
}

impl FingerprintDisplay for RecordingDisplay {
    fn show(&self, value: f64) -> Result<()> {
        self.shown.borrow_mut().push(value);
        Ok(())
    }
}
