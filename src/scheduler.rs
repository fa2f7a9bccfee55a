//! Render Scheduler
//!
//! Drives an offline render to completion. Browsers may create offline
//! contexts in the `suspended` state (and keep them there while the tab is in
//! the background), so starting a render is a small state machine:
//!
//! ```text
//!          start_rendering()
//! Idle ──────────────────────▶ state()?
//!                                ├─ Running   ──▶ await completion │ watchdog ──▶ Completed / Failed(Timeout)
//!                                ├─ Suspended ──▶ budget left? ── yes ─▶ sleep(retry delay) ─▶ start again
//!                                │                     └─ no ──▶ Failed(Suspended)
//!                                └─ Closed    ──▶ Failed(ContextClosed)
//! ```
//!
//! Suspended attempts only consume the resume budget while the page is in the
//! foreground. In the background the browser itself is throttling us, so the
//! scheduler keeps retrying without spending tries.
//!
//! Each job owns exactly one completion receiver, taken from the context when
//! the job is created. Once a job reaches a terminal state the receiver is
//! gone, and a late `oncomplete` from the engine lands nowhere.

use futures::future::{self, Either};
use web_time::Instant;

use crate::config::FingerprintConfig;
use crate::engine::{ContextState, RenderCompletion, RenderContext, SampleBuffer};
use crate::error::{FingerprintError, Result};
use crate::runtime::Host;

/// Lifecycle of a render job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running,
    Suspended,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// One request to the audio engine and its retry bookkeeping
pub struct RenderJob<C: RenderContext> {
    context: C,
    state: JobState,
    resume_tries_left: u32,
    attempts: u32,
    background_attempts: u32,
    completion: Option<RenderCompletion>,
}

impl<C: RenderContext> RenderJob<C> {
    /// Wrap a freshly built context.
    ///
    /// Fails if the context's completion receiver was already handed out.
    pub fn new(mut context: C, resume_tries: u32) -> Result<Self> {
        let completion = context.take_completion().ok_or_else(|| {
            FingerprintError::InvalidState("render context completion already taken".into())
        })?;
        Ok(Self {
            context,
            state: JobState::Idle,
            resume_tries_left: resume_tries,
            attempts: 0,
            background_attempts: 0,
            completion: Some(completion),
        })
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Foreground resume attempts still available
    pub fn resume_tries_left(&self) -> u32 {
        self.resume_tries_left
    }

    /// `start_rendering()` calls issued for this job
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Attempts made while the page was hidden
    pub fn background_attempts(&self) -> u32 {
        self.background_attempts
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    fn fail(&mut self, err: FingerprintError) -> Result<SampleBuffer> {
        self.state = JobState::Failed;
        self.completion = None;
        Err(err)
    }

    fn finish(
        &mut self,
        delivered: std::result::Result<Result<SampleBuffer>, futures::channel::oneshot::Canceled>,
    ) -> Result<SampleBuffer> {
        match delivered {
            Ok(Ok(buffer)) => {
                self.state = JobState::Completed;
                self.completion = None;
                Ok(buffer)
            }
            Ok(Err(err)) => self.fail(err),
            Err(_) => self.fail(FingerprintError::CompletionDropped),
        }
    }
}

/// Drives render jobs through start, resume and watchdog
pub struct RenderScheduler<H> {
    host: H,
    config: FingerprintConfig,
}

impl<H: Host> RenderScheduler<H> {
    pub fn new(host: H, config: FingerprintConfig) -> Self {
        Self { host, config }
    }

    pub fn config(&self) -> &FingerprintConfig {
        &self.config
    }

    /// Create a job for `context` with this scheduler's resume budget
    pub fn job<C: RenderContext>(&self, context: C) -> Result<RenderJob<C>> {
        RenderJob::new(context, self.config.resume_tries)
    }

    /// Run `job` until the engine delivers its buffer or the job fails.
    pub async fn render<C: RenderContext>(&self, job: &mut RenderJob<C>) -> Result<SampleBuffer> {
        if job.state.is_terminal() {
            return Err(FingerprintError::InvalidState(format!(
                "render job already {:?}",
                job.state
            )));
        }
        let mut completion = match job.completion.take() {
            Some(completion) => completion,
            None => {
                return job.fail(FingerprintError::InvalidState(
                    "render job has no completion".into(),
                ))
            }
        };
        let started = Instant::now();

        loop {
            if let Err(e) = job.context.start_rendering() {
                log::warn!("⚠️ startRendering() failed: {}", e);
                return job.fail(e);
            }
            job.attempts += 1;

            match job.context.state() {
                ContextState::Running => {
                    job.state = JobState::Running;
                    log::debug!("  ▶️ Render running after {} attempt(s)", job.attempts);
                    break;
                }
                ContextState::Suspended => {
                    job.state = JobState::Suspended;
                    if self.host.is_hidden() {
                        job.background_attempts += 1;
                    } else {
                        job.resume_tries_left = job.resume_tries_left.saturating_sub(1);
                    }
                    log::debug!(
                        "  ⏸️ Render suspended (attempt {}, {} foreground tries left)",
                        job.attempts,
                        job.resume_tries_left
                    );

                    if job.resume_tries_left == 0 {
                        log::warn!(
                            "⚠️ Render context still suspended after {} attempts",
                            job.attempts
                        );
                        return job.fail(FingerprintError::Suspended {
                            attempts: job.attempts,
                        });
                    }

                    let delay = self.host.sleep(self.config.resume_retry_delay());
                    match future::select(&mut completion, delay).await {
                        Either::Left((delivered, _)) => return job.finish(delivered),
                        Either::Right(((), _)) => continue,
                    }
                }
                ContextState::Closed => {
                    log::warn!("⚠️ Render context closed before rendering");
                    return job.fail(FingerprintError::ContextClosed);
                }
            }
        }

        let watchdog = self.host.sleep(self.config.render_timeout());
        match future::select(&mut completion, watchdog).await {
            Either::Left((delivered, _)) => {
                let result = job.finish(delivered);
                if result.is_ok() {
                    log::debug!(
                        "  ✅ Render completed in {}ms",
                        started.elapsed().as_millis()
                    );
                }
                result
            }
            Either::Right(((), _)) => {
                log::warn!(
                    "⏰ Render did not complete within {}ms of starting",
                    self.config.render_timeout_ms
                );
                job.fail(FingerprintError::Timeout {
                    timeout_ms: self.config.render_timeout_ms,
                })
            }
        }
    }
}
