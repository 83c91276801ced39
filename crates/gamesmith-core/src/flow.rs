//! The generation request flow.
//!
//! [`GenerationRequestFlow::run`] takes a prompt through one complete
//! generation:
//!
//! ```text
//! idle -> requesting -> {retry-wait -> requesting}* -> {succeeded | failed}
//! ```
//!
//! Each attempt is raced against the per-attempt timeout and the caller's
//! cancellation token.  Only a timeout leads to `retry-wait`; every other
//! failure is terminal.  While attempts are outstanding a
//! [`ProgressSimulator`] advances the displayed percentage.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::error::{GenerationError, Result};
use crate::fence::strip_code_fences;
use crate::progress::{ProgressMeter, ProgressSimulator};
use crate::request::GenerationRequest;
use crate::response::decode_response;
use crate::status::{FlowStatus, StatusSink};
use crate::transport::{CompletionTransport, RawResponse, TransportError};

/// Appended to every failure shown on the status channel.
const RETRY_GUIDANCE: &str = "please retry or refine the description";

// ---------------------------------------------------------------------------
// Result and attempt types
// ---------------------------------------------------------------------------

/// Generated code ready for the display sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedCode {
    /// The generated document with fence markers removed.
    pub code: String,
    /// Attempts issued, including the successful one.
    pub attempts: u32,
}

/// Terminal value of a run.
pub type GenerationResult = Result<ExtractedCode>;

/// Lifecycle of the current attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Pending,
    Succeeded,
    TimedOut,
    Failed,
}

/// Bookkeeping for the attempt in flight.  Lives only for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationAttemptState {
    /// Retries issued so far (0 for the first attempt).
    pub attempt_number: u32,
    pub status: AttemptStatus,
    pub progress_percent: u8,
}

impl GenerationAttemptState {
    fn new() -> Self {
        Self {
            attempt_number: 0,
            status: AttemptStatus::Pending,
            progress_percent: 0,
        }
    }

    /// Attempts issued so far, counting the current one.
    pub fn attempts(&self) -> u32 {
        self.attempt_number + 1
    }

    /// Record how the current attempt ended.
    fn settle(&mut self, status: AttemptStatus) {
        self.status = status;
        debug!(
            attempt = self.attempts(),
            status = ?self.status,
            progress = self.progress_percent,
            "attempt settled"
        );
    }
}

/// How a single attempt settled.
#[derive(Debug)]
enum AttemptOutcome {
    Response(RawResponse),
    TimedOut,
    TransportFailure(TransportError),
    Cancelled,
}

// ---------------------------------------------------------------------------
// Flow
// ---------------------------------------------------------------------------

/// Runs generations against a [`CompletionTransport`], reporting to a
/// [`StatusSink`].
///
/// A flow runs one generation at a time; a concurrent call to
/// [`run`](Self::run) on the same flow fails with [`GenerationError::Busy`].
pub struct GenerationRequestFlow {
    config: GeneratorConfig,
    transport: Arc<dyn CompletionTransport>,
    sink: Arc<dyn StatusSink>,
    in_flight: AtomicBool,
}

impl GenerationRequestFlow {
    pub fn new(
        config: GeneratorConfig,
        transport: Arc<dyn CompletionTransport>,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            config,
            transport,
            sink,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Whether a generation is currently running.
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Generate code for `prompt`.
    pub async fn run(&self, prompt: &str) -> GenerationResult {
        self.run_with_cancel(prompt, CancellationToken::new()).await
    }

    /// Generate code for `prompt`, aborting when `cancel` fires.
    ///
    /// An empty prompt fails with [`GenerationError::UserInput`] before any
    /// network or progress activity.  Every other failure resets progress to
    /// 0 and is reported on the status channel before being returned.
    pub async fn run_with_cancel(&self, prompt: &str, cancel: CancellationToken) -> GenerationResult {
        if prompt.trim().is_empty() {
            return Err(GenerationError::UserInput);
        }
        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        let meter = ProgressMeter::new(Arc::clone(&self.sink));
        match self.execute(prompt, &meter, &cancel).await {
            Ok(extracted) => {
                info!(
                    attempts = extracted.attempts,
                    bytes = extracted.code.len(),
                    "generation completed"
                );
                self.sink.status(&FlowStatus::Completed);
                Ok(extracted)
            }
            Err(err) => {
                warn!(error = %err, "generation failed");
                meter.set(0);
                self.sink.status(&FlowStatus::Failed {
                    message: format!("{err} - {RETRY_GUIDANCE}"),
                });
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        prompt: &str,
        meter: &ProgressMeter,
        cancel: &CancellationToken,
    ) -> Result<ExtractedCode> {
        meter.set(0);
        self.sink.status(&FlowStatus::Generating);

        let simulator = ProgressSimulator::start(
            meter.clone(),
            self.config.progress_interval(),
            self.config.progress_step,
            self.config.progress_ceiling,
        );
        let settled = self.send_with_retries(prompt, meter, cancel).await;
        simulator.stop().await;
        let (response, attempts) = settled?;

        meter.set(100);
        self.sink.status(&FlowStatus::Processing);
        debug!(status = response.status, bytes = response.body.len(), "response received");

        let content = decode_response(&response)?;
        let code = strip_code_fences(&content).trim().to_owned();
        if code.is_empty() {
            return Err(GenerationError::Unexpected {
                reason: "response contained no code".into(),
            });
        }

        Ok(ExtractedCode { code, attempts })
    }

    /// Issue attempts until one settles with a response, retrying only on
    /// timeout.  Returns the response and the number of attempts issued.
    async fn send_with_retries(
        &self,
        prompt: &str,
        meter: &ProgressMeter,
        cancel: &CancellationToken,
    ) -> Result<(RawResponse, u32)> {
        let max_retries = self.config.max_retries;
        let mut state = GenerationAttemptState::new();

        loop {
            let request = GenerationRequest::new(prompt, &self.config);
            state.status = AttemptStatus::Pending;
            state.progress_percent = meter.get();
            debug!(
                attempt = state.attempts(),
                max_attempts = max_retries + 1,
                status = ?state.status,
                progress = state.progress_percent,
                "issuing attempt"
            );

            match self.attempt(&request, cancel).await {
                AttemptOutcome::Response(response) => {
                    state.settle(AttemptStatus::Succeeded);
                    return Ok((response, state.attempts()));
                }
                AttemptOutcome::TimedOut => {
                    state.settle(AttemptStatus::TimedOut);
                    if state.attempt_number >= max_retries {
                        return Err(GenerationError::Timeout {
                            attempts: state.attempts(),
                        });
                    }

                    state.attempt_number += 1;
                    warn!(
                        retry = state.attempt_number,
                        max_retries,
                        backoff = ?self.config.retry_backoff(),
                        "attempt timed out, retrying"
                    );
                    self.sink.status(&FlowStatus::Retrying {
                        attempt: state.attempt_number,
                        max: max_retries,
                    });

                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return Err(GenerationError::Cancelled),
                        () = tokio::time::sleep(self.config.retry_backoff()) => {}
                    }
                }
                AttemptOutcome::TransportFailure(e) => {
                    state.settle(AttemptStatus::Failed);
                    return Err(GenerationError::Transport { reason: e.reason });
                }
                AttemptOutcome::Cancelled => {
                    state.settle(AttemptStatus::Failed);
                    return Err(GenerationError::Cancelled);
                }
            }
        }
    }

    /// Race one transport exchange against the timeout and the caller's
    /// token.  The losing exchange future is dropped, aborting the request.
    async fn attempt(&self, request: &GenerationRequest, cancel: &CancellationToken) -> AttemptOutcome {
        tokio::select! {
            biased;
            () = cancel.cancelled() => AttemptOutcome::Cancelled,
            () = tokio::time::sleep(self.config.attempt_timeout()) => AttemptOutcome::TimedOut,
            result = self.transport.send(request) => match result {
                Ok(response) => AttemptOutcome::Response(response),
                Err(e) => AttemptOutcome::TransportFailure(e),
            },
        }
    }
}

impl std::fmt::Debug for GenerationRequestFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationRequestFlow")
            .field("config", &self.config)
            .field("in_flight", &self.is_running())
            .finish_non_exhaustive()
    }
}

/// Holds the single-flight flag for the duration of a run.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| GenerationError::Busy)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    /// Never answers; every attempt runs into the timeout.
    struct Silent {
        calls: AtomicU32,
    }

    #[async_trait]
    impl CompletionTransport for Silent {
        async fn send(&self, _: &GenerationRequest) -> std::result::Result<RawResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    #[derive(Default)]
    struct Statuses(Mutex<Vec<FlowStatus>>);

    impl StatusSink for Statuses {
        fn progress(&self, _: u8) {}
        fn status(&self, status: &FlowStatus) {
            self.0.lock().unwrap().push(status.clone());
        }
    }

    fn flow(transport: Arc<dyn CompletionTransport>, sink: Arc<dyn StatusSink>) -> GenerationRequestFlow {
        GenerationRequestFlow::new(GeneratorConfig::default(), transport, sink)
    }

    #[test]
    fn attempt_state_counts_current_attempt() {
        let mut state = GenerationAttemptState::new();
        assert_eq!(state.attempts(), 1);
        state.attempt_number = 3;
        assert_eq!(state.attempts(), 4);
    }

    #[test]
    fn settle_records_attempt_outcome() {
        let mut state = GenerationAttemptState::new();
        assert_eq!(state.status, AttemptStatus::Pending);
        state.settle(AttemptStatus::TimedOut);
        assert_eq!(state.status, AttemptStatus::TimedOut);
        state.settle(AttemptStatus::Succeeded);
        assert_eq!(state.status, AttemptStatus::Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_run_is_busy() {
        let transport = Arc::new(Silent {
            calls: AtomicU32::new(0),
        });
        let flow = Arc::new(flow(transport, Arc::new(Statuses::default())));

        let background = {
            let flow = Arc::clone(&flow);
            tokio::spawn(async move { flow.run("tetris").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(flow.is_running());

        let err = flow.run("snake").await.unwrap_err();
        assert!(matches!(err, GenerationError::Busy));

        background.abort();
        let _ = background.await;
        assert!(!flow.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_attempt_is_not_retried() {
        let transport = Arc::new(Silent {
            calls: AtomicU32::new(0),
        });
        let sink = Arc::new(Statuses::default());
        let flow = flow(transport.clone(), sink.clone());

        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let err = flow.run_with_cancel("pong", token).await.unwrap_err();
        assert!(matches!(err, GenerationError::Cancelled));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

        let statuses = sink.0.lock().unwrap();
        assert!(
            !statuses
                .iter()
                .any(|s| matches!(s, FlowStatus::Retrying { .. }))
        );
        assert!(matches!(statuses.last(), Some(FlowStatus::Failed { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_backoff_stops_retries() {
        let transport = Arc::new(Silent {
            calls: AtomicU32::new(0),
        });
        let flow = flow(transport.clone(), Arc::new(Statuses::default()));

        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            // First attempt times out at 300 s, backoff runs until 305 s.
            tokio::time::sleep(Duration::from_secs(302)).await;
            trigger.cancel();
        });

        let err = flow.run_with_cancel("pong", token).await.unwrap_err();
        assert!(matches!(err, GenerationError::Cancelled));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_means_single_attempt() {
        let transport = Arc::new(Silent {
            calls: AtomicU32::new(0),
        });
        let config = GeneratorConfig {
            max_retries: 0,
            ..GeneratorConfig::default()
        };
        let flow = GenerationRequestFlow::new(config, transport.clone(), Arc::new(Statuses::default()));

        let err = flow.run("pong").await.unwrap_err();
        assert!(matches!(err, GenerationError::Timeout { attempts: 1 }));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }
}
