//! ServeRequestsUseCase: the worker's receive → classify → reply loop.
//!
//! This use case sits at the application layer.  It depends on two traits:
//!
//! - [`Classifier`] – runs inference on one decoded [`Frame`].  The concrete
//!   model backend lives in the infrastructure layer and is injected at
//!   startup.
//! - [`RequestChannel`] – receives request segments and sends reply bytes.
//!   The production implementation wraps a ZeroMQ REP socket.
//!
//! # Always reply (for beginners)
//!
//! The REP socket on the other side of [`RequestChannel`] only accepts a
//! send after a receive, and only accepts a receive after a send.  If the
//! worker bailed out of a request without replying, the next receive would
//! fail and the client that sent the bad request would wait forever.
//!
//! That is why [`ServeRequestsUseCase::handle_request`] is infallible.
//! Every failure path (wrong number of segments, bad shape descriptor,
//! pixel count mismatch, classifier error, even a classifier panic) is
//! logged and turned into an empty result table, which is still a valid
//! reply.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use vision_core::{decode_request, encode_result_set, DecodedFrame, Frame, ResultSet};

/// Pause after a failed receive so a persistently broken socket does not
/// spin the loop.
const RECEIVE_RETRY_DELAY: Duration = Duration::from_millis(100);

// ── Errors ────────────────────────────────────────────────────────────────────

/// Error reported by a [`Classifier`] for a single frame.
///
/// Never fatal: the worker replies with an empty table and keeps serving.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("frame not compatible with model: {0}")]
    IncompatibleFrame(String),
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Error reported by a [`RequestChannel`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("receive failed: {0}")]
    Receive(String),
    #[error("send failed: {0}")]
    Send(String),
    /// The channel will never deliver another request.
    #[error("channel closed")]
    Closed,
}

// ── Seams ─────────────────────────────────────────────────────────────────────

/// A loaded image classification model.
///
/// Implementations are constructed once at startup and called once per
/// non-empty frame.  Results are `(label, score)` pairs in the order the
/// model produced them.
#[cfg_attr(test, mockall::automock)]
pub trait Classifier: Send + Sync {
    fn classify(&self, frame: &Frame) -> Result<ResultSet, ClassifyError>;
}

/// Request/reply transport seen from the worker side.
///
/// Implementations must enforce nothing about alternation themselves; the
/// use case guarantees exactly one [`send_reply`](Self::send_reply) per
/// successful [`recv_request`](Self::recv_request).
#[async_trait]
pub trait RequestChannel: Send {
    /// Waits for the next request and returns its segments.
    async fn recv_request(&mut self) -> Result<Vec<Bytes>, TransportError>;

    /// Sends the reply to the most recently received request.
    async fn send_reply(&mut self, reply: Bytes) -> Result<(), TransportError>;
}

// ── State and statistics ──────────────────────────────────────────────────────

/// Where the worker is in its request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerState {
    /// Waiting for a request.  The only state in which shutdown is observed.
    #[default]
    Idle,
    /// Decoding, classifying or replying to a request.
    Processing,
}

/// Running counters for one worker process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Requests received (and therefore replies attempted).
    pub requests: u64,
    /// Classifier invocations.
    pub inferences: u64,
    /// Replies that carried zero rows.
    pub empty_replies: u64,
    /// Requests rejected before inference.
    pub decode_failures: u64,
    /// Classifier errors and panics.
    pub classifier_failures: u64,
    pub receive_failures: u64,
    pub send_failures: u64,
}

// ── Use case ──────────────────────────────────────────────────────────────────

/// Serves classification requests with one injected [`Classifier`].
pub struct ServeRequestsUseCase {
    classifier: Arc<dyn Classifier>,
    state: WorkerState,
    stats: WorkerStats,
}

impl ServeRequestsUseCase {
    /// Creates a new use case around an already loaded classifier.
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier,
            state: WorkerState::Idle,
            stats: WorkerStats::default(),
        }
    }

    /// Returns the current request-cycle state.
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Returns the counters accumulated so far.
    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Turns one request into one encoded reply.
    ///
    /// Never fails.  Anything that prevents classification produces an
    /// encoded empty table.
    pub fn handle_request<S: AsRef<[u8]>>(&mut self, segments: &[S]) -> Bytes {
        self.stats.requests += 1;

        let results = match decode_request(segments) {
            Ok(DecodedFrame::Image(frame)) => self.classify(&frame),
            Ok(DecodedFrame::Empty) => {
                debug!("frame has zero area; skipping inference");
                ResultSet::empty()
            }
            Err(e) => {
                warn!("rejecting request: {e}");
                self.stats.decode_failures += 1;
                ResultSet::empty()
            }
        };

        if results.is_empty() {
            self.stats.empty_replies += 1;
        }
        encode_result_set(&results)
    }

    /// Runs the classifier on one frame, timing only the inference call.
    fn classify(&mut self, frame: &Frame) -> ResultSet {
        info!("frame shape: {}", frame.shape());

        let classifier = &self.classifier;
        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| classifier.classify(frame)));
        let elapsed = started.elapsed();
        self.stats.inferences += 1;

        let seconds = elapsed.as_secs_f64();
        let fps = if seconds > 0.0 { 1.0 / seconds } else { f64::INFINITY };
        info!(
            "inference took {:.2} ms ({:.1} FPS)",
            seconds * 1000.0,
            fps
        );

        match outcome {
            Ok(Ok(results)) => {
                debug!("classifier returned {} rows", results.len());
                results
            }
            Ok(Err(e)) => {
                error!("error during model inference: {e}");
                self.stats.classifier_failures += 1;
                ResultSet::empty()
            }
            Err(payload) => {
                error!("classifier panicked: {}", panic_message(payload.as_ref()));
                self.stats.classifier_failures += 1;
                ResultSet::empty()
            }
        }
    }

    /// Serves requests from `channel` until `shutdown` completes.
    ///
    /// Shutdown is only observed while idle, so a request that has been
    /// received is always answered first.  Receive and send failures are
    /// logged and the loop continues; [`TransportError::Closed`] ends it.
    pub async fn run_until<C, F>(&mut self, channel: &mut C, shutdown: F)
    where
        C: RequestChannel + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            self.state = WorkerState::Idle;

            let received = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("worker interrupted; stopping");
                    break;
                }
                received = channel.recv_request() => received,
            };

            let segments = match received {
                Ok(segments) => segments,
                Err(TransportError::Closed) => {
                    info!("request channel closed; stopping");
                    break;
                }
                Err(e) => {
                    warn!("{e}");
                    self.stats.receive_failures += 1;
                    tokio::time::sleep(RECEIVE_RETRY_DELAY).await;
                    continue;
                }
            };

            self.state = WorkerState::Processing;
            let reply = self.handle_request(&segments);
            if let Err(e) = channel.send_reply(reply).await {
                warn!("{e}");
                self.stats.send_failures += 1;
            }
        }

        self.state = WorkerState::Idle;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
