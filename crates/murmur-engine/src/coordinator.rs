use crate::accumulator::TokenAccumulator;
use crate::dedup;
use crate::engine_trait::{InferenceEngine, TokenDecoder};
use crate::progress::ProgressTracker;
use murmur_core::{
    Chunk, EngineError, EngineEvent, ErrorEvent, ErrorKind, InferenceOptions, InferenceRequest,
    PipelineEvent, ProgressEvent, TranscribeError, Transcript, TranscriptEvent,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const TIMEOUT_SCAN_INTERVAL: Duration = Duration::from_millis(250);

type DoneSender = oneshot::Sender<Result<Transcript, TranscribeError>>;
pub type DoneReceiver = oneshot::Receiver<Result<Transcript, TranscribeError>>;

// ── PendingRequest ────────────────────────────────────────────

struct PendingRequest {
    sequence_id: u64,
    submitted_at: Instant,
    done: DoneSender,
}

enum Command {
    Submit {
        id: u64,
        chunk: Chunk,
        options: InferenceOptions,
        done: DoneSender,
    },
}

// ── CoordinatorHandle ─────────────────────────────────────────

/// Cheap, cloneable submission side of a running coordinator.
#[derive(Clone)]
pub struct CoordinatorHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    next_id: Arc<AtomicU64>,
}

impl CoordinatorHandle {
    /// Hand a chunk to the engine. Never blocks: the correlation id is
    /// assigned immediately and the receiver resolves with the final
    /// transcript, an engine failure, or a timeout.
    pub fn submit(&self, chunk: Chunk, options: InferenceOptions) -> (u64, DoneReceiver) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (done_tx, done_rx) = oneshot::channel();
        let cmd = Command::Submit {
            id,
            chunk,
            options,
            done: done_tx,
        };
        if let Err(mpsc::error::SendError(Command::Submit { done, .. })) = self.cmd_tx.send(cmd) {
            let _ = done.send(Err(TranscribeError::Engine(
                "coordinator stopped".to_string(),
            )));
        }
        (id, done_rx)
    }
}

// ── InferenceCoordinator ──────────────────────────────────────

/// Owns every piece of per-request state: the pending table, one token
/// accumulator per in-flight request, and the progress tracker. All of it
/// is mutated from a single event loop; submissions and engine events are
/// messages into that loop.
pub struct InferenceCoordinator {
    engine: Box<dyn InferenceEngine>,
    decoder: Arc<dyn TokenDecoder>,
    timeout: Duration,
    cmd_tx: Option<mpsc::UnboundedSender<Command>>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    engine_rx: mpsc::UnboundedReceiver<EngineEvent>,
    event_tx: mpsc::UnboundedSender<PipelineEvent>,
    event_rx: Option<mpsc::UnboundedReceiver<PipelineEvent>>,
    pending: HashMap<u64, PendingRequest>,
    accumulators: HashMap<u64, TokenAccumulator>,
    progress: ProgressTracker,
    next_id: Arc<AtomicU64>,
}

impl InferenceCoordinator {
    pub fn new(mut engine: Box<dyn InferenceEngine>, timeout: Duration) -> Self {
        let (engine_tx, engine_rx) = mpsc::unbounded_channel();
        engine.set_event_sender(engine_tx);
        let decoder = engine.token_decoder();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            engine,
            decoder,
            timeout,
            cmd_tx: Some(cmd_tx),
            cmd_rx,
            engine_rx,
            event_tx,
            event_rx: Some(event_rx),
            pending: HashMap::new(),
            accumulators: HashMap::new(),
            progress: ProgressTracker::default(),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// One-time engine preparation. Progress events it emits are published
    /// to subscribers once the loop is running.
    pub async fn initialize(&mut self, config: toml::Value) -> Result<(), EngineError> {
        self.engine.initialize(config).await
    }

    pub fn handle(&self) -> CoordinatorHandle {
        CoordinatorHandle {
            cmd_tx: self
                .cmd_tx
                .as_ref()
                .expect("coordinator not started")
                .clone(),
            next_id: Arc::clone(&self.next_id),
        }
    }

    pub fn take_event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<PipelineEvent>> {
        self.event_rx.take()
    }

    /// Run the event loop on its own task. After every handle is dropped
    /// the loop stops accepting work but keeps running until all in-flight
    /// requests resolve or time out.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        // Handles own the only submission senders from here on; otherwise
        // the loop would never observe the channel closing.
        drop(self.cmd_tx.take());

        let mut scan = tokio::time::interval(TIMEOUT_SCAN_INTERVAL);
        scan.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut accepting = true;

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv(), if accepting => match cmd {
                    Some(Command::Submit { id, chunk, options, done }) => {
                        self.handle_submit(id, chunk, options, done).await;
                    }
                    None => accepting = false,
                },
                ev = self.engine_rx.recv() => match ev {
                    Some(ev) => self.handle_engine_event(ev),
                    None => {
                        tracing::warn!("engine event channel closed");
                        break;
                    }
                },
                _ = scan.tick() => self.expire_timeouts(),
            }

            if !accepting && self.pending.is_empty() {
                break;
            }
        }

        if let Err(e) = self.engine.shutdown().await {
            tracing::warn!("engine shutdown failed: {e}");
        }
    }

    async fn handle_submit(
        &mut self,
        id: u64,
        chunk: Chunk,
        options: InferenceOptions,
        done: DoneSender,
    ) {
        tracing::debug!(
            request_id = id,
            sequence_id = chunk.sequence_id,
            duration = chunk.duration,
            is_final = chunk.is_final,
            "submitting chunk"
        );
        self.pending.insert(
            id,
            PendingRequest {
                sequence_id: chunk.sequence_id,
                submitted_at: Instant::now(),
                done,
            },
        );
        self.accumulators.insert(id, TokenAccumulator::new());

        let request = InferenceRequest {
            id,
            samples: chunk.samples,
            sample_rate: chunk.sample_rate,
            options,
        };
        if let Err(e) = self.engine.submit(request).await {
            self.fail_request(id, e.to_string());
        }
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Token {
                request_id,
                token_ids,
            } => {
                let Some(acc) = self.accumulators.get_mut(&request_id) else {
                    tracing::debug!(request_id, "token event for unknown request, dropped");
                    return;
                };
                acc.extend(&token_ids);
                let mut partial = acc.decode(self.decoder.as_ref());
                partial.is_partial = true;
                let _ = self.event_tx.send(PipelineEvent::Transcript {
                    request_id,
                    event: partial,
                });
            }

            EngineEvent::SegmentBoundary { request_id, last } => {
                let Some(acc) = self.accumulators.get_mut(&request_id) else {
                    tracing::debug!(request_id, "boundary event for unknown request, dropped");
                    return;
                };
                acc.mark_boundary(last);
            }

            EngineEvent::Progress { percent } => {
                let smoothed = self.progress.update(percent);
                let _ = self
                    .event_tx
                    .send(PipelineEvent::Progress(ProgressEvent { percent: smoothed }));
            }

            EngineEvent::Completed {
                request_id,
                text,
                chunks,
                language,
            } => {
                let Some(pending) = self.pending.remove(&request_id) else {
                    tracing::debug!(request_id, "completion for unknown request, dropped");
                    return;
                };
                let acc = self.accumulators.remove(&request_id).unwrap_or_default();

                // Engines that decode with their own tokenizer report text
                // directly; otherwise reconstruct it from streamed tokens.
                let raw_text = if text.trim().is_empty() {
                    acc.decode(self.decoder.as_ref()).text
                } else {
                    text
                };
                let final_text = dedup::suppress_repetitions(&raw_text);
                let final_chunks = dedup::dedup_spans(chunks);

                let _ = self.event_tx.send(PipelineEvent::Transcript {
                    request_id,
                    event: TranscriptEvent {
                        text: final_text.clone(),
                        chunks: final_chunks.clone(),
                        is_partial: false,
                    },
                });
                let _ = pending.done.send(Ok(Transcript {
                    text: final_text,
                    chunks: final_chunks,
                    language,
                }));
            }

            EngineEvent::Error {
                request_id,
                message,
            } => {
                if self.pending.contains_key(&request_id) {
                    self.fail_request(request_id, message);
                } else {
                    tracing::debug!(request_id, "error event for unknown request, dropped");
                }
            }
        }
    }

    fn fail_request(&mut self, id: u64, message: String) {
        self.accumulators.remove(&id);
        if let Some(pending) = self.pending.remove(&id) {
            self.publish_error(ErrorKind::Engine, &message, Some(pending.sequence_id));
            let _ = pending.done.send(Err(TranscribeError::Engine(message)));
        }
    }

    fn expire_timeouts(&mut self) {
        let now = Instant::now();
        let expired: Vec<u64> = self
            .pending
            .iter()
            .filter(|(_, p)| now.duration_since(p.submitted_at) >= self.timeout)
            .map(|(id, _)| *id)
            .collect();

        for id in expired {
            self.accumulators.remove(&id);
            if let Some(pending) = self.pending.remove(&id) {
                tracing::warn!(
                    request_id = id,
                    sequence_id = pending.sequence_id,
                    "inference request timed out"
                );
                self.publish_error(
                    ErrorKind::Timeout,
                    &format!("no engine response within {:?}", self.timeout),
                    Some(pending.sequence_id),
                );
                let _ = pending.done.send(Err(TranscribeError::Timeout(self.timeout)));
            }
        }
    }

    fn publish_error(&self, kind: ErrorKind, message: &str, sequence_id: Option<u64>) {
        let _ = self
            .event_tx
            .send(PipelineEvent::Error(ErrorEvent::new(
                kind,
                message,
                sequence_id,
            )));
    }
}
