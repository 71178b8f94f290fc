use crate::engine_trait::{InferenceEngine, TokenDecoder, VocabDecoder};
use async_trait::async_trait;
use murmur_core::{EngineError, EngineEvent, InferenceRequest, TextSpan};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

const VOCAB: &[&str] = &["testing", " one", " two", " three", "."];
const STOP_TOKEN: u32 = 4;

/// Deterministic stand-in engine: streams one token per half second of
/// request audio, then a terminating period, a segment boundary, and a
/// completion event. Set `respond = false` in its config to swallow
/// requests, or `fail_with = "..."` to report every request as failed.
pub struct NullEngine {
    submit_count: AtomicUsize,
    respond: AtomicBool,
    fail_with: Mutex<Option<String>>,
    event_sender: Mutex<Option<mpsc::UnboundedSender<EngineEvent>>>,
}

impl NullEngine {
    pub fn new() -> Self {
        Self {
            submit_count: AtomicUsize::new(0),
            respond: AtomicBool::new(true),
            fail_with: Mutex::new(None),
            event_sender: Mutex::new(None),
        }
    }

    pub fn submit_count(&self) -> usize {
        self.submit_count.load(Ordering::Relaxed)
    }

    fn send(&self, event: EngineEvent) {
        if let Ok(sender) = self.event_sender.lock() {
            if let Some(tx) = sender.as_ref() {
                let _ = tx.send(event);
            }
        }
    }

    /// Token ids for a request: one counting word per half second, capped
    /// at the vocabulary, followed by the stop token.
    fn script(request: &InferenceRequest) -> Vec<u32> {
        let half_seconds =
            request.samples.len() / (request.sample_rate as usize / 2).max(1);
        let words = half_seconds.clamp(1, STOP_TOKEN as usize);
        (0..words as u32).chain([STOP_TOKEN]).collect()
    }
}

impl Default for NullEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceEngine for NullEngine {
    fn name(&self) -> &str {
        "null"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), EngineError> {
        if let Some(respond) = config.get("respond").and_then(|v| v.as_bool()) {
            self.respond.store(respond, Ordering::Relaxed);
        }
        if let Some(msg) = config.get("fail_with").and_then(|v| v.as_str()) {
            *self.fail_with.lock().expect("not poisoned") = Some(msg.to_string());
        }
        // Simulated one-time model preparation
        for percent in [30.0, 60.0, 100.0] {
            self.send(EngineEvent::Progress { percent });
        }
        Ok(())
    }

    async fn submit(&self, request: InferenceRequest) -> Result<(), EngineError> {
        let count = self.submit_count.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(
            request_id = request.id,
            "NullEngine request #{count}, {} samples",
            request.samples.len()
        );

        if !self.respond.load(Ordering::Relaxed) {
            return Ok(());
        }

        if let Some(msg) = self.fail_with.lock().expect("not poisoned").clone() {
            self.send(EngineEvent::Error {
                request_id: request.id,
                message: msg,
            });
            return Ok(());
        }

        let tokens = Self::script(&request);
        for &token in &tokens {
            self.send(EngineEvent::Token {
                request_id: request.id,
                token_ids: vec![token],
            });
        }
        self.send(EngineEvent::SegmentBoundary {
            request_id: request.id,
            last: true,
        });

        let text = self.token_decoder().decode(&tokens);
        let duration = request.samples.len() as f64 / request.sample_rate as f64;
        self.send(EngineEvent::Completed {
            request_id: request.id,
            text: text.clone(),
            chunks: vec![TextSpan::new(text, 0.0, Some(duration))],
            language: request.options.language.or_else(|| Some("en".to_string())),
        });
        Ok(())
    }

    fn set_event_sender(&mut self, sender: mpsc::UnboundedSender<EngineEvent>) {
        *self.event_sender.lock().expect("not poisoned") = Some(sender);
    }

    fn token_decoder(&self) -> Arc<dyn TokenDecoder> {
        Arc::new(VocabDecoder::new(
            VOCAB.iter().map(|s| s.to_string()).collect(),
        ))
    }

    async fn shutdown(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_core::InferenceOptions;

    fn request(id: u64, seconds: f64) -> InferenceRequest {
        InferenceRequest {
            id,
            samples: vec![0.0; (seconds * 16000.0) as usize],
            sample_rate: 16000,
            options: InferenceOptions::default(),
        }
    }

    #[test]
    fn test_null_engine_name() {
        assert_eq!(NullEngine::new().name(), "null");
    }

    #[tokio::test]
    async fn test_initialize_emits_progress() {
        let mut engine = NullEngine::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        engine.set_event_sender(tx);
        engine
            .initialize(toml::Value::Table(Default::default()))
            .await
            .unwrap();

        let mut percents = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if let EngineEvent::Progress { percent } = ev {
                percents.push(percent);
            }
        }
        assert_eq!(percents, vec![30.0, 60.0, 100.0]);
    }

    #[tokio::test]
    async fn test_submit_streams_tokens_then_boundary_then_completion() {
        let mut engine = NullEngine::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        engine.set_event_sender(tx);

        engine.submit(request(7, 1.0)).await.unwrap();

        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        // 2 half-seconds → "testing one" + "." = 3 token events
        assert!(matches!(events[0], EngineEvent::Token { request_id: 7, .. }));
        assert!(matches!(
            events[3],
            EngineEvent::SegmentBoundary {
                request_id: 7,
                last: true
            }
        ));
        match &events[4] {
            EngineEvent::Completed {
                request_id,
                text,
                chunks,
                language,
            } => {
                assert_eq!(*request_id, 7);
                assert_eq!(text, "testing one.");
                assert_eq!(chunks.len(), 1);
                assert_eq!(chunks[0].end_time, Some(1.0));
                assert_eq!(language.as_deref(), Some("en"));
            }
            other => panic!("expected Completed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_is_deterministic() {
        let mut engine = NullEngine::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        engine.set_event_sender(tx);

        engine.submit(request(1, 1.5)).await.unwrap();
        let first: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| format!("{e:?}"))
            .collect();

        engine.submit(request(1, 1.5)).await.unwrap();
        let second: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| format!("{e:?}"))
            .collect();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_respond_false_swallows_requests() {
        let mut engine = NullEngine::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        engine.set_event_sender(tx);
        engine
            .initialize(toml::from_str("respond = false").unwrap())
            .await
            .unwrap();
        while rx.try_recv().is_ok() {} // drain progress events

        engine.submit(request(1, 1.0)).await.unwrap();
        assert!(rx.try_recv().is_err());
        assert_eq!(engine.submit_count(), 1);
    }

    #[tokio::test]
    async fn test_fail_with_reports_error_event() {
        let mut engine = NullEngine::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        engine.set_event_sender(tx);
        engine
            .initialize(toml::from_str(r#"fail_with = "model exploded""#).unwrap())
            .await
            .unwrap();
        while let Ok(ev) = rx.try_recv() {
            if !matches!(ev, EngineEvent::Progress { .. }) {
                panic!("unexpected event before submit: {ev:?}");
            }
        }

        engine.submit(request(3, 1.0)).await.unwrap();
        match rx.try_recv().unwrap() {
            EngineEvent::Error {
                request_id,
                message,
            } => {
                assert_eq!(request_id, 3);
                assert_eq!(message, "model exploded");
            }
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_without_sender_does_not_panic() {
        let engine = NullEngine::new();
        assert!(engine.submit(request(1, 1.0)).await.is_ok());
        assert_eq!(engine.submit_count(), 1);
    }

    #[test]
    fn test_null_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NullEngine>();
    }
}
