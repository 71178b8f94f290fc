use async_trait::async_trait;
use murmur_core::{EngineError, EngineEvent, InferenceRequest};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Boundary to the recognition model. Implementations run inference on
/// their own schedule (thread, sidecar process, remote service) and report
/// back through the event sender; `submit` must return promptly.
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    fn name(&self) -> &str;

    /// One-time preparation (model load, warm-up). May emit `Progress`
    /// events while it runs.
    async fn initialize(&mut self, config: toml::Value) -> Result<(), EngineError>;

    /// Accept a request for background processing. Events for it carry
    /// `request.id` back to the coordinator.
    async fn submit(&self, request: InferenceRequest) -> Result<(), EngineError>;

    fn set_event_sender(&mut self, sender: mpsc::UnboundedSender<EngineEvent>);

    /// The decoder matching this engine's token ids.
    fn token_decoder(&self) -> Arc<dyn TokenDecoder>;

    async fn shutdown(&self) -> Result<(), EngineError>;
}

/// Maps engine token ids to text.
pub trait TokenDecoder: Send + Sync {
    fn decode(&self, tokens: &[u32]) -> String;
}

/// Table-backed decoder: token id indexes a vocabulary of text pieces.
/// Unknown ids decode to the replacement character.
pub struct VocabDecoder {
    vocab: Vec<String>,
}

impl VocabDecoder {
    pub fn new(vocab: Vec<String>) -> Self {
        Self { vocab }
    }
}

impl TokenDecoder for VocabDecoder {
    fn decode(&self, tokens: &[u32]) -> String {
        tokens
            .iter()
            .map(|&t| {
                self.vocab
                    .get(t as usize)
                    .map(String::as_str)
                    .unwrap_or("\u{fffd}")
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> VocabDecoder {
        VocabDecoder::new(vec![
            "hello".to_string(),
            " world".to_string(),
            ".".to_string(),
        ])
    }

    #[test]
    fn test_vocab_decoder_concatenates_pieces() {
        assert_eq!(decoder().decode(&[0, 1, 2]), "hello world.");
    }

    #[test]
    fn test_vocab_decoder_empty_tokens() {
        assert_eq!(decoder().decode(&[]), "");
    }

    #[test]
    fn test_vocab_decoder_unknown_id() {
        assert_eq!(decoder().decode(&[99]), "\u{fffd}");
    }
}
