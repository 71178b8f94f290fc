use crate::engine_trait::TokenDecoder;
use murmur_core::{TextSpan, TranscriptEvent};

#[derive(Debug, Clone)]
struct Segment {
    tokens: Vec<u32>,
    finalized: bool,
}

impl Segment {
    fn open() -> Self {
        Self {
            tokens: Vec::new(),
            finalized: false,
        }
    }
}

/// Ordered token segments for one in-flight request. Every segment except
/// possibly the last is finalized; new tokens always land in the open tail.
#[derive(Debug, Clone)]
pub struct TokenAccumulator {
    segments: Vec<Segment>,
}

impl TokenAccumulator {
    pub fn new() -> Self {
        Self {
            segments: vec![Segment::open()],
        }
    }

    /// Append streamed token ids to the open segment. Tokens arriving after
    /// a terminal boundary open a fresh segment rather than mutating a
    /// finalized one.
    pub fn extend(&mut self, tokens: &[u32]) {
        if self.segments.last().map_or(true, |s| s.finalized) {
            self.segments.push(Segment::open());
        }
        if let Some(last) = self.segments.last_mut() {
            last.tokens.extend_from_slice(tokens);
        }
    }

    /// Finalize the open segment; unless this was the last boundary for the
    /// request, start a new empty one.
    pub fn mark_boundary(&mut self, last: bool) {
        if let Some(seg) = self.segments.last_mut() {
            seg.finalized = true;
        }
        if !last {
            self.segments.push(Segment::open());
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.segments.iter().all(|s| s.finalized)
    }

    /// Decode a snapshot into a transcript event. Pure over the current
    /// state: decoding twice without mutation yields identical events.
    pub fn decode(&self, decoder: &dyn TokenDecoder) -> TranscriptEvent {
        let mut text = String::new();
        let mut chunks = Vec::new();
        for seg in &self.segments {
            if seg.tokens.is_empty() {
                continue;
            }
            let piece = decoder.decode(&seg.tokens);
            text.push_str(&piece);
            chunks.push(TextSpan::untimed(piece));
        }
        TranscriptEvent {
            text,
            chunks,
            is_partial: !self.is_finalized(),
        }
    }
}

impl Default for TokenAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_trait::VocabDecoder;

    fn decoder() -> VocabDecoder {
        VocabDecoder::new(vec![
            "alpha".to_string(),
            " beta".to_string(),
            " gamma".to_string(),
            ".".to_string(),
        ])
    }

    #[test]
    fn test_tokens_accumulate_in_open_segment() {
        let mut acc = TokenAccumulator::new();
        acc.extend(&[0]);
        acc.extend(&[1, 3]);
        let event = acc.decode(&decoder());
        assert_eq!(event.text, "alpha beta.");
        assert_eq!(event.chunks.len(), 1);
        assert!(event.is_partial);
    }

    #[test]
    fn test_boundary_opens_new_segment() {
        let mut acc = TokenAccumulator::new();
        acc.extend(&[0, 3]);
        acc.mark_boundary(false);
        acc.extend(&[2, 3]);
        let event = acc.decode(&decoder());
        assert_eq!(event.text, "alpha. gamma.");
        assert_eq!(event.chunks.len(), 2);
        assert_eq!(event.chunks[0].text, "alpha.");
        assert_eq!(event.chunks[1].text, " gamma.");
    }

    #[test]
    fn test_terminal_boundary_finalizes() {
        let mut acc = TokenAccumulator::new();
        acc.extend(&[0]);
        assert!(!acc.is_finalized());
        acc.mark_boundary(true);
        assert!(acc.is_finalized());
        assert!(!acc.decode(&decoder()).is_partial);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let mut acc = TokenAccumulator::new();
        acc.extend(&[0, 1]);
        acc.mark_boundary(false);
        acc.extend(&[2]);
        let first = acc.decode(&decoder());
        let second = acc.decode(&decoder());
        assert_eq!(first, second);
    }

    #[test]
    fn test_tokens_after_terminal_boundary_open_fresh_segment() {
        let mut acc = TokenAccumulator::new();
        acc.extend(&[0]);
        acc.mark_boundary(true);
        acc.extend(&[2]);
        let event = acc.decode(&decoder());
        assert_eq!(event.chunks.len(), 2);
        assert!(event.is_partial);
    }

    #[test]
    fn test_empty_accumulator_decodes_empty() {
        let acc = TokenAccumulator::new();
        let event = acc.decode(&decoder());
        assert!(event.text.is_empty());
        assert!(event.chunks.is_empty());
    }
}
