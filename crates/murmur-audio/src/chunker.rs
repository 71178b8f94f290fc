use murmur_core::{Chunk, ConfigurationError};
use std::time::SystemTime;

// ── ChunkerConfig ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    pub chunk_length_seconds: f64,
    pub overlap_seconds: f64,
    /// Non-final fragments shorter than this are dropped instead of emitted.
    pub min_chunk_seconds: f64,
    pub sample_rate: u32,
}

impl ChunkerConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.sample_rate == 0 {
            return Err(ConfigurationError::ZeroSampleRate);
        }
        if self.chunk_length_seconds <= 0.0 {
            return Err(ConfigurationError::NonPositiveChunkLength(
                self.chunk_length_seconds,
            ));
        }
        if self.overlap_seconds < 0.0 {
            return Err(ConfigurationError::NegativeOverlap(self.overlap_seconds));
        }
        if self.overlap_seconds >= self.chunk_length_seconds {
            return Err(ConfigurationError::OverlapTooLarge {
                chunk_length_seconds: self.chunk_length_seconds,
                overlap_seconds: self.overlap_seconds,
            });
        }
        Ok(())
    }
}

// ── StreamChunker ──────────────────────────────────────────────

/// Accumulates incoming samples and emits fixed-duration windows that share
/// `overlap_seconds` of audio with their predecessor, so recognition context
/// survives chunk boundaries.
pub struct StreamChunker {
    window: Vec<f32>,
    next_sequence_id: u64,
    sample_rate: u32,
    chunk_samples: usize,
    step_samples: usize,
    min_samples: usize,
}

impl StreamChunker {
    pub fn new(config: ChunkerConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let rate = config.sample_rate as f64;
        let chunk_samples = (config.chunk_length_seconds * rate).round() as usize;
        let overlap_samples = (config.overlap_seconds * rate).round() as usize;
        // Seconds that pass validation can still round to sample counts
        // that break the drain invariant: step_samples must be >= 1 or
        // push() never shrinks the window.
        if chunk_samples == 0 {
            return Err(ConfigurationError::NonPositiveChunkLength(
                config.chunk_length_seconds,
            ));
        }
        if overlap_samples >= chunk_samples {
            return Err(ConfigurationError::OverlapTooLarge {
                chunk_length_seconds: config.chunk_length_seconds,
                overlap_seconds: config.overlap_seconds,
            });
        }
        Ok(Self {
            window: Vec::new(),
            next_sequence_id: 0,
            sample_rate: config.sample_rate,
            chunk_samples,
            step_samples: chunk_samples - overlap_samples,
            min_samples: (config.min_chunk_seconds * rate).round() as usize,
        })
    }

    /// Append a frame and drain every full window it completes. Consecutive
    /// emitted chunks share exactly `chunk_samples - step_samples` samples.
    pub fn push(&mut self, frame: &[f32]) -> Vec<Chunk> {
        self.window.extend_from_slice(frame);
        let mut out = Vec::new();
        while self.window.len() >= self.chunk_samples {
            let samples = self.window[..self.chunk_samples].to_vec();
            out.push(self.make_chunk(samples, false));
            self.window.drain(..self.step_samples);
        }
        out
    }

    /// Emit whatever remains as the terminal chunk, which may be shorter
    /// than a full window. Trailing audio is never dropped. Calling again
    /// on an empty window is a no-op.
    pub fn flush(&mut self) -> Option<Chunk> {
        if self.window.is_empty() {
            return None;
        }
        let samples = std::mem::take(&mut self.window);
        Some(self.make_chunk(samples, true))
    }

    /// Early-stop variant of [`flush`](Self::flush): sub-minimum fragments
    /// are discarded rather than submitted as near-silent noise.
    pub fn flush_non_final(&mut self) -> Option<Chunk> {
        if self.window.len() < self.min_samples {
            self.window.clear();
            return None;
        }
        let samples = std::mem::take(&mut self.window);
        Some(self.make_chunk(samples, false))
    }

    pub fn buffered_samples(&self) -> usize {
        self.window.len()
    }

    fn make_chunk(&mut self, samples: Vec<f32>, is_final: bool) -> Chunk {
        let sequence_id = self.next_sequence_id;
        self.next_sequence_id += 1;
        let duration = samples.len() as f64 / self.sample_rate as f64;
        Chunk {
            sequence_id,
            samples,
            sample_rate: self.sample_rate,
            duration,
            captured_at: SystemTime::now(),
            is_final,
        }
    }
}
