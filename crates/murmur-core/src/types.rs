use std::time::SystemTime;

use crate::error::{ErrorEvent, TranscribeError};

// ── SampleBuffer ───────────────────────────────────────────────

/// A block of interleaved f32 samples in [-1.0, 1.0], tagged with its format.
///
/// Ownership moves between pipeline stages; no stage holds onto a buffer it
/// has passed downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, sample_rate, 1)
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// ── Chunk ──────────────────────────────────────────────────────

/// A fixed-duration slice of mono audio handed to the inference engine.
///
/// `duration` always matches `samples.len() / sample_rate` within floating
/// rounding. The chunker marks the trailing flush with `is_final`.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub sequence_id: u64,
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub duration: f64,
    pub captured_at: SystemTime,
    pub is_final: bool,
}

// ── Transcript types ───────────────────────────────────────────

/// A stretch of recognized text with optional timing.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub start_time: f64,
    pub end_time: Option<f64>,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, start_time: f64, end_time: Option<f64>) -> Self {
        Self {
            text: text.into(),
            start_time,
            end_time,
        }
    }

    /// A span whose timing is not yet known (partial decodes).
    pub fn untimed(text: impl Into<String>) -> Self {
        Self::new(text, 0.0, None)
    }
}

/// A partial or final decode of one submitted chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEvent {
    pub text: String,
    pub chunks: Vec<TextSpan>,
    pub is_partial: bool,
}

/// The final resolution value of a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub chunks: Vec<TextSpan>,
    pub language: Option<String>,
}

/// Result type delivered on a submission's completion channel.
pub type TranscribeResult = Result<Transcript, TranscribeError>;

// ── Engine contract ────────────────────────────────────────────

/// Options forwarded with every inference request.
#[derive(Debug, Clone)]
pub struct InferenceOptions {
    pub language: Option<String>,
    pub return_timestamps: bool,
    pub chunk_length_seconds: f64,
    pub stride_length_seconds: f64,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            language: None,
            return_timestamps: true,
            chunk_length_seconds: 5.0,
            stride_length_seconds: 1.0,
        }
    }
}

/// One unit of work sent to the inference engine. `id` is the correlation
/// id assigned by the coordinator; every event the engine emits for this
/// request carries it back.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub id: u64,
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub options: InferenceOptions,
}

/// Everything an engine can report back, matched exhaustively at the
/// coordinator boundary.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// New token ids appended to the currently open segment.
    Token { request_id: u64, token_ids: Vec<u32> },
    /// The open segment is complete; `last` means no further segment follows.
    SegmentBoundary { request_id: u64, last: bool },
    /// Model preparation progress, 0–100. Not tied to a request.
    Progress { percent: f32 },
    /// Terminal event for a request.
    Completed {
        request_id: u64,
        text: String,
        chunks: Vec<TextSpan>,
        language: Option<String>,
    },
    /// The engine failed this request.
    Error { request_id: u64, message: String },
}

// ── Caller-facing events ───────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub percent: f32,
}

/// Events published to pipeline subscribers.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    Transcript {
        request_id: u64,
        event: TranscriptEvent,
    },
    Progress(ProgressEvent),
    Error(ErrorEvent),
}
