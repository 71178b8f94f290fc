use std::time::{Duration, SystemTime};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),
}

/// Invalid pipeline parameters. Raised once, at construction time; the
/// audio path itself never fails after this check passes.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("overlap ({overlap_seconds}s) must be shorter than chunk length ({chunk_length_seconds}s)")]
    OverlapTooLarge {
        chunk_length_seconds: f64,
        overlap_seconds: f64,
    },

    #[error("chunk length must be positive, got {0}s")]
    NonPositiveChunkLength(f64),

    #[error("overlap must not be negative, got {0}s")]
    NegativeOverlap(f64),

    #[error("sample rate must be positive")]
    ZeroSampleRate,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("failed to enumerate devices: {0}")]
    DeviceEnumeration(String),

    #[error("failed to build stream: {0}")]
    StreamBuild(String),

    #[error("stream error: {0}")]
    Stream(String),
}

/// Malformed PCM container.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormatError {
    #[error("missing RIFF marker")]
    MissingRiff,

    #[error("missing WAVE marker")]
    MissingWave,

    #[error("no fmt sub-chunk before data")]
    MissingFmt,

    #[error("no data sub-chunk found")]
    MissingData,

    #[error("container truncated at byte {0}")]
    Truncated(usize),

    #[error("unsupported format tag {0} (expected 1 = PCM)")]
    UnsupportedFormat(u16),

    #[error("unsupported bits per sample: {0}")]
    UnsupportedBitDepth(u16),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine initialization failed: {0}")]
    InitializationFailed(String),

    #[error("engine processing failed: {0}")]
    ProcessingFailed(String),

    #[error("engine not found: {0}")]
    NotFound(String),
}

/// How a single pending request resolved when it did not succeed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TranscribeError {
    #[error("no engine response within {0:?}")]
    Timeout(Duration),

    #[error("engine reported failure: {0}")]
    Engine(String),
}

// ── Caller-facing error events ─────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    Capture,
    Timeout,
    Engine,
    Configuration,
}

/// A failure surfaced on the pipeline event channel, with enough context
/// to correlate it with the submission it belongs to.
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub kind: ErrorKind,
    pub message: String,
    pub sequence_id: Option<u64>,
    pub timestamp: SystemTime,
}

impl ErrorEvent {
    pub fn new(kind: ErrorKind, message: impl Into<String>, sequence_id: Option<u64>) -> Self {
        Self {
            kind,
            message: message.into(),
            sequence_id,
            timestamp: SystemTime::now(),
        }
    }
}
