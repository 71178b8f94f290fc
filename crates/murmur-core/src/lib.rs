pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{
    CaptureError, ConfigError, ConfigurationError, EngineError, ErrorEvent, ErrorKind,
    FormatError, TranscribeError,
};
pub use types::{
    Chunk, EngineEvent, InferenceOptions, InferenceRequest, PipelineEvent, ProgressEvent,
    SampleBuffer, TextSpan, Transcript, TranscriptEvent,
};
