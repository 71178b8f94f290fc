//! Inference side of the pipeline: the engine seam, the built-in null
//! engine, and the coordinator that correlates chunk submissions with
//! streamed engine events.

pub mod accumulator;
pub mod coordinator;
pub mod dedup;
pub mod engine_trait;
pub mod null_engine;
pub mod progress;
pub mod registry;

pub use accumulator::TokenAccumulator;
pub use coordinator::{CoordinatorHandle, DoneReceiver, InferenceCoordinator, DEFAULT_TIMEOUT};
pub use dedup::{dedup_spans, suppress_repetitions};
pub use engine_trait::{InferenceEngine, TokenDecoder, VocabDecoder};
pub use null_engine::NullEngine;
pub use progress::ProgressTracker;
pub use registry::EngineRegistry;
