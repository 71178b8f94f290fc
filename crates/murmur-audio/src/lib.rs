pub mod capture;
pub mod chunker;
pub mod device;
pub mod resample;
pub mod wav;
pub mod wav_source;

pub use capture::{spawn_frame_pump, CaptureHandle, CaptureNode, CaptureStatus};
pub use chunker::{ChunkerConfig, StreamChunker};
pub use device::DeviceManager;
pub use resample::{resample, to_mono};
pub use wav::{decode_header, decode_pcm16, encode_pcm16, WavHeader};
pub use wav_source::WavFileSource;

use ringbuf::traits::Split;
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// Create a ring buffer split into producer and consumer halves.
pub fn create_ring_buffer(capacity: usize) -> (HeapProd<f32>, HeapCons<f32>) {
    HeapRb::<f32>::new(capacity).split()
}
