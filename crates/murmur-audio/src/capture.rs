use cpal::traits::DeviceTrait;
use cpal::{Device, SampleRate, Stream, StreamConfig};
use murmur_core::{CaptureError, SampleBuffer};
use ringbuf::traits::{Consumer, Producer};
use ringbuf::{HeapCons, HeapProd};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

// ── CaptureHandle ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    Ok,
    Error,
}

/// Shared view of a running capture stream's health.
#[derive(Clone)]
pub struct CaptureHandle {
    status: Arc<AtomicU8>,
}

impl CaptureHandle {
    pub fn status(&self) -> CaptureStatus {
        match self.status.load(Ordering::Relaxed) {
            1 => CaptureStatus::Error,
            _ => CaptureStatus::Ok,
        }
    }
}

// ── CaptureNode ───────────────────────────────────────────────

/// Owns a cpal input stream. The real-time callback pushes raw samples into
/// a ring buffer; overflow is silently dropped rather than blocking the
/// audio thread.
pub struct CaptureNode {
    _stream: Stream,
}

impl CaptureNode {
    pub fn new(
        device: &Device,
        producer: HeapProd<f32>,
        sample_rate: u32,
        channels: u16,
        buffer_size: u32,
    ) -> Result<(Self, CaptureHandle), CaptureError> {
        let config = StreamConfig {
            channels,
            sample_rate: SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Fixed(buffer_size),
        };

        let producer = Arc::new(Mutex::new(producer));
        let status = Arc::new(AtomicU8::new(0));
        let status_flag = Arc::clone(&status);

        let err_callback = move |err: cpal::StreamError| {
            tracing::error!("capture stream error: {}", err);
            status_flag.store(1, Ordering::Relaxed);
        };

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut prod) = producer.lock() {
                        prod.push_slice(data);
                    }
                },
                err_callback,
                None,
            )
            .map_err(|e| CaptureError::StreamBuild(e.to_string()))?;

        Ok((Self { _stream: stream }, CaptureHandle { status }))
    }
}

// ── Frame pump ────────────────────────────────────────────────

/// Drain the capture ring buffer at a fixed interval and forward whatever
/// accumulated as [`SampleBuffer`] frames. Frames arrive in chronological
/// order; the task ends when the receiving side is dropped.
pub fn spawn_frame_pump(
    mut consumer: HeapCons<f32>,
    sample_rate: u32,
    channels: u16,
    frame_tx: mpsc::UnboundedSender<SampleBuffer>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut scratch = vec![0.0f32; 8192];
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            loop {
                let n = consumer.pop_slice(&mut scratch);
                if n == 0 {
                    break;
                }
                let frame = SampleBuffer::new(scratch[..n].to_vec(), sample_rate, channels);
                if frame_tx.send(frame).is_err() {
                    tracing::debug!("frame receiver dropped, stopping pump");
                    return;
                }
            }
            if frame_tx.is_closed() {
                return;
            }
        }
    })
}
