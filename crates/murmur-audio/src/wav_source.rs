use murmur_core::SampleBuffer;

/// Replays a decoded audio buffer as capture-sized frames, so the pipeline
/// can run from a file with no audio hardware attached.
pub struct WavFileSource {
    buffer: SampleBuffer,
    frame_len: usize,
    pos: usize,
}

impl WavFileSource {
    /// `frame_frames` is the number of frames (per-channel samples) each
    /// yielded buffer carries, mirroring a capture callback's packet size.
    pub fn new(buffer: SampleBuffer, frame_frames: usize) -> Self {
        let frame_len = frame_frames.max(1) * buffer.channels.max(1) as usize;
        Self {
            buffer,
            frame_len,
            pos: 0,
        }
    }
}

impl Iterator for WavFileSource {
    type Item = SampleBuffer;

    fn next(&mut self) -> Option<SampleBuffer> {
        if self.pos >= self.buffer.samples.len() {
            return None;
        }
        let end = (self.pos + self.frame_len).min(self.buffer.samples.len());
        let frame = SampleBuffer::new(
            self.buffer.samples[self.pos..end].to_vec(),
            self.buffer.sample_rate,
            self.buffer.channels,
        );
        self.pos = end;
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_source_yields_all_samples_in_order() {
        let samples: Vec<f32> = (0..1000).map(|i| i as f32).collect();
        let source = WavFileSource::new(SampleBuffer::mono(samples.clone(), 16000), 256);
        let collected: Vec<f32> = source.flat_map(|f| f.samples).collect();
        assert_eq!(collected, samples);
    }

    #[test]
    fn test_wav_source_frame_sizes() {
        let source = WavFileSource::new(SampleBuffer::mono(vec![0.0; 1000], 16000), 256);
        let sizes: Vec<usize> = source.map(|f| f.samples.len()).collect();
        assert_eq!(sizes, vec![256, 256, 256, 232]);
    }

    #[test]
    fn test_wav_source_stereo_frames_keep_channel_alignment() {
        // 2 channels, 10 frames per packet → 20 samples per yielded buffer
        let source = WavFileSource::new(SampleBuffer::new(vec![0.0; 100], 16000, 2), 10);
        for frame in source {
            assert_eq!(frame.channels, 2);
            assert_eq!(frame.samples.len() % 2, 0);
        }
    }

    #[test]
    fn test_wav_source_empty_buffer() {
        let mut source = WavFileSource::new(SampleBuffer::mono(vec![], 16000), 256);
        assert!(source.next().is_none());
    }
}
