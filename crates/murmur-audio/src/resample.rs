use murmur_core::{ConfigurationError, SampleBuffer};

/// Reduce an interleaved multi-channel buffer to mono by averaging the
/// channels of each frame. Single-channel input is returned as-is.
pub fn to_mono(buffer: SampleBuffer) -> SampleBuffer {
    if buffer.channels <= 1 {
        return buffer;
    }
    let ch = buffer.channels as usize;
    let mut mono = Vec::with_capacity(buffer.samples.len() / ch);
    for frame in buffer.samples.chunks_exact(ch) {
        mono.push(frame.iter().sum::<f32>() / ch as f32);
    }
    SampleBuffer::mono(mono, buffer.sample_rate)
}

/// Convert a mono buffer to `target_rate` by linear interpolation.
///
/// When the rates already match the input is returned unchanged, with no
/// allocation. The upper bracketing index is clamped to the last sample.
pub fn resample(
    buffer: SampleBuffer,
    target_rate: u32,
) -> Result<SampleBuffer, ConfigurationError> {
    if target_rate == 0 {
        return Err(ConfigurationError::ZeroSampleRate);
    }
    if buffer.sample_rate == target_rate {
        return Ok(buffer);
    }
    if buffer.samples.is_empty() {
        return Ok(SampleBuffer::mono(Vec::new(), target_rate));
    }

    let ratio = buffer.sample_rate as f64 / target_rate as f64;
    let out_len = (buffer.samples.len() as f64 / ratio).round() as usize;
    let last = buffer.samples.len() - 1;

    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let pos = i as f64 * ratio;
        let lo = (pos.floor() as usize).min(last);
        let hi = (lo + 1).min(last);
        let frac = (pos - lo as f64) as f32;
        out.push(buffer.samples[lo] + (buffer.samples[hi] - buffer.samples[lo]) * frac);
    }
    Ok(SampleBuffer::mono(out, target_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_identity_when_rates_match() {
        let samples: Vec<f32> = (0..100).map(|i| (i as f32 * 0.01).sin()).collect();
        let input = SampleBuffer::mono(samples.clone(), 16000);
        let output = resample(input, 16000).unwrap();
        assert_eq!(output.samples, samples);
        assert_eq!(output.sample_rate, 16000);
    }

    #[test]
    fn test_resample_rejects_zero_rate() {
        let input = SampleBuffer::mono(vec![0.0; 10], 16000);
        assert_eq!(
            resample(input, 0).unwrap_err(),
            ConfigurationError::ZeroSampleRate
        );
    }

    #[test]
    fn test_resample_downsample_halves_length() {
        let input = SampleBuffer::mono(vec![0.5; 48000], 48000);
        let output = resample(input, 24000).unwrap();
        assert_eq!(output.samples.len(), 24000);
        assert_eq!(output.sample_rate, 24000);
        for s in &output.samples {
            assert!((s - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_resample_upsample_interpolates() {
        // Linear ramp stays a linear ramp under linear interpolation
        let input = SampleBuffer::mono(vec![0.0, 1.0], 1);
        let output = resample(input, 2).unwrap();
        assert_eq!(output.samples.len(), 4);
        assert!((output.samples[0] - 0.0).abs() < 1e-6);
        assert!((output.samples[1] - 0.5).abs() < 1e-6);
        assert!((output.samples[2] - 1.0).abs() < 1e-6);
        // Upper bracket clamps to the last sample
        assert!((output.samples[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_resample_48k_to_16k_length() {
        let input = SampleBuffer::mono(vec![0.0; 48000], 48000);
        let output = resample(input, 16000).unwrap();
        assert_eq!(output.samples.len(), 16000);
    }

    #[test]
    fn test_resample_empty_input() {
        let input = SampleBuffer::mono(vec![], 48000);
        let output = resample(input, 16000).unwrap();
        assert!(output.samples.is_empty());
    }

    #[test]
    fn test_to_mono_passthrough_single_channel() {
        let samples = vec![0.1, 0.2, 0.3];
        let input = SampleBuffer::mono(samples.clone(), 16000);
        let output = to_mono(input);
        assert_eq!(output.samples, samples);
        assert_eq!(output.channels, 1);
    }

    #[test]
    fn test_to_mono_averages_stereo() {
        // Interleaved L/R pairs
        let input = SampleBuffer::new(vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 16000, 2);
        let output = to_mono(input);
        assert_eq!(output.channels, 1);
        assert_eq!(output.samples.len(), 3);
        assert!((output.samples[0] - 0.5).abs() < 1e-6);
        assert!((output.samples[1] - 0.5).abs() < 1e-6);
        assert!((output.samples[2] - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_to_mono_four_channels() {
        let input = SampleBuffer::new(vec![0.4, 0.4, 0.4, 0.4, 0.0, 0.8, 0.0, 0.8], 16000, 4);
        let output = to_mono(input);
        assert_eq!(output.samples.len(), 2);
        assert!((output.samples[0] - 0.4).abs() < 1e-6);
        assert!((output.samples[1] - 0.4).abs() < 1e-6);
    }
}
