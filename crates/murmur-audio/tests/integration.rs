use murmur_audio::{decode_header, decode_pcm16, encode_pcm16, resample, to_mono};
use murmur_audio::{ChunkerConfig, StreamChunker, WavFileSource};
use murmur_core::SampleBuffer;

/// File decode → mono → resample → chunker, the same path the binary wires.
#[test]
fn test_file_to_chunks_pipeline() {
    // 3 seconds of stereo 44.1 kHz audio encoded to a WAV container
    let rate = 44100u32;
    let frames = 3 * rate as usize;
    let mut interleaved = Vec::with_capacity(frames * 2);
    for i in 0..frames {
        let s = (i as f32 * 0.001).sin() * 0.4;
        interleaved.push(s);
        interleaved.push(s * 0.5);
    }
    let bytes = encode_pcm16(&interleaved, rate, 2);

    let decoded = decode_pcm16(&bytes).unwrap();
    assert_eq!(decoded.channels, 2);
    assert_eq!(decoded.sample_rate, rate);

    let mut chunker = StreamChunker::new(ChunkerConfig {
        chunk_length_seconds: 1.0,
        overlap_seconds: 0.25,
        min_chunk_seconds: 0.5,
        sample_rate: 16000,
    })
    .unwrap();

    let mut chunks = Vec::new();
    for frame in WavFileSource::new(decoded, 1024) {
        let mono = to_mono(frame);
        assert_eq!(mono.channels, 1);
        let resampled = resample(mono, 16000).unwrap();
        chunks.extend(chunker.push(&resampled.samples));
    }
    chunks.extend(chunker.flush());

    // 3s at step 0.75s: full windows at 0, 0.75, 1.5 plus the terminal flush
    assert_eq!(chunks.len(), 4);
    for chunk in &chunks[..3] {
        assert_eq!(chunk.samples.len(), 16000);
        assert!(!chunk.is_final);
    }
    let last = chunks.last().unwrap();
    assert!(last.is_final);
    assert!(last.samples.len() < 16000);

    // Total audio length is preserved up to per-packet rounding:
    // windows overlap by 0.25s each, and each resampled packet may
    // round its output length by up to half a sample.
    let total: usize = chunks.iter().map(|c| c.samples.len()).sum();
    let overlap_total = 16000 / 4 * 3;
    let net = (total - overlap_total) as i64;
    assert!((net - 3 * 16000).abs() < 100, "net samples: {net}");
}

#[test]
fn test_encode_decode_header_round_trip() {
    let samples = vec![0.0f32; 16000];
    let bytes = encode_pcm16(&samples, 16000, 1);
    assert_eq!(bytes.len(), 44 + 32000);

    let header = decode_header(&bytes).unwrap();
    assert_eq!(header.sample_rate, 16000);
    assert_eq!(header.channels, 1);
    assert_eq!(header.bits_per_sample, 16);
    assert!((header.duration_secs() - 1.0).abs() <= 1.0 / 16000.0);
}

#[test]
fn test_resample_preserves_duration() {
    let input = SampleBuffer::mono(vec![0.1; 44100], 44100);
    let output = resample(input, 16000).unwrap();
    assert!((output.duration_secs() - 1.0).abs() < 1e-3);
}
