use murmur_core::{FormatError, SampleBuffer};

/// Fields read out of a RIFF/WAVE header.
#[derive(Debug, Clone, PartialEq)]
pub struct WavHeader {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub data_len: u32,
    pub format_tag: u16,
}

impl WavHeader {
    pub fn duration_secs(&self) -> f64 {
        let bytes_per_second =
            self.sample_rate as f64 * self.channels as f64 * (self.bits_per_sample as f64 / 8.0);
        self.data_len as f64 / bytes_per_second
    }
}

/// Encode mono or interleaved samples as a 16-bit PCM WAVE container with
/// the standard 44-byte header. Samples are clamped to [-1, 1] and scaled
/// to the signed 16-bit range, little-endian.
pub fn encode_pcm16(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<u8> {
    let data_len = samples.len() * 2;
    let byte_rate = sample_rate * channels as u32 * 2;
    let block_align = channels * 2;

    let mut out = Vec::with_capacity(44 + data_len);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&((36 + data_len) as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // linear PCM
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(data_len as u32).to_le_bytes());

    for &s in samples {
        let v = (s.clamp(-1.0, 1.0) * 32767.0).round() as i16;
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Validate the magic markers and walk the sub-chunks until `data` is found.
pub fn decode_header(bytes: &[u8]) -> Result<WavHeader, FormatError> {
    parse(bytes).map(|(header, _)| header)
}

/// Decode a full 16-bit PCM container into a sample buffer.
pub fn decode_pcm16(bytes: &[u8]) -> Result<SampleBuffer, FormatError> {
    let (header, data_offset) = parse(bytes)?;
    if header.format_tag != 1 {
        return Err(FormatError::UnsupportedFormat(header.format_tag));
    }
    if header.bits_per_sample != 16 {
        return Err(FormatError::UnsupportedBitDepth(header.bits_per_sample));
    }

    let data_end = data_offset + header.data_len as usize;
    if data_end > bytes.len() {
        return Err(FormatError::Truncated(bytes.len()));
    }

    let mut samples = Vec::with_capacity(header.data_len as usize / 2);
    for pair in bytes[data_offset..data_end].chunks_exact(2) {
        let v = i16::from_le_bytes([pair[0], pair[1]]);
        samples.push(v as f32 / 32768.0);
    }
    Ok(SampleBuffer::new(
        samples,
        header.sample_rate,
        header.channels,
    ))
}

fn parse(bytes: &[u8]) -> Result<(WavHeader, usize), FormatError> {
    if bytes.len() < 4 || &bytes[0..4] != b"RIFF" {
        return Err(FormatError::MissingRiff);
    }
    if bytes.len() < 12 || &bytes[8..12] != b"WAVE" {
        return Err(FormatError::MissingWave);
    }

    let mut fmt: Option<(u16, u16, u32, u16)> = None;
    let mut pos = 12;

    while pos + 8 <= bytes.len() {
        let tag = &bytes[pos..pos + 4];
        let len = u32::from_le_bytes([bytes[pos + 4], bytes[pos + 5], bytes[pos + 6], bytes[pos + 7]])
            as usize;
        let body = pos + 8;

        match tag {
            b"fmt " => {
                if body + 16 > bytes.len() {
                    return Err(FormatError::Truncated(bytes.len()));
                }
                let format_tag = u16::from_le_bytes([bytes[body], bytes[body + 1]]);
                let channels = u16::from_le_bytes([bytes[body + 2], bytes[body + 3]]);
                let sample_rate = u32::from_le_bytes([
                    bytes[body + 4],
                    bytes[body + 5],
                    bytes[body + 6],
                    bytes[body + 7],
                ]);
                let bits_per_sample = u16::from_le_bytes([bytes[body + 14], bytes[body + 15]]);
                fmt = Some((format_tag, channels, sample_rate, bits_per_sample));
            }
            b"data" => {
                let (format_tag, channels, sample_rate, bits_per_sample) =
                    fmt.ok_or(FormatError::MissingFmt)?;
                let header = WavHeader {
                    sample_rate,
                    channels,
                    bits_per_sample,
                    data_len: len as u32,
                    format_tag,
                };
                return Ok((header, body));
            }
            _ => {} // unknown sub-chunk, skip
        }

        // Sub-chunk bodies are padded to even length
        pos = body + len + (len & 1);
    }

    Err(FormatError::MissingData)
}
