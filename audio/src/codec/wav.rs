//! WAV encoding and decoding via hound.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::{AudioError, Result};
use crate::pcm::{Format, Segment};

/// Returns true if `data` starts with a RIFF/WAVE header.
pub fn is_wav(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WAVE"
}

/// Encodes a segment as a 16-bit PCM WAV file.
pub fn encode(segment: &Segment) -> Result<Vec<u8>> {
    let format = segment.format();
    let spec = WavSpec {
        channels: format.channels() as u16,
        sample_rate: format.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &s in segment.samples() {
            writer.write_sample(s)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Decodes a WAV file into a 16-bit segment.
///
/// Integer samples of any width and 32-bit float samples are rescaled to
/// 16 bits. Files with more than two channels keep the first two.
pub fn decode(data: &[u8]) -> Result<Segment> {
    let reader = WavReader::new(Cursor::new(data))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(AudioError::Unsupported("wav with zero channels".into()));
    }

    let samples: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 8) => reader
            .into_samples::<i8>()
            .map(|s| s.map(|v| (v as i16) << 8))
            .collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, 16) => reader
            .into_samples::<i16>()
            .collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, bits) if bits <= 32 => {
            let shift = bits - 16;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| (v >> shift) as i16))
                .collect::<std::result::Result<_, _>>()?
        }
        (SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .map(|s| s.map(|v| (v * 32767.0).clamp(-32768.0, 32767.0) as i16))
            .collect::<std::result::Result<_, _>>()?,
        (fmt, bits) => {
            return Err(AudioError::Unsupported(format!(
                "wav sample format {:?} with {} bits",
                fmt, bits
            )));
        }
    };

    Ok(keep_two_channels(spec.sample_rate, channels, samples))
}

/// Builds a segment from interleaved samples, dropping channels beyond the second.
pub(crate) fn keep_two_channels(sample_rate: u32, channels: usize, samples: Vec<i16>) -> Segment {
    match channels {
        1 => Segment::from_samples(Format::mono(sample_rate), samples),
        2 => Segment::from_samples(Format::stereo(sample_rate), samples),
        n => {
            let stereo = samples
                .chunks_exact(n)
                .flat_map(|frame| [frame[0], frame[1]])
                .collect();
            Segment::from_samples(Format::stereo(sample_rate), stereo)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_encode_header() {
        let seg = Segment::silent(Format::MONO_16K, Duration::from_millis(100));
        let data = encode(&seg).unwrap();
        assert!(is_wav(&data));
        // 44-byte canonical header + 3200 bytes of samples
        assert_eq!(data.len(), 44 + 3200);
    }

    #[test]
    fn test_encode_decode() {
        let seg = Segment::from_samples(Format::STEREO_44K, vec![1, -1, 1000, -1000, i16::MAX, i16::MIN]);
        let decoded = decode(&encode(&seg).unwrap()).unwrap();
        assert_eq!(decoded, seg);
    }

    #[test]
    fn test_decode_float_wav() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            writer.write_sample(0.5f32).unwrap();
            writer.write_sample(-1.0f32).unwrap();
            writer.finalize().unwrap();
        }
        let seg = decode(&cursor.into_inner()).unwrap();
        assert_eq!(seg.format(), Format::mono(8000));
        assert_eq!(seg.samples(), &[16383, -32767]);
    }

    #[test]
    fn test_keep_two_channels() {
        let seg = keep_two_channels(8000, 3, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(seg.format(), Format::stereo(8000));
        assert_eq!(seg.samples(), &[1, 2, 4, 5]);
    }

    #[test]
    fn test_is_wav() {
        assert!(!is_wav(b"ID3\x03"));
        assert!(!is_wav(b"RIFF"));
    }
}
