//! Sample rate and channel layout conversion.
//!
//! Sample-rate conversion uses the rubato FFT resampler, a pure Rust
//! implementation without any FFI dependencies. Channel conversion is a
//! plain average (stereo to mono) or duplication (mono to stereo).

use rubato::{FftFixedInOut, Resampler};
use tracing::debug;

use crate::error::Result;
use crate::pcm::Format;

/// Number of frames per rubato processing block.
const CHUNK_FRAMES: usize = 1024;

/// Converts interleaved samples from `src` format to `dst` format.
pub fn convert(samples: &[i16], src: Format, dst: Format) -> Result<Vec<i16>> {
    if src == dst {
        return Ok(samples.to_vec());
    }

    // Work at the smaller channel count while resampling.
    let remixed = match (src.stereo, dst.stereo) {
        (true, false) => stereo_to_mono(samples),
        _ => samples.to_vec(),
    };
    let channels = if src.stereo && dst.stereo { 2 } else { 1 };

    let resampled = if src.sample_rate != dst.sample_rate {
        resample(&remixed, channels, src.sample_rate, dst.sample_rate)?
    } else {
        remixed
    };

    Ok(match (src.stereo, dst.stereo) {
        (false, true) => mono_to_stereo(&resampled),
        _ => resampled,
    })
}

/// Resamples interleaved samples with `channels` channels from `from` Hz to `to` Hz.
///
/// The output holds exactly `round(frames * to / from)` frames; the
/// resampler's startup delay is trimmed from the front.
pub fn resample(samples: &[i16], channels: usize, from: u32, to: u32) -> Result<Vec<i16>> {
    let frames = samples.len() / channels;
    if frames == 0 || from == to {
        return Ok(samples.to_vec());
    }

    let expected = ((frames as u64 * to as u64 + from as u64 / 2) / from as u64) as usize;

    let mut resampler =
        FftFixedInOut::<f32>::new(from as usize, to as usize, CHUNK_FRAMES, channels)?;
    let delay = resampler.output_delay();

    debug!(frames, from, to, delay, "resampling");

    let mut input_buf = vec![Vec::<f32>::new(); channels];
    let mut output_buf = vec![Vec::<f32>::new(); channels];
    let mut out: Vec<Vec<f32>> = vec![Vec::with_capacity(expected + delay); channels];

    let mut pos = 0;
    while out[0].len() < expected + delay {
        let frames_needed = resampler.input_frames_next();

        // Convert i16 interleaved to f32 per-channel, zero padding past the end.
        for (ch, buf) in input_buf.iter_mut().enumerate() {
            buf.clear();
            buf.extend((0..frames_needed).map(|i| {
                let frame = pos + i;
                if frame < frames {
                    samples[frame * channels + ch] as f32 / 32768.0
                } else {
                    0.0
                }
            }));
        }
        pos += frames_needed;

        let output_frames = resampler.output_frames_next();
        for buf in output_buf.iter_mut() {
            buf.clear();
            buf.resize(output_frames, 0.0);
        }

        let (_, written) = resampler.process_into_buffer(&input_buf, &mut output_buf, None)?;
        for (dst, src) in out.iter_mut().zip(output_buf.iter()) {
            dst.extend_from_slice(&src[..written]);
        }
    }

    // Convert f32 per-channel back to i16 interleaved
    let mut result = Vec::with_capacity(expected * channels);
    for frame in delay..delay + expected {
        for ch_buf in out.iter() {
            result.push((ch_buf[frame] * 32767.0).clamp(-32768.0, 32767.0) as i16);
        }
    }
    Ok(result)
}

/// Averages interleaved stereo frames down to mono.
pub fn stereo_to_mono(samples: &[i16]) -> Vec<i16> {
    samples
        .chunks_exact(2)
        .map(|lr| ((lr[0] as i32 + lr[1] as i32) / 2) as i16)
        .collect()
}

/// Duplicates each mono sample into a stereo frame.
pub fn mono_to_stereo(samples: &[i16]) -> Vec<i16> {
    samples.iter().flat_map(|&s| [s, s]).collect()
}
