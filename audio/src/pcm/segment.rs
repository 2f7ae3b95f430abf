//! In-memory audio segments.
//!
//! A [`Segment`] is a finite, fully decoded buffer of 16-bit PCM frames.
//! Every operation here is offline: lengths are exact frame counts and
//! nothing depends on wall-clock pacing.

use std::time::Duration;

use super::Format;
use crate::error::{AudioError, Result};
use crate::resampler;

/// Gain applied at the silent end of a fade envelope.
const SILENT: f32 = 0.0;

/// A finite buffer of interleaved 16-bit PCM frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    format: Format,
    samples: Vec<i16>,
}

impl Segment {
    /// Creates a zero-length segment.
    pub fn empty(format: Format) -> Self {
        Self {
            format,
            samples: Vec::new(),
        }
    }

    /// Creates a segment of digital silence.
    pub fn silent(format: Format, duration: Duration) -> Self {
        let frames = format.frames_in(duration);
        Self {
            format,
            samples: vec![0; frames * format.channels()],
        }
    }

    /// Creates a segment from interleaved samples.
    ///
    /// A trailing partial frame is dropped.
    pub fn from_samples(format: Format, mut samples: Vec<i16>) -> Self {
        let whole = samples.len() - samples.len() % format.channels();
        samples.truncate(whole);
        Self { format, samples }
    }

    /// Creates a segment from little-endian 16-bit PCM bytes.
    pub fn from_le_bytes(format: Format, data: &[u8]) -> Self {
        let samples = data
            .chunks_exact(2)
            .map(|bytes| i16::from_le_bytes([bytes[0], bytes[1]]))
            .collect();
        Self::from_samples(format, samples)
    }

    /// Returns the audio format.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Returns the interleaved samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Consumes the segment and returns the interleaved samples.
    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }

    /// Returns the number of frames.
    pub fn frames(&self) -> usize {
        self.samples.len() / self.format.channels()
    }

    /// Returns true if the segment holds no frames.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the playback duration.
    pub fn duration(&self) -> Duration {
        self.format.duration_of(self.frames())
    }

    /// Returns the playback duration in whole milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.duration().as_millis() as u64
    }

    /// Returns the samples as little-endian bytes.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.samples.len() * 2);
        for sample in &self.samples {
            data.extend_from_slice(&sample.to_le_bytes());
        }
        data
    }

    /// Returns this segment converted to `format`.
    pub fn convert(&self, format: Format) -> Result<Segment> {
        if format == self.format {
            return Ok(self.clone());
        }
        let samples = resampler::convert(&self.samples, self.format, format)?;
        Ok(Segment::from_samples(format, samples))
    }

    /// Appends `other` to the end of this segment.
    ///
    /// `other` is converted to this segment's format first.
    pub fn append(&mut self, other: &Segment) -> Result<()> {
        if other.format == self.format {
            self.samples.extend_from_slice(&other.samples);
        } else {
            let converted = other.convert(self.format)?;
            self.samples.extend_from_slice(&converted.samples);
        }
        Ok(())
    }

    /// Appends `duration` of silence.
    ///
    /// Fails with [`AudioError::TooLong`] if the sample count overflows.
    pub fn append_silence(&mut self, duration: Duration) -> Result<()> {
        let len = self
            .format
            .try_frames_in(duration)
            .and_then(|frames| frames.checked_mul(self.format.channels()))
            .and_then(|n| n.checked_add(self.samples.len()))
            .ok_or(AudioError::TooLong(duration))?;
        self.samples.resize(len, 0);
        Ok(())
    }

    /// Concatenates segments into a new segment of the given format.
    pub fn concat<'a, I>(format: Format, parts: I) -> Result<Segment>
    where
        I: IntoIterator<Item = &'a Segment>,
    {
        let mut out = Segment::empty(format);
        for part in parts {
            out.append(part)?;
        }
        Ok(out)
    }

    /// Returns the audio between `start` and `end`, clamped to the segment bounds.
    pub fn slice(&self, start: Duration, end: Duration) -> Segment {
        let start = self.format.frames_in(start).min(self.frames());
        let end = self.format.frames_in(end).clamp(start, self.frames());
        self.slice_frames(start, end)
    }

    /// Returns the audio between frame `start` and frame `end` (exclusive).
    pub fn slice_frames(&self, start: usize, end: usize) -> Segment {
        let ch = self.format.channels();
        let end = end.min(self.frames());
        let start = start.min(end);
        Segment {
            format: self.format,
            samples: self.samples[start * ch..end * ch].to_vec(),
        }
    }

    /// Shortens the segment to at most `duration`.
    pub fn truncate(&mut self, duration: Duration) {
        let frames = self.format.frames_in(duration);
        self.truncate_frames(frames);
    }

    /// Shortens the segment to at most `frames` frames.
    pub fn truncate_frames(&mut self, frames: usize) {
        self.samples.truncate(frames * self.format.channels());
    }

    /// Returns this segment played back-to-back `times` times.
    pub fn repeat(&self, times: usize) -> Segment {
        Segment {
            format: self.format,
            samples: self.samples.repeat(times),
        }
    }

    /// Returns a copy with the gain changed by `db` decibels.
    ///
    /// Negative values attenuate. Samples saturate at the i16 range.
    pub fn apply_gain(&self, db: f64) -> Segment {
        if db == 0.0 {
            return self.clone();
        }
        let factor = db_to_ratio(db);
        Segment {
            format: self.format,
            samples: self
                .samples
                .iter()
                .map(|&s| scale(s, factor as f32))
                .collect(),
        }
    }

    /// Returns a copy with a linear fade-in over the first `duration`.
    ///
    /// The envelope is clamped to the segment length.
    pub fn fade_in(&self, duration: Duration) -> Segment {
        let n = self.format.frames_in(duration).min(self.frames());
        let mut out = self.clone();
        out.shape(0, n, |i| i as f32 / n as f32);
        out
    }

    /// Returns a copy with a linear fade-out over the last `duration`.
    ///
    /// The envelope is clamped to the segment length.
    pub fn fade_out(&self, duration: Duration) -> Segment {
        let frames = self.frames();
        let n = self.format.frames_in(duration).min(frames);
        let mut out = self.clone();
        out.shape(frames - n, n, |i| {
            if n <= 1 {
                SILENT
            } else {
                1.0 - i as f32 / (n - 1) as f32
            }
        });
        out
    }

    /// Mixes `other` on top of this segment starting at frame 0.
    ///
    /// The result always has this segment's length and format: `other` is
    /// converted first, and anything past this segment's end is dropped.
    pub fn overlay(&self, other: &Segment) -> Result<Segment> {
        let other = other.convert(self.format)?;
        let mut samples = self.samples.clone();
        for (dst, &src) in samples.iter_mut().zip(other.samples.iter()) {
            *dst = dst.saturating_add(src);
        }
        Ok(Segment {
            format: self.format,
            samples,
        })
    }

    /// Multiplies `len` frames starting at `start` by `gain(i)`, where `i`
    /// is the frame offset within the window.
    fn shape(&mut self, start: usize, len: usize, gain: impl Fn(usize) -> f32) {
        let ch = self.format.channels();
        for i in 0..len {
            let g = gain(i);
            let base = (start + i) * ch;
            for s in &mut self.samples[base..base + ch] {
                *s = scale(*s, g);
            }
        }
    }
}

/// Converts a decibel change to a linear amplitude ratio.
pub fn db_to_ratio(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

fn scale(sample: i16, factor: f32) -> i16 {
    (sample as f32 * factor)
        .round()
        .clamp(i16::MIN as f32, i16::MAX as f32) as i16
}
