//! PCM audio format definitions.

use std::time::Duration;

/// Describes a PCM audio format.
/// Samples are always 16-bit signed integers, interleaved for stereo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Format {
    /// Sample rate in Hz (e.g., 24000, 44100).
    pub sample_rate: u32,
    /// True for stereo (2 channels), false for mono (1 channel).
    pub stereo: bool,
}

impl Format {
    /// Creates a new format with the given sample rate and mono audio.
    pub const fn mono(sample_rate: u32) -> Self {
        Self { sample_rate, stereo: false }
    }

    /// Creates a new format with the given sample rate and stereo audio.
    pub const fn stereo(sample_rate: u32) -> Self {
        Self { sample_rate, stereo: true }
    }

    /// Returns the number of channels (1 for mono, 2 for stereo).
    pub fn channels(&self) -> usize {
        if self.stereo { 2 } else { 1 }
    }

    /// Returns the number of bytes per sample frame.
    /// For 16-bit audio: 2 bytes for mono, 4 bytes for stereo.
    pub fn sample_bytes(&self) -> usize {
        if self.stereo { 4 } else { 2 }
    }

    /// Returns the number of whole frames covering `duration`, or `None`
    /// if the count does not fit in a `usize`.
    ///
    /// Rounds to the nearest frame so that millisecond durations at common
    /// sample rates map to exact frame counts.
    pub fn try_frames_in(&self, duration: Duration) -> Option<usize> {
        let frames = duration
            .as_nanos()
            .checked_mul(self.sample_rate as u128)?
            .checked_add(500_000_000)?
            / 1_000_000_000;
        usize::try_from(frames).ok()
    }

    /// Like [`try_frames_in`](Self::try_frames_in), saturating at `usize::MAX`.
    ///
    /// Suitable for positions that are clamped to a buffer length afterwards.
    pub fn frames_in(&self, duration: Duration) -> usize {
        self.try_frames_in(duration).unwrap_or(usize::MAX)
    }

    /// Returns the playback duration of `frames` frames.
    pub fn duration_of(&self, frames: usize) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let nanos = frames as u128 * 1_000_000_000 / self.sample_rate as u128;
        Duration::from_nanos(nanos as u64)
    }

    /// Returns the number of bytes needed for `duration` of audio.
    pub fn bytes_in_duration(&self, duration: Duration) -> usize {
        self.frames_in(duration).saturating_mul(self.sample_bytes())
    }
}

// Common format presets
impl Format {
    /// 16kHz mono
    pub const MONO_16K: Format = Format::mono(16000);
    /// 24kHz mono (the rate the translate TTS endpoint produces)
    pub const MONO_24K: Format = Format::mono(24000);
    /// 44.1kHz mono (CD quality mono)
    pub const MONO_44K: Format = Format::mono(44100);
    /// 44.1kHz stereo (CD quality)
    pub const STEREO_44K: Format = Format::stereo(44100);
    /// 48kHz stereo
    pub const STEREO_48K: Format = Format::stereo(48000);
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let layout = if self.stereo { "stereo" } else { "mono" };
        write!(f, "{}Hz {}", self.sample_rate, layout)
    }
}
