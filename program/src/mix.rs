//! Background mixing.
//!
//! The order of operations is fixed: normalize the background to the
//! speech length, attenuate, fade, then overlay. Fades therefore act on
//! the normalized length, and may overlap on short programs.

use std::time::Duration;

use apg_audio::Segment;
use tracing::debug;

use crate::error::{Error, Result};

/// Default background fade-in.
pub const DEFAULT_FADE_IN: Duration = Duration::from_millis(3000);

/// Default background fade-out.
pub const DEFAULT_FADE_OUT: Duration = Duration::from_millis(6000);

/// Background treatment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixOptions {
    /// Gain reduction of the background in dB. Never negative.
    pub attenuation_db: f64,
    pub fade_in: Duration,
    pub fade_out: Duration,
}

impl Default for MixOptions {
    fn default() -> Self {
        Self {
            attenuation_db: 0.0,
            fade_in: DEFAULT_FADE_IN,
            fade_out: DEFAULT_FADE_OUT,
        }
    }
}

/// Loops or truncates `background` to exactly `frames` frames.
///
/// A background shorter than `frames` is repeated `ceil(frames / len)`
/// times and cut; a longer one is cut from its start.
pub fn normalize_length(background: &Segment, frames: usize) -> Result<Segment> {
    let len = background.frames();
    if len == 0 {
        return Err(Error::MixInput("background track has zero length".to_string()));
    }

    if frames > len {
        let repeats = frames.div_ceil(len);
        let mut looped = background.repeat(repeats);
        looped.truncate_frames(frames);
        debug!(repeats, frames, "looped background");
        Ok(looped)
    } else {
        Ok(background.slice_frames(0, frames))
    }
}

/// Mixes `background` under `speech`.
///
/// The result has the speech track's format and length.
pub fn mix(speech: &Segment, background: &Segment, options: &MixOptions) -> Result<Segment> {
    if !options.attenuation_db.is_finite() || options.attenuation_db < 0.0 {
        return Err(Error::Config(format!(
            "attenuation must be a non-negative number of dB, got {}",
            options.attenuation_db
        )));
    }

    let background = background.convert(speech.format())?;
    let bed = normalize_length(&background, speech.frames())?
        .apply_gain(-options.attenuation_db)
        .fade_in(options.fade_in)
        .fade_out(options.fade_out);

    debug!(
        speech_ms = speech.duration_ms(),
        background_ms = background.duration_ms(),
        attenuation_db = options.attenuation_db,
        "mixing background"
    );
    Ok(speech.overlay(&bed)?)
}
