//! Speech track assembly.

use apg_audio::{Format, Segment};
use tracing::debug;

use crate::dispatch::SynthesizedSegment;
use crate::error::{Error, Result};
use crate::phrase::pause_duration;

/// Concatenates segments in index order, each followed by its pause.
///
/// The result is in `format`; segments in another format are converted.
/// A zero pause appends nothing. A pause below zero or above
/// [`MAX_PAUSE_SECS`] fails with [`Error::Pause`].
///
/// [`MAX_PAUSE_SECS`]: crate::phrase::MAX_PAUSE_SECS
pub fn assemble(mut segments: Vec<SynthesizedSegment>, format: Format) -> Result<Segment> {
    segments.sort_by_key(|s| s.index);

    let mut track = Segment::empty(format);
    for seg in &segments {
        track.append(&seg.audio)?;
        let pause = pause_duration(seg.pause).ok_or_else(|| Error::Pause {
            index: seg.index,
            seconds: seg.pause,
        })?;
        if !pause.is_zero() {
            track.append_silence(pause)?;
        }
    }

    debug!(
        segments = segments.len(),
        ms = track.duration_ms(),
        "assembled speech track"
    );
    Ok(track)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn tone(ms: u64, value: i16) -> Segment {
        let format = Format::MONO_16K;
        let frames = format.frames_in(Duration::from_millis(ms));
        Segment::from_samples(format, vec![value; frames])
    }

    fn seg(index: usize, audio: Segment, pause: f64) -> SynthesizedSegment {
        SynthesizedSegment { index, audio, pause }
    }

    #[test]
    fn test_duration_is_sum_of_audio_and_pauses() {
        let track = assemble(
            vec![seg(0, tone(300, 1), 2.0), seg(1, tone(450, 2), 0.0)],
            Format::MONO_16K,
        )
        .unwrap();
        assert_eq!(track.duration(), Duration::from_millis(300 + 2000 + 450));
    }

    #[test]
    fn test_order_follows_index() {
        let track = assemble(
            vec![seg(1, tone(10, 2), 0.0), seg(0, tone(10, 1), 0.0)],
            Format::MONO_16K,
        )
        .unwrap();
        assert_eq!(track.samples()[0], 1);
        assert_eq!(*track.samples().last().unwrap(), 2);
    }

    #[test]
    fn test_silence_unit() {
        let track = assemble(
            vec![seg(0, Segment::empty(Format::MONO_16K), 5.0)],
            Format::MONO_16K,
        )
        .unwrap();
        assert_eq!(track.duration(), Duration::from_secs(5));
        assert!(track.samples().iter().all(|&s| s == 0));
    }

    #[test]
    fn test_fractional_pause() {
        let track = assemble(vec![seg(0, tone(100, 1), 0.25)], Format::MONO_16K).unwrap();
        assert_eq!(track.duration(), Duration::from_millis(350));
    }

    #[test]
    fn test_rejects_unusable_pause() {
        for pause in [1e20, -1.0, f64::NAN] {
            let result = assemble(
                vec![seg(0, tone(10, 1), 1.0), seg(1, tone(10, 1), pause)],
                Format::MONO_16K,
            );
            assert!(
                matches!(result, Err(Error::Pause { index: 1, .. })),
                "pause {}",
                pause
            );
        }
    }

    #[test]
    fn test_empty() {
        let track = assemble(Vec::new(), Format::MONO_24K).unwrap();
        assert!(track.is_empty());
        assert_eq!(track.format(), Format::MONO_24K);
    }
}
