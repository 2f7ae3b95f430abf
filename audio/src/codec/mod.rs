//! Audio codecs.
//!
//! [`decode`] turns any supported container into a [`Segment`]: WAV goes
//! through hound, everything else (MP3, OGG/Vorbis, FLAC, AAC) through
//! symphonia's probe.

pub mod wav;

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::error::{AudioError, Result};
use crate::pcm::Segment;

/// Decodes an encoded audio file held in memory.
///
/// `hint` is an optional file extension ("mp3", "ogg", ...) that helps the
/// container probe. The segment keeps the source sample rate; sources with
/// more than two channels keep the first two.
pub fn decode(data: &[u8], hint: Option<&str>) -> Result<Segment> {
    if wav::is_wav(data) {
        let segment = wav::decode(data)?;
        return non_empty(segment);
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(data.to_vec())), Default::default());
    let mut probe_hint = Hint::new();
    if let Some(ext) = hint {
        probe_hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &probe_hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::Unsupported("no decodable audio track".into()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count());

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples: Vec<i16> = Vec::new();

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                warn!(error = msg, "skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);
        channels.get_or_insert(spec.channels.count());

        let mut sample_buf = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    let (Some(sample_rate), Some(channels)) = (sample_rate, channels) else {
        return Err(AudioError::Empty);
    };
    if channels == 0 {
        return Err(AudioError::Unsupported("zero channels".into()));
    }
    debug!(sample_rate, channels, samples = samples.len(), "decoded audio");

    non_empty(wav::keep_two_channels(sample_rate, channels, samples))
}

fn non_empty(segment: Segment) -> Result<Segment> {
    if segment.is_empty() {
        Err(AudioError::Empty)
    } else {
        Ok(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcm::Format;

    #[test]
    fn test_decode_wav() {
        let seg = Segment::from_samples(Format::MONO_16K, vec![100; 1600]);
        let data = wav::encode(&seg).unwrap();
        let decoded = decode(&data, Some("wav")).unwrap();
        assert_eq!(decoded, seg);
    }

    #[test]
    fn test_decode_empty_wav() {
        let data = wav::encode(&Segment::empty(Format::MONO_16K)).unwrap();
        assert!(matches!(decode(&data, None), Err(AudioError::Empty)));
    }

    #[test]
    fn test_decode_garbage() {
        let result = decode(b"definitely not audio data", Some("mp3"));
        assert!(result.is_err());
    }
}
