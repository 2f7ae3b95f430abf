//! PCM (Pulse Code Modulation) audio handling.
//!
//! # Key Types
//!
//! - [`Format`]: Sample rate and channel layout of 16-bit PCM
//! - [`Segment`]: A finite decoded buffer with the offline editing
//!   operations a rendered program needs (concatenate, slice, repeat,
//!   gain, fades, overlay)
//!
//! # Example
//!
//! ```rust
//! use apg_audio::pcm::{Format, Segment};
//! use std::time::Duration;
//!
//! let mut track = Segment::silent(Format::MONO_16K, Duration::from_millis(250));
//! track.append_silence(Duration::from_millis(750))?;
//! assert_eq!(track.duration_ms(), 1000);
//!
//! let quieter = track.apply_gain(-6.0).fade_in(Duration::from_millis(100));
//! assert_eq!(quieter.frames(), track.frames());
//! # Ok::<(), apg_audio::AudioError>(())
//! ```

mod format;
mod segment;

pub use format::Format;
pub use segment::{Segment, db_to_ratio};
