//! Audio primitives for the program generator.
//!
//! - `pcm`: in-memory 16-bit PCM segments and their format
//! - `codec`: decoding encoded files into segments, WAV encoding
//! - `resampler`: sample-rate and channel conversion
//!
//! # Example
//!
//! ```rust
//! use apg_audio::{Format, Segment};
//! use std::time::Duration;
//!
//! let speech = Segment::silent(Format::MONO_24K, Duration::from_secs(2));
//! let bed = Segment::silent(Format::MONO_24K, Duration::from_millis(500))
//!     .repeat(4)
//!     .apply_gain(-10.0)
//!     .fade_in(Duration::from_millis(300));
//! let mixed = speech.overlay(&bed).unwrap();
//! assert_eq!(mixed.duration(), Duration::from_secs(2));
//! ```

pub mod codec;
pub mod error;
pub mod pcm;
pub mod resampler;

pub use error::{AudioError, Result};
pub use pcm::{Format, Segment};
