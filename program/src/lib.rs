//! Audio program rendering.
//!
//! A phrase script becomes one audio program:
//!
//! 1. [`phrase`] parses the script into ordered [`Unit`]s.
//! 2. [`dispatch`] synthesizes units concurrently and restores their order.
//! 3. [`assemble`](assemble::assemble) joins the audio with each unit's pause.
//! 4. [`mix`](mix::mix) lays an optional background under the speech.
//! 5. [`export`] encodes the result.
//!
//! [`Renderer`] runs steps 1 to 4 for a [`RenderConfig`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use apg_program::{Exporter, GttsSynthesizer, RenderConfig, Renderer};
//!
//! # async fn run() -> apg_program::Result<()> {
//! let renderer = Renderer::new(RenderConfig::default(), Arc::new(GttsSynthesizer::default()))?;
//! let rendered = renderer.render("Breathe in;4\nBreathe out;4\n", None).await?;
//! let wav = Exporter::new().encode(&rendered.track, rendered.format).await?;
//! # Ok(())
//! # }
//! ```

pub mod assemble;
pub mod config;
pub mod dispatch;
mod error;
pub mod export;
pub mod mix;
pub mod phrase;
pub mod progress;
pub mod render;
pub mod segment;
pub mod synth;

pub use config::RenderConfig;
pub use dispatch::{DispatchOptions, Dispatcher, SynthesizedSegment};
pub use error::{Error, Result, SynthError};
pub use export::{ExportError, Exporter, OutputFormat};
pub use mix::MixOptions;
pub use phrase::{BookOptions, Mode, ParseError, ParseOutcome, Parser, Unit, UnitKind};
pub use progress::{NoProgress, Progress, Stage};
pub use render::{Background, RenderReport, Rendered, Renderer, Warning};
pub use segment::{PunctuationSegmenter, Sentence, SentenceSegmenter};
pub use synth::{CachingSynthesizer, GttsSynthesizer, Synthesizer, Voice};

pub use apg_gtts::Accent;
