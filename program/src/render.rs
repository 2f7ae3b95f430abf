//! The render pipeline: parse, synthesize, assemble, mix.

use std::sync::Arc;

use apg_audio::{Segment, codec};
use tracing::{info, warn};

use crate::assemble::assemble;
use crate::config::RenderConfig;
use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::export::OutputFormat;
use crate::mix::mix;
use crate::phrase::{Parser, Unit};
use crate::progress::{Progress, Stage};
use crate::segment::SentenceSegmenter;
use crate::synth::Synthesizer;

/// Non-fatal conditions observed during a render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The script produced no units; the track is empty.
    EmptyProgram,
}

/// What happened during a render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderReport {
    pub units: Vec<Unit>,
    pub skipped_lines: usize,
    pub warnings: Vec<Warning>,
}

/// A finished render, ready for export.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub track: Segment,
    pub format: OutputFormat,
    pub report: RenderReport,
}

/// Background audio handed to a render.
#[derive(Debug, Clone, Copy)]
pub struct Background<'a> {
    pub data: &'a [u8],
    /// File extension to help the decoder, e.g. `wav`.
    pub hint: Option<&'a str>,
}

/// Runs renders with one configuration and one synthesizer.
pub struct Renderer {
    config: RenderConfig,
    synth: Arc<dyn Synthesizer>,
    parser: Parser,
    progress: Option<Arc<dyn Progress>>,
}

impl Renderer {
    /// Creates a renderer after validating `config`.
    pub fn new(config: RenderConfig, synth: Arc<dyn Synthesizer>) -> Result<Self> {
        config.validate()?;
        let parser = Parser::new().book_options(config.book.clone());
        Ok(Self {
            config,
            synth,
            parser,
            progress: None,
        })
    }

    /// Attaches a progress observer. Ignored when `show_progress` is off.
    pub fn progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Replaces the book-mode sentence segmenter.
    pub fn segmenter(mut self, segmenter: Arc<dyn SentenceSegmenter>) -> Self {
        self.parser = self.parser.segmenter(segmenter);
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Renders a script given as raw bytes, which must be UTF-8.
    pub async fn render_bytes(&self, script: &[u8], background: Option<Background<'_>>) -> Result<Rendered> {
        let text = std::str::from_utf8(script).map_err(crate::phrase::ParseError::from)?;
        self.render(text, background).await
    }

    /// Renders `script`, optionally mixed over `background`.
    ///
    /// The background is decoded before any synthesis, so an unusable
    /// background fails fast.
    pub async fn render(&self, script: &str, background: Option<Background<'_>>) -> Result<Rendered> {
        self.stage(Stage::Parsing);
        let outcome = self.parser.parse(script, self.config.mode)?;
        info!(
            units = outcome.units.len(),
            skipped_lines = outcome.skipped_lines,
            "parsed script"
        );

        let background = background.map(decode_background).transpose()?;

        let mut warnings = Vec::new();
        if outcome.units.is_empty() {
            warn!("script produced no units, program will be empty");
            warnings.push(Warning::EmptyProgram);
        }

        self.stage(Stage::Synthesizing);
        let mut dispatcher = Dispatcher::new(
            self.synth.clone(),
            self.config.voice(),
            self.config.working_format,
        )
        .options(self.config.dispatch_options());
        if let Some(progress) = self.observer() {
            dispatcher = dispatcher.progress(progress);
        }

        let dispatch = dispatcher.dispatch(&outcome.units);
        let segments = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, dispatch)
                .await
                .map_err(|_| Error::Timeout(limit))??,
            None => dispatch.await?,
        };

        self.stage(Stage::Assembling);
        let speech = assemble(segments, self.config.working_format)?;
        info!(ms = speech.duration_ms(), "speech track ready");

        let track = match background {
            Some(bg) => {
                self.stage(Stage::Mixing);
                mix(&speech, &bg, &self.config.mix_options())?
            }
            None => speech,
        };

        self.stage(Stage::Done);
        Ok(Rendered {
            track,
            format: self.config.output_format,
            report: RenderReport {
                units: outcome.units,
                skipped_lines: outcome.skipped_lines,
                warnings,
            },
        })
    }

    fn observer(&self) -> Option<Arc<dyn Progress>> {
        if self.config.show_progress {
            self.progress.clone()
        } else {
            None
        }
    }

    fn stage(&self, stage: Stage) {
        if let Some(p) = self.observer() {
            p.stage(stage);
        }
    }
}

fn decode_background(background: Background<'_>) -> Result<Segment> {
    let segment = codec::decode(background.data, background.hint)
        .map_err(|e| Error::MixInput(e.to_string()))?;
    info!(ms = segment.duration_ms(), format = %segment.format(), "decoded background");
    Ok(segment)
}
