//! Concurrent synthesis with ordered reassembly.
//!
//! Every speech unit becomes one task in a [`JoinSet`]; a [`Semaphore`]
//! bounds how many of them talk to the synthesizer at once. Results land
//! in a slot vector indexed by unit position, so completion order never
//! leaks into the output. The first failure aborts all outstanding tasks.

use std::sync::Arc;
use std::time::Duration;

use apg_audio::{Format, Segment, codec};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{Error, Result, SynthError};
use crate::phrase::Unit;
use crate::progress::Progress;
use crate::synth::{Synthesizer, Voice};

/// Default retry backoff base.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Worker pool settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Maximum number of synthesis calls in flight.
    pub concurrency: usize,
    /// Retries per unit for retryable failures.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_backoff: Duration,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            max_retries: 2,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

/// Audio produced for one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedSegment {
    /// Index of the unit this audio belongs to.
    pub index: usize,
    /// Decoded speech in the working format. Empty for silence units.
    pub audio: Segment,
    /// Seconds of silence to follow the audio.
    pub pause: f64,
}

/// Turns units into audio segments with bounded concurrency.
pub struct Dispatcher {
    synth: Arc<dyn Synthesizer>,
    voice: Voice,
    format: Format,
    options: DispatchOptions,
    progress: Option<Arc<dyn Progress>>,
}

impl Dispatcher {
    /// Creates a dispatcher producing segments in `format`.
    pub fn new(synth: Arc<dyn Synthesizer>, voice: Voice, format: Format) -> Self {
        Self {
            synth,
            voice,
            format,
            options: DispatchOptions::default(),
            progress: None,
        }
    }

    pub fn options(mut self, options: DispatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Synthesizes every unit and returns segments in unit order.
    ///
    /// Silence units never reach the synthesizer. Fails with
    /// [`Error::Synthesis`] naming the first unit that failed.
    pub async fn dispatch(&self, units: &[Unit]) -> Result<Vec<SynthesizedSegment>> {
        if let Some(p) = &self.progress {
            p.start(units.len());
        }
        let result = self.run(units).await;
        if let Some(p) = &self.progress {
            p.finish();
        }
        result
    }

    async fn run(&self, units: &[Unit]) -> Result<Vec<SynthesizedSegment>> {
        let concurrency = self.options.concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut slots: Vec<Option<SynthesizedSegment>> = vec![None; units.len()];
        let mut tasks = JoinSet::new();

        info!(units = units.len(), concurrency, "dispatching synthesis");

        for (slot, unit) in units.iter().enumerate() {
            if unit.is_silence() {
                debug!(index = unit.index, pause = unit.pause, "silence unit");
                slots[slot] = Some(SynthesizedSegment {
                    index: unit.index,
                    audio: Segment::empty(self.format),
                    pause: unit.pause,
                });
                self.advance(unit.index);
                continue;
            }

            let semaphore = semaphore.clone();
            let synth = self.synth.clone();
            let voice = self.voice.clone();
            let format = self.format;
            let options = self.options.clone();
            let unit = unit.clone();

            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => synthesize_unit(synth.as_ref(), &unit, &voice, format, &options).await,
                    Err(_) => Err(SynthError::provider("worker pool closed")),
                };
                (slot, unit, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (slot, unit, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    tasks.abort_all();
                    return Err(Error::Task(e));
                }
            };
            match result {
                Ok(audio) => {
                    debug!(index = unit.index, ms = audio.duration_ms(), "unit synthesized");
                    slots[slot] = Some(SynthesizedSegment {
                        index: unit.index,
                        audio,
                        pause: unit.pause,
                    });
                    self.advance(unit.index);
                }
                Err(source) => {
                    tasks.abort_all();
                    return Err(Error::Synthesis {
                        index: unit.index,
                        text: unit.text,
                        source,
                    });
                }
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }

    fn advance(&self, index: usize) {
        if let Some(p) = &self.progress {
            p.advance(index);
        }
    }
}

/// Decodes synthesized audio into `format` on the blocking pool.
async fn decode_blocking(
    bytes: Vec<u8>,
    hint: Option<String>,
    format: Format,
) -> std::result::Result<Segment, SynthError> {
    let task = tokio::task::spawn_blocking(move || -> std::result::Result<Segment, SynthError> {
        let audio = codec::decode(&bytes, hint.as_deref())?;
        Ok(audio.convert(format)?)
    });
    task.await
        .map_err(|e| SynthError::provider(format!("decode task failed: {}", e)))?
}

/// Synthesizes and decodes one unit, retrying retryable failures.
async fn synthesize_unit(
    synth: &dyn Synthesizer,
    unit: &Unit,
    voice: &Voice,
    format: Format,
    options: &DispatchOptions,
) -> std::result::Result<Segment, SynthError> {
    let mut attempt = 0;
    loop {
        match synth.synthesize(&unit.text, voice).await {
            Ok(bytes) => {
                let hint = synth.format_hint().map(str::to_owned);
                return decode_blocking(bytes, hint, format).await;
            }
            Err(e) if e.is_retryable() && attempt < options.max_retries => {
                attempt += 1;
                let backoff = options.retry_backoff * 2u32.saturating_pow(attempt - 1);
                warn!(index = unit.index, attempt, error = %e, "synthesis failed, retrying");
                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}
