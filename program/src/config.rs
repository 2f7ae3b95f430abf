//! Render configuration.

use std::time::Duration;

use apg_audio::Format;
use apg_gtts::Accent;

use crate::dispatch::{DEFAULT_RETRY_BACKOFF, DispatchOptions};
use crate::error::{Error, Result};
use crate::export::OutputFormat;
use crate::mix::{DEFAULT_FADE_IN, DEFAULT_FADE_OUT, MixOptions};
use crate::phrase::{BookOptions, Mode};
use crate::synth::Voice;

/// Upper bound of the default concurrency.
pub const MAX_DEFAULT_CONCURRENCY: usize = 8;

/// Settings for one render. Built once and never changed while rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub accent: Accent,
    /// IETF language tag passed to the synthesizer.
    pub lang: String,
    /// Speak at reduced speed.
    pub slow: bool,
    /// Background gain reduction in dB.
    pub attenuation_db: f64,
    pub fade_in: Duration,
    pub fade_out: Duration,
    /// Maximum synthesis calls in flight.
    pub concurrency: usize,
    pub mode: Mode,
    pub book: BookOptions,
    pub output_format: OutputFormat,
    /// Format every segment is converted to before assembly.
    pub working_format: Format,
    /// Attach the progress observer, if one is given.
    pub show_progress: bool,
    /// Upper bound on the whole synthesis stage.
    pub timeout: Option<Duration>,
    /// Retries per unit for retryable synthesis failures.
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            accent: Accent::US,
            lang: apg_gtts::DEFAULT_LANG.to_string(),
            slow: false,
            attenuation_db: 0.0,
            fade_in: DEFAULT_FADE_IN,
            fade_out: DEFAULT_FADE_OUT,
            concurrency: default_concurrency(),
            mode: Mode::Structured,
            book: BookOptions::default(),
            output_format: OutputFormat::Wav,
            working_format: Format::MONO_24K,
            show_progress: true,
            timeout: None,
            max_retries: 2,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

impl RenderConfig {
    /// Checks every field for a usable value.
    pub fn validate(&self) -> Result<()> {
        if !self.attenuation_db.is_finite() || self.attenuation_db < 0.0 {
            return Err(Error::Config(format!(
                "attenuation must be a non-negative number of dB, got {}",
                self.attenuation_db
            )));
        }
        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be at least 1".to_string()));
        }
        if self.lang.trim().is_empty() {
            return Err(Error::Config("lang must be non-empty".to_string()));
        }
        if self.working_format.sample_rate == 0 {
            return Err(Error::Config("working sample rate must be positive".to_string()));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(Error::Config("timeout must be positive".to_string()));
        }
        Ok(())
    }

    /// Voice parameters for the synthesizer.
    pub fn voice(&self) -> Voice {
        Voice {
            accent: self.accent,
            lang: self.lang.clone(),
            slow: self.slow,
        }
    }

    /// Background treatment.
    pub fn mix_options(&self) -> MixOptions {
        MixOptions {
            attenuation_db: self.attenuation_db,
            fade_in: self.fade_in,
            fade_out: self.fade_out,
        }
    }

    /// Worker pool settings.
    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            concurrency: self.concurrency,
            max_retries: self.max_retries,
            retry_backoff: self.retry_backoff,
        }
    }
}

/// Available hardware parallelism, clamped to `1..=8`.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .clamp(1, MAX_DEFAULT_CONCURRENCY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.accent, Accent::US);
        assert_eq!(config.lang, "en");
        assert_eq!(config.fade_in, Duration::from_millis(3000));
        assert_eq!(config.fade_out, Duration::from_millis(6000));
        assert_eq!(config.output_format, OutputFormat::Wav);
        assert_eq!(config.mode, Mode::Structured);
        assert!((1..=MAX_DEFAULT_CONCURRENCY).contains(&config.concurrency));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            RenderConfig {
                attenuation_db: -1.0,
                ..Default::default()
            },
            RenderConfig {
                attenuation_db: f64::NAN,
                ..Default::default()
            },
            RenderConfig {
                concurrency: 0,
                ..Default::default()
            },
            RenderConfig {
                lang: " ".to_string(),
                ..Default::default()
            },
            RenderConfig {
                timeout: Some(Duration::ZERO),
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(Error::Config(_))), "{:?}", config);
        }
    }

    #[test]
    fn test_derived_options() {
        let config = RenderConfig {
            accent: Accent::IE,
            slow: true,
            attenuation_db: 12.0,
            concurrency: 3,
            ..Default::default()
        };
        assert_eq!(config.voice().accent, Accent::IE);
        assert!(config.voice().slow);
        assert_eq!(config.mix_options().attenuation_db, 12.0);
        assert_eq!(config.dispatch_options().concurrency, 3);
    }
}
