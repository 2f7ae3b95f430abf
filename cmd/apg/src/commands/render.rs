//! The render command.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use apg_program::{
    Accent, Background, CachingSynthesizer, Exporter, GttsSynthesizer, Mode, OutputFormat,
    Progress, RenderConfig, Renderer, Synthesizer, Warning,
};
use apg_cli::{Profile, print_verbose};
use clap::Args;
use clap::builder::FalseyValueParser;
use tracing::info;

use super::progress::BarProgress;
use super::{format_bytes, get_profile, print_success, print_warning};
use crate::Cli;

/// Render a phrase file into an audio program.
///
/// Settings are taken from flags, then APG_* environment variables, then
/// the active profile, then built-in defaults.
#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Phrase file, one `text;pause` per line
    #[arg(env = "APG_PHRASE_FILE")]
    pub phrase_file: PathBuf,

    /// Background sound file mixed under the speech
    #[arg(env = "APG_SOUND_FILE")]
    pub sound_file: Option<PathBuf>,

    /// Output file (default: phrase file with the format's extension)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Output format: wav, mp3, ogg, aac or flac
    #[arg(short = 'f', long, env = "APG_FORMAT")]
    pub format: Option<OutputFormat>,

    /// Background attenuation in dB
    #[arg(short = 'a', long, env = "APG_ATTENUATION")]
    pub attenuation: Option<f64>,

    /// Speak slowly
    #[arg(short = 's', long, env = "APG_SLOW_SPEECH", value_parser = FalseyValueParser::new())]
    pub slow: bool,

    /// Accent: AU, CA, IE, IN, UK, US or ZA
    #[arg(short = 'r', long, env = "APG_ACCENT")]
    pub accent: Option<Accent>,

    /// Read the phrase file as prose instead of `text;pause` lines
    #[arg(short = 'b', long)]
    pub book: bool,

    /// Hide the progress bar
    #[arg(
        short = 'H',
        long = "hide-progress",
        env = "APG_HIDE_PROGRESS_BAR",
        value_parser = FalseyValueParser::new()
    )]
    pub hide_progress: bool,

    /// Background fade-in in milliseconds
    #[arg(long = "fade-in", value_name = "MS")]
    pub fade_in: Option<u64>,

    /// Background fade-out in milliseconds
    #[arg(long = "fade-out", value_name = "MS")]
    pub fade_out: Option<u64>,

    /// Maximum concurrent synthesis requests
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Overall synthesis timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Synthesize repeated phrases once
    #[arg(long)]
    pub cache: bool,

    /// Path to the ffmpeg binary used for compressed formats
    #[arg(long, env = "APG_FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,
}

impl RenderCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let profile = get_profile(cli)?;
        let config = self.render_config(profile.as_ref());
        let output = self.output_path(config.output_format);

        print_verbose(cli.verbose, &format!("Rendering {}", self.phrase_file.display()));
        print_verbose(cli.verbose, &format!("Output: {}", output.display()));

        let cache = self.cache || profile.as_ref().and_then(|p| p.cache).unwrap_or(false);
        let synth: Arc<dyn Synthesizer> = if cache {
            Arc::new(CachingSynthesizer::new(GttsSynthesizer::default()))
        } else {
            Arc::new(GttsSynthesizer::default())
        };

        let script = tokio::fs::read(&self.phrase_file).await?;
        let sound = match &self.sound_file {
            Some(path) => Some(tokio::fs::read(path).await?),
            None => None,
        };
        let hint = self
            .sound_file
            .as_deref()
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str());
        let background = sound.as_deref().map(|data| Background { data, hint });

        let bar = if config.show_progress {
            Some(Arc::new(BarProgress::new()?))
        } else {
            None
        };
        let mut renderer = Renderer::new(config, synth)?;
        if let Some(bar) = &bar {
            renderer = renderer.progress(bar.clone() as Arc<dyn Progress>);
        }

        let result = renderer.render_bytes(&script, background).await;
        if let Some(bar) = &bar {
            bar.clear();
        }
        let rendered = result?;

        for warning in &rendered.report.warnings {
            match warning {
                Warning::EmptyProgram => print_warning("phrase file produced no units"),
            }
        }
        if rendered.report.skipped_lines > 0 {
            print_warning(&format!(
                "skipped {} malformed line(s)",
                rendered.report.skipped_lines
            ));
        }

        let exporter = Exporter::new().ffmpeg(&self.ffmpeg);
        let data = exporter.encode(&rendered.track, rendered.format).await?;
        tokio::fs::write(&output, &data).await?;
        info!(path = %output.display(), bytes = data.len(), "wrote program");

        print_success(&format!(
            "Rendered {} units ({:.1}s) to {} ({})",
            rendered.report.units.len(),
            rendered.track.duration().as_secs_f64(),
            output.display(),
            format_bytes(data.len())
        ));
        Ok(())
    }

    /// Builds the render settings: defaults, then profile, then flags.
    pub fn render_config(&self, profile: Option<&Profile>) -> RenderConfig {
        let mut config = RenderConfig::default();
        if let Some(profile) = profile {
            profile.apply(&mut config);
        }

        if let Some(format) = self.format {
            config.output_format = format;
        }
        if let Some(db) = self.attenuation {
            config.attenuation_db = db;
        }
        if self.slow {
            config.slow = true;
        }
        if let Some(accent) = self.accent {
            config.accent = accent;
        }
        if self.book {
            config.mode = Mode::Book;
        }
        if self.hide_progress {
            config.show_progress = false;
        }
        if let Some(ms) = self.fade_in {
            config.fade_in = Duration::from_millis(ms);
        }
        if let Some(ms) = self.fade_out {
            config.fade_out = Duration::from_millis(ms);
        }
        if let Some(n) = self.concurrency {
            config.concurrency = n;
        }
        if let Some(secs) = self.timeout {
            config.timeout = Some(Duration::from_secs(secs));
        }
        config
    }

    /// The output path: `-o`, or the phrase file with the format's extension.
    pub fn output_path(&self, format: OutputFormat) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => default_output(&self.phrase_file, format),
        }
    }
}

fn default_output(phrase_file: &Path, format: OutputFormat) -> PathBuf {
    phrase_file.with_extension(format.extension())
}
