//! Encoding the final track.
//!
//! WAV is written in-process. The compressed formats are produced by
//! piping a WAV stream through an `ffmpeg` subprocess.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;

use apg_audio::codec::wav;
use apg_audio::{AudioError, Segment};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Error type for export.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("audio error: {0}")]
    Audio(#[from] AudioError),

    /// The external encoder is missing or failed.
    #[error("encoder error: {0}")]
    Encoder(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Wav,
    Mp3,
    Ogg,
    Aac,
    Flac,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Wav,
        OutputFormat::Mp3,
        OutputFormat::Ogg,
        OutputFormat::Aac,
        OutputFormat::Flac,
    ];

    /// Returns the file extension, without a dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Ogg => "ogg",
            OutputFormat::Aac => "aac",
            OutputFormat::Flac => "flac",
        }
    }

    /// ffmpeg output arguments for this format.
    fn ffmpeg_args(&self) -> &'static [&'static str] {
        match self {
            OutputFormat::Wav => &["-f", "wav"],
            OutputFormat::Mp3 => &["-c:a", "libmp3lame", "-f", "mp3"],
            OutputFormat::Ogg => &["-c:a", "libvorbis", "-f", "ogg"],
            OutputFormat::Aac => &["-c:a", "aac", "-f", "adts"],
            OutputFormat::Flac => &["-c:a", "flac", "-f", "flac"],
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('.');
        OutputFormat::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(s))
            .ok_or_else(|| ExportError::Encoder(format!("unsupported output format {:?}", s)))
    }
}

/// Encodes tracks into output containers.
#[derive(Debug, Clone)]
pub struct Exporter {
    ffmpeg: PathBuf,
}

impl Default for Exporter {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the ffmpeg executable used for compressed formats.
    pub fn ffmpeg(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg = path.into();
        self
    }

    /// Encodes `track` as `format`.
    pub async fn encode(&self, track: &Segment, format: OutputFormat) -> Result<Vec<u8>, ExportError> {
        let wav = wav::encode(track)?;
        if format == OutputFormat::Wav {
            return Ok(wav);
        }
        self.transcode(wav, format).await
    }

    /// Encodes `track` as `format` and writes it to `path`.
    pub async fn write(&self, track: &Segment, format: OutputFormat, path: &Path) -> Result<(), ExportError> {
        let data = self.encode(track, format).await?;
        tokio::fs::write(path, &data).await?;
        debug!(path = %path.display(), bytes = data.len(), %format, "wrote program");
        Ok(())
    }

    async fn transcode(&self, wav: Vec<u8>, format: OutputFormat) -> Result<Vec<u8>, ExportError> {
        let mut child = Command::new(&self.ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-f", "wav", "-i", "pipe:0"])
            .args(format.ffmpeg_args())
            .arg("pipe:1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ExportError::Encoder(format!(
                    "cannot run {} (needed for {} output): {}",
                    self.ffmpeg.display(),
                    format,
                    e
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ExportError::Encoder("encoder stdin unavailable".to_string()))?;
        let feeder = tokio::spawn(async move {
            let result = stdin.write_all(&wav).await;
            drop(stdin);
            result
        });

        let output = child.wait_with_output().await?;
        // A broken pipe here just means ffmpeg exited early; its status says why.
        let fed = feeder
            .await
            .map_err(|e| ExportError::Encoder(format!("encoder feed task failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExportError::Encoder(format!(
                "{} exited with {}: {}",
                self.ffmpeg.display(),
                output.status,
                stderr.trim()
            )));
        }
        fed?;
        if output.stdout.is_empty() {
            return Err(ExportError::Encoder(format!("{} produced no output", self.ffmpeg.display())));
        }
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apg_audio::Format;
    use std::time::Duration;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("mp3".parse::<OutputFormat>().unwrap(), OutputFormat::Mp3);
        assert_eq!(".FLAC".parse::<OutputFormat>().unwrap(), OutputFormat::Flac);
        assert!("aiff".parse::<OutputFormat>().is_err());
        for format in OutputFormat::ALL {
            assert_eq!(format.to_string().parse::<OutputFormat>().unwrap(), format);
        }
    }

    #[tokio::test]
    async fn test_encode_wav_in_process() {
        let track = Segment::silent(Format::MONO_24K, Duration::from_millis(250));
        let exporter = Exporter::new().ffmpeg("/nonexistent/ffmpeg");
        let data = exporter.encode(&track, OutputFormat::Wav).await.unwrap();
        assert_eq!(wav::decode(&data).unwrap(), track);
    }

    #[tokio::test]
    async fn test_missing_encoder() {
        let track = Segment::silent(Format::MONO_24K, Duration::from_millis(250));
        let exporter = Exporter::new().ffmpeg("/nonexistent/ffmpeg");
        let result = exporter.encode(&track, OutputFormat::Mp3).await;
        assert!(matches!(result, Err(ExportError::Encoder(_))));
    }

    #[tokio::test]
    async fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("program.wav");
        let track = Segment::silent(Format::MONO_16K, Duration::from_millis(100));

        Exporter::new().write(&track, OutputFormat::Wav, &path).await.unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(wav::decode(&data).unwrap().frames(), 1600);
    }
}
