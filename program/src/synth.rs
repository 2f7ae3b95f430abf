//! Text-to-speech synthesis.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use apg_gtts::{Accent, Client};
use async_trait::async_trait;
use tokio::sync::{OnceCell, RwLock};
use tracing::debug;

use crate::error::SynthError;

/// Voice parameters for one render.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Voice {
    pub accent: Accent,
    /// IETF language tag, e.g. `en`.
    pub lang: String,
    /// Speak at reduced speed.
    pub slow: bool,
}

impl Default for Voice {
    fn default() -> Self {
        Self {
            accent: Accent::US,
            lang: apg_gtts::DEFAULT_LANG.to_string(),
            slow: false,
        }
    }
}

/// Interface for a text-to-speech synthesizer.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesizes `text` and returns encoded audio bytes.
    async fn synthesize(&self, text: &str, voice: &Voice) -> Result<Vec<u8>, SynthError>;

    /// File extension of the returned audio, used as a decoder hint.
    fn format_hint(&self) -> Option<&str> {
        None
    }
}

#[async_trait]
impl<S: Synthesizer + ?Sized> Synthesizer for Arc<S> {
    async fn synthesize(&self, text: &str, voice: &Voice) -> Result<Vec<u8>, SynthError> {
        (**self).synthesize(text, voice).await
    }

    fn format_hint(&self) -> Option<&str> {
        (**self).format_hint()
    }
}

/// Synthesizer backed by the translate TTS endpoint.
///
/// One client is built per accent and language on first use. Clients do
/// not retry on their own; retrying is left to the dispatcher.
pub struct GttsSynthesizer {
    timeout: Duration,
    base_url: Option<String>,
    clients: RwLock<HashMap<(Accent, String), Client>>,
}

impl Default for GttsSynthesizer {
    fn default() -> Self {
        Self::new(apg_gtts::DEFAULT_TIMEOUT)
    }
}

impl GttsSynthesizer {
    /// Creates a synthesizer with the given per-request timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            base_url: None,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Sends every request to `url` instead of the accent's host.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    async fn client(&self, voice: &Voice) -> Result<Client, SynthError> {
        let key = (voice.accent, voice.lang.clone());
        if let Some(client) = self.clients.read().await.get(&key) {
            return Ok(client.clone());
        }

        let mut clients = self.clients.write().await;
        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }
        let mut builder = Client::builder()
            .tld(voice.accent.tld())
            .lang(voice.lang.clone())
            .timeout(self.timeout)
            .max_retries(0);
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url.clone());
        }
        let client = builder.build()?;
        debug!(accent = %voice.accent, lang = %voice.lang, url = client.base_url(), "created tts client");
        clients.insert(key, client.clone());
        Ok(client)
    }
}

#[async_trait]
impl Synthesizer for GttsSynthesizer {
    async fn synthesize(&self, text: &str, voice: &Voice) -> Result<Vec<u8>, SynthError> {
        let client = self.client(voice).await?;
        Ok(client.synthesize(text, voice.slow).await?)
    }

    fn format_hint(&self) -> Option<&str> {
        Some("mp3")
    }
}

type CacheKey = (String, Voice);

/// Reuses audio for repeated identical text within one render.
///
/// Concurrent requests for the same text and voice share a single call
/// to the inner synthesizer. Failures are not cached.
pub struct CachingSynthesizer<S> {
    inner: S,
    cache: RwLock<HashMap<CacheKey, Arc<OnceCell<Vec<u8>>>>>,
}

impl<S: Synthesizer> CachingSynthesizer<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the number of distinct entries synthesized so far.
    pub async fn len(&self) -> usize {
        self.cache
            .read()
            .await
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    /// Returns true if nothing has been cached yet.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn cell(&self, key: CacheKey) -> Arc<OnceCell<Vec<u8>>> {
        if let Some(cell) = self.cache.read().await.get(&key) {
            return cell.clone();
        }
        self.cache.write().await.entry(key).or_default().clone()
    }
}

#[async_trait]
impl<S: Synthesizer> Synthesizer for CachingSynthesizer<S> {
    async fn synthesize(&self, text: &str, voice: &Voice) -> Result<Vec<u8>, SynthError> {
        let cell = self.cell((text.to_string(), voice.clone())).await;
        let audio = cell
            .get_or_try_init(|| self.inner.synthesize(text, voice))
            .await?;
        Ok(audio.clone())
    }

    fn format_hint(&self) -> Option<&str> {
        self.inner.format_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSynthesizer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Synthesizer for CountingSynthesizer {
        async fn synthesize(&self, text: &str, _voice: &Voice) -> Result<Vec<u8>, SynthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            if text == "fail" {
                return Err(SynthError::provider("nope"));
            }
            Ok(text.as_bytes().to_vec())
        }
    }

    fn counting() -> CachingSynthesizer<CountingSynthesizer> {
        CachingSynthesizer::new(CountingSynthesizer {
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_cache_reuses_audio() {
        let synth = counting();
        let voice = Voice::default();

        assert_eq!(synth.synthesize("hello", &voice).await.unwrap(), b"hello");
        assert_eq!(synth.synthesize("hello", &voice).await.unwrap(), b"hello");
        assert_eq!(synth.synthesize("world", &voice).await.unwrap(), b"world");

        assert_eq!(synth.inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(synth.len().await, 2);
    }

    #[tokio::test]
    async fn test_cache_keys_on_voice() {
        let synth = counting();
        let slow = Voice {
            slow: true,
            ..Voice::default()
        };
        synth.synthesize("hello", &Voice::default()).await.unwrap();
        synth.synthesize("hello", &slow).await.unwrap();
        assert_eq!(synth.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_dedupes_concurrent_calls() {
        let synth = Arc::new(counting());
        let voice = Voice::default();

        let (a, b) = tokio::join!(
            synth.synthesize("same", &voice),
            synth.synthesize("same", &voice)
        );
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(synth.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_does_not_keep_failures() {
        let synth = counting();
        let voice = Voice::default();
        assert!(synth.synthesize("fail", &voice).await.is_err());
        assert!(synth.synthesize("fail", &voice).await.is_err());
        assert_eq!(synth.inner.calls.load(Ordering::SeqCst), 2);
        assert!(synth.is_empty().await);
    }

    #[tokio::test]
    async fn test_gtts_format_hint() {
        let synth = GttsSynthesizer::default();
        assert_eq!(synth.format_hint(), Some("mp3"));
    }

    #[tokio::test]
    async fn test_gtts_empty_text_is_permanent() {
        let synth = GttsSynthesizer::default().with_base_url("http://127.0.0.1:9");
        let err = synth.synthesize("?!", &Voice::default()).await.unwrap_err();
        assert!(matches!(err, SynthError::Gtts(apg_gtts::Error::EmptyText)));
        assert!(!err.is_retryable());
    }
}
