//! Translate TTS client.

use std::time::Duration;

use reqwest::Client as ReqwestClient;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::rpc;
use crate::tokenizer;

/// Default top-level domain of the translate host.
pub const DEFAULT_TLD: &str = "com";

/// Default IETF language tag.
pub const DEFAULT_LANG: &str = "en";

/// Default maximum number of retries per chunk.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const BROWSER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; WOW64) AppleWebKit/537.36 \
                             (KHTML, like Gecko) Chrome/47.0.2526.106 Safari/537.36";

/// Translate TTS client.
///
/// One client speaks one language through one host; build a client per
/// accent. Cloning is cheap and shares the connection pool.
#[derive(Clone)]
pub struct Client {
    http: ReqwestClient,
    base_url: String,
    lang: String,
    max_retries: u32,
}

impl Client {
    /// Creates a client for US English with default settings.
    pub fn new() -> Result<Self> {
        ClientBuilder::new().build()
    }

    /// Creates a new client builder for more configuration options.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the configured language.
    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Synthesizes `text` and returns MP3 bytes.
    ///
    /// Long text is split into several requests; their MP3 streams are
    /// concatenated in order.
    pub async fn synthesize(&self, text: &str, slow: bool) -> Result<Vec<u8>> {
        let chunks = tokenizer::tokenize(text, tokenizer::MAX_CHARS);
        if chunks.is_empty() {
            return Err(Error::EmptyText);
        }

        let mut audio = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            debug!(chunk = i, total = chunks.len(), len = chunk.len(), "requesting speech");
            audio.extend(self.request(chunk, slow).await?);
        }
        Ok(audio)
    }

    /// Performs one RPC with retry support.
    async fn request(&self, chunk: &str, slow: bool) -> Result<Vec<u8>> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, ...
                let backoff = Duration::from_secs(1 << (attempt - 1));
                tokio::time::sleep(backoff).await;
            }

            match self.do_request(chunk, slow).await {
                Ok(audio) => return Ok(audio),
                Err(e) => {
                    if e.is_retryable() && attempt < self.max_retries {
                        warn!(attempt, error = %e, "speech request failed, retrying");
                        last_err = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_err.unwrap_or(Error::NoAudio))
    }

    /// Performs a single RPC.
    async fn do_request(&self, chunk: &str, slow: bool) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.base_url, rpc::RPC_PATH);
        let payload = rpc::package(chunk, &self.lang, slow);

        let response = self
            .http
            .post(&url)
            .form(&[("f.req", payload)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        rpc::parse_audio(&body)
    }
}

/// Builder for creating a translate TTS client.
pub struct ClientBuilder {
    tld: String,
    lang: String,
    base_url: Option<String>,
    timeout: Duration,
    max_retries: u32,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    /// Creates a new client builder.
    pub fn new() -> Self {
        Self {
            tld: DEFAULT_TLD.to_string(),
            lang: DEFAULT_LANG.to_string(),
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets the top-level domain of the translate host, e.g. `co.uk`.
    pub fn tld(mut self, tld: impl Into<String>) -> Self {
        self.tld = tld.into();
        self
    }

    /// Sets the language tag, e.g. `en`.
    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Overrides the host URL entirely. The TLD is ignored when set.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum number of retries for transient errors.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<Client> {
        if self.lang.trim().is_empty() {
            return Err(Error::Config("lang must be non-empty".to_string()));
        }
        let base_url = match self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                if self.tld.trim().is_empty() {
                    return Err(Error::Config("tld must be non-empty".to_string()));
                }
                format!("https://translate.google.{}", self.tld.trim())
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("http://translate.google.com/"));
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_AGENT));

        let http = ReqwestClient::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()?;

        Ok(Client {
            http,
            base_url,
            lang: self.lang,
            max_retries: self.max_retries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response per incoming connection and
    /// returns the request bodies it saw.
    async fn serve(responses: Vec<(u16, String)>) -> (String, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut bodies = Vec::new();
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                bodies.push(read_request_body(&mut socket).await);
                let reply = format!(
                    "HTTP/1.1 {} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
            bodies
        });
        (format!("http://{}", addr), handle)
    }

    async fn read_request_body(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut tmp = [0u8; 1024];
        loop {
            let n = socket.read(&mut tmp).await.unwrap();
            buf.extend_from_slice(&tmp[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let len = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length")
                            .then(|| v.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + len {
                    return text[end + 4..end + 4 + len].to_string();
                }
            }
            if n == 0 {
                return String::new();
            }
        }
    }

    fn audio_body(b64: &str) -> String {
        format!(
            ")]}}'\n\n[[\"wrb.fr\",\"jQ1olc\",\"[\\\"{}\\\"]\",null,null,null,\"generic\"]]\n",
            b64
        )
    }

    #[test]
    fn test_builder_urls() {
        let client = Client::builder().tld("co.uk").build().unwrap();
        assert_eq!(client.base_url(), "https://translate.google.co.uk");
        assert_eq!(client.lang(), "en");

        let client = Client::builder().base_url("http://localhost:1/").build().unwrap();
        assert_eq!(client.base_url(), "http://localhost:1");
    }

    #[test]
    fn test_builder_rejects_empty() {
        assert!(matches!(
            Client::builder().lang(" ").build(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Client::builder().tld("").build(),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_synthesize_concatenates_chunks() {
        let (url, server) = serve(vec![
            (200, audio_body("SUQz")),
            (200, audio_body("BAAA")),
        ])
        .await;
        let client = Client::builder().base_url(url).max_retries(0).build().unwrap();

        let audio = client.synthesize("First part. Second part", true).await.unwrap();
        assert_eq!(audio, b"ID3\x04\x00\x00");

        let bodies = server.await.unwrap();
        assert_eq!(bodies.len(), 2);
        assert!(bodies[0].starts_with("f.req="));
        assert!(bodies[0].contains("First+part"));
        assert!(bodies[0].contains("true"));
        assert!(bodies[1].contains("Second+part"));
    }

    #[tokio::test]
    async fn test_synthesize_status_error() {
        let (url, _server) = serve(vec![(403, "forbidden".to_string())]).await;
        let client = Client::builder().base_url(url).max_retries(0).build().unwrap();

        match client.synthesize("Hello", false).await {
            Err(Error::Status { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "forbidden");
            }
            other => panic!("unexpected result: {:?}", other.map(|a| a.len())),
        }
    }

    #[tokio::test]
    async fn test_synthesize_empty_text() {
        let client = Client::builder().base_url("http://127.0.0.1:9").build().unwrap();
        assert!(matches!(
            client.synthesize(" ... ", false).await,
            Err(Error::EmptyText)
        ));
    }
}
