//! Google Translate text-to-speech client.
//!
//! The translate web UI exposes speech synthesis through a batch RPC
//! endpoint that returns base64-encoded MP3. This crate wraps it:
//!
//! ```rust,no_run
//! use apg_gtts::{Accent, Client};
//!
//! # async fn run() -> apg_gtts::Result<()> {
//! let client = Client::builder().tld(Accent::UK.tld()).lang("en").build()?;
//! let mp3 = client.synthesize("Breathe in slowly.", false).await?;
//! # Ok(())
//! # }
//! ```

mod accent;
mod client;
mod error;
pub mod rpc;
pub mod tokenizer;

pub use accent::Accent;
pub use client::{Client, ClientBuilder, DEFAULT_LANG, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT, DEFAULT_TLD};
pub use error::{Error, Result};
