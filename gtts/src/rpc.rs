//! Batch RPC packaging and response parsing.
//!
//! A synthesis request is a single `f.req` form field holding a JSON
//! envelope around a JSON-encoded argument list. The response is a
//! length-prefixed stream of JSON lines; the audio is the first string
//! argument of the `jQ1olc` line, base64-encoded.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Value, json};

use crate::error::{Error, Result};

/// RPC identifier of the text-to-speech method.
pub const RPC_ID: &str = "jQ1olc";

/// Path of the batch RPC endpoint, relative to the translate host.
pub const RPC_PATH: &str = "/_/TranslateWebserverUi/data/batchexecute";

static AUDIO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"jQ1olc","\[\\"([^\\"]*)\\"\]"#).expect("static regex"));

/// Builds the `f.req` form value for one chunk of text.
///
/// `slow` is sent as `true`; normal speed is sent as `null`.
pub fn package(text: &str, lang: &str, slow: bool) -> String {
    let speed = if slow { Value::Bool(true) } else { Value::Null };
    let args = json!([text, lang, speed, "null"]).to_string();
    json!([[[RPC_ID, args, Value::Null, "generic"]]]).to_string()
}

/// Extracts and decodes the audio payload from a batch RPC response body.
pub fn parse_audio(body: &str) -> Result<Vec<u8>> {
    for line in body.lines().filter(|l| l.contains(RPC_ID)) {
        if let Some(caps) = AUDIO_RE.captures(line) {
            let audio = STANDARD.decode(&caps[1])?;
            if audio.is_empty() {
                return Err(Error::NoAudio);
            }
            return Ok(audio);
        }
    }
    Err(Error::NoAudio)
}
