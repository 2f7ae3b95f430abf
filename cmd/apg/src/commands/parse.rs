//! The parse command.

use std::path::PathBuf;

use apg_cli::{DisplayFormat, Output};
use apg_program::{Mode, Parser, Unit};
use clap::Args;
use serde::Serialize;

use super::{get_profile, print_warning};
use crate::Cli;

/// Parse a phrase file and print its units.
///
/// Nothing is synthesized; use this to check a script before rendering.
#[derive(Args, Debug)]
pub struct ParseCommand {
    /// Phrase file
    #[arg(env = "APG_PHRASE_FILE")]
    pub phrase_file: PathBuf,

    /// Read the phrase file as prose
    #[arg(short = 'b', long)]
    pub book: bool,

    /// Output as JSON instead of YAML
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct Parsed<'a> {
    mode: Mode,
    units: &'a [Unit],
    skipped_lines: usize,
}

impl ParseCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let mut config = apg_program::RenderConfig::default();
        if let Some(profile) = get_profile(cli)? {
            profile.apply(&mut config);
        }
        let mode = if self.book { Mode::Book } else { config.mode };

        let data = tokio::fs::read(&self.phrase_file).await?;
        let outcome = Parser::new()
            .book_options(config.book)
            .parse_bytes(&data, mode)?;

        if outcome.skipped_lines > 0 {
            print_warning(&format!("skipped {} malformed line(s)", outcome.skipped_lines));
        }

        let format = if self.json {
            DisplayFormat::Json
        } else {
            DisplayFormat::Yaml
        };
        Output::new(format, None).write(&Parsed {
            mode,
            units: &outcome.units,
            skipped_lines: outcome.skipped_lines,
        })
    }
}
