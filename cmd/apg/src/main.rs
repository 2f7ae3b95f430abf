//! apg - Audio program generator.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ConfigCommand, ParseCommand, RenderCommand};

/// apg - Turn a phrase script into a spoken audio program.
///
/// Each line of a phrase file is `text;pause`, spoken with the chosen
/// accent and followed by `pause` seconds of silence. `*;pause` inserts
/// silence only. An optional sound file is looped or trimmed to the
/// speech and mixed underneath it.
///
/// Render defaults can be saved as named profiles in ~/.apg/config.yaml.
#[derive(Parser)]
#[command(name = "apg")]
#[command(about = "Audio program generator")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.apg/config.yaml)
    #[arg(long, global = true, env = "APG_CONFIG")]
    pub config: Option<String>,

    /// Profile name to use
    #[arg(short = 'p', long, global = true, env = "APG_PROFILE")]
    pub profile: Option<String>,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a phrase file into an audio program
    Render(RenderCommand),
    /// Parse a phrase file and print its units
    Parse(ParseCommand),
    /// Manage render profiles
    Config(ConfigCommand),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Render(cmd) => cmd.run(&cli).await,
        Commands::Parse(cmd) => cmd.run(&cli).await,
        Commands::Config(cmd) => cmd.run(&cli).await,
    }
}
