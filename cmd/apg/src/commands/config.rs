//! Profile management commands.

use apg_cli::Profile;
use apg_program::{Accent, Mode, OutputFormat};
use clap::{Args, Subcommand};

use super::{get_config, print_success};
use crate::Cli;

/// Manage render profiles.
///
/// A profile stores render defaults under a name. Flags and APG_*
/// environment variables still take precedence over the active profile.
///
/// Configuration is stored in ~/.apg/config.yaml
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Args, Debug, Default)]
struct ProfileArgs {
    /// Accent: AU, CA, IE, IN, UK, US or ZA
    #[arg(long)]
    accent: Option<Accent>,
    /// Language tag
    #[arg(long)]
    lang: Option<String>,
    /// Speak slowly
    #[arg(long)]
    slow: Option<bool>,
    /// Background attenuation in dB
    #[arg(long)]
    attenuation: Option<f64>,
    /// Background fade-in in milliseconds
    #[arg(long)]
    fade_in: Option<u64>,
    /// Background fade-out in milliseconds
    #[arg(long)]
    fade_out: Option<u64>,
    /// Maximum concurrent synthesis requests
    #[arg(long)]
    concurrency: Option<usize>,
    /// Output format
    #[arg(long)]
    format: Option<OutputFormat>,
    /// Read phrase files as prose
    #[arg(long)]
    book: bool,
    /// Overall synthesis timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
    /// Retries per phrase
    #[arg(long)]
    max_retries: Option<u32>,
    /// Hide the progress bar
    #[arg(long)]
    hide_progress: Option<bool>,
    /// Synthesize repeated phrases once
    #[arg(long)]
    cache: Option<bool>,
}

impl From<&ProfileArgs> for Profile {
    fn from(args: &ProfileArgs) -> Self {
        Profile {
            name: String::new(),
            accent: args.accent,
            lang: args.lang.clone(),
            slow: args.slow,
            attenuation: args.attenuation,
            fade_in_ms: args.fade_in,
            fade_out_ms: args.fade_out,
            concurrency: args.concurrency,
            format: args.format,
            mode: args.book.then_some(Mode::Book),
            timeout: args.timeout,
            max_retries: args.max_retries,
            hide_progress: args.hide_progress,
            cache: args.cache,
        }
    }
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Add or replace a profile
    #[command(name = "add-profile")]
    AddProfile {
        /// Profile name
        name: String,
        #[command(flatten)]
        settings: ProfileArgs,
    },
    /// Delete a profile
    #[command(name = "delete-profile")]
    DeleteProfile {
        /// Profile name
        name: String,
    },
    /// Set the current profile
    #[command(name = "use-profile")]
    UseProfile {
        /// Profile name
        name: String,
    },
    /// Display the current profile
    #[command(name = "get-profile")]
    GetProfile,
    /// List all profiles
    #[command(name = "list-profiles", alias = "get-profiles")]
    ListProfiles,
    /// View the current configuration
    View,
}

impl ConfigCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::AddProfile { name, settings } => {
                let mut cfg = get_config(cli)?;
                cfg.add_profile(name, Profile::from(settings))?;
                print_success(&format!("Profile \"{}\" added successfully", name));
                Ok(())
            }

            ConfigSubcommand::DeleteProfile { name } => {
                let mut cfg = get_config(cli)?;
                cfg.delete_profile(name)?;
                print_success(&format!("Profile \"{}\" deleted", name));
                Ok(())
            }

            ConfigSubcommand::UseProfile { name } => {
                let mut cfg = get_config(cli)?;
                cfg.use_profile(name)?;
                print_success(&format!("Switched to profile \"{}\"", name));
                Ok(())
            }

            ConfigSubcommand::GetProfile => {
                let cfg = get_config(cli)?;
                if cfg.current_profile.is_empty() {
                    println!("No current profile set");
                } else {
                    println!("{}", cfg.current_profile);
                }
                Ok(())
            }

            ConfigSubcommand::ListProfiles => {
                let cfg = get_config(cli)?;

                if cfg.profiles.is_empty() {
                    println!("No profiles configured");
                    return Ok(());
                }

                println!("{:<8} {:<20} {:<8} {:<8} {}", "CURRENT", "NAME", "ACCENT", "FORMAT", "ATTENUATION");
                for (name, profile) in &cfg.profiles {
                    let current = if name == &cfg.current_profile { "*" } else { "" };
                    let accent = profile.accent.map(|a| a.to_string()).unwrap_or_default();
                    let format = profile.format.map(|f| f.to_string()).unwrap_or_default();
                    let attenuation = profile
                        .attenuation
                        .map(|db| format!("{} dB", db))
                        .unwrap_or_default();
                    println!("{:<8} {:<20} {:<8} {:<8} {}", current, name, accent, format, attenuation);
                }
                Ok(())
            }

            ConfigSubcommand::View => {
                let cfg = get_config(cli)?;

                println!("Config file: {}", cfg.path().display());
                println!("Current profile: {}", cfg.current_profile);
                println!("Profiles: {}", cfg.profiles.len());

                if !cfg.profiles.is_empty() {
                    println!("\nProfile details:");
                    for (name, profile) in &cfg.profiles {
                        println!("\n  {}:", name);
                        for line in serde_json::to_string_pretty(profile)?.lines() {
                            println!("    {}", line);
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
