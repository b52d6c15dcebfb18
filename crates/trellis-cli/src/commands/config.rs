//! `trellis config`: inspect and edit the TOML settings file

use std::path::Path;

use clap::{Args, Subcommand};

use crate::config::Settings;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print one setting
    Get {
        key: String,
    },
    /// Change one setting and write the file
    Set {
        key: String,
        value: String,
    },
    /// Print every setting
    List,
    /// Print the settings file location
    Path,
    /// Write a settings file with default values
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: &ConfigArgs, path: &Path) -> anyhow::Result<()> {
    match &args.command {
        ConfigCommands::Get { key } => {
            let settings = Settings::load(path)?;
            let value = settings.get(key).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown config key: {}. Available keys: {}",
                    key,
                    Settings::keys().join(", ")
                )
            })?;
            println!("{}", value);
        }
        ConfigCommands::Set { key, value } => {
            let mut settings = Settings::load(path)?;
            settings.set(key, value)?;
            settings.save(path)?;
            tracing::info!("Updated {}", path.display());
            println!("{} = {}", key, value);
        }
        ConfigCommands::List => {
            let settings = Settings::load(path)?;
            println!("# {}", path.display());
            for key in Settings::keys() {
                let value = settings.get(key).unwrap_or_default();
                println!("{} = {}", key, value);
            }
        }
        ConfigCommands::Path => println!("{}", path.display()),
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists; pass --force to overwrite it",
                    path.display()
                );
            }
            Settings::default().save(path)?;
            println!("Wrote default settings to {}", path.display());
        }
    }
    Ok(())
}
