//! Settings commands - Manage saved client settings

use clap::{Args, Subcommand};
use litrev_core::{ClientSettings, FileSettingsStore, SettingsStore};

/// Settings management commands
#[derive(Args, Debug)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Show saved settings
    Show,

    /// Update saved settings (empty value removes it)
    Set {
        /// API key sent with every request
        #[arg(long)]
        api_key: Option<String>,

        /// Model sent with every request
        #[arg(long)]
        model: Option<String>,

        /// Review server base URL
        #[arg(long)]
        server: Option<String>,
    },

    /// Remove all saved settings
    Clear,
}

impl SettingsArgs {
    /// Execute the settings command
    pub fn execute(&self, verbose: bool) -> anyhow::Result<()> {
        let store = FileSettingsStore::at_default_path()?;
        if verbose {
            tracing::info!(path = %store.path().display(), "Using settings file");
        }

        match &self.command {
            SettingsCommand::Show => show(&store),
            SettingsCommand::Set {
                api_key,
                model,
                server,
            } => {
                let current = store.load()?;
                let updated = apply(current, api_key.clone(), model.clone(), server.clone());
                store.save(&updated)?;
                println!("Settings saved to {}", store.path().display());
                Ok(())
            }
            SettingsCommand::Clear => {
                store.clear()?;
                println!("Settings cleared");
                Ok(())
            }
        }
    }
}

fn show(store: &dyn SettingsStore) -> anyhow::Result<()> {
    let settings = store.load()?;
    println!("Client Settings");
    println!("===============");
    println!();
    println!(
        "  api_key: {}",
        settings
            .api_key
            .as_deref()
            .map(mask)
            .unwrap_or_else(|| "(server default)".to_string())
    );
    println!(
        "  model: {}",
        settings.model.as_deref().unwrap_or("(server default)")
    );
    println!("  server: {}", settings.server_url());
    Ok(())
}

/// Overlay provided values; blanks are dropped when the store normalizes
fn apply(
    mut settings: ClientSettings,
    api_key: Option<String>,
    model: Option<String>,
    server: Option<String>,
) -> ClientSettings {
    if api_key.is_some() {
        settings.api_key = api_key;
    }
    if model.is_some() {
        settings.model = model;
    }
    if server.is_some() {
        settings.server_url = server;
    }
    settings
}

fn mask(key: &str) -> String {
    let visible: String = key.chars().take(6).collect();
    format!("{}… ({} chars)", visible, key.chars().count())
}
