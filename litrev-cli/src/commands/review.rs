//! Review command - Request a literature review

use clap::Args;
use litrev_core::{
    ClientSettings, Config, FileSettingsStore, ReviewClient, ReviewRelay, ReviewResponse, Secrets,
    SettingsStore,
};

use crate::render;

/// Arguments for the review command
#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// Research topic or question
    #[arg(required = true)]
    pub query: String,

    /// Review server base URL (overrides saved settings)
    #[arg(short, long, conflicts_with = "local")]
    pub server: Option<String>,

    /// Run the generator in-process instead of calling a server
    #[arg(long)]
    pub local: bool,

    /// API key override (overrides saved settings)
    #[arg(long, env = "LITREV_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model override (overrides saved settings)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Print the raw JSON payload
    #[arg(long)]
    pub json: bool,
}

impl ReviewArgs {
    /// Execute the review command
    ///
    /// `load_config` runs only for `--local`.
    pub async fn execute<F>(&self, verbose: bool, load_config: F) -> anyhow::Result<()>
    where
        F: FnOnce() -> anyhow::Result<Config>,
    {
        let settings = self.effective_settings(load_saved_settings()?);
        let request = settings.build_request(self.query.as_str())?;

        if verbose {
            tracing::info!(
                query = %request.query,
                model = ?request.model,
                has_api_key = request.api_key.is_some(),
                local = self.local,
                "Starting review"
            );
        }

        let payload = if self.local {
            let config = load_config()?;
            let secrets = Secrets::load()?;
            let relay = ReviewRelay::from_config(&config, secrets.default_credential());
            relay.handle(request).await?
        } else {
            let client = ReviewClient::new(settings.server_url())?;
            if verbose {
                tracing::info!(endpoint = %client.endpoint(), "Calling review server");
            }
            client.review_raw(&request).await?
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            return Ok(());
        }

        let review: ReviewResponse = serde_json::from_value(payload)?;
        print!("{}", render::review(&self.query, &review));
        Ok(())
    }

    /// Saved settings with command-line flags layered on top
    fn effective_settings(&self, saved: ClientSettings) -> ClientSettings {
        ClientSettings {
            api_key: self.api_key.clone().or(saved.api_key),
            model: self.model.clone().or(saved.model),
            server_url: self.server.clone().or(saved.server_url),
        }
    }
}

fn load_saved_settings() -> anyhow::Result<ClientSettings> {
    match FileSettingsStore::default_path() {
        Some(path) => Ok(FileSettingsStore::new(path).load()?),
        None => Ok(ClientSettings::default()),
    }
}
