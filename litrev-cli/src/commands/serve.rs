//! Serve command - Run the literature review HTTP endpoint

use clap::Args;
use litrev_core::{Config, ReviewRelay, Secrets};

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind (overrides config and LITREV_ADDR)
    #[arg(short, long)]
    pub addr: Option<String>,
}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(&self, verbose: bool, config: Config) -> anyhow::Result<()> {
        let config = config.with_cli_overrides(self.addr.clone(), None, None);
        let secrets = Secrets::load()?;
        let relay = ReviewRelay::from_config(&config, secrets.default_credential());

        if !relay.has_default_api_key() {
            tracing::warn!(
                "No default API key configured; requests must carry their own apiKey"
            );
        }

        if !relay.generator_available() {
            tracing::warn!(
                program = %config.generator.program,
                script = %config.generator.script.display(),
                "Generator not launchable; review requests will fail until it is installed"
            );
        }

        if verbose {
            tracing::info!(relay = ?relay, "Relay ready");
        }

        litrev_server::serve(&config.server.addr, relay).await?;
        Ok(())
    }
}
