//! litrev CLI - Command line interface for the literature review relay
//!
//! Serves the review endpoint, requests reviews and manages client settings.

mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use litrev_core::{Config, Secrets};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{ReviewArgs, ServeArgs, SettingsArgs};

/// litrev: literature landscapes from a research query
#[derive(Parser, Debug)]
#[command(name = "litrev")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.config/litrev/config.toml)
    #[arg(long, global = true, env = "LITREV_CONFIG")]
    config: Option<PathBuf>,

    /// Generator interpreter (overrides config and PYTHON_PATH)
    #[arg(long, global = true)]
    python: Option<String>,

    /// Default model (overrides config and env)
    #[arg(long, global = true)]
    default_model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Serve the literature review endpoint
    #[command(visible_alias = "s")]
    Serve(ServeArgs),

    /// Request a literature review
    #[command(visible_alias = "r")]
    Review(ReviewArgs),

    /// Manage saved client settings
    Settings(SettingsArgs),

    /// Show current configuration
    Config {
        /// Write a secrets template to ~/.config/litrev/secrets.toml
        #[arg(long)]
        init_secrets: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("litrev=info".parse()?))
        .init();

    run(Cli::parse()).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    // Config is resolved per command; `version` and `settings` never load it
    match &cli.command {
        Some(Commands::Version) => {
            println!("litrev {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve(args)) => {
            args.execute(cli.verbose, load_config(&cli)?).await?;
        }
        Some(Commands::Review(args)) => {
            args.execute(cli.verbose, || load_config(&cli)).await?;
        }
        Some(Commands::Settings(args)) => {
            args.execute(cli.verbose)?;
        }
        Some(Commands::Config { init_secrets }) => {
            if *init_secrets {
                let path = Secrets::create_template()?;
                println!("Created secrets template at {}", path.display());
                return Ok(());
            }
            show_config(&load_config(&cli)?)?;
        }
        None => {
            println!("litrev - literature landscapes from a research query");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

/// Load configuration with env and CLI overrides
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = Config::load_with_overrides(
        cli.config.as_deref(),
        cli.python.clone(),
        cli.default_model.clone(),
    )?;

    if cli.verbose {
        tracing::info!(
            program = %config.generator.program,
            script = %config.generator.script.display(),
            model = %config.generator.default_model,
            "Configuration loaded"
        );
    }

    Ok(config)
}

fn show_config(config: &Config) -> anyhow::Result<()> {
    let secrets = Secrets::load()?;

    println!("litrev Configuration");
    println!("====================");
    println!();
    println!("Server:");
    println!("  addr: {}", config.server.addr);
    println!();
    println!("Generator:");
    println!("  program: {}", config.generator.program);
    println!("  script: {}", config.generator.script.display());
    println!("  default_model: {}", config.generator.default_model);
    println!("  credential_prefix: {}", config.generator.credential_prefix);
    println!(
        "  timeout: {}",
        config
            .generator
            .timeout
            .map(|t| format!("{}s", t.as_secs()))
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!("  output: {:?}", config.generator.output);
    println!(
        "  default api key: {}",
        if secrets.default_credential().is_some() {
            "(configured)"
        } else {
            "(not set)"
        }
    );
    println!();
    if let Some(path) = Config::default_config_path() {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }

    Ok(())
}
