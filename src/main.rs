use clap::Parser;
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

use terraform_provider_octopusdeploy::ProviderService;
use terraform_provider_octopusdeploy::cli::{self, Cli, Command};
use terraform_provider_octopusdeploy::terraform::handshake;

/// Terraform sets this from TF_LOG_PROVIDER for the provider process.
const LOG_ENV: &str = "TF_LOG_PROVIDER_OCTOPUSDEPLOY";

fn env_filter() -> EnvFilter {
    [LOG_ENV, EnvFilter::DEFAULT_ENV]
        .iter()
        .find_map(|key| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.is_empty())
                .and_then(|v| EnvFilter::try_new(v.to_lowercase()).ok())
        })
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // NOTE: stdout carries the plugin handshake, so logs must go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        None => {
            handshake::serve(ProviderService::new(), cli.debug).await?;
        }
        Some(Command::Resources) => {
            println!("{}", cli::list_types());
        }
        Some(Command::Schema(args)) => {
            println!("{}", cli::describe(&args)?);
        }
    }

    Ok(())
}
