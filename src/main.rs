use clap::Parser;
use std::io::ErrorKind;
use trade_governor::cli::{Cli, Commands};
use trade_governor::config::{Config, ConfigError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing file means defaults; a broken one is fatal
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(ConfigError::ReadFile(e)) if e.kind() == ErrorKind::NotFound => {
            eprintln!("Warning: {} not found, using default configuration", cli.config);
            Config::default()
        }
        Err(e) => return Err(e.into()),
    };

    // Initialize telemetry
    trade_governor::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Evaluate(args) => {
            tracing::debug!(symbol = %args.symbol, "Evaluating trade request");
            args.execute(&config.risk).await?;
        }
        Commands::Replay(args) => {
            tracing::info!("Starting replay");
            args.execute(&config.risk).await?;
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
