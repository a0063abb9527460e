mod cli;
mod config;

use clap::Parser;
use cli::{Cli, Commands};
use config::GuildpromptConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; library `log` records are bridged through tracing-log.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve(args) => {
            let config = GuildpromptConfig::load_or_default(&cli.config)?;
            cli::resolve::run(args, &config).await
        }
        Commands::Validate(cmd) => cli::validate::run(cmd),
        Commands::Routes(args) => cli::routes::run(args),
        Commands::Defaults(args) => {
            let config = GuildpromptConfig::load_or_default(&cli.config)?;
            cli::defaults::run(args, &config)
        }
        Commands::Config(cmd) => cli::config_cmd::run(cmd, &cli.config),
    }
}
