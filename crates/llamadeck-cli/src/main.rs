//! CLI entry point.

use clap::Parser;

use llamadeck_cli::{Cli, Commands, bootstrap, handlers, init_tracing};
use llamadeck_runtime::ServerSupervisor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = bootstrap(&cli)?;

    match &cli.command {
        Commands::Run { .. } => {
            let supervisor = ServerSupervisor::local(config.server, config.settings)?;
            handlers::run::execute(&supervisor).await?;
        }
        Commands::Args { .. } => handlers::args::execute(&config.server)?,
        Commands::Probe => handlers::probe::execute(&config.server, &config.settings).await?,
        Commands::Models { json } => {
            handlers::models::execute(&config.server, &config.settings, *json).await?;
        }
    }

    Ok(())
}
