use apikey_registry::cli::{self, Cli, Command};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Mint(args) => cli::mint::run(&args),
        Command::Migrate(args) => cli::migrate::run(&args).await,
    }
}
