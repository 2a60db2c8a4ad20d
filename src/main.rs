use clap::Parser;
use teamshare::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Reconcile(args) => cli::reconcile::run(args).await,
        Command::Token(args) => cli::token::run(args),
    }
}
