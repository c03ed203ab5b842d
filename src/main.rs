use anyhow::Result;
use clap::Parser;
use wallet_ledger::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    cli.run().await
}
