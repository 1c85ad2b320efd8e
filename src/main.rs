use anyhow::Context;
use clap::Parser;
use smn_pipeline::cli::{run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run(cli).await.context("smn-pipeline failed")
}
