// eosio-newaccount - create one account through a node's chain API

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use eosio_newaccount::{
    run, Api, ChainRpc, CommandArguments, LocalKeySignatureProvider, Outcome, RpcConfig,
};

#[tokio::main]
async fn main() -> ExitCode {
    init_logger();

    // Exits with a usage error when a flag is missing
    let args = CommandArguments::parse();

    match create_account(&args).await {
        Ok(outcome) if outcome.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Wire the chain client and signing key into the submitter, then run once
async fn create_account(args: &CommandArguments) -> Result<Outcome> {
    let rpc = ChainRpc::new(&RpcConfig::new(&args.url))
        .context("failed to create chain API client")?;
    let signature_provider =
        LocalKeySignatureProvider::new(std::slice::from_ref(&args.private_key))
            .context("failed to load signing key")?;
    let api = Api::new(rpc, signature_provider);

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    Ok(run(args, &api, &mut stdout, &mut stderr).await)
}

fn init_logger() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .with_target(false)
        .init();
}
