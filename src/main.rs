use std::{io, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use config::{Deployer, Network, VoteConfig};
use elements::vote::TxParams;
use omnibus::{start_vote, StartVoteOptions, VoteOutcome};
use utils::network::{connect_unlocked, connect_with_signer};

mod config;
mod elements;
mod error;
mod omnibus;
mod utils;

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
const DEFAULT_GAS_PRICE_GWEI: u64 = 100;

#[derive(Debug, Parser)]
struct Args {
    #[clap(long, value_enum, default_value_t = Network::Mainnet)]
    network: Network,

    #[clap(long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,

    // TOML address table, replaces the built-in one for the network.
    #[clap(long)]
    addresses: Option<PathBuf>,

    #[clap(long, default_value_t = DEFAULT_GAS_PRICE_GWEI)]
    gas_price_gwei: u64,

    // Submit without preview and confirmation.
    #[clap(long)]
    silent: bool,

    // Show how every call of the preview was resolved.
    #[clap(long)]
    verbose: bool,

    // Write the assembled payload as JSON before submitting.
    #[clap(long)]
    dump_payload: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::init();

    let config = VoteConfig::load(
        args.network,
        args.rpc_url,
        args.addresses.as_deref(),
        args.gas_price_gwei,
    )
    .context("loading configuration")?;
    let tx_params = TxParams::new(config.deployer.address(), config.gas_price)?;

    let options = StartVoteOptions {
        silent: args.silent,
        verbose: args.verbose,
        dump_payload: args.dump_payload,
    };
    let mut input = io::stdin().lock();
    let mut output = io::stdout();

    let outcome = match &config.deployer {
        Deployer::Local(signer) => {
            let submitter = connect_with_signer(&config.rpc_url, signer.clone())?;
            start_vote(&config, tx_params, &options, &submitter, &mut input, &mut output).await?
        }
        Deployer::Unlocked(sender) => {
            let submitter = connect_unlocked(&config.rpc_url, *sender)?;
            start_vote(&config, tx_params, &options, &submitter, &mut input, &mut output).await?
        }
    };

    if let VoteOutcome::Created { vote_id, .. } = outcome {
        println!("Vote created: {}.", vote_id);
    }

    Ok(())
}
