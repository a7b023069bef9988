use std::{fmt, fs, path::Path, str::FromStr};

use alloy::{
    primitives::{address, Address},
    signers::local::PrivateKeySigner,
};
use clap::ValueEnum;
use log::{debug, info};

use crate::{elements::address_book::AddressBook, error::VoteError};

/// Account used on a `development` fork, unlocked by the node.
pub const DEVELOPMENT_SENDER: Address = address!("3e40d73eb977dc6a537af587d48316fee66e9c8c");

pub const DEPLOYER_ENV: &str = "DEPLOYER";

const WEI_PER_GWEI: u128 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Network {
    Mainnet,
    Goerli,
    /// Local fork of mainnet.
    Development,
}

impl Network {
    pub fn is_live(&self) -> bool {
        *self != Network::Development
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Goerli => write!(f, "goerli"),
            Network::Development => write!(f, "development"),
        }
    }
}

pub enum Deployer {
    Local(PrivateKeySigner),
    Unlocked(Address),
}

impl Deployer {
    pub fn from_env(network: Network) -> Result<Self, VoteError> {
        Self::from_key(network, std::env::var(DEPLOYER_ENV).ok().as_deref())
    }

    pub fn from_key(network: Network, key: Option<&str>) -> Result<Self, VoteError> {
        if !network.is_live() {
            return Ok(Deployer::Unlocked(DEVELOPMENT_SENDER));
        }

        let key = key.ok_or_else(|| {
            VoteError::EnvironmentConfig(format!(
                "Please set {DEPLOYER_ENV} env variable to the deployer private key"
            ))
        })?;
        let signer = PrivateKeySigner::from_str(key.trim()).map_err(|err| {
            VoteError::EnvironmentConfig(format!("{DEPLOYER_ENV} is not a valid private key: {err}"))
        })?;

        Ok(Deployer::Local(signer))
    }

    pub fn address(&self) -> Address {
        match self {
            Deployer::Local(signer) => signer.address(),
            Deployer::Unlocked(address) => *address,
        }
    }
}

/// Everything the vote needs from the environment, loaded once at start.
pub struct VoteConfig {
    pub network: Network,
    pub rpc_url: String,
    pub addresses: AddressBook,
    pub deployer: Deployer,
    /// In wei.
    pub gas_price: u128,
}

impl VoteConfig {
    pub fn load(
        network: Network,
        rpc_url: String,
        addresses_path: Option<&Path>,
        gas_price_gwei: u64,
    ) -> Result<Self, VoteError> {
        let addresses = load_address_book(network, addresses_path)?;
        let deployer = Deployer::from_env(network)?;
        let gas_price = u128::from(gas_price_gwei) * WEI_PER_GWEI;

        info!(
            "Loaded {} config, sending from {}",
            network,
            deployer.address()
        );
        for (name, address) in addresses.named_addresses() {
            debug!("{}: {}", name, address);
        }

        Ok(Self {
            network,
            rpc_url,
            addresses,
            deployer,
            gas_price,
        })
    }
}

pub fn load_address_book(
    network: Network,
    addresses_path: Option<&Path>,
) -> Result<AddressBook, VoteError> {
    if let Some(path) = addresses_path {
        info!("Using addresses from {}", path.display());
        let content = fs::read_to_string(path).map_err(|err| {
            VoteError::EnvironmentConfig(format!("cannot read {}: {err}", path.display()))
        })?;
        return AddressBook::parse(&content);
    }

    match network {
        Network::Mainnet | Network::Development => AddressBook::mainnet(),
        Network::Goerli => Err(VoteError::EnvironmentConfig(
            "no built-in goerli address table, pass --addresses".to_string(),
        )),
    }
}
