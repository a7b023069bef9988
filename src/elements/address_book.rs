use alloy::primitives::Address;
use serde::Deserialize;

use crate::error::VoteError;

const MAINNET_ADDRESSES: &str = include_str!("../../config/mainnet.toml");

/// DAO contract addresses of one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddressBook {
    pub ldo_token: Address,
    pub voting: Address,
    pub token_manager: Address,
    pub finance: Address,
    pub agent: Address,
    pub node_operators_registry: Address,
    pub balancer_rewards_manager: Address,
}

impl AddressBook {
    pub fn parse(toml_content: &str) -> Result<Self, VoteError> {
        toml::from_str(toml_content)
            .map_err(|err| VoteError::EnvironmentConfig(format!("invalid address table: {err}")))
    }

    pub fn mainnet() -> Result<Self, VoteError> {
        Self::parse(MAINNET_ADDRESSES)
    }

    pub fn named_addresses(&self) -> [(&'static str, Address); 7] {
        [
            ("ldo_token", self.ldo_token),
            ("voting", self.voting),
            ("token_manager", self.token_manager),
            ("finance", self.finance),
            ("agent", self.agent),
            ("node_operators_registry", self.node_operators_registry),
            ("balancer_rewards_manager", self.balancer_rewards_manager),
        ]
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    #[test]
    fn test_mainnet_table() {
        let book = AddressBook::mainnet().unwrap();
        assert_eq!(
            book.agent,
            address!("3e40d73eb977dc6a537af587d48316fee66e9c8c")
        );
        assert_eq!(
            book.voting,
            address!("2e59a20f205bb85a89c53f1936454680651e618e")
        );

        // Every role points at a distinct contract.
        let mut addresses: Vec<Address> = book
            .named_addresses()
            .iter()
            .map(|(_, address)| *address)
            .collect();
        addresses.sort();
        addresses.dedup();
        assert_eq!(addresses.len(), 7);
    }

    #[test]
    fn test_missing_entry_is_rejected() {
        let err = AddressBook::parse("voting = \"0x2e59a20f205bb85a89c53f1936454680651e618e\"")
            .unwrap_err();
        assert!(matches!(err, VoteError::EnvironmentConfig(_)));
    }
}
