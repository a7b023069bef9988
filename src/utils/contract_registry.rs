use alloy::{
    json_abi::Function,
    primitives::{map::HashMap, Address},
};

use crate::{config::Network, elements::address_book::AddressBook};

/// Contract with the human-readable signatures used to decode its calls.
#[derive(Debug, Clone)]
pub struct KnownContract {
    pub name: String,
    functions: Vec<Function>,
}

impl KnownContract {
    /// Signatures are static, so a malformed one is a programming error.
    pub fn new(name: &str, signatures: &[&str]) -> Self {
        let functions = signatures
            .iter()
            .map(|signature| {
                Function::parse(signature)
                    .unwrap_or_else(|err| panic!("Invalid signature {signature}: {err}"))
            })
            .collect();

        Self {
            name: name.to_string(),
            functions,
        }
    }

    pub fn function_by_selector(&self, selector: &[u8]) -> Option<&Function> {
        self.functions
            .iter()
            .find(|function| function.selector().as_slice() == selector)
    }
}

#[derive(Debug, Default)]
pub struct ContractRegistry {
    contracts: HashMap<(Network, Address), KnownContract>,
}

impl ContractRegistry {
    pub fn for_network(network: Network, addresses: &AddressBook) -> Self {
        let mut result = Self::default();
        result.add_network(network, addresses);
        result
    }

    pub fn add_network(&mut self, network: Network, addresses: &AddressBook) {
        self.add_contract(
            network,
            addresses.voting,
            KnownContract::new(
                "voting",
                &[
                    "newVote(bytes _executionScript, string _metadata)",
                    "vote(uint256 _voteId, bool _supports, bool _executesIfDecided)",
                    "executeVote(uint256 _voteId)",
                ],
            ),
        );
        self.add_contract(
            network,
            addresses.token_manager,
            KnownContract::new("token_manager", &["forward(bytes _evmScript)"]),
        );
        self.add_contract(
            network,
            addresses.agent,
            KnownContract::new(
                "agent",
                &[
                    "forward(bytes _evmScript)",
                    "execute(address _target, uint256 _ethValue, bytes _data)",
                    "transfer(address _token, address _to, uint256 _value)",
                ],
            ),
        );
        self.add_contract(
            network,
            addresses.finance,
            KnownContract::new(
                "finance",
                &["newImmediatePayment(address _token, address _receiver, uint256 _amount, string _reference)"],
            ),
        );
        self.add_contract(
            network,
            addresses.node_operators_registry,
            KnownContract::new(
                "node_operators_registry",
                &["setNodeOperatorStakingLimit(uint256 _id, uint64 _stakingLimit)"],
            ),
        );
        self.add_contract(
            network,
            addresses.balancer_rewards_manager,
            KnownContract::new(
                "balancer_rewards_manager",
                &[
                    "set_rewards_limit_per_period(uint256 _new_limit)",
                    "set_allocations_limit(uint256 _new_allocations_limit)",
                ],
            ),
        );
        self.add_contract(
            network,
            addresses.ldo_token,
            KnownContract::new("ldo_token", &["transfer(address _to, uint256 _amount)"]),
        );
    }

    pub fn add_contract(&mut self, network: Network, address: Address, contract: KnownContract) {
        self.contracts.insert((network, address), contract);
    }

    pub fn lookup(&self, network: Network, address: &Address) -> Option<&KnownContract> {
        self.contracts.get(&(network, *address))
    }
}
