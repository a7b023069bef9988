use alloy::{
    primitives::{Address, Bytes, U256},
    sol_types::SolCall,
};
use serde::Serialize;

use super::{
    address_book::AddressBook,
    call_script::{decode_call_script, encode_call_script, Call, DecodeOptions, DecodedCall},
    contracts::{Agent, BalancerRewardsManager, Finance, Voting},
};
use crate::{config::Network, error::VoteError, utils::contract_registry::ContractRegistry};

const LDO_DECIMALS: u64 = 18;

/// Intent kinds of a balancer rewards vote.
pub const REWARD_INTENT_KINDS: &[&str] = &["set_rewards_rate", "set_allocations_amount"];

/// Converts a whole LDO amount to its smallest unit.
pub fn ldo(amount: u64) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(LDO_DECIMALS))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteIntent {
    SetRewardsRate {
        rate: U256,
    },
    SetAllocationsAmount {
        amount: U256,
    },
    /// LDO paid from the DAO treasury through Finance.
    #[allow(dead_code)] // no current vote pays out
    TokenPayout {
        recipient: Address,
        amount: U256,
        reference: String,
    },
}

impl VoteIntent {
    pub fn kind(&self) -> &'static str {
        match self {
            VoteIntent::SetRewardsRate { .. } => "set_rewards_rate",
            VoteIntent::SetAllocationsAmount { .. } => "set_allocations_amount",
            VoteIntent::TokenPayout { .. } => "token_payout",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TxParams {
    from: Address,
    /// In wei.
    gas_price: u128,
}

impl TxParams {
    pub fn new(from: Address, gas_price: u128) -> Result<Self, VoteError> {
        if from == Address::ZERO {
            return Err(VoteError::EnvironmentConfig(
                "transaction sender must not be the zero address".to_string(),
            ));
        }
        if gas_price == 0 {
            return Err(VoteError::EnvironmentConfig(
                "gas price must be positive".to_string(),
            ));
        }

        Ok(Self { from, gas_price })
    }

    pub fn from(&self) -> Address {
        self.from
    }

    pub fn gas_price(&self) -> u128 {
        self.gas_price
    }
}

pub struct VoteContext {
    pub agent: Address,
    pub rewards_manager: Address,
    pub finance: Address,
    pub ldo_token: Address,
    pub description: String,
    pub tx_params: TxParams,
    /// Intent kinds this vote is allowed to contain.
    pub supported_kinds: &'static [&'static str],
}

impl VoteContext {
    pub fn new(
        addresses: &AddressBook,
        description: String,
        tx_params: TxParams,
        supported_kinds: &'static [&'static str],
    ) -> Self {
        Self {
            agent: addresses.agent,
            rewards_manager: addresses.balancer_rewards_manager,
            finance: addresses.finance,
            ldo_token: addresses.ldo_token,
            description,
            tx_params,
            supported_kinds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VotePayload {
    pub description: String,
    pub calls: Vec<Call>,
    pub script: Bytes,
    pub tx_params: TxParams,
}

/// Wraps a call so that the agent executes it, through `Agent.forward`
/// with a single-call script.
pub fn build_forwarded_call(
    inner_target: Address,
    inner_calldata: Bytes,
    agent: Address,
) -> Result<Call, VoteError> {
    let inner_script = encode_call_script(&[Call::new(inner_target, inner_calldata)])?;
    let calldata = Agent::forwardCall {
        _evmScript: inner_script,
    }
    .abi_encode();

    Ok(Call::new(agent, calldata))
}

/// Payment of `amount` LDO to `recipient`, made by Finance itself.
pub fn encode_ldo_payout(
    recipient: Address,
    amount: U256,
    reference: &str,
    finance: Address,
    ldo_token: Address,
) -> Result<Call, VoteError> {
    if recipient == Address::ZERO || amount.is_zero() {
        return Err(VoteError::InvalidIntent(format!(
            "payout of {amount} to {recipient} needs a recipient and a positive amount"
        )));
    }

    let calldata = Finance::newImmediatePaymentCall {
        _token: ldo_token,
        _receiver: recipient,
        _amount: amount,
        _reference: reference.to_string(),
    }
    .abi_encode();

    Ok(Call::new(finance, calldata))
}

fn encode_intent(intent: &VoteIntent, context: &VoteContext) -> Result<Call, VoteError> {
    if !context.supported_kinds.contains(&intent.kind()) {
        return Err(VoteError::InvalidIntent(format!(
            "{} is not supported by this vote",
            intent.kind()
        )));
    }

    let calldata = match intent {
        VoteIntent::SetRewardsRate { rate } => {
            BalancerRewardsManager::set_rewards_limit_per_periodCall { _new_limit: *rate }
                .abi_encode()
        }
        VoteIntent::SetAllocationsAmount { amount } => {
            BalancerRewardsManager::set_allocations_limitCall {
                _new_allocations_limit: *amount,
            }
            .abi_encode()
        }
        VoteIntent::TokenPayout {
            recipient,
            amount,
            reference,
        } => {
            return encode_ldo_payout(
                *recipient,
                *amount,
                reference,
                context.finance,
                context.ldo_token,
            )
        }
    };

    build_forwarded_call(context.rewards_manager, calldata.into(), context.agent)
}

pub fn assemble_vote(
    intents: &[VoteIntent],
    context: &VoteContext,
) -> Result<VotePayload, VoteError> {
    let calls = intents
        .iter()
        .map(|intent| encode_intent(intent, context))
        .collect::<Result<Vec<_>, _>>()?;
    let script = encode_call_script(&calls)?;

    Ok(VotePayload {
        description: context.description.clone(),
        calls,
        script,
        tx_params: context.tx_params,
    })
}

/// Decodes the payload script strictly and checks it against what was
/// assembled. Returns the decoded calls for display.
pub fn verify_payload_script(
    payload: &VotePayload,
    registry: &ContractRegistry,
    network: Network,
    verbose: bool,
) -> Result<Vec<DecodedCall>, VoteError> {
    let options = DecodeOptions {
        verbose,
        network,
        strict_unknown_calls: true,
    };
    let decoded = decode_call_script(&payload.script, registry, &options)?;

    let decoded_calls: Vec<Call> = decoded.iter().map(DecodedCall::call).collect();
    if decoded_calls != payload.calls {
        return Err(VoteError::Encoding(format!(
            "script decodes to {} calls that differ from the {} assembled ones",
            decoded_calls.len(),
            payload.calls.len()
        )));
    }
    if encode_call_script(&decoded_calls)? != payload.script {
        return Err(VoteError::Encoding(
            "script does not re-encode to the same bytes".to_string(),
        ));
    }

    Ok(decoded)
}

/// Script run by the token manager to open the vote on `voting`.
pub fn encode_new_vote_script(voting: Address, payload: &VotePayload) -> Result<Bytes, VoteError> {
    let calldata = Voting::newVoteCall {
        _executionScript: payload.script.clone(),
        _metadata: payload.description.clone(),
    }
    .abi_encode();

    encode_call_script(&[Call::new(voting, calldata)])
}
