use alloy::{
    network::EthereumWallet,
    primitives::{Address, TxHash, U256},
    providers::{Provider, ProviderBuilder},
    rpc::types::TransactionReceipt,
    signers::local::PrivateKeySigner,
    transports::http::Http,
};
use log::info;
use reqwest::{Client, Url};

use crate::{
    elements::{
        contracts::{TokenManager, Voting},
        vote::{encode_new_vote_script, VotePayload},
    },
    error::{SubmissionFailure, VoteError},
};

pub struct VoteSubmission<'a> {
    pub voting: Address,
    pub token_manager: Address,
    pub payload: &'a VotePayload,
}

/// Sends the vote creation transaction and reports the new vote id.
pub trait VoteSubmitter {
    async fn submit(
        &self,
        submission: &VoteSubmission<'_>,
    ) -> Result<(U256, Option<TransactionReceipt>), VoteError>;
}

pub struct RpcVoteSubmitter<P> {
    provider: P,
    /// Account the fork node is asked to unlock right before sending.
    impersonate: Option<Address>,
}

fn parse_rpc_url(rpc_url: &str) -> Result<Url, VoteError> {
    rpc_url
        .parse()
        .map_err(|err| VoteError::EnvironmentConfig(format!("invalid RPC url {rpc_url}: {err}")))
}

pub fn connect_with_signer(
    rpc_url: &str,
    signer: PrivateKeySigner,
) -> Result<RpcVoteSubmitter<impl Provider<Http<Client>> + Clone>, VoteError> {
    let provider = ProviderBuilder::new()
        .with_recommended_fillers()
        .wallet(EthereumWallet::from(signer))
        .on_http(parse_rpc_url(rpc_url)?);

    Ok(RpcVoteSubmitter {
        provider,
        impersonate: None,
    })
}

/// Sets up sending on behalf of `sender` through a fork node, without a key.
/// The node is not contacted until `submit`.
pub fn connect_unlocked(
    rpc_url: &str,
    sender: Address,
) -> Result<RpcVoteSubmitter<impl Provider<Http<Client>> + Clone>, VoteError> {
    let provider = ProviderBuilder::new()
        .with_recommended_fillers()
        .on_http(parse_rpc_url(rpc_url)?);

    Ok(RpcVoteSubmitter {
        provider,
        impersonate: Some(sender),
    })
}

fn not_sent(reason: impl ToString) -> VoteError {
    VoteError::Submission {
        tx_hash: None,
        failure: SubmissionFailure::NotSent,
        reason: reason.to_string(),
    }
}

fn outcome_unknown(tx_hash: TxHash, reason: impl ToString) -> VoteError {
    VoteError::Submission {
        tx_hash: Some(tx_hash),
        failure: SubmissionFailure::Unknown,
        reason: reason.to_string(),
    }
}

fn check_status(tx_hash: TxHash, succeeded: bool) -> Result<(), VoteError> {
    if succeeded {
        return Ok(());
    }
    Err(VoteError::Submission {
        tx_hash: Some(tx_hash),
        failure: SubmissionFailure::Reverted,
        reason: "receipt status is failed".to_string(),
    })
}

impl<P> VoteSubmitter for RpcVoteSubmitter<P>
where
    P: Provider<Http<Client>> + Clone,
{
    async fn submit(
        &self,
        submission: &VoteSubmission<'_>,
    ) -> Result<(U256, Option<TransactionReceipt>), VoteError> {
        let new_vote_script = encode_new_vote_script(submission.voting, submission.payload)?;
        let tx_params = submission.payload.tx_params;

        if let Some(sender) = self.impersonate {
            self.provider
                .raw_request::<_, ()>("anvil_impersonateAccount".into(), (sender,))
                .await
                .map_err(|err| {
                    VoteError::EnvironmentConfig(format!(
                        "cannot unlock {sender} on the fork: {err}"
                    ))
                })?;
            info!("Impersonating {}", sender);
        }

        let token_manager = TokenManager::new(submission.token_manager, self.provider.clone());
        let pending = token_manager
            .forward(new_vote_script)
            .from(tx_params.from())
            .gas_price(tx_params.gas_price())
            .send()
            .await
            .map_err(not_sent)?;

        let tx_hash = *pending.tx_hash();
        info!("Vote transaction sent: {}", tx_hash);

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|err| outcome_unknown(tx_hash, err))?;
        check_status(tx_hash, receipt.status())?;

        let vote_id = receipt
            .inner
            .logs()
            .iter()
            .find_map(|log| log.log_decode::<Voting::StartVote>().ok())
            .map(|log| log.inner.data.voteId)
            .ok_or_else(|| outcome_unknown(tx_hash, "receipt has no StartVote event"))?;
        info!("Vote {} started in block {:?}", vote_id, receipt.block_number);

        Ok((vote_id, Some(receipt)))
    }
}
