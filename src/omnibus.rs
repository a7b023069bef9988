//! Voting 16/09/2021.
//!
//! 1. Increase balancer reward program rate to 75000 LDO
//! 2. Set balancer reward program allocations to 75000 LDO

use std::{
    fs,
    io::{BufRead, Write},
    path::PathBuf,
};

use alloy::{primitives::U256, rpc::types::TransactionReceipt};
use anyhow::Context;
use log::info;

use crate::{
    config::VoteConfig,
    elements::vote::{
        assemble_vote, ldo, verify_payload_script, TxParams, VoteContext, VoteIntent,
        REWARD_INTENT_KINDS,
    },
    utils::{
        contract_registry::ContractRegistry,
        display_vote::{calls_info_pretty_print, pp},
        network::{VoteSubmission, VoteSubmitter},
        prompt::confirm,
    },
};

pub const VOTE_HEADER: &str = "Voting 16/09/2021.

1. Increase balancer reward program rate to 75000 LDO
2. Set balancer reward program allocations to 75000 LDO";

pub const VOTE_DESCRIPTION: &str = "Omnibus vote: \
    1) Increase balancer reward program rate to 75000 LDO, \
    2) Set balancer reward program allocations to 75000 LDO, ";

const BALANCER_REWARDS_RATE_LDO: u64 = 75_000;
const BALANCER_ALLOCATIONS_LDO: u64 = 75_000;

pub fn vote_intents() -> Vec<VoteIntent> {
    vec![
        VoteIntent::SetRewardsRate {
            rate: ldo(BALANCER_REWARDS_RATE_LDO),
        },
        VoteIntent::SetAllocationsAmount {
            amount: ldo(BALANCER_ALLOCATIONS_LDO),
        },
    ]
}

#[derive(Debug, Default)]
pub struct StartVoteOptions {
    /// Skip the preview and the confirmation prompt.
    pub silent: bool,
    /// Show how each call was resolved in the preview.
    pub verbose: bool,
    pub dump_payload: Option<PathBuf>,
}

#[derive(Debug)]
pub enum VoteOutcome {
    Created {
        vote_id: U256,
        receipt: Option<TransactionReceipt>,
    },
    /// The operator declined, nothing was sent.
    Aborted,
}

pub async fn start_vote<S, R, W>(
    config: &VoteConfig,
    tx_params: TxParams,
    options: &StartVoteOptions,
    submitter: &S,
    input: &mut R,
    output: &mut W,
) -> anyhow::Result<VoteOutcome>
where
    S: VoteSubmitter,
    R: BufRead,
    W: Write,
{
    let addresses = &config.addresses;
    let registry = ContractRegistry::for_network(config.network, addresses);

    let context = VoteContext::new(
        addresses,
        VOTE_DESCRIPTION.to_string(),
        tx_params,
        REWARD_INTENT_KINDS,
    );
    let payload = assemble_vote(&vote_intents(), &context).context("assembling vote")?;
    let human_readable_script =
        verify_payload_script(&payload, &registry, config.network, options.verbose)
            .context("checking vote script")?;
    info!(
        "Vote script is {} bytes with {} calls",
        payload.script.len(),
        human_readable_script.len()
    );

    if let Some(path) = &options.dump_payload {
        let json = serde_json::to_string_pretty(&payload)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!("Payload written to {}", path.display());
    }

    if !options.silent {
        writeln!(output, "\n{}\n", VOTE_HEADER)?;

        pp(output, "Lido finance contract at:", addresses.finance)?;
        pp(
            output,
            "Lido node operator registry at:",
            addresses.node_operators_registry,
        )?;
        pp(output, "Lido voting contract at:", addresses.voting)?;
        pp(output, "Lido token manager at:", addresses.token_manager)?;
        pp(output, "LDO token at:", addresses.ldo_token)?;

        writeln!(output, "\nPoints of voting:")?;
        let total = human_readable_script.len();
        for (ind, call) in human_readable_script.iter().enumerate() {
            writeln!(output, "Point #{}/{}.", ind + 1, total)?;
            write!(output, "{}", calls_info_pretty_print(call)?)?;
            writeln!(output, "---------------------------")?;
        }

        writeln!(output, "Does it look good?")?;
        output.flush()?;
        let resume = confirm(input, output).context("reading operator answer")?;

        if !resume {
            writeln!(output, "Exit without running.")?;
            return Ok(VoteOutcome::Aborted);
        }
    }

    let submission = VoteSubmission {
        voting: addresses.voting,
        token_manager: addresses.token_manager,
        payload: &payload,
    };
    let (vote_id, receipt) = submitter.submit(&submission).await?;

    Ok(VoteOutcome::Created { vote_id, receipt })
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        io::Cursor,
    };

    use alloy::primitives::Bytes;

    use super::*;
    use crate::{
        config::{Deployer, Network, DEVELOPMENT_SENDER},
        elements::{address_book::AddressBook, vote::VotePayload},
        error::{SubmissionFailure, VoteError},
    };

    #[derive(Default)]
    struct RecordingSubmitter {
        submitted: RefCell<Vec<VotePayload>>,
    }

    impl VoteSubmitter for RecordingSubmitter {
        async fn submit(
            &self,
            submission: &VoteSubmission<'_>,
        ) -> Result<(U256, Option<TransactionReceipt>), VoteError> {
            self.submitted.borrow_mut().push(submission.payload.clone());
            Ok((U256::from(123u64), None))
        }
    }

    /// Stands in for a node that cannot be reached.
    #[derive(Default)]
    struct OfflineSubmitter {
        attempts: Cell<usize>,
    }

    impl VoteSubmitter for OfflineSubmitter {
        async fn submit(
            &self,
            _submission: &VoteSubmission<'_>,
        ) -> Result<(U256, Option<TransactionReceipt>), VoteError> {
            self.attempts.set(self.attempts.get() + 1);
            Err(VoteError::Submission {
                tx_hash: None,
                failure: SubmissionFailure::NotSent,
                reason: "connection refused".to_string(),
            })
        }
    }

    fn config() -> VoteConfig {
        VoteConfig {
            network: Network::Development,
            rpc_url: "http://127.0.0.1:8545".to_string(),
            addresses: AddressBook::mainnet().unwrap(),
            deployer: Deployer::Unlocked(DEVELOPMENT_SENDER),
            gas_price: 100_000_000_000,
        }
    }

    async fn run(answers: &str, options: StartVoteOptions) -> (VoteOutcome, RecordingSubmitter, String) {
        colored::control::set_override(false);
        let config = config();
        let tx_params = TxParams::new(config.deployer.address(), config.gas_price).unwrap();
        let submitter = RecordingSubmitter::default();
        let mut output = Vec::new();

        let outcome = start_vote(
            &config,
            tx_params,
            &options,
            &submitter,
            &mut Cursor::new(answers.to_string()),
            &mut output,
        )
        .await
        .unwrap();

        (outcome, submitter, String::from_utf8(output).unwrap())
    }

    #[tokio::test]
    async fn test_negative_answer_never_submits() {
        let (outcome, submitter, output) = run("no\n", StartVoteOptions::default()).await;

        assert!(matches!(outcome, VoteOutcome::Aborted));
        assert!(submitter.submitted.borrow().is_empty());
        assert!(output.contains("Exit without running."));
    }

    #[tokio::test]
    async fn test_confirmed_vote_is_submitted() {
        let (outcome, submitter, output) = run("what\nyes\n", StartVoteOptions::default()).await;

        let VoteOutcome::Created { vote_id, receipt } = outcome else {
            panic!("vote was not created");
        };
        assert_eq!(vote_id, U256::from(123u64));
        assert!(receipt.is_none());

        let submitted = submitter.submitted.borrow();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].description, VOTE_DESCRIPTION);
        assert_eq!(submitted[0].calls.len(), 2);

        assert!(output.contains("Point #1/2."));
        assert!(output.contains("Point #2/2."));
        assert!(output.contains("set_rewards_limit_per_period(uint256)"));
        assert!(output.contains("set_allocations_limit(uint256)"));
        assert!(output.contains("Please respond with 'yes' or 'no'"));
    }

    #[tokio::test]
    async fn test_node_is_only_used_after_confirmation() {
        colored::control::set_override(false);
        let config = config();
        let tx_params = TxParams::new(config.deployer.address(), config.gas_price).unwrap();
        let submitter = OfflineSubmitter::default();

        let mut output = Vec::new();
        let outcome = start_vote(
            &config,
            tx_params,
            &StartVoteOptions::default(),
            &submitter,
            &mut Cursor::new("maybe\nno\n"),
            &mut output,
        )
        .await
        .unwrap();
        assert!(matches!(outcome, VoteOutcome::Aborted));
        assert_eq!(submitter.attempts.get(), 0);

        let mut output = Vec::new();
        let err = start_vote(
            &config,
            tx_params,
            &StartVoteOptions::default(),
            &submitter,
            &mut Cursor::new("y\n"),
            &mut output,
        )
        .await
        .unwrap_err();
        assert_eq!(submitter.attempts.get(), 1);
        assert!(matches!(
            err.downcast_ref::<VoteError>(),
            Some(VoteError::Submission {
                failure: SubmissionFailure::NotSent,
                ..
            })
        ));

        // The whole preview was shown before the node was needed.
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Point #2/2."));
        assert!(output.contains("Does it look good?"));
    }

    #[tokio::test]
    async fn test_silent_run_skips_prompt() {
        let options = StartVoteOptions {
            silent: true,
            ..Default::default()
        };
        let (outcome, submitter, output) = run("", options).await;

        assert!(matches!(outcome, VoteOutcome::Created { .. }));
        assert_eq!(submitter.submitted.borrow().len(), 1);
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_verbose_preview_shows_resolution() {
        let options = StartVoteOptions {
            verbose: true,
            ..Default::default()
        };
        let (_, _, output) = run("n\n", options).await;

        assert!(output.contains("resolved to agent"));
        assert!(output.contains("resolved to balancer_rewards_manager"));
    }

    #[tokio::test]
    async fn test_payload_dump() {
        let path = std::env::temp_dir().join(format!("vote-payload-{}.json", std::process::id()));
        let options = StartVoteOptions {
            silent: true,
            dump_payload: Some(path.clone()),
            ..Default::default()
        };
        let (_, submitter, _) = run("", options).await;

        let dumped: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        fs::remove_file(&path).unwrap();

        let script: Bytes = serde_json::from_value(dumped["script"].clone()).unwrap();
        assert_eq!(script, submitter.submitted.borrow()[0].script);
        assert_eq!(dumped["description"], VOTE_DESCRIPTION);
    }
}
