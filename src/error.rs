use std::fmt;

use alloy::primitives::{Address, TxHash};

/// Failures raised while building, checking or submitting the vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteError {
    /// Malformed call shape, unsupported script format or a script that does
    /// not survive re-encoding.
    Encoding(String),
    TruncatedScript {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    UnknownCallTarget {
        target: Address,
        reason: String,
    },
    InvalidIntent(String),
    EnvironmentConfig(String),
    Submission {
        tx_hash: Option<TxHash>,
        failure: SubmissionFailure,
        reason: String,
    },
}

/// How far a failed vote transaction got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionFailure {
    /// Rejected while being prepared, nothing was broadcast.
    NotSent,
    /// Mined with a failed status.
    Reverted,
    /// Broadcast, but the result could not be established.
    Unknown,
}

impl fmt::Display for VoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteError::Encoding(reason) => write!(f, "Call script encoding error: {reason}"),
            VoteError::TruncatedScript {
                offset,
                needed,
                remaining,
            } => write!(
                f,
                "Truncated call script at offset {offset}: needed {needed} bytes, {remaining} remaining"
            ),
            VoteError::UnknownCallTarget { target, reason } => {
                write!(f, "Unknown call target {target}: {reason}")
            }
            VoteError::InvalidIntent(reason) => write!(f, "Invalid vote intent: {reason}"),
            VoteError::EnvironmentConfig(reason) => write!(f, "Environment config error: {reason}"),
            VoteError::Submission {
                tx_hash,
                failure,
                reason,
            } => {
                match failure {
                    SubmissionFailure::NotSent => write!(f, "Vote transaction was not sent")?,
                    SubmissionFailure::Reverted => write!(f, "Vote transaction reverted")?,
                    SubmissionFailure::Unknown => {
                        write!(f, "Vote submission failed, outcome unknown on-chain")?
                    }
                }
                if let Some(tx_hash) = tx_hash {
                    write!(f, " (tx {tx_hash})")?;
                }
                write!(f, ": {reason}")
            }
        }
    }
}

impl std::error::Error for VoteError {}
