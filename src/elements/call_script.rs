//! Aragon call-script (EVMScript spec 1) encoding and decoding.
//!
//! Layout: `0x00000001` followed by one entry per call, each being the
//! 20-byte target, the calldata length as big-endian `u32` and the calldata.

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    hex,
    primitives::{Address, Bytes},
};
use log::{debug, warn};
use serde::Serialize;

use crate::{config::Network, error::VoteError, utils::contract_registry::ContractRegistry};

pub const CALL_SCRIPT_SPEC_ID: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

const ADDRESS_LENGTH: usize = 20;
const CALLDATA_LENGTH_SIZE: usize = 4;
const SELECTOR_LENGTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Call {
    pub target: Address,
    pub calldata: Bytes,
}

impl Call {
    pub fn new(target: Address, calldata: impl Into<Bytes>) -> Self {
        Self {
            target,
            calldata: calldata.into(),
        }
    }

    /// Builds a call from an unchecked target slice.
    pub fn from_raw(target: &[u8], calldata: &[u8]) -> Result<Self, VoteError> {
        if target.len() != ADDRESS_LENGTH {
            return Err(VoteError::Encoding(format!(
                "call target must be {} bytes, got {} (0x{})",
                ADDRESS_LENGTH,
                target.len(),
                hex::encode(target)
            )));
        }

        Ok(Self::new(
            Address::from_slice(target),
            Bytes::copy_from_slice(calldata),
        ))
    }
}

pub fn is_call_script(data: &[u8]) -> bool {
    data.starts_with(&CALL_SCRIPT_SPEC_ID)
}

pub fn encode_call_script(calls: &[Call]) -> Result<Bytes, VoteError> {
    if calls.is_empty() {
        return Err(VoteError::Encoding(
            "call script must contain at least one call".to_string(),
        ));
    }

    let body_len: usize = calls
        .iter()
        .map(|call| ADDRESS_LENGTH + CALLDATA_LENGTH_SIZE + call.calldata.len())
        .sum();
    let mut script = Vec::with_capacity(CALL_SCRIPT_SPEC_ID.len() + body_len);
    script.extend_from_slice(&CALL_SCRIPT_SPEC_ID);

    for call in calls {
        let length = u32::try_from(call.calldata.len()).map_err(|_| {
            VoteError::Encoding(format!(
                "calldata for {} is {} bytes, which does not fit the u32 length field",
                call.target,
                call.calldata.len()
            ))
        })?;

        script.extend_from_slice(call.target.as_slice());
        script.extend_from_slice(&length.to_be_bytes());
        script.extend_from_slice(&call.calldata);
    }

    Ok(script.into())
}

/// Splits a call script back into its calls, without any interpretation of
/// the calldata.
pub fn parse_call_script(script: &[u8]) -> Result<Vec<Call>, VoteError> {
    let mut i = 0usize;
    let spec_id = read_slice(script, &mut i, CALL_SCRIPT_SPEC_ID.len())?;
    if spec_id != CALL_SCRIPT_SPEC_ID {
        return Err(VoteError::Encoding(format!(
            "unsupported call script spec id 0x{}",
            hex::encode(spec_id)
        )));
    }

    let mut calls = Vec::new();
    while i < script.len() {
        let target = read_slice(script, &mut i, ADDRESS_LENGTH)?;
        let length = read_u32_be(script, &mut i)? as usize;
        let calldata = read_slice(script, &mut i, length)?;
        calls.push(Call::from_raw(target, calldata)?);
    }

    if calls.is_empty() {
        // A bare spec id is what remains of a script cut right after its header.
        return Err(VoteError::TruncatedScript {
            offset: i,
            needed: ADDRESS_LENGTH + CALLDATA_LENGTH_SIZE,
            remaining: 0,
        });
    }

    Ok(calls)
}

fn read_slice<'a>(bytes: &'a [u8], i: &mut usize, len: usize) -> Result<&'a [u8], VoteError> {
    let remaining = bytes.len() - *i;
    if remaining < len {
        return Err(VoteError::TruncatedScript {
            offset: *i,
            needed: len,
            remaining,
        });
    }
    let out = &bytes[*i..*i + len];
    *i += len;
    Ok(out)
}

fn read_u32_be(bytes: &[u8], i: &mut usize) -> Result<u32, VoteError> {
    let mut buf = [0u8; CALLDATA_LENGTH_SIZE];
    buf.copy_from_slice(read_slice(bytes, i, CALLDATA_LENGTH_SIZE)?);
    Ok(u32::from_be_bytes(buf))
}

#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Keep the resolution steps on every decoded call.
    pub verbose: bool,
    pub network: Network,
    /// Fail on targets or selectors missing from the registry instead of
    /// returning them undecoded.
    pub strict_unknown_calls: bool,
}

/// Best-effort readable form of a single call-script entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCall {
    pub target: Address,
    pub contract_name: Option<String>,
    pub signature: Option<String>,
    pub function_name: Option<String>,
    pub args: Option<Vec<(String, DynSolValue)>>,
    pub calldata: Bytes,
    /// Calls of a call script passed as a `bytes` argument (forwarding).
    pub nested: Option<Vec<DecodedCall>>,
    pub trace: Vec<String>,
}

impl DecodedCall {
    pub fn call(&self) -> Call {
        Call::new(self.target, self.calldata.clone())
    }
}

struct Trace {
    verbose: bool,
    steps: Vec<String>,
}

impl Trace {
    fn note(&mut self, step: String) {
        debug!("{}", step);
        if self.verbose {
            self.steps.push(step);
        }
    }
}

pub fn decode_call_script(
    script: &[u8],
    registry: &ContractRegistry,
    options: &DecodeOptions,
) -> Result<Vec<DecodedCall>, VoteError> {
    parse_call_script(script)?
        .into_iter()
        .map(|call| decode_call(call, registry, options))
        .collect()
}

fn decode_call(
    call: Call,
    registry: &ContractRegistry,
    options: &DecodeOptions,
) -> Result<DecodedCall, VoteError> {
    let mut trace = Trace {
        verbose: options.verbose,
        steps: Vec::new(),
    };

    let Some(contract) = registry.lookup(options.network, &call.target) else {
        let reason = format!("no {} registry entry", options.network);
        trace.note(format!("{}: {}", call.target, reason));
        return unresolved(call, None, trace, options, reason);
    };
    trace.note(format!("{}: resolved to {}", call.target, contract.name));

    let function = call
        .calldata
        .get(..SELECTOR_LENGTH)
        .and_then(|selector| contract.function_by_selector(selector));
    let Some(function) = function else {
        let reason = format!(
            "selector 0x{} is not part of {}",
            hex::encode(call.calldata.get(..SELECTOR_LENGTH).unwrap_or(&call.calldata[..])),
            contract.name
        );
        trace.note(format!("{}: {}", call.target, reason));
        return unresolved(call, Some(contract.name.clone()), trace, options, reason);
    };
    let signature = function.signature();
    trace.note(format!("{}: selector matches {}", call.target, signature));

    let values = match function.abi_decode_input(&call.calldata[SELECTOR_LENGTH..], true) {
        Ok(values) => values,
        Err(err) => {
            let reason = format!("arguments do not decode as {signature}: {err}");
            trace.note(format!("{}: {}", call.target, reason));
            return unresolved(call, Some(contract.name.clone()), trace, options, reason);
        }
    };

    let args: Vec<(String, DynSolValue)> = function
        .inputs
        .iter()
        .zip(values)
        .enumerate()
        .map(|(index, (param, value))| {
            let name = if param.name.is_empty() {
                format!("arg{index}")
            } else {
                param.name.clone()
            };
            (name, value)
        })
        .collect();

    let mut nested = None;
    for (name, value) in &args {
        let DynSolValue::Bytes(inner) = value else {
            continue;
        };
        if !is_call_script(inner) {
            continue;
        }
        trace.note(format!("{}: decoding call script in {}", call.target, name));
        match decode_call_script(inner, registry, options) {
            Ok(calls) => {
                nested = Some(calls);
                break;
            }
            Err(err) if options.strict_unknown_calls => return Err(err),
            Err(err) => warn!("Could not decode call script in {}: {}", name, err),
        }
    }

    Ok(DecodedCall {
        target: call.target,
        contract_name: Some(contract.name.clone()),
        signature: Some(signature),
        function_name: Some(function.name.clone()),
        args: Some(args),
        calldata: call.calldata,
        nested,
        trace: trace.steps,
    })
}

fn unresolved(
    call: Call,
    contract_name: Option<String>,
    trace: Trace,
    options: &DecodeOptions,
    reason: String,
) -> Result<DecodedCall, VoteError> {
    if options.strict_unknown_calls {
        return Err(VoteError::UnknownCallTarget {
            target: call.target,
            reason,
        });
    }

    warn!("Leaving call to {} undecoded: {}", call.target, reason);
    Ok(DecodedCall {
        target: call.target,
        contract_name,
        signature: None,
        function_name: None,
        args: None,
        calldata: call.calldata,
        nested: None,
        trace: trace.steps,
    })
}
