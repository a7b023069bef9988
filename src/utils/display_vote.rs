use std::{
    fmt::{self, Display, Write as _},
    io::{self, Write},
};

use alloy::{dyn_abi::DynSolValue, hex};
use colored::Colorize;

use crate::elements::call_script::DecodedCall;

/// Prints a label followed by its highlighted value.
pub(crate) fn pp<W: Write>(output: &mut W, text: &str, value: impl Display) -> io::Result<()> {
    writeln!(output, "{} {}", text, value.to_string().bright_magenta())
}

pub(crate) fn format_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Address(address) => address.to_checksum(None),
        DynSolValue::Uint(value, _) => value.to_string(),
        DynSolValue::Int(value, _) => value.to_string(),
        DynSolValue::Bool(value) => value.to_string(),
        DynSolValue::Bytes(bytes) => format!("0x{}", hex::encode(bytes)),
        DynSolValue::FixedBytes(word, size) => format!("0x{}", hex::encode(&word[..*size])),
        DynSolValue::String(value) => format!("{value:?}"),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        other => format!("{other:?}"),
    }
}

pub(crate) fn calls_info_pretty_print(call: &DecodedCall) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_call(&mut out, call, 0)?;
    Ok(out)
}

fn write_call(out: &mut String, call: &DecodedCall, depth: usize) -> fmt::Result {
    let indent = "    ".repeat(depth);

    let contract = call.contract_name.as_deref().unwrap_or("unknown contract");
    writeln!(out, "{indent}Contract: {} ({})", contract.cyan(), call.target)?;

    let (Some(signature), Some(args)) = (&call.signature, &call.args) else {
        writeln!(out, "{indent}Raw calldata: 0x{}", hex::encode(&call.calldata))?;
        return write_trace(out, call, &indent);
    };

    writeln!(out, "{indent}Function: {}", signature.green())?;
    writeln!(out, "{indent}Inputs:")?;
    for (name, value) in args {
        // The forwarded script is shown decoded below.
        if call.nested.is_some() && matches!(value, DynSolValue::Bytes(_)) {
            writeln!(out, "{indent}  {name}: <call script>")?;
            continue;
        }
        writeln!(out, "{indent}  {name}: {}", format_value(value).bright_magenta())?;
    }
    write_trace(out, call, &indent)?;

    if let Some(nested) = &call.nested {
        writeln!(out, "{indent}Forwarded calls:")?;
        for inner in nested {
            write_call(out, inner, depth + 1)?;
        }
    }
    Ok(())
}

fn write_trace(out: &mut String, call: &DecodedCall, indent: &str) -> fmt::Result {
    for step in &call.trace {
        writeln!(out, "{indent}  > {}", step.dimmed())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, Bytes, U256};

    use super::*;

    fn forward_call() -> DecodedCall {
        let inner = DecodedCall {
            target: address!("1dd909cddf3dbe61ac08112dc0fdf2ab949f79d8"),
            contract_name: Some("balancer_rewards_manager".to_string()),
            signature: Some("set_allocations_limit(uint256)".to_string()),
            function_name: Some("set_allocations_limit".to_string()),
            args: Some(vec![(
                "_new_allocations_limit".to_string(),
                DynSolValue::Uint(U256::from(75_000u64), 256),
            )]),
            calldata: Bytes::new(),
            nested: None,
            trace: Vec::new(),
        };

        DecodedCall {
            target: address!("3e40d73eb977dc6a537af587d48316fee66e9c8c"),
            contract_name: Some("agent".to_string()),
            signature: Some("forward(bytes)".to_string()),
            function_name: Some("forward".to_string()),
            args: Some(vec![(
                "_evmScript".to_string(),
                DynSolValue::Bytes(vec![0, 0, 0, 1]),
            )]),
            calldata: Bytes::new(),
            nested: Some(vec![inner]),
            trace: Vec::new(),
        }
    }

    #[test]
    fn test_pretty_print_nested() {
        colored::control::set_override(false);
        let call = forward_call();
        let text = calls_info_pretty_print(&call).unwrap();

        assert!(text.contains(&format!("Contract: agent ({})", call.target)));
        assert!(text.contains("Function: forward(bytes)"));
        assert!(text.contains("_evmScript: <call script>"));
        assert!(text.contains("    Function: set_allocations_limit(uint256)"));
        assert!(text.contains("      _new_allocations_limit: 75000"));
    }

    #[test]
    fn test_pretty_print_unknown() {
        colored::control::set_override(false);
        let call = DecodedCall {
            contract_name: None,
            signature: None,
            function_name: None,
            args: None,
            calldata: Bytes::from(vec![0xab, 0xcd]),
            nested: None,
            ..forward_call()
        };

        let text = calls_info_pretty_print(&call).unwrap();
        assert!(text.contains("unknown contract"));
        assert!(text.contains("Raw calldata: 0xabcd"));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&DynSolValue::String("ref".to_string())), "\"ref\"");
        assert_eq!(format_value(&DynSolValue::Bytes(vec![1, 2])), "0x0102");
        assert_eq!(
            format_value(&DynSolValue::Tuple(vec![
                DynSolValue::Bool(true),
                DynSolValue::Uint(U256::from(3u64), 64)
            ])),
            "[true, 3]"
        );
    }
}
