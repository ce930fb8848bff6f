/// Value codec: user input <-> Soroban `ScVal`
use crate::error::CodecError;
use crate::types::{NativeValue, ValueType};
use base64::Engine;
use std::string::String as StdString;
use std::vec::Vec as StdVec;
use stellar_xdr::curr::{
    AccountId, ContractId, Hash, Int128Parts, Limits, PublicKey, ReadXdr, ScAddress, ScString,
    ScSymbol, ScVal, UInt128Parts, Uint256, WriteXdr,
};

/// Longest symbol the ledger accepts
pub const MAX_SYMBOL_LEN: usize = 32;

const MAX_DECODE_DEPTH: u32 = 500;

/// Read limits for untrusted input of `len` bytes
pub(crate) fn read_limits(len: usize) -> Limits {
    Limits {
        depth: MAX_DECODE_DEPTH,
        len,
    }
}

/// Convert raw user input of the given type into an `ScVal`
pub fn encode(value_type: ValueType, input: &str) -> Result<ScVal, CodecError> {
    match value_type {
        ValueType::Symbol => encode_symbol(input),
        ValueType::String => encode_string(input),
        ValueType::I32 => parse_integer::<i32>(input, "i32").map(ScVal::I32),
        ValueType::U32 => parse_integer::<u32>(input, "u32").map(ScVal::U32),
        ValueType::I128 => parse_integer::<i128>(input, "i128").map(|n| ScVal::I128(i128_parts(n))),
        ValueType::U128 => parse_integer::<u128>(input, "u128").map(|n| ScVal::U128(u128_parts(n))),
        ValueType::Address => parse_address(input).map(ScVal::Address),
    }
}

/// Serialize an `ScVal` to its canonical XDR bytes
pub fn encode_bytes(scval: &ScVal) -> Result<StdVec<u8>, CodecError> {
    scval
        .to_xdr(Limits::none())
        .map_err(|e| CodecError::UnsupportedValueShape(format!("cannot serialize value: {}", e)))
}

/// Serialize an `ScVal` to base64 XDR
pub fn encode_base64(scval: &ScVal) -> Result<StdString, CodecError> {
    let bytes = encode_bytes(scval)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

fn encode_symbol(input: &str) -> Result<ScVal, CodecError> {
    if !is_valid_symbol(input) {
        return Err(CodecError::InvalidSymbol(input.to_string()));
    }
    let symbol = input
        .as_bytes()
        .to_vec()
        .try_into()
        .map_err(|_| CodecError::InvalidSymbol(input.to_string()))?;
    Ok(ScVal::Symbol(ScSymbol(symbol)))
}

fn encode_string(input: &str) -> Result<ScVal, CodecError> {
    let string = input
        .as_bytes()
        .to_vec()
        .try_into()
        .map_err(|_| CodecError::OutOfRange {
            value: format!("{} bytes", input.len()),
            ty: "string",
        })?;
    Ok(ScVal::String(ScString(string)))
}

/// Symbols are at most 32 characters from `[A-Za-z0-9_]`
pub fn is_valid_symbol(input: &str) -> bool {
    input.len() <= MAX_SYMBOL_LEN
        && input
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Optional sign followed by at least one ASCII digit
fn is_integer_literal(input: &str) -> bool {
    let digits = input
        .strip_prefix('-')
        .or_else(|| input.strip_prefix('+'))
        .unwrap_or(input);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn parse_integer<T: std::str::FromStr>(input: &str, ty: &'static str) -> Result<T, CodecError> {
    let trimmed = input.trim();
    if !is_integer_literal(trimmed) {
        return Err(CodecError::NotANumber(input.to_string()));
    }
    // A well-formed literal can only fail to parse by overflowing the target type.
    trimmed.parse::<T>().map_err(|_| CodecError::OutOfRange {
        value: trimmed.to_string(),
        ty,
    })
}

/// Split into hi/lo halves; `hi` carries the sign-extended upper bits
pub fn i128_parts(n: i128) -> Int128Parts {
    Int128Parts {
        hi: (n >> 64) as i64,
        lo: n as u64,
    }
}

pub fn u128_parts(n: u128) -> UInt128Parts {
    UInt128Parts {
        hi: (n >> 64) as u64,
        lo: n as u64,
    }
}

pub fn i128_from_parts(parts: &Int128Parts) -> i128 {
    ((parts.hi as i128) << 64) | (parts.lo as i128)
}

pub fn u128_from_parts(parts: &UInt128Parts) -> u128 {
    ((parts.hi as u128) << 64) | (parts.lo as u128)
}

/// Parse a `G...` account or `C...` contract strkey
pub fn parse_address(input: &str) -> Result<ScAddress, CodecError> {
    let trimmed = input.trim();
    let invalid = || CodecError::InvalidAddress(input.to_string());

    match trimmed.chars().next() {
        Some('G') => {
            let key = stellar_strkey::ed25519::PublicKey::from_string(trimmed)
                .map_err(|_| invalid())?;
            Ok(ScAddress::Account(AccountId(
                PublicKey::PublicKeyTypeEd25519(Uint256(key.0)),
            )))
        }
        Some('C') => {
            let contract =
                stellar_strkey::Contract::from_string(trimmed).map_err(|_| invalid())?;
            Ok(ScAddress::Contract(ContractId(Hash(contract.0))))
        }
        _ => Err(invalid()),
    }
}

/// Parse a `C...` contract strkey, rejecting account addresses
pub fn parse_contract_address(input: &str) -> Result<ScAddress, CodecError> {
    match parse_address(input)? {
        addr @ ScAddress::Contract(_) => Ok(addr),
        _ => Err(CodecError::InvalidAddress(input.to_string())),
    }
}

/// Render an address in Stellar strkey format
pub fn format_address(addr: &ScAddress) -> Result<StdString, CodecError> {
    match addr {
        ScAddress::Account(AccountId(PublicKey::PublicKeyTypeEd25519(key))) => {
            Ok(format!("{}", stellar_strkey::ed25519::PublicKey(key.0)))
        }
        ScAddress::Contract(ContractId(hash)) => {
            Ok(format!("{}", stellar_strkey::Contract(hash.0)))
        }
        ScAddress::MuxedAccount(_) => Err(CodecError::UnsupportedValueShape(
            "muxed account address".to_string(),
        )),
        ScAddress::ClaimableBalance(_) => Err(CodecError::UnsupportedValueShape(
            "claimable balance address".to_string(),
        )),
        ScAddress::LiquidityPool(_) => Err(CodecError::UnsupportedValueShape(
            "liquidity pool address".to_string(),
        )),
    }
}

/// Decode a base64-encoded XDR `ScVal` into its native form
pub fn decode_base64(xdr_base64: &str) -> Result<NativeValue, CodecError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(xdr_base64.trim())
        .map_err(|e| CodecError::UnsupportedValueShape(format!("invalid base64: {}", e)))?;
    decode_bytes(&bytes)
}

/// Decode XDR bytes directly into a native value
pub fn decode_bytes(bytes: &[u8]) -> Result<NativeValue, CodecError> {
    let scval = ScVal::from_xdr(bytes, read_limits(bytes.len()))
        .map_err(|e| CodecError::UnsupportedValueShape(format!("not an ScVal: {}", e)))?;
    decode(&scval)
}

/// Convert an `ScVal` into its native form
pub fn decode(scval: &ScVal) -> Result<NativeValue, CodecError> {
    use stellar_xdr::curr::ScVal::*;

    let unsupported = |shape: &str| Err(CodecError::UnsupportedValueShape(shape.to_string()));

    match scval {
        Bool(b) => Ok(NativeValue::Bool(*b)),
        Void => Ok(NativeValue::Void),
        U32(n) => Ok(NativeValue::Uint32(*n)),
        I32(n) => Ok(NativeValue::Int32(*n)),
        U64(n) => Ok(NativeValue::Uint64(*n)),
        I64(n) => Ok(NativeValue::Int64(*n)),
        Timepoint(t) => Ok(NativeValue::Uint64(t.0)),
        Duration(d) => Ok(NativeValue::Uint64(d.0)),
        U128(parts) => Ok(NativeValue::Uint128(u128_from_parts(parts))),
        I128(parts) => Ok(NativeValue::Int128(i128_from_parts(parts))),
        U256(parts) => Ok(NativeValue::Bytes(format!(
            "{:016x}{:016x}{:016x}{:016x}",
            parts.hi_hi, parts.hi_lo, parts.lo_hi, parts.lo_lo
        ))),
        I256(parts) => Ok(NativeValue::Bytes(format!(
            "{:016x}{:016x}{:016x}{:016x}",
            parts.hi_hi, parts.hi_lo, parts.lo_hi, parts.lo_lo
        ))),
        Bytes(b) => Ok(NativeValue::Bytes(hex::encode(b.0.as_slice()))),
        String(s) => Ok(NativeValue::String(
            StdString::from_utf8_lossy(s.0.as_slice()).to_string(),
        )),
        Symbol(s) => Ok(NativeValue::Symbol(
            StdString::from_utf8_lossy(s.0.as_slice()).to_string(),
        )),
        Vec(Some(items)) => {
            let mut decoded = StdVec::with_capacity(items.0.len());
            for item in items.0.iter() {
                decoded.push(decode(item)?);
            }
            Ok(NativeValue::Vec(decoded))
        }
        Vec(None) => Ok(NativeValue::Vec(StdVec::new())),
        Map(Some(entries)) => {
            let mut decoded = StdVec::with_capacity(entries.0.len());
            for entry in entries.0.iter() {
                let key = decode(&entry.key)?;
                let val = decode(&entry.val)?;
                decoded.push((Box::new(key), Box::new(val)));
            }
            Ok(NativeValue::Map(decoded))
        }
        Map(None) => Ok(NativeValue::Map(StdVec::new())),
        Address(addr) => format_address(addr).map(NativeValue::Address),
        Error(_) => unsupported("error"),
        ContractInstance(_) => unsupported("contract instance"),
        LedgerKeyContractInstance => unsupported("ledger key contract instance"),
        LedgerKeyNonce(_) => unsupported("ledger key nonce"),
    }
}

/// Format a native value with optional indentation
pub fn format_native(value: &NativeValue, indent: usize) -> StdString {
    let prefix = "  ".repeat(indent);
    match value {
        NativeValue::Map(entries) if !entries.is_empty() => {
            let mut result = StdString::from("{\n");
            for (k, v) in entries {
                result.push_str(&format!(
                    "{}  {}: {},\n",
                    prefix,
                    format_native(k, indent + 1),
                    format_native(v, indent + 1)
                ));
            }
            result.push_str(&format!("{}}}", prefix));
            result
        }
        NativeValue::Vec(items) if !items.is_empty() => {
            let mut result = StdString::from("[\n");
            for item in items {
                result.push_str(&format!("{}  {},\n", prefix, format_native(item, indent + 1)));
            }
            result.push_str(&format!("{}]", prefix));
            result
        }
        _ => value.to_string(),
    }
}
