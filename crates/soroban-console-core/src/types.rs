/// Shared types for the console core
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Native, display-friendly form of a decoded ledger value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value")]
pub enum NativeValue {
    Bool(bool),
    Int32(i32),
    Uint32(u32),
    Int64(i64),
    Uint64(u64),
    Int128(i128),
    Uint128(u128),
    Bytes(String),   // hex-encoded
    String(String),
    Symbol(String),
    Address(String), // Stellar strkey format
    Map(Vec<(Box<NativeValue>, Box<NativeValue>)>),
    Vec(Vec<NativeValue>),
    Void,
}

/// Scalars render exactly as `encode` accepts them, so a decoded value can be
/// fed straight back into the codec.
impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeValue::Bool(b) => write!(f, "{}", b),
            NativeValue::Int32(n) => write!(f, "{}", n),
            NativeValue::Uint32(n) => write!(f, "{}", n),
            NativeValue::Int64(n) => write!(f, "{}", n),
            NativeValue::Uint64(n) => write!(f, "{}", n),
            NativeValue::Int128(n) => write!(f, "{}", n),
            NativeValue::Uint128(n) => write!(f, "{}", n),
            NativeValue::Bytes(s) => write!(f, "0x{}", s),
            NativeValue::String(s) => write!(f, "{}", s),
            NativeValue::Symbol(s) => write!(f, "{}", s),
            NativeValue::Address(a) => write!(f, "{}", a),
            NativeValue::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            NativeValue::Vec(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            NativeValue::Void => write!(f, "void"),
        }
    }
}

/// User-selectable input type for the value codec
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Symbol,
    String,
    I32,
    U32,
    I128,
    U128,
    Address,
}

impl ValueType {
    pub const ALL: [ValueType; 7] = [
        ValueType::Symbol,
        ValueType::String,
        ValueType::I32,
        ValueType::U32,
        ValueType::I128,
        ValueType::U128,
        ValueType::Address,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Symbol => "symbol",
            ValueType::String => "string",
            ValueType::I32 => "i32",
            ValueType::U32 => "u32",
            ValueType::I128 => "i128",
            ValueType::U128 => "u128",
            ValueType::Address => "address",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        ValueType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| {
                format!(
                    "unknown value type '{}' (expected one of: symbol, string, i32, u32, i128, u128, address)",
                    s
                )
            })
    }
}

/// Lifecycle class of a contract data entry
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StorageDurability {
    Temporary,
    #[default]
    Persistent,
}

impl fmt::Display for StorageDurability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageDurability::Temporary => write!(f, "Temporary"),
            StorageDurability::Persistent => write!(f, "Persistent"),
        }
    }
}

impl FromStr for StorageDurability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "persistent" => Ok(StorageDurability::Persistent),
            "temporary" => Ok(StorageDurability::Temporary),
            other => Err(format!(
                "unknown durability '{}' (expected persistent or temporary)",
                other
            )),
        }
    }
}

/// One entry as returned by a fetch collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLedgerEntry {
    /// `LedgerKey` XDR echoed back by the ledger
    pub key_xdr: Vec<u8>,
    /// `LedgerEntryData` XDR
    pub data_xdr: Vec<u8>,
    pub last_modified_ledger_seq: u32,
    pub live_until_ledger_seq: Option<u32>,
}

/// Value held by a present entry
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StoredValue {
    Decoded { value: NativeValue },
    /// The ledger returned something the codec cannot render.
    ///
    /// `raw_hex` is hex of the stored `ScVal` XDR when only the value is
    /// unrenderable, and hex of the whole `LedgerEntryData` XDR when the entry
    /// itself is unparseable or not contract data.
    Unsupported { shape: String, raw_hex: String },
}

impl StoredValue {
    pub fn decoded(&self) -> Option<&NativeValue> {
        match self {
            StoredValue::Decoded { value } => Some(value),
            StoredValue::Unsupported { .. } => None,
        }
    }
}

impl fmt::Display for StoredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoredValue::Decoded { value } => write!(f, "{}", value),
            StoredValue::Unsupported { shape, raw_hex } => {
                write!(f, "unsupported({}) 0x{}", shape, raw_hex)
            }
        }
    }
}

/// Resolved state of one storage key at fetch time
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum EntryState {
    Absent,
    Present {
        value: StoredValue,
        last_modified_ledger_seq: u32,
        live_until_ledger_seq: Option<u32>,
    },
}

impl EntryState {
    pub fn is_present(&self) -> bool {
        matches!(self, EntryState::Present { .. })
    }
}

/// Response from Stellar RPC `getLedgerEntries`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntriesResponse {
    #[serde(default)]
    pub entries: Option<Vec<LedgerEntryResult>>,
    pub latest_ledger: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryResult {
    pub key: String,
    pub xdr: String,
    pub last_modified_ledger_seq: u32,
    #[serde(default)]
    pub live_until_ledger_seq: Option<u32>,
}
