//! soroban-console-core — Contract storage key and XDR value codec library
//!
//! Converts typed user input into Soroban `ScVal`s, derives contract-data
//! ledger keys, resolves batches of keys against a ledger entry fetcher, and
//! sniffs arbitrary base64 XDR blobs.

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod ledger_key;
pub mod resolver;
pub mod sniffer;
pub mod types;

pub use client::StellarRpcClient;
pub use codec::{decode, decode_base64, decode_bytes, encode, encode_base64, format_native};
pub use config::{ConsoleConfig, Network, NetworkEntry};
pub use error::{CodecError, FetchError};
pub use ledger_key::{contract_instance_key, derive_key, derive_key_from_input, StorageKey};
pub use resolver::{resolve, LedgerEntryFetcher, ResolvedEntries};
pub use sniffer::{sniff, sniff_bytes, DecodedFrame, FrameShape};
pub use types::*;
