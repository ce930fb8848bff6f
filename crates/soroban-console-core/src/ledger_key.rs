/// Storage key derivation for contract data entries
use crate::codec::{encode, parse_contract_address};
use crate::error::CodecError;
use crate::types::{StorageDurability, ValueType};
use base64::Engine;
use std::fmt;
use std::hash::{Hash, Hasher};
use stellar_xdr::curr::{
    ContractDataDurability, LedgerKey, LedgerKeyContractData, Limits, ScVal, WriteXdr,
};

/// A derived contract-data `LedgerKey` together with its canonical XDR bytes.
///
/// Equality and hashing look at the bytes only: the encoding is the sole
/// contract with the ledger, so two keys are the same slot iff they serialize
/// identically.
#[derive(Debug, Clone)]
pub struct StorageKey {
    ledger_key: LedgerKey,
    bytes: Vec<u8>,
}

impl StorageKey {
    pub fn ledger_key(&self) -> &LedgerKey {
        &self.ledger_key
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

impl PartialEq for StorageKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for StorageKey {}

impl Hash for StorageKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl From<StorageDurability> for ContractDataDurability {
    fn from(durability: StorageDurability) -> Self {
        match durability {
            StorageDurability::Temporary => ContractDataDurability::Temporary,
            StorageDurability::Persistent => ContractDataDurability::Persistent,
        }
    }
}

/// Derive the canonical ledger key for one contract storage slot
pub fn derive_key(
    contract_address: &str,
    sub_key: &ScVal,
    durability: StorageDurability,
) -> Result<StorageKey, CodecError> {
    let contract = parse_contract_address(contract_address)?;

    let ledger_key = LedgerKey::ContractData(LedgerKeyContractData {
        contract,
        key: sub_key.clone(),
        durability: durability.into(),
    });

    let bytes = ledger_key
        .to_xdr(Limits::none())
        .map_err(|e| CodecError::KeyDerivationFailed(e.to_string()))?;

    Ok(StorageKey { ledger_key, bytes })
}

/// Encode raw user input and derive its storage key in one step
pub fn derive_key_from_input(
    contract_address: &str,
    value_type: ValueType,
    input: &str,
    durability: StorageDurability,
) -> Result<StorageKey, CodecError> {
    let sub_key = encode(value_type, input)?;
    derive_key(contract_address, &sub_key, durability)
}

/// Key of the contract instance entry, present for every deployed contract
pub fn contract_instance_key(contract_address: &str) -> Result<StorageKey, CodecError> {
    derive_key(
        contract_address,
        &ScVal::LedgerKeyContractInstance,
        StorageDurability::Persistent,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT_A: &str = "CADQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQP5KR";
    const CONTRACT_B: &str = "CAEQSCIJBEEQSCIJBEEQSCIJBEEQSCIJBEEQSCIJBEEQSCIJBEEQTD2L";
    const ACCOUNT: &str = "GAAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQDZ7H";

    fn symbol(s: &str) -> ScVal {
        encode(ValueType::Symbol, s).unwrap()
    }

    #[test]
    fn test_byte_layout() {
        let key = derive_key(CONTRACT_A, &symbol("Admin"), StorageDurability::Persistent).unwrap();

        let mut expected = vec![0, 0, 0, 6]; // LedgerEntryType::ContractData
        expected.extend([0, 0, 0, 1]); // ScAddressType::Contract
        expected.extend([7u8; 32]);
        expected.extend([0, 0, 0, 15]); // ScValType::Symbol
        expected.extend([0, 0, 0, 5]);
        expected.extend(b"Admin\0\0\0");
        expected.extend([0, 0, 0, 1]); // ContractDataDurability::Persistent

        assert_eq!(key.as_bytes(), expected.as_slice());
    }

    #[test]
    fn test_deterministic() {
        let first = derive_key(CONTRACT_A, &symbol("Counter"), StorageDurability::Persistent).unwrap();
        let second = derive_key(CONTRACT_A, &symbol("Counter"), StorageDurability::Persistent).unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
        assert_eq!(first, second);
        assert_eq!(first.to_base64(), second.to_base64());
    }

    #[test]
    fn test_distinct_inputs_give_distinct_keys() {
        let sub_keys = [
            symbol("Admin"),
            symbol("Counter"),
            encode(ValueType::String, "Admin").unwrap(),
            encode(ValueType::I32, "1").unwrap(),
            encode(ValueType::I128, "1").unwrap(),
            encode(ValueType::Address, ACCOUNT).unwrap(),
        ];

        let mut seen = Vec::new();
        for contract in [CONTRACT_A, CONTRACT_B] {
            for sub_key in &sub_keys {
                for durability in [StorageDurability::Persistent, StorageDurability::Temporary] {
                    let key = derive_key(contract, sub_key, durability).unwrap();
                    assert!(
                        !seen.contains(&key.as_bytes().to_vec()),
                        "collision for {} {:?} {}",
                        contract,
                        sub_key,
                        durability
                    );
                    seen.push(key.into_bytes());
                }
            }
        }
        assert_eq!(seen.len(), 2 * sub_keys.len() * 2);
    }

    #[test]
    fn test_rejects_invalid_contract_before_serializing() {
        assert_eq!(
            derive_key("CNOTAREALCONTRACT", &symbol("Admin"), StorageDurability::Persistent)
                .unwrap_err(),
            CodecError::InvalidAddress("CNOTAREALCONTRACT".to_string())
        );
        assert!(matches!(
            derive_key(ACCOUNT, &symbol("Admin"), StorageDurability::Persistent),
            Err(CodecError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_from_input_surfaces_codec_errors() {
        assert!(matches!(
            derive_key_from_input(CONTRACT_A, ValueType::Symbol, "no spaces", StorageDurability::Persistent),
            Err(CodecError::InvalidSymbol(_))
        ));
        assert!(matches!(
            derive_key_from_input(CONTRACT_A, ValueType::I32, "x", StorageDurability::Persistent),
            Err(CodecError::NotANumber(_))
        ));
    }

    #[test]
    fn test_from_input_matches_manual_derivation() {
        let manual = derive_key(CONTRACT_A, &symbol("Admin"), StorageDurability::Persistent).unwrap();
        let composed = derive_key_from_input(
            CONTRACT_A,
            ValueType::Symbol,
            "Admin",
            StorageDurability::Persistent,
        )
        .unwrap();
        assert_eq!(manual, composed);
    }

    #[test]
    fn test_contract_instance_key() {
        let key = contract_instance_key(CONTRACT_A).unwrap();
        match key.ledger_key() {
            LedgerKey::ContractData(data) => {
                assert_eq!(data.key, ScVal::LedgerKeyContractInstance);
                assert_eq!(data.durability, ContractDataDurability::Persistent);
            }
            other => panic!("unexpected key {:?}", other),
        }
    }
}
