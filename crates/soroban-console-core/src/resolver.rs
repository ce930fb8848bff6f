/// Batched resolution of derived storage keys into ledger entries
use crate::codec::{decode, read_limits};
use crate::error::{CodecError, FetchError};
use crate::ledger_key::StorageKey;
use crate::types::{EntryState, RawLedgerEntry, StoredValue};
use async_trait::async_trait;
use stellar_xdr::curr::{LedgerEntryData, ReadXdr};

/// Source of raw ledger entries, typically a Stellar RPC endpoint.
///
/// Implementations receive the whole batch at once and return only the
/// entries that exist; missing keys are simply left out.
#[async_trait]
pub trait LedgerEntryFetcher: Send + Sync {
    async fn fetch_ledger_entries(&self, keys: &[Vec<u8>])
        -> Result<Vec<RawLedgerEntry>, FetchError>;
}

/// Resolved entries in candidate order
#[derive(Debug, Clone, Default)]
pub struct ResolvedEntries {
    entries: Vec<(StorageKey, EntryState)>,
}

impl ResolvedEntries {
    pub fn get(&self, key: &StorageKey) -> Option<&EntryState> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, state)| state)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StorageKey, &EntryState)> {
        self.entries.iter().map(|(key, state)| (key, state))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn present_count(&self) -> usize {
        self.entries.iter().filter(|(_, state)| state.is_present()).count()
    }
}

impl IntoIterator for ResolvedEntries {
    type Item = (StorageKey, EntryState);
    type IntoIter = std::vec::IntoIter<(StorageKey, EntryState)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Fetch every candidate in a single round trip and decode what comes back.
///
/// Entries are matched to candidates by comparing the echoed key bytes; a
/// candidate with no returned entry resolves to `EntryState::Absent`.
pub async fn resolve<F>(candidates: &[StorageKey], fetcher: &F) -> Result<ResolvedEntries, CodecError>
where
    F: LedgerEntryFetcher + ?Sized,
{
    let mut unique: Vec<&StorageKey> = Vec::with_capacity(candidates.len());
    for key in candidates {
        if !unique.contains(&key) {
            unique.push(key);
        }
    }

    if unique.is_empty() {
        return Ok(ResolvedEntries::default());
    }

    let request: Vec<Vec<u8>> = unique.iter().map(|key| key.as_bytes().to_vec()).collect();
    let raw_entries = fetcher.fetch_ledger_entries(&request).await?;

    let entries = unique
        .into_iter()
        .map(|key| {
            let state = raw_entries
                .iter()
                .find(|raw| raw.key_xdr.as_slice() == key.as_bytes())
                .map(entry_state)
                .unwrap_or(EntryState::Absent);
            (key.clone(), state)
        })
        .collect();

    Ok(ResolvedEntries { entries })
}

fn entry_state(raw: &RawLedgerEntry) -> EntryState {
    EntryState::Present {
        value: stored_value(&raw.data_xdr),
        last_modified_ledger_seq: raw.last_modified_ledger_seq,
        live_until_ledger_seq: raw.live_until_ledger_seq,
    }
}

/// Unwrap `LedgerEntryData::ContractData` and decode its value
fn stored_value(data_xdr: &[u8]) -> StoredValue {
    let unsupported = |shape: String, raw: &[u8]| StoredValue::Unsupported {
        shape,
        raw_hex: hex::encode(raw),
    };

    let data = match LedgerEntryData::from_xdr(data_xdr, read_limits(data_xdr.len())) {
        Ok(data) => data,
        Err(e) => return unsupported(format!("unparseable entry data: {}", e), data_xdr),
    };

    let contract_data = match data {
        LedgerEntryData::ContractData(contract_data) => contract_data,
        _ => return unsupported("not a contract data entry".to_string(), data_xdr),
    };

    match decode(&contract_data.val) {
        Ok(value) => StoredValue::Decoded { value },
        Err(CodecError::UnsupportedValueShape(shape)) => {
            let raw = crate::codec::encode_bytes(&contract_data.val).unwrap_or_default();
            unsupported(shape, &raw)
        }
        Err(e) => unsupported(e.to_string(), data_xdr),
    }
}
