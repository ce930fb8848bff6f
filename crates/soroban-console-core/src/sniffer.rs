/// Identify which top-level XDR message a blob holds by linear probing.
///
/// Several candidate shapes have no reliable outermost discriminant, so every
/// shape is tried in a fixed order and the first one that consumes the whole
/// input wins. Ambiguous inputs resolve to the earliest listed shape.
use crate::codec::read_limits;
use crate::error::CodecError;
use base64::Engine;
use serde::Serialize;
use std::fmt;
use stellar_xdr::curr::{
    LedgerEntry, ReadXdr, ScVal, SorobanAuthorizationEntry, TransactionEnvelope, TransactionMeta,
    TransactionResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FrameShape {
    TransactionEnvelope,
    TransactionResult,
    TransactionMeta,
    ScVal,
    LedgerEntry,
    SorobanAuthorizationEntry,
}

impl FrameShape {
    /// Probe order
    pub const ALL: [FrameShape; 6] = [
        FrameShape::TransactionEnvelope,
        FrameShape::TransactionResult,
        FrameShape::TransactionMeta,
        FrameShape::ScVal,
        FrameShape::LedgerEntry,
        FrameShape::SorobanAuthorizationEntry,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FrameShape::TransactionEnvelope => "Transaction Envelope",
            FrameShape::TransactionResult => "Transaction Result",
            FrameShape::TransactionMeta => "Transaction Meta",
            FrameShape::ScVal => "Soroban Value (ScVal)",
            FrameShape::LedgerEntry => "Ledger Entry",
            FrameShape::SorobanAuthorizationEntry => "Soroban Auth",
        }
    }

    /// Strict whole-input decode against this shape
    fn probe(&self, bytes: &[u8]) -> Option<serde_json::Value> {
        match self {
            FrameShape::TransactionEnvelope => probe_as::<TransactionEnvelope>(bytes),
            FrameShape::TransactionResult => probe_as::<TransactionResult>(bytes),
            FrameShape::TransactionMeta => probe_as::<TransactionMeta>(bytes),
            FrameShape::ScVal => probe_as::<ScVal>(bytes),
            FrameShape::LedgerEntry => probe_as::<LedgerEntry>(bytes),
            FrameShape::SorobanAuthorizationEntry => probe_as::<SorobanAuthorizationEntry>(bytes),
        }
    }
}

impl fmt::Display for FrameShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a sniff request
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedFrame {
    Matched {
        shape: FrameShape,
        tree: serde_json::Value,
    },
    NoMatch,
}

impl DecodedFrame {
    pub fn shape(&self) -> Option<FrameShape> {
        match self {
            DecodedFrame::Matched { shape, .. } => Some(*shape),
            DecodedFrame::NoMatch => None,
        }
    }
}

fn probe_as<T>(bytes: &[u8]) -> Option<serde_json::Value>
where
    T: ReadXdr + Serialize + fmt::Debug,
{
    // from_xdr fails on trailing bytes, so a match always covers the full input
    let decoded = T::from_xdr(bytes, read_limits(bytes.len())).ok()?;
    Some(
        serde_json::to_value(&decoded)
            .unwrap_or_else(|_| serde_json::Value::String(format!("{:?}", decoded))),
    )
}

/// Sniff a base64 blob; invalid base64 is a `NoMatch`
pub fn sniff(base64_blob: &str) -> DecodedFrame {
    match base64::engine::general_purpose::STANDARD.decode(base64_blob.trim()) {
        Ok(bytes) => sniff_bytes(&bytes),
        Err(_) => DecodedFrame::NoMatch,
    }
}

pub fn sniff_bytes(bytes: &[u8]) -> DecodedFrame {
    if bytes.is_empty() {
        return DecodedFrame::NoMatch;
    }
    FrameShape::ALL
        .iter()
        .find_map(|shape| {
            shape
                .probe(bytes)
                .map(|tree| DecodedFrame::Matched { shape: *shape, tree })
        })
        .unwrap_or(DecodedFrame::NoMatch)
}

/// Like [`sniff`], but a miss is an error
pub fn sniff_or_err(base64_blob: &str) -> Result<(FrameShape, serde_json::Value), CodecError> {
    match sniff(base64_blob) {
        DecodedFrame::Matched { shape, tree } => Ok((shape, tree)),
        DecodedFrame::NoMatch => Err(CodecError::NoMatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stellar_xdr::curr::{
        Limits, Memo, MuxedAccount, Operation, OperationBody, Preconditions, SequenceNumber,
        Transaction, TransactionExt, TransactionV1Envelope, Uint256, VecM, WriteXdr,
    };

    fn envelope_bytes() -> Vec<u8> {
        let envelope = TransactionEnvelope::Tx(TransactionV1Envelope {
            tx: Transaction {
                source_account: MuxedAccount::Ed25519(Uint256([1; 32])),
                fee: 100,
                seq_num: SequenceNumber(1),
                cond: Preconditions::None,
                memo: Memo::None,
                operations: vec![Operation {
                    source_account: None,
                    body: OperationBody::Inflation,
                }]
                .try_into()
                .unwrap(),
                ext: TransactionExt::V0,
            },
            signatures: VecM::default(),
        });
        envelope.to_xdr(Limits::none()).unwrap()
    }

    fn b64(bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn test_transaction_envelope_wins() {
        let frame = sniff(&b64(&envelope_bytes()));
        assert_eq!(frame.shape(), Some(FrameShape::TransactionEnvelope));
        assert_eq!(frame.shape().unwrap().name(), "Transaction Envelope");
    }

    #[test]
    fn test_envelope_wins_over_later_shape() {
        // V0 envelope with an id memo, which also reads as an auth entry
        let mut bytes = vec![0u8; 76];
        bytes[55] = 2;
        assert!(TransactionEnvelope::from_xdr(&bytes, Limits::none()).is_ok());
        assert!(SorobanAuthorizationEntry::from_xdr(&bytes, Limits::none()).is_ok());

        assert_eq!(
            sniff_bytes(&bytes).shape(),
            Some(FrameShape::TransactionEnvelope)
        );
    }

    #[test]
    fn test_deep_nesting_is_no_match() {
        let mut bytes = Vec::new();
        for _ in 0..2000 {
            // SCV_VEC, present, one element
            bytes.extend([0, 0, 0, 16, 0, 0, 0, 1, 0, 0, 0, 1]);
        }
        bytes.extend([0, 0, 0, 1]);
        assert_eq!(sniff_bytes(&bytes), DecodedFrame::NoMatch);
    }

    #[test]
    fn test_scval_detected() {
        let bytes = ScVal::I32(42).to_xdr(Limits::none()).unwrap();
        let frame = sniff(&b64(&bytes));
        assert_eq!(frame.shape(), Some(FrameShape::ScVal));
        match frame {
            DecodedFrame::Matched { tree, .. } => assert!(!tree.is_null()),
            DecodedFrame::NoMatch => panic!("expected a match"),
        }
    }

    #[test]
    fn test_garbage_is_no_match() {
        // XDR frames are always a multiple of four bytes long
        assert_eq!(
            sniff_bytes(&[0xde, 0xad, 0xbe, 0xef, 0x01, 0x02, 0x03]),
            DecodedFrame::NoMatch
        );
        assert_eq!(sniff("!!! not base64 !!!"), DecodedFrame::NoMatch);
        assert_eq!(sniff(""), DecodedFrame::NoMatch);
    }

    #[test]
    fn test_trailing_bytes_prevent_match() {
        let mut bytes = envelope_bytes();
        bytes.extend([0xff, 0xff, 0xff]);
        assert_eq!(sniff_bytes(&bytes), DecodedFrame::NoMatch);
    }

    #[test]
    fn test_sniff_or_err() {
        assert_eq!(sniff_or_err("AAAA!").unwrap_err(), CodecError::NoMatch);
        let (shape, _) = sniff_or_err(&b64(&envelope_bytes())).unwrap();
        assert_eq!(shape, FrameShape::TransactionEnvelope);
    }

    #[test]
    fn test_probe_order_names() {
        let names: Vec<&str> = FrameShape::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "Transaction Envelope",
                "Transaction Result",
                "Transaction Meta",
                "Soroban Value (ScVal)",
                "Ledger Entry",
                "Soroban Auth",
            ]
        );
    }
}
