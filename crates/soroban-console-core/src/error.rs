/// Error types for the value codec, key deriver, resolver and sniffer

/// Failure reported by a ledger entry fetch collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Malformed RPC response: {0}")]
    MalformedResponse(String),
}

/// Every failure the core can surface to its caller.
///
/// All variants except `FetchFailed` are terminal for the call that produced
/// them: they describe malformed input or an unrecognised wire shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("Invalid symbol '{0}': expected at most 32 characters from [A-Za-z0-9_]")]
    InvalidSymbol(String),

    #[error("'{0}' is not a base-10 integer")]
    NotANumber(String),

    #[error("{value} is out of range for {ty}")]
    OutOfRange { value: String, ty: &'static str },

    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    #[error("Unsupported value shape: {0}")]
    UnsupportedValueShape(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Input does not match any known XDR frame")]
    NoMatch,

    #[error("Fetch failed: {0}")]
    FetchFailed(#[from] FetchError),
}
