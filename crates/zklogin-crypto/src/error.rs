use thiserror::Error;
use zklogin_core::ZkLoginError;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Entropy source failed: {0}")]
    Entropy(String),

    #[error("Poseidon hash failed: {0}")]
    Poseidon(String),

    #[error("Poseidon supports 1 to {max} inputs, got {actual}")]
    InvalidInputCount { actual: usize, max: usize },

    #[error("Value does not fit in the BN254 scalar field")]
    FieldOverflow,

    #[error("{field} is {actual} bytes, longer than the maximum {max}")]
    StringTooLong {
        field: &'static str,
        actual: usize,
        max: usize,
    },

    #[error("{0} is not a decimal integer")]
    InvalidDecimal(&'static str),

    #[error("Invalid issuer: {0}")]
    InvalidIssuer(String),

    #[error("Malformed proof bundle: {0}")]
    MalformedProof(String),

    #[error("Encoding failed: {0}")]
    Encoding(String),
}

impl From<CryptoError> for ZkLoginError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::StringTooLong { .. }
            | CryptoError::InvalidDecimal(_)
            | CryptoError::InvalidIssuer(_)
            | CryptoError::FieldOverflow => ZkLoginError::Validation(err.to_string()),
            CryptoError::MalformedProof(_) | CryptoError::Encoding(_) => {
                ZkLoginError::Signing(err.to_string())
            }
            CryptoError::Entropy(_)
            | CryptoError::Poseidon(_)
            | CryptoError::InvalidInputCount { .. } => ZkLoginError::Crypto(err.to_string()),
        }
    }
}
