//! Error types for the send contract

use crate::store::FsmError;
use thiserror::Error;

/// Result type for contract operations
pub type Result<T> = std::result::Result<T, Error>;

/// Codespace reported alongside every error code
pub const CODESPACE: &str = "send";

/// Contract errors
///
/// `Store`, `Decode` and `InvariantViolation` are faults; every other
/// variant rejects the transaction as invalid.
#[derive(Error, Debug)]
pub enum Error {
    /// State store error (either channel)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Malformed stored or wire bytes
    #[error("Decode error: {0}")]
    Decode(String),

    /// Fee below the governance minimum
    #[error("Fee below state limit: fee {fee} < minimum {minimum}")]
    FeeTooLow {
        /// Offered fee
        fee: u64,
        /// Current minimum
        minimum: u64,
    },

    /// Address of the wrong length
    #[error("Invalid {field} address: expected 20 bytes, got {len}")]
    InvalidAddress {
        /// Which address was rejected
        field: &'static str,
        /// Actual length
        len: usize,
    },

    /// Zero transfer amount
    #[error("Invalid amount: must be greater than zero")]
    InvalidAmount,

    /// Sender balance too low
    #[error("Insufficient funds: balance {balance} < amount {amount}")]
    InsufficientFunds {
        /// Sender balance
        balance: u64,
        /// Requested amount
        amount: u64,
    },

    /// Unknown or malformed message
    #[error("Invalid message type: {0}")]
    InvalidMessageType(String),

    /// Recipient balance would exceed u64
    #[error("Balance overflow")]
    BalanceOverflow,

    /// Invariant violation (money conservation)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl Error {
    /// Stable response code
    pub fn code(&self) -> u32 {
        match self {
            Error::Store(_) => 1,
            Error::Decode(_) => 2,
            Error::FeeTooLow { .. } => 3,
            Error::InvalidAddress { .. } => 4,
            Error::InvalidAmount => 5,
            Error::InsufficientFunds { .. } => 6,
            Error::InvalidMessageType(_) => 7,
            Error::BalanceOverflow => 8,
            Error::InvariantViolation(_) => 9,
        }
    }

    /// Short name used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Store(_) => "store",
            Error::Decode(_) => "decode",
            Error::FeeTooLow { .. } => "fee_too_low",
            Error::InvalidAddress { .. } => "invalid_address",
            Error::InvalidAmount => "invalid_amount",
            Error::InsufficientFunds { .. } => "insufficient_funds",
            Error::InvalidMessageType(_) => "invalid_message_type",
            Error::BalanceOverflow => "balance_overflow",
            Error::InvariantViolation(_) => "invariant_violation",
        }
    }

    /// True for faults of the node rather than of the transaction
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            Error::Store(_) | Error::Decode(_) | Error::InvariantViolation(_)
        )
    }
}

impl From<prost::DecodeError> for Error {
    fn from(err: prost::DecodeError) -> Self {
        Error::Decode(err.to_string())
    }
}

/// State store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Request channel: transport or backend fault
    #[error("request failed: {0}")]
    Request(String),

    /// Semantic channel: rejected by the state machine
    #[error("rejected by state machine: {0}")]
    Rejected(FsmError),
}

impl From<rocksdb::Error> for StoreError {
    fn from(err: rocksdb::Error) -> Self {
        StoreError::Request(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            Error::Store(StoreError::Request("io".to_string())),
            Error::Decode("bad".to_string()),
            Error::FeeTooLow { fee: 1, minimum: 2 },
            Error::InvalidAddress { field: "from", len: 19 },
            Error::InvalidAmount,
            Error::InsufficientFunds { balance: 1, amount: 2 },
            Error::InvalidMessageType("x".to_string()),
            Error::BalanceOverflow,
            Error::InvariantViolation("x".to_string()),
        ];

        let mut codes: Vec<u32> = errors.iter().map(Error::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(errors.iter().all(|e| e.code() != 0));
    }

    #[test]
    fn test_fault_classification() {
        assert!(Error::Decode("bad".to_string()).is_fault());
        assert!(!Error::InvalidAmount.is_fault());
        assert!(!Error::FeeTooLow { fee: 0, minimum: 1 }.is_fault());
    }

    #[test]
    fn test_display() {
        let err = Error::InvalidAddress { field: "to", len: 19 };
        assert_eq!(
            err.to_string(),
            "Invalid to address: expected 20 bytes, got 19"
        );
    }
}
