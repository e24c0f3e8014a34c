//! Wire and state types
//!
//! Records are proto3 messages encoded with prost. Proto3 omits default
//! fields, so an empty byte string decodes to the all-default record: a
//! missing account reads back as a zero balance.

use crate::{Error, Result};
use prost::Message as _;
use prost_types::Any;

/// Length of an account address in bytes
pub const ADDRESS_LEN: usize = 20;

/// Type URL of [`MessageSend`] inside a transaction's `Any`
pub const MESSAGE_SEND_TYPE_URL: &str = "type.googleapis.com/types.MessageSend";

/// Account balance record
#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct Account {
    /// Owner address (20 bytes)
    #[prost(bytes = "vec", tag = "1")]
    pub address: Vec<u8>,

    /// Balance
    #[prost(uint64, tag = "2")]
    pub amount: u64,
}

/// Governance controlled fee parameters
#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct FeeParams {
    /// Minimum fee for a send transaction
    #[prost(uint64, tag = "1")]
    pub send_fee: u64,
}

/// Transfer `amount` from `from_address` to `to_address`
#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct MessageSend {
    /// Sender address
    #[prost(bytes = "vec", tag = "1")]
    pub from_address: Vec<u8>,

    /// Recipient address
    #[prost(bytes = "vec", tag = "2")]
    pub to_address: Vec<u8>,

    /// Amount to transfer
    #[prost(uint64, tag = "3")]
    pub amount: u64,
}

/// Transaction envelope
#[derive(Clone, PartialEq, prost::Message)]
pub struct Transaction {
    /// Opaque message payload
    #[prost(message, optional, tag = "1")]
    pub msg: Option<Any>,

    /// Fee offered by the sender
    #[prost(uint64, tag = "2")]
    pub fee: u64,

    /// Free-form memo
    #[prost(string, tag = "3")]
    pub memo: String,
}

impl Transaction {
    /// Wrap a message with the given fee
    pub fn new(msg: &Message, fee: u64) -> Self {
        Self {
            msg: Some(msg.to_any()),
            fee,
            memo: String::new(),
        }
    }

    /// Decode the envelope payload
    pub fn message(&self) -> Result<Message> {
        let any = self
            .msg
            .as_ref()
            .ok_or_else(|| Error::InvalidMessageType("missing message".to_string()))?;
        Message::from_any(any)
    }
}

/// Closed set of messages this contract understands
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Message {
    /// Balance transfer
    Send(MessageSend),
}

impl Message {
    /// Decode from a protobuf `Any`
    pub fn from_any(any: &Any) -> Result<Self> {
        match any.type_url.as_str() {
            MESSAGE_SEND_TYPE_URL => MessageSend::decode(any.value.as_slice())
                .map(Message::Send)
                .map_err(|e| Error::InvalidMessageType(format!("malformed send: {}", e))),
            other => Err(Error::InvalidMessageType(other.to_string())),
        }
    }

    /// Encode into a protobuf `Any`
    pub fn to_any(&self) -> Any {
        match self {
            Message::Send(msg) => Any {
                type_url: MESSAGE_SEND_TYPE_URL.to_string(),
                value: msg.encode_to_vec(),
            },
        }
    }
}

/// Decode a stored record; a missing value yields the default record
pub fn decode_record<T: prost::Message + Default>(value: Option<&[u8]>) -> Result<T> {
    match value {
        Some(bytes) => T::decode(bytes).map_err(Error::from),
        None => Ok(T::default()),
    }
}
