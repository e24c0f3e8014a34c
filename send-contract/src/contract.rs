//! Send contract
//!
//! Implements the plugin interface the host state machine drives for every
//! block:
//!
//! - **Genesis / BeginBlock / EndBlock**: reserved, no-ops
//! - **CheckTx**: stateless admission (minimum fee, message shape, signers)
//! - **DeliverTx**: stateful transfer execution
//!
//! # Invariants
//!
//! - Money conservation: `from + to` is identical before and after a transfer
//! - Drained accounts are deleted, never stored with a zero balance
//! - Every failure returns before the single write batch is issued

use crate::{
    error::CODESPACE,
    keys::{key_for_account, key_for_fee_params},
    metrics::Metrics,
    store::{value_for, DeleteOp, KeyRead, ReadRequest, SetOp, StateStore, WriteRequest},
    types::{decode_record, Account, FeeParams, Message, MessageSend, Transaction, ADDRESS_LEN},
    Error, Result,
};
use prost::Message as _;
use tracing::{debug, warn};

/// Correlation ids used within a single read
const FEE_PARAMS_QUERY_ID: u64 = 0;
const FROM_QUERY_ID: u64 = 1;
const TO_QUERY_ID: u64 = 2;

/// Genesis request
#[derive(Debug, Clone, Default)]
pub struct GenesisRequest {
    /// Raw genesis document
    pub genesis_json: Vec<u8>,
}

/// Genesis response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenesisResponse {}

/// BeginBlock request
#[derive(Debug, Clone, Default)]
pub struct BeginBlockRequest {
    /// Height of the block being applied
    pub height: u64,
}

/// BeginBlock response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeginBlockResponse {}

/// EndBlock request
#[derive(Debug, Clone, Default)]
pub struct EndBlockRequest {
    /// Height of the block being applied
    pub height: u64,
}

/// EndBlock response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndBlockResponse {}

/// CheckTx request
#[derive(Debug, Clone)]
pub struct CheckRequest {
    /// Transaction to admit
    pub tx: Transaction,
}

/// CheckTx response
#[derive(Debug, Default)]
pub struct CheckResponse {
    /// Addresses whose signatures must authorize the transaction
    pub authorized_signers: Vec<Vec<u8>>,
    /// Rejection or fault
    pub error: Option<Error>,
}

impl CheckResponse {
    /// Response code, 0 on success
    pub fn code(&self) -> u32 {
        self.error.as_ref().map_or(0, Error::code)
    }

    /// Namespace of [`Self::code`], empty on success
    pub fn codespace(&self) -> &'static str {
        codespace(self.error.as_ref())
    }
}

/// DeliverTx request
#[derive(Debug, Clone)]
pub struct DeliverRequest {
    /// Transaction to apply
    pub tx: Transaction,
}

/// DeliverTx response
#[derive(Debug, Default)]
pub struct DeliverResponse {
    /// Rejection or fault
    pub error: Option<Error>,
}

impl DeliverResponse {
    /// Response code, 0 on success
    pub fn code(&self) -> u32 {
        self.error.as_ref().map_or(0, Error::code)
    }

    /// Namespace of [`Self::code`], empty on success
    pub fn codespace(&self) -> &'static str {
        codespace(self.error.as_ref())
    }
}

fn codespace(error: Option<&Error>) -> &'static str {
    match error {
        Some(_) => CODESPACE,
        None => "",
    }
}

/// Calls the host state machine makes into a contract
///
/// Outcomes are reported only through the response; none of these panic
/// on a bad transaction.
pub trait Plugin {
    /// Import genesis state
    fn genesis(&self, request: GenesisRequest) -> GenesisResponse;

    /// Start of block application
    fn begin_block(&self, request: BeginBlockRequest) -> BeginBlockResponse;

    /// Stateless admission check
    fn check_tx(&self, request: CheckRequest) -> CheckResponse;

    /// Apply a transaction
    fn deliver_tx(&self, request: DeliverRequest) -> DeliverResponse;

    /// End of block application
    fn end_block(&self, request: EndBlockRequest) -> EndBlockResponse;
}

/// Balance transfer contract
#[derive(Debug)]
pub struct Contract<S> {
    /// Host state
    store: S,

    /// Metrics (optional)
    metrics: Option<Metrics>,
}

impl<S: StateStore> Contract<S> {
    /// Create a contract over `store`
    pub fn new(store: S) -> Self {
        Self {
            store,
            metrics: None,
        }
    }

    /// Attach a metrics collector
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Metrics collector, if attached
    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref()
    }

    /// Admission check; returns the authorized signers
    pub fn check(&self, tx: &Transaction) -> Result<Vec<Vec<u8>>> {
        // Fee gate comes before the message is even decoded
        let params = self.fee_params()?;
        if tx.fee < params.send_fee {
            return Err(Error::FeeTooLow {
                fee: tx.fee,
                minimum: params.send_fee,
            });
        }

        match tx.message()? {
            Message::Send(msg) => check_message_send(&msg),
        }
    }

    /// Execute a transaction against the store
    pub fn deliver(&self, tx: &Transaction) -> Result<()> {
        match tx.message()? {
            Message::Send(msg) => self.deliver_message_send(&msg),
        }
    }

    /// Current fee parameters; defaults when governance has not set them
    pub fn fee_params(&self) -> Result<FeeParams> {
        let request = ReadRequest {
            keys: vec![KeyRead {
                query_id: FEE_PARAMS_QUERY_ID,
                key: key_for_fee_params(),
            }],
        };
        let results = self.store.state_read(&request)?.into_result()?;
        decode_record(value_for(&results, FEE_PARAMS_QUERY_ID))
    }

    /// Execute a send: one batched read, one atomic batched write
    fn deliver_message_send(&self, msg: &MessageSend) -> Result<()> {
        // Deliver can see transactions that never passed admission
        check_message_send(msg)?;

        let from_key = key_for_account(&msg.from_address);
        let to_key = key_for_account(&msg.to_address);

        let request = ReadRequest {
            keys: vec![
                KeyRead {
                    query_id: FROM_QUERY_ID,
                    key: from_key.clone(),
                },
                KeyRead {
                    query_id: TO_QUERY_ID,
                    key: to_key.clone(),
                },
            ],
        };
        let results = self.store.state_read(&request)?.into_result()?;

        let mut from: Account = decode_record(value_for(&results, FROM_QUERY_ID))?;
        let mut to: Account = decode_record(value_for(&results, TO_QUERY_ID))?;

        if from.amount < msg.amount {
            return Err(Error::InsufficientFunds {
                balance: from.amount,
                amount: msg.amount,
            });
        }

        // Debit and credit cancel out on a single account
        if from_key == to_key {
            debug!(amount = msg.amount, "Self transfer, state unchanged");
            return Ok(());
        }

        let before = u128::from(from.amount) + u128::from(to.amount);

        from.amount -= msg.amount;
        to.amount = to
            .amount
            .checked_add(msg.amount)
            .ok_or(Error::BalanceOverflow)?;

        let after = u128::from(from.amount) + u128::from(to.amount);
        if before != after {
            return Err(Error::InvariantViolation(format!(
                "transfer changed total balance from {} to {}",
                before, after
            )));
        }

        from.address = msg.from_address.clone();
        to.address = msg.to_address.clone();

        let pruned = from.amount == 0;
        let mut sets = vec![SetOp {
            key: to_key,
            value: to.encode_to_vec(),
        }];
        let mut deletes = Vec::new();
        if pruned {
            deletes.push(DeleteOp { key: from_key });
        } else {
            sets.push(SetOp {
                key: from_key,
                value: from.encode_to_vec(),
            });
        }

        self.store
            .state_write(&WriteRequest { sets, deletes })?
            .into_result()?;

        if let Some(metrics) = &self.metrics {
            metrics.record_transfer(msg.amount, pruned);
        }

        debug!(
            amount = msg.amount,
            sender_balance = from.amount,
            recipient_balance = to.amount,
            pruned,
            "Transfer applied"
        );

        Ok(())
    }
}

/// Stateless checks for a send; returns the authorized signers
pub fn check_message_send(msg: &MessageSend) -> Result<Vec<Vec<u8>>> {
    if msg.from_address.len() != ADDRESS_LEN {
        return Err(Error::InvalidAddress {
            field: "from",
            len: msg.from_address.len(),
        });
    }

    if msg.to_address.len() != ADDRESS_LEN {
        return Err(Error::InvalidAddress {
            field: "to",
            len: msg.to_address.len(),
        });
    }

    if msg.amount == 0 {
        return Err(Error::InvalidAmount);
    }

    Ok(vec![msg.from_address.clone()])
}

impl<S: StateStore> Plugin for Contract<S> {
    fn genesis(&self, _request: GenesisRequest) -> GenesisResponse {
        GenesisResponse {}
    }

    fn begin_block(&self, _request: BeginBlockRequest) -> BeginBlockResponse {
        BeginBlockResponse {}
    }

    fn check_tx(&self, request: CheckRequest) -> CheckResponse {
        let response = match self.check(&request.tx) {
            Ok(authorized_signers) => {
                debug!(fee = request.tx.fee, "CheckTx passed");
                CheckResponse {
                    authorized_signers,
                    error: None,
                }
            }
            Err(e) => {
                if e.is_fault() {
                    warn!(code = e.code(), "CheckTx failed: {}", e);
                } else {
                    debug!(code = e.code(), "CheckTx rejected: {}", e);
                }
                CheckResponse {
                    authorized_signers: vec![],
                    error: Some(e),
                }
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_check(response.error.as_ref().map_or("ok", Error::kind));
        }

        response
    }

    fn deliver_tx(&self, request: DeliverRequest) -> DeliverResponse {
        let error = match self.deliver(&request.tx) {
            Ok(()) => None,
            Err(e) => {
                if e.is_fault() {
                    warn!(code = e.code(), "DeliverTx failed: {}", e);
                } else {
                    debug!(code = e.code(), "DeliverTx rejected: {}", e);
                }
                Some(e)
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_deliver(error.as_ref().map_or("ok", Error::kind));
        }

        DeliverResponse { error }
    }

    fn end_block(&self, _request: EndBlockRequest) -> EndBlockResponse {
        EndBlockResponse {}
    }
}
