// Allow deprecated Signature for compatibility with alloy-consensus ecosystem
#![allow(deprecated)]

use alloy_consensus::{SignableTransaction, Signed, TxEip1559};
use alloy_eips::eip2930::AccessList;
use alloy_primitives::{Address, Bytes, ChainId, Signature, TxKind, B256, U256};
use alloy_rpc_types_eth::TransactionRequest;

use crate::protocols::evm::types::FeeSuggestion;

/// Gas limit used while estimating; replaced by the buffered estimate before signing
pub const GAS_ESTIMATE_INITIAL: u64 = 500_000;

/// Convenience builder for constructing and signing EIP-1559 contract calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Eip1559Transaction {
    pub chain_id: ChainId,
    pub nonce: u64,
    pub gas_limit: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

impl Eip1559Transaction {
    /// Create a zero-value call of `data` on the contract at `to`.
    pub fn contract_call(chain_id: u64, nonce: u64, to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            chain_id,
            nonce,
            gas_limit: GAS_ESTIMATE_INITIAL,
            max_fee_per_gas: 0,
            max_priority_fee_per_gas: 0,
            to,
            value: U256::ZERO,
            data: data.into(),
        }
    }

    /// Set the gas limit for the transaction.
    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Apply a buffer in percent on top of a gas estimate.
    pub fn buffered_gas_limit(self, estimate: u64, buffer_percent: u64) -> Self {
        let limit = estimate.saturating_mul(100 + buffer_percent) / 100;
        self.gas_limit(limit)
    }

    /// Set max fee and tip from a fee suggestion, saturating at `u128::MAX`.
    pub fn fees(mut self, fees: &FeeSuggestion) -> Self {
        self.max_fee_per_gas = fees.max_fee_per_gas.saturating_to::<u128>();
        self.max_priority_fee_per_gas = fees.max_priority_fee_per_gas.saturating_to::<u128>();
        self
    }

    /// RPC request used for `eth_estimateGas` on behalf of `from`.
    pub fn to_request(&self, from: Address) -> TransactionRequest {
        TransactionRequest {
            from: Some(from),
            to: Some(TxKind::Call(self.to)),
            value: Some(self.value),
            max_fee_per_gas: Some(self.max_fee_per_gas),
            max_priority_fee_per_gas: Some(self.max_priority_fee_per_gas),
            input: self.data.clone().into(),
            chain_id: Some(self.chain_id),
            nonce: Some(self.nonce),
            ..Default::default()
        }
    }

    fn to_alloy(&self) -> TxEip1559 {
        TxEip1559 {
            chain_id: self.chain_id,
            nonce: self.nonce,
            gas_limit: self.gas_limit,
            max_fee_per_gas: self.max_fee_per_gas,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            to: TxKind::Call(self.to),
            value: self.value,
            access_list: AccessList::default(),
            input: self.data.clone(),
        }
    }

    /// Bytes that should be hashed (keccak256) for signing.
    pub fn encoded_for_signing(&self) -> Vec<u8> {
        self.to_alloy().encoded_for_signing()
    }

    /// Keccak256 signature hash of the transaction.
    pub fn signature_hash(&self) -> B256 {
        self.to_alloy().signature_hash()
    }

    /// Combine with a signature into a payload ready for `eth_sendRawTransaction`.
    pub fn into_signed(self, signature: Signature) -> SignedEip1559Transaction {
        let tx = self.to_alloy();
        let mut buf = Vec::with_capacity(tx.encoded_len_with_signature(&signature, false));
        tx.encode_with_signature(&signature, &mut buf, false);
        SignedEip1559Transaction {
            signed: tx.into_signed(signature),
            raw: Bytes::from(buf),
        }
    }
}

/// Fully signed transaction and its raw payload.
#[derive(Clone, Debug)]
pub struct SignedEip1559Transaction {
    signed: Signed<TxEip1559>,
    raw: Bytes,
}

impl SignedEip1559Transaction {
    /// Raw bytes ready to be sent via `eth_sendRawTransaction`.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Transaction hash computed from the signed payload.
    pub fn hash(&self) -> B256 {
        *self.signed.hash()
    }

    pub fn signature(&self) -> &Signature {
        self.signed.signature()
    }
}
