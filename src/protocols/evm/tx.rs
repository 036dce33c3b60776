// Allow deprecated Signature for compatibility with alloy-consensus ecosystem
#![allow(deprecated)]

use crate::protocols::evm::types::{EvmTransactionRequest, FeeData};
use alloy_consensus::{SignableTransaction, Signed, TxEip1559};
use alloy_eips::eip2930::AccessList;
use alloy_primitives::{Address, Bytes, ChainId, Signature, TxKind, B256, U256};

/// Unsigned EIP-1559 contract call
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
    /// Attach nonce, gas and fees to a prepared request
    pub fn from_request(
        request: &EvmTransactionRequest,
        nonce: u64,
        gas_limit: u64,
        fees: FeeData,
    ) -> Self {
        Self {
            chain_id: request.chain_id,
            nonce,
            gas_limit,
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            to: request.to,
            value: request.value,
            data: request.data.clone(),
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

    /// Bytes that are keccak-hashed and signed
    pub fn encoded_for_signing(&self) -> Vec<u8> {
        self.to_alloy().encoded_for_signing()
    }

    pub fn signature_hash(&self) -> B256 {
        self.to_alloy().signature_hash()
    }

    /// Combine with `signature` into the raw `eth_sendRawTransaction` payload
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

/// Signed transaction and its network encoding
#[derive(Clone, Debug)]
pub struct SignedEip1559Transaction {
    signed: Signed<TxEip1559>,
    raw: Bytes,
}

impl SignedEip1559Transaction {
    /// Raw bytes ready to be sent via `eth_sendRawTransaction`
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Transaction hash computed from the signed payload
    pub fn hash(&self) -> B256 {
        *self.signed.hash()
    }

    pub fn signature(&self) -> &Signature {
        self.signed.signature()
    }

    pub fn transaction(&self) -> &TxEip1559 {
        self.signed.tx()
    }
}
