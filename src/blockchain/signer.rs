use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{Address, Bytes, TxKind, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use std::fmt;
use std::str::FromStr;

use crate::config::NATIVE_TRANSFER_GAS;
use crate::error::{ConfigError, SubmissionError};

/// Chain parameters fetched from the node right before signing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferParams {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
}

/// The server-held signing credential.
///
/// Built once from configuration at start-up and shared read-only afterwards.
/// The key never appears in `Debug` output.
pub struct TransferSigner {
    inner: PrivateKeySigner,
    gas_limit: u64,
}

impl TransferSigner {
    pub fn from_private_key(private_key: &str) -> Result<Self, ConfigError> {
        let inner = PrivateKeySigner::from_str(private_key.trim())
            .map_err(|e| ConfigError::InvalidSigningKey(e.to_string()))?;

        Ok(Self {
            inner,
            gas_limit: NATIVE_TRANSFER_GAS,
        })
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn address(&self) -> Address {
        self.inner.address()
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    /// Signs an EIP-155 legacy native transfer and returns its raw 2718 encoding
    pub fn sign_native_transfer(
        &self,
        to: Address,
        value_wei: U256,
        params: TransferParams,
    ) -> Result<Vec<u8>, SubmissionError> {
        let tx = TxLegacy {
            chain_id: Some(params.chain_id),
            nonce: params.nonce,
            gas_price: params.gas_price,
            gas_limit: params.gas_limit,
            to: TxKind::Call(to),
            value: value_wei,
            input: Bytes::new(),
        };

        let signature = self
            .inner
            .sign_hash_sync(&tx.signature_hash())
            .map_err(|e| SubmissionError::Signing(e.to_string()))?;

        let envelope = TxEnvelope::from(tx.into_signed(signature));
        Ok(envelope.encoded_2718())
    }
}

impl fmt::Debug for TransferSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferSigner")
            .field("address", &self.address())
            .field("gas_limit", &self.gas_limit)
            .finish_non_exhaustive()
    }
}
