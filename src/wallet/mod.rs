// Allow deprecated Signature for compatibility with alloy-consensus ecosystem
#![allow(deprecated)]

use bip32::{DerivationPath, Seed, XPrv};
use bip39::Mnemonic;
use k256::ecdsa::SigningKey;
use sha3::{Digest, Keccak256};
use std::str::FromStr;
use zeroize::Zeroizing;

use alloy_primitives::{Address, Signature};

use crate::error::Error;
use crate::protocols::evm::tx::{Eip1559Transaction, SignedEip1559Transaction};
use crate::protocols::evm::types::utils::eth_address_from_pubkey_uncompressed;

/// HD Path prefix for Ethereum chains (BIP-44)
const ETHEREUM_HD_PATH: &str = "m/44'/60'/0'/0/";

/// Local secp256k1 signer for the presale account
pub struct EvmWallet {
    signer: SigningKey,
    address: Address,
    account_index: u32,
}

// The signing key is never printed
impl std::fmt::Debug for EvmWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmWallet")
            .field("address", &self.address)
            .field("account_index", &self.account_index)
            .finish()
    }
}

impl EvmWallet {
    /// Derive the key at m/44'/60'/0'/0/`account_index`
    pub fn from_mnemonic(mnemonic: &str, account_index: u32) -> Result<Self, Error> {
        let parsed = Mnemonic::from_str(mnemonic.trim())
            .map_err(|e| Error::Wallet(format!("Invalid mnemonic: {}", e)))?;

        let seed = Seed::new(parsed.to_seed(""));
        let path = format!("{}{}", ETHEREUM_HD_PATH, account_index);
        let path = DerivationPath::from_str(&path)
            .map_err(|e| Error::Wallet(format!("Invalid derivation path: {}", e)))?;

        let derived_key = XPrv::derive_from_path(seed.as_bytes(), &path)
            .map_err(|e| Error::Wallet(format!("Key derivation error: {}", e)))?;
        let key_bytes = Zeroizing::new(derived_key.to_bytes());
        let signer = SigningKey::from_slice(key_bytes.as_slice())
            .map_err(|e| Error::Wallet(format!("Failed to create signing key: {}", e)))?;

        Self::with_signer(signer, account_index)
    }

    /// Import a raw hex private key, with or without `0x`
    pub fn from_private_key(private_key: &str) -> Result<Self, Error> {
        let hex_key = private_key.trim();
        let hex_key = hex_key.strip_prefix("0x").unwrap_or(hex_key);
        let key_bytes = Zeroizing::new(
            hex::decode(hex_key)
                .map_err(|e| Error::Wallet(format!("Invalid private key hex: {}", e)))?,
        );
        if key_bytes.len() != 32 {
            return Err(Error::Wallet(format!(
                "Private key must be 32 bytes, got {}",
                key_bytes.len()
            )));
        }
        let signer = SigningKey::from_slice(key_bytes.as_slice())
            .map_err(|e| Error::Wallet(format!("Invalid private key: {}", e)))?;

        Self::with_signer(signer, 0)
    }

    fn with_signer(signer: SigningKey, account_index: u32) -> Result<Self, Error> {
        let point = signer.verifying_key().to_encoded_point(false);
        let address = eth_address_from_pubkey_uncompressed(point.as_bytes())?;
        Ok(Self {
            signer,
            address,
            account_index,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn account_index(&self) -> u32 {
        self.account_index
    }

    fn sign_keccak(&self, payload: &[u8]) -> Result<Signature, Error> {
        let mut digest = Keccak256::new();
        digest.update(payload);

        let (sig, recid) = self
            .signer
            .sign_digest_recoverable(digest)
            .map_err(|e| Error::Wallet(format!("Failed to sign digest: {}", e)))?;

        Ok(Signature::from((sig, recid)))
    }

    /// Sign an EIP-1559 transaction and return the full signed payload
    pub fn sign_eip1559(&self, tx: &Eip1559Transaction) -> Result<SignedEip1559Transaction, Error> {
        let signature = self.sign_keccak(&tx.encoded_for_signing())?;
        Ok(tx.clone().into_signed(signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::evm::types::{EvmTransactionRequest, FeeData};
    use alloy_primitives::{address, U256};

    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_mnemonic_derivation_matches_known_address() {
        let wallet = EvmWallet::from_mnemonic(TEST_MNEMONIC, 0).unwrap();
        assert_eq!(
            wallet.address(),
            address!("9858EfFD232B4033E47d90003D41EC34EcaEda94")
        );

        let second = EvmWallet::from_mnemonic(TEST_MNEMONIC, 1).unwrap();
        assert_eq!(second.account_index(), 1);
        assert_ne!(second.address(), wallet.address());
    }

    #[test]
    fn test_private_key_import() {
        let wallet = EvmWallet::from_private_key(
            "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
        )
        .unwrap();
        assert_eq!(
            wallet.address(),
            address!("2c7536E3605D9C16a7a3D7b1898e529396a65c23")
        );
        assert_eq!(wallet.account_index(), 0);
    }

    #[test]
    fn test_invalid_keys_rejected() {
        assert!(matches!(
            EvmWallet::from_mnemonic("not a mnemonic", 0),
            Err(Error::Wallet(_))
        ));
        assert!(matches!(
            EvmWallet::from_private_key("0x1234"),
            Err(Error::Wallet(_))
        ));
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let wallet = EvmWallet::from_mnemonic(TEST_MNEMONIC, 0).unwrap();
        let rendered = format!("{:?}", wallet);
        assert!(!rendered.contains("abandon"));
    }

    #[test]
    fn test_signed_transaction_recovers_to_wallet() {
        let wallet = EvmWallet::from_mnemonic(TEST_MNEMONIC, 0).unwrap();
        let request = EvmTransactionRequest::new(56, wallet.address(), Address::repeat_byte(0x42))
            .value(U256::from(1u64));
        let tx = Eip1559Transaction::from_request(&request, 0, 21_000, FeeData::from_base_fee(1, 1));

        let signed = wallet.sign_eip1559(&tx).unwrap();
        let recovered = signed
            .signature()
            .recover_address_from_prehash(&tx.signature_hash())
            .unwrap();
        assert_eq!(recovered, wallet.address());
        assert!(!signed.raw().is_empty());
    }
}
