// Allow deprecated Signature for compatibility with alloy-consensus ecosystem
#![allow(deprecated)]

use alloy_primitives::{Address, Signature};
use async_trait::async_trait;
use bip32::DerivationPath;
use bip39::Mnemonic;
use k256::ecdsa::SigningKey;
use sha3::{Digest, Keccak256};
use std::str::FromStr;
use tiny_keccak::{Hasher, Keccak};

use crate::error::{Error, WriteError};
use crate::protocols::evm::tx::{Eip1559Transaction, SignedEip1559Transaction};

/// HD Path prefix for Ethereum accounts (BIP-44, coin type 60)
const EVM_HD_PATH_PREFIX: &str = "m/44'/60'/0'/0/";

/// Signs transactions on behalf of the connected account
///
/// External wallets that prompt the user should report a declined request with
/// [`WriteError::from_wallet_code`] so that code 4001 surfaces as a cancellation.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Account that pays for and sends the transactions
    fn address(&self) -> Address;

    async fn sign_transaction(
        &self,
        tx: &Eip1559Transaction,
    ) -> Result<SignedEip1559Transaction, WriteError>;
}

/// Wallet holding a secp256k1 key in memory
pub struct LocalWallet {
    signer: SigningKey,
    address: Address,
}

// Note: LocalWallet intentionally does not implement Clone
// The signing key should not be easily duplicated

impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address)
            .finish()
    }
}

impl LocalWallet {
    /// Create a wallet from a BIP-39 mnemonic at `m/44'/60'/0'/0/{account_index}`
    pub fn from_mnemonic(mnemonic: &str, account_index: u32) -> Result<Self, Error> {
        let mnemonic = Mnemonic::from_str(mnemonic)
            .map_err(|e| Error::Wallet(format!("Invalid mnemonic: {}", e)))?;

        let seed = mnemonic.to_seed("");
        let seed = bip32::Seed::new(seed);

        let path = format!("{}{}", EVM_HD_PATH_PREFIX, account_index);
        let path = DerivationPath::from_str(&path)
            .map_err(|e| Error::Wallet(format!("Invalid derivation path: {}", e)))?;

        let derived_key = bip32::XPrv::derive_from_path(seed.as_bytes(), &path)
            .map_err(|e| Error::Wallet(format!("Key derivation error: {}", e)))?;

        let signer = SigningKey::from_slice(&derived_key.to_bytes())
            .map_err(|e| Error::Wallet(format!("Failed to create EVM signing key: {}", e)))?;

        Ok(Self::from_signing_key(signer))
    }

    /// Create a wallet from a hex-encoded private key, with or without `0x`
    pub fn from_private_key(private_key: &str) -> Result<Self, Error> {
        let trimmed = private_key.trim();
        let bytes = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
            .map_err(|e| Error::Wallet(format!("Invalid private key hex: {}", e)))?;

        let signer = SigningKey::from_slice(&bytes)
            .map_err(|e| Error::Wallet(format!("Invalid private key: {}", e)))?;

        Ok(Self::from_signing_key(signer))
    }

    pub fn from_signing_key(signer: SigningKey) -> Self {
        let address = ethereum_address(&signer);
        Self { signer, address }
    }

    /// Ethereum address of the wallet
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign an EIP-1559 transaction and return the full signed payload.
    pub fn sign_eip1559(&self, tx: &Eip1559Transaction) -> Result<SignedEip1559Transaction, Error> {
        let mut digest = Keccak256::new();
        digest.update(tx.encoded_for_signing());

        let (sig, recid) = self
            .signer
            .sign_digest_recoverable(digest)
            .map_err(|e| Error::Wallet(format!("Failed to sign digest: {}", e)))?;

        let signature = Signature::from((sig, recid));
        Ok(tx.clone().into_signed(signature))
    }
}

#[async_trait]
impl TransactionSigner for LocalWallet {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_transaction(
        &self,
        tx: &Eip1559Transaction,
    ) -> Result<SignedEip1559Transaction, WriteError> {
        self.sign_eip1559(tx)
            .map_err(|e| WriteError::Signer(e.to_string()))
    }
}

/// Derive the Ethereum address of a secp256k1 key
///
/// Keccak-256 of the uncompressed public key without its 0x04 prefix; the address is
/// the last 20 bytes.
fn ethereum_address(signer: &SigningKey) -> Address {
    let point = signer.verifying_key().to_encoded_point(false);

    let mut hasher = Keccak::v256();
    hasher.update(&point.as_bytes()[1..]);
    let mut hash = [0u8; 32];
    hasher.finalize(&mut hash);

    Address::from_slice(&hash[12..])
}
