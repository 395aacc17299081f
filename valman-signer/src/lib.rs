//! Key management for valman: generating, importing and storing the ECDSA key that signs
//! validator-manager transactions.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use ethers::{
    core::{rand::thread_rng, utils::hex::ToHex},
    signers::{LocalWallet, Signer, WalletError},
    types::Address,
};
use serde_json::{Map, Value};
use valman_io::{read_json, write_json, IoError};

pub mod keyfile;

pub use keyfile::{EcdsaKeyfile, KeyfileError};

/// A signing key as loaded from a keystore or the terminal. Signing itself happens on the
/// wrapped [`LocalWallet`], see [`ValmanWallet::into_signer`].
#[derive(Clone, Debug)]
pub struct ValmanWallet(LocalWallet);

#[derive(thiserror::Error, Debug)]
pub enum ValmanWalletError {
    #[error(transparent)]
    WalletError(#[from] WalletError),
    #[error(transparent)]
    IoError(#[from] IoError),
}

impl ValmanWallet {
    pub fn generate() -> Self {
        Self(LocalWallet::new(&mut thread_rng()))
    }

    pub fn from_private_key(private_key: &str) -> Result<Self, ValmanWalletError> {
        Ok(Self(LocalWallet::from_str(private_key.trim_start_matches("0x"))?))
    }

    pub fn from_keystore(path: &Path, password: &str) -> Result<Self, ValmanWalletError> {
        Ok(Self(LocalWallet::decrypt_keystore(path, password)?))
    }

    /// Encrypts the key into `dir/name`. The stored keystore also carries the plain `address`
    /// most tooling looks for.
    pub fn encrypt_and_store(
        &self,
        dir: &Path,
        name: &str,
        password: &str,
    ) -> Result<PathBuf, ValmanWalletError> {
        valman_io::create_dir_all(dir)?;
        LocalWallet::encrypt_keystore(
            dir,
            &mut thread_rng(),
            self.0.signer().to_bytes(),
            password,
            Some(name),
        )?;

        let key_path = dir.join(name);
        let mut keystore: Map<String, Value> = read_json(&key_path)?;
        keystore.insert("address".to_owned(), Value::String(format!("{:?}", self.address())));
        write_json(&key_path, &keystore)?;
        Ok(key_path)
    }

    pub fn to_private_key(&self) -> String {
        self.0.signer().to_bytes().encode_hex::<String>()
    }

    pub fn address(&self) -> Address {
        self.0.address()
    }

    /// The wallet bound to `chain_id`, ready for a signing middleware.
    pub fn into_signer(self, chain_id: u64) -> LocalWallet {
        self.0.with_chain_id(chain_id)
    }
}
