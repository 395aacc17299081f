use super::ValmanWallet;
use ethers::types::Address;
use serde::{Deserialize, Serialize};

use std::{env, path::PathBuf};

/// Reference to an encrypted ECDSA keystore. The password itself is never stored, only the name
/// of the environment variable that holds it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EcdsaKeyfile {
    pub path: PathBuf,
    pub address: Address,
    pub name: String,
    pub pw_env_var: String,
}

#[derive(Debug, thiserror::Error)]
pub enum KeyfileError {
    #[error("Could not decrypt keyfile: {0}")]
    KeyfileDecryptionError(String),
    #[error(transparent)]
    DialoguerError(#[from] dialoguer::Error),
    #[error("Environment variable {1} not found for key {0}. Ensure the variable is set or in a .env file.")]
    EnvVarError(String, String),
}

impl EcdsaKeyfile {
    pub fn new(path: PathBuf, address: Address, name: &str, pw_env_var: &str) -> Self {
        EcdsaKeyfile { path, address, name: name.to_owned(), pw_env_var: pw_env_var.to_owned() }
    }

    pub fn decrypt(&self, password: &str) -> Result<ValmanWallet, KeyfileError> {
        ValmanWallet::from_keystore(&self.path, password)
            .map_err(|_| KeyfileError::KeyfileDecryptionError(self.path.display().to_string()))
    }

    pub fn decrypt_env(&self) -> Result<ValmanWallet, KeyfileError> {
        let password = match env::var(&self.pw_env_var) {
            Ok(pw) => pw,
            // Fall back to a .env file in the working directory
            Err(_) => dotenvy::var(&self.pw_env_var)
                .map_err(|_| KeyfileError::EnvVarError(self.name.clone(), self.pw_env_var.clone()))?,
        };
        self.decrypt(&password)
    }

    /// Decrypts with the environment password, asking on the terminal when it is not set.
    pub fn decrypt_or_prompt(&self) -> Result<ValmanWallet, KeyfileError> {
        match self.decrypt_env() {
            Err(KeyfileError::EnvVarError(..)) => {
                let password = dialoguer::Password::new()
                    .with_prompt(format!("Password for key {}", self.name))
                    .interact()?;
                self.decrypt(&password)
            }
            other => other,
        }
    }
}

pub fn prompt_ecdsa_keyfile() -> Result<EcdsaKeyfile, KeyfileError> {
    let path = dialoguer::Input::<String>::new()
        .with_prompt("Enter the full path to the keyfile")
        .interact()?;
    let name =
        dialoguer::Input::<String>::new().with_prompt("Enter the keyfile name.").interact()?;
    let pw_env_var = dialoguer::Input::<String>::new()
        .with_prompt("Enter the password environment variable name. This will be used later to decrypt the keyfile.")
        .interact()?;

    let keyfile = EcdsaKeyfile::new(path.into(), Address::zero(), &name, &pw_env_var);
    let wallet = keyfile.decrypt_or_prompt()?;

    Ok(EcdsaKeyfile { address: wallet.address(), ..keyfile })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_decrypt_env() {
        let dir = tempdir().unwrap();
        let wallet = ValmanWallet::generate();
        let path = wallet.encrypt_and_store(dir.path(), "operator", "hunter22").unwrap();

        let var = "VALMAN_TEST_KEYFILE_PASSWORD";
        env::set_var(var, "hunter22");
        let keyfile = EcdsaKeyfile::new(path, wallet.address(), "operator", var);
        let decrypted = keyfile.decrypt_env().unwrap();
        assert_eq!(decrypted.address(), wallet.address());
    }

    #[test]
    fn test_decrypt_env_missing_var() {
        let keyfile = EcdsaKeyfile::new(
            PathBuf::from("/nonexistent"),
            Address::zero(),
            "missing",
            "VALMAN_TEST_PASSWORD_THAT_IS_NOT_SET",
        );
        assert!(matches!(keyfile.decrypt_env(), Err(KeyfileError::EnvVarError(..))));
    }

    #[test]
    fn test_decrypt_wrong_password() {
        let dir = tempdir().unwrap();
        let wallet = ValmanWallet::generate();
        let path = wallet.encrypt_and_store(dir.path(), "operator", "right").unwrap();
        let keyfile = EcdsaKeyfile::new(path, wallet.address(), "operator", "UNUSED");
        assert!(matches!(keyfile.decrypt("wrong"), Err(KeyfileError::KeyfileDecryptionError(_))));
    }
}
