use std::path::Path;

use clap::Parser;
use dialoguer::{Confirm, Password};
use valman_signer::{EcdsaKeyfile, ValmanWallet};

use crate::{config::ValmanConfig, error::Error};

pub const DEFAULT_PASSWORD_ENV: &str = "VALMAN_KEYFILE_PASSWORD";

#[derive(Parser, Debug, Clone)]
pub enum KeyCommands {
    #[command(name = "create", about = "Create an encrypted ECDSA key")]
    Create {
        name: String,
        /// Environment variable that will hold the password when signing
        #[arg(long, default_value = DEFAULT_PASSWORD_ENV)]
        password_env: String,
    },
    #[command(name = "import", about = "Import an ECDSA private key into an encrypted keyfile")]
    Import {
        name: String,
        #[arg(long, default_value = DEFAULT_PASSWORD_ENV)]
        password_env: String,
    },
    #[command(name = "show", about = "Show the signing key")]
    Show {
        /// Decrypt the key and print the private key as well
        #[arg(long)]
        private: bool,
    },
}

pub fn parse_key_subcommands(subcmd: KeyCommands, config: &mut ValmanConfig) -> Result<(), Error> {
    match subcmd {
        KeyCommands::Create { name, password_env } => {
            let password = Password::new()
                .with_prompt("Provide the password to the key")
                .with_confirmation("Repeat the password", "Passwords do not match")
                .interact()?;
            let wallet = ValmanWallet::generate();
            let keyfile = store_key(&wallet, &config.keys_dir(), &name, &password, &password_env)?;
            println!("Created key {name} with address {:?}", keyfile.address);
            set_default(config, keyfile)?;
        }
        KeyCommands::Import { name, password_env } => {
            let private_key = Password::new().with_prompt("Enter your private key").interact()?;
            let wallet = ValmanWallet::from_private_key(&private_key)?;
            let password = Password::new()
                .with_prompt("Provide the password to the key")
                .with_confirmation("Repeat the password", "Passwords do not match")
                .interact()?;
            let keyfile = store_key(&wallet, &config.keys_dir(), &name, &password, &password_env)?;
            println!("Key with an address {:?} has been added", keyfile.address);
            set_default(config, keyfile)?;
        }
        KeyCommands::Show { private } => {
            let keyfile = config.default_keyfile.as_ref().ok_or(Error::NoKeyfile)?;
            println!("Key name: {}", keyfile.name);
            println!("Path to key: {}", keyfile.path.display());
            println!("Public address: {:?}", keyfile.address);
            println!("Password variable: {}", keyfile.pw_env_var);
            if private {
                let wallet = keyfile.decrypt_or_prompt()?;
                println!("Private key: {}", wallet.to_private_key());
            }
        }
    }
    Ok(())
}

/// Encrypts `wallet` into `dir/name`. Refuses to overwrite an existing key.
pub fn store_key(
    wallet: &ValmanWallet,
    dir: &Path,
    name: &str,
    password: &str,
    password_env: &str,
) -> Result<EcdsaKeyfile, Error> {
    if dir.join(name).exists() {
        return Err(Error::KeyExists(name.to_owned()));
    }
    let path = wallet.encrypt_and_store(dir, name, password)?;
    Ok(EcdsaKeyfile::new(path, wallet.address(), name, password_env))
}

fn set_default(config: &mut ValmanConfig, keyfile: EcdsaKeyfile) -> Result<(), Error> {
    let replace = match &config.default_keyfile {
        None => true,
        Some(current) => Confirm::new()
            .with_prompt(format!("Replace {} as the signing key?", current.name))
            .default(false)
            .interact()?,
    };
    if replace {
        println!(
            "Signing with {} from now on. Export {} before sending transactions",
            keyfile.name, keyfile.pw_env_var
        );
        config.default_keyfile = Some(keyfile);
        config.store()?;
    }
    Ok(())
}
