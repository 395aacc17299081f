use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use ethers::types::Address;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error as ThisError;
use tracing::debug;
use valman_contracts::TokenKind;
use valman_io::{read_toml, write_toml, IoError};
use valman_signer::{keyfile::prompt_ecdsa_keyfile, EcdsaKeyfile};

use crate::error::Error;

pub const CONFIG_FILE: &str = "valman-config.toml";

pub static DEFAULT_CONFIG_PATH: Lazy<PathBuf> =
    Lazy::new(|| dirs::home_dir().unwrap_or_default().join(".valman"));

/// Avalanche networks with a stored RPC url. C-Chain endpoints by default; point them at the
/// L1 that hosts the manager with `valman config set rpc`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Network {
    Mainnet,
    Fuji,
    Local,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingManagerConfig {
    pub address: Address,
    pub token: TokenKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValmanConfig {
    /// Directory holding the config file
    #[serde(skip, default = "default_dir")]
    path: PathBuf,
    pub mainnet_rpc_url: String,
    pub fuji_rpc_url: String,
    pub local_rpc_url: String,
    /// Validator manager used when --manager is not given
    pub validator_manager: Option<Address>,
    pub staking_manager: Option<StakingManagerConfig>,
    /// Key that signs transactions
    pub default_keyfile: Option<EcdsaKeyfile>,
}

fn default_dir() -> PathBuf {
    DEFAULT_CONFIG_PATH.to_owned()
}

impl Default for ValmanConfig {
    fn default() -> Self {
        Self {
            path: default_dir(),
            mainnet_rpc_url: "https://api.avax.network/ext/bc/C/rpc".to_string(),
            fuji_rpc_url: "https://api.avax-test.network/ext/bc/C/rpc".to_string(),
            local_rpc_url: "http://localhost:9650/ext/bc/C/rpc".to_string(),
            validator_manager: None,
            staking_manager: None,
            default_keyfile: None,
        }
    }
}

impl ValmanConfig {
    pub fn new_at_path(path: PathBuf) -> Self {
        Self { path, ..Default::default() }
    }

    /// Loads `dir/valman-config.toml`, falling back to defaults when the file does not exist yet.
    pub fn load(dir: PathBuf) -> Result<Self, ConfigError> {
        let file = dir.join(CONFIG_FILE);
        if !file.exists() {
            debug!("No config at {}, using defaults", file.display());
            return Ok(Self::new_at_path(dir));
        }
        let config: Self = read_toml(&file)?;
        Ok(Self { path: dir, ..config })
    }

    pub fn load_from_default_path() -> Result<Self, ConfigError> {
        Self::load(default_dir())
    }

    pub fn store(&self) -> Result<(), ConfigError> {
        write_toml(&self.get_file(), self)?;
        Ok(())
    }

    pub fn set_rpc_url(&mut self, network: Network, rpc: &str) {
        println!("Setting {network} rpc url to: {rpc}");
        match network {
            Network::Mainnet => self.mainnet_rpc_url = rpc.to_string(),
            Network::Fuji => self.fuji_rpc_url = rpc.to_string(),
            Network::Local => self.local_rpc_url = rpc.to_string(),
        }
    }

    pub fn rpc_url(&self, network: Network) -> &str {
        match network {
            Network::Mainnet => &self.mainnet_rpc_url,
            Network::Fuji => &self.fuji_rpc_url,
            Network::Local => &self.local_rpc_url,
        }
    }

    pub fn get_dir(&self) -> &Path {
        &self.path
    }

    pub fn get_file(&self) -> PathBuf {
        self.path.join(CONFIG_FILE)
    }

    /// Where `valman key` stores encrypted keystores.
    pub fn keys_dir(&self) -> PathBuf {
        self.path.join("keys")
    }
}

#[derive(ThisError, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    ConfigIo(#[from] IoError),
}

#[derive(Parser, Debug, Clone)]
pub enum ConfigCommands {
    #[command(name = "set", about = "Set RPC urls, manager addresses or the signing keyfile")]
    Set {
        #[command(subcommand)]
        command: ConfigSetCommands,
    },
    #[command(name = "get", about = "Print configuration values")]
    Get {
        #[command(subcommand)]
        command: ConfigGetCommands,
    },
}

#[derive(Parser, Debug, Clone)]
pub enum ConfigSetCommands {
    #[command(name = "rpc", about = "Set the RPC url used for 'mainnet', 'fuji' or 'local'")]
    Rpc { network: Network, rpc_url: String },
    #[command(name = "manager", about = "Set the default validator manager address")]
    Manager { address: Address },
    #[command(name = "staking-manager", about = "Set the default staking manager address")]
    StakingManager {
        address: Address,
        /// How the manager takes stake: native or erc20
        #[arg(long, default_value_t = TokenKind::Native)]
        token: TokenKind,
    },
    #[command(name = "keyfile", about = "Point at an existing encrypted ECDSA keystore")]
    Keyfile,
}

#[derive(Parser, Debug, Clone)]
pub enum ConfigGetCommands {
    #[command(name = "rpc", about = "Get the RPC url used for a network")]
    Rpc { network: Network },
    #[command(name = "manager", about = "Get the default validator manager address")]
    Manager,
    #[command(name = "staking-manager", about = "Get the default staking manager")]
    StakingManager,
    #[command(name = "keyfile", about = "Get the signing keyfile reference")]
    Keyfile,
    #[command(name = "config", about = "Get all config data")]
    Config,
}

pub fn parse_config_subcommands(
    subcmd: ConfigCommands,
    config: &mut ValmanConfig,
) -> Result<(), Error> {
    match subcmd {
        ConfigCommands::Set { command } => {
            parse_config_setter_commands(command, config)?;
            config.store()?;
            println!("Config stored at {}", config.get_file().display());
        }
        ConfigCommands::Get { command } => parse_config_getter_commands(command, config),
    }
    Ok(())
}

fn parse_config_setter_commands(
    subsetter: ConfigSetCommands,
    config: &mut ValmanConfig,
) -> Result<(), Error> {
    match subsetter {
        ConfigSetCommands::Rpc { network, rpc_url } => config.set_rpc_url(network, &rpc_url),
        ConfigSetCommands::Manager { address } => config.validator_manager = Some(address),
        ConfigSetCommands::StakingManager { address, token } => {
            config.staking_manager = Some(StakingManagerConfig { address, token })
        }
        ConfigSetCommands::Keyfile => {
            let keyfile = prompt_ecdsa_keyfile()?;
            println!("Signing with {:?}", keyfile.address);
            config.default_keyfile = Some(keyfile);
        }
    }
    Ok(())
}

fn parse_config_getter_commands(subgetter: ConfigGetCommands, config: &ValmanConfig) {
    match subgetter {
        ConfigGetCommands::Rpc { network } => {
            println!("Url for {network} is {}", config.rpc_url(network));
        }
        ConfigGetCommands::Manager => match config.validator_manager {
            Some(address) => println!("{address:?}"),
            None => println!("No validator manager set"),
        },
        ConfigGetCommands::StakingManager => match &config.staking_manager {
            Some(staking) => println!("{:?} ({})", staking.address, staking.token),
            None => println!("No staking manager set"),
        },
        ConfigGetCommands::Keyfile => match &config.default_keyfile {
            Some(keyfile) => println!("{keyfile:#?}"),
            None => println!("No keyfile set"),
        },
        ConfigGetCommands::Config => println!("{config:#?}"),
    }
}
