use valman_contracts::{ids::IdError, messages::MessageError, ValmanError};

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    ConfigError(#[from] ConfigError),

    #[error(transparent)]
    ValmanError(#[from] ValmanError),

    #[error(transparent)]
    MessageError(#[from] MessageError),

    #[error(transparent)]
    IdError(#[from] IdError),

    #[error(transparent)]
    IoError(#[from] valman_io::IoError),

    #[error(transparent)]
    KeyfileError(#[from] valman_signer::KeyfileError),

    #[error(transparent)]
    WalletError(#[from] valman_signer::ValmanWalletError),

    #[error(transparent)]
    DialoguerError(#[from] dialoguer::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    TracingFilterError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    StdIo(#[from] std::io::Error),

    #[error("No validator manager address. Pass --manager or run `valman config set manager`")]
    NoManagerAddress,

    #[error(
        "No staking manager address. Pass --staking-manager or run `valman config set staking-manager`"
    )]
    NoStakingManager,

    #[error("No keyfile configured. Run `valman key create` or `valman config set keyfile`")]
    NoKeyfile,

    #[error("Key {0} already exists")]
    KeyExists(String),
}
