use std::path::PathBuf;

use thiserror::Error;
use valman_contracts::{ethers::providers::ProviderError, ValmanError};
use valman_io::IoError;

#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("No contracts to monitor")]
    NoAddresses,

    #[error("Invalid contract address {0}")]
    InvalidAddress(String),

    #[error("Could not write to {path}: {source}")]
    OutputError { path: PathBuf, source: std::io::Error },

    #[error(transparent)]
    JsonParseError(#[from] serde_json::Error),

    #[error(transparent)]
    ProviderError(#[from] ProviderError),

    #[error(transparent)]
    ValmanError(#[from] ValmanError),

    #[error(transparent)]
    IoError(#[from] IoError),
}

pub type Result<T> = std::result::Result<T, ScannerError>;
