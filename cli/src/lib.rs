use std::path::Path;

use clap::Args;
use ethers::types::Bytes;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Error;

pub mod config;
pub mod context;
pub mod error;
pub mod key;
pub mod message;
pub mod staking;
pub mod validator;

/// Signed Warp messages a transaction carries, and the one the contract reads.
#[derive(Args, Debug, Clone, Default)]
pub struct WarpArgs {
    /// Signed Warp message as hex. Repeat to attach several
    #[arg(long = "warp-message")]
    pub warp_messages: Vec<Bytes>,

    /// Position of the message the contract reads
    #[arg(long, default_value_t = 0)]
    pub message_index: u32,
}

/// Reads a JSON argument given either inline or as a path to a file.
pub fn read_json_arg<T: DeserializeOwned>(arg: &str) -> Result<T, Error> {
    if arg.trim_start().starts_with(['{', '[']) {
        Ok(serde_json::from_str(arg)?)
    } else {
        Ok(valman_io::read_json(Path::new(arg))?)
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
