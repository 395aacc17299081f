use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use scanner::{
    blockchain::{self, ScanOptions},
    error::ScannerError,
    sink::JsonLinesSink,
};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::FmtSubscriber;
use valman_contracts::ethers::types::Address;

#[derive(Clone, Parser, Debug)]
#[command(name = "valman-scanner", version, about = "Validator manager event scanner")]
pub struct Params {
    /// WebSocket endpoint of the L1 hosting the managers
    #[arg(long, env = "RPC_URL")]
    pub rpc_url: String,

    /// Comma separated validator and staking manager addresses
    #[arg(long, env = "ADDRESSES")]
    pub addresses: String,

    #[arg(long, env = "START_BLOCK", default_value_t = 0)]
    pub start_block: u64,

    #[arg(long, env = "LOG_LEVEL", default_value_t = LevelFilter::INFO)]
    pub log_level: LevelFilter,

    #[arg(long, env = "CHECKPOINT", default_value = "valman-scanner.checkpoint.json")]
    pub checkpoint: PathBuf,

    /// JSON lines output file. Defaults to stdout
    #[arg(long, env = "OUTPUT")]
    pub output: Option<PathBuf>,

    #[arg(long, short, default_value_t = false)]
    pub reset_checkpoint: bool,
}

fn parse_addresses(addresses: &str) -> Result<Vec<Address>, ScannerError> {
    addresses
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(|a| a.parse::<Address>().map_err(|_| ScannerError::InvalidAddress(a.to_owned())))
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let params = Params::parse();

    start_tracing(params.log_level)?;
    let addresses = parse_addresses(&params.addresses)?;

    info!("Valman scanner starting...");

    let options = ScanOptions {
        rpc_url: &params.rpc_url,
        addresses: &addresses,
        start_block: params.start_block,
        checkpoint: &params.checkpoint,
        reset_checkpoint: params.reset_checkpoint,
    };

    let last_block = match &params.output {
        Some(path) => {
            let mut sink = JsonLinesSink::file(path)?;
            blockchain::scan(options, &mut sink).await
        }
        None => blockchain::scan(options, &mut JsonLinesSink::stdout()).await,
    }
    .context("Scanner stopped")?;

    info!("Stopped at block {last_block}");
    Ok(())
}

fn start_tracing(level: LevelFilter) -> Result<(), anyhow::Error> {
    // stdout carries the events
    let subscriber =
        FmtSubscriber::builder().with_max_level(level).with_writer(std::io::stderr).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
