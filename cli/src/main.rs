use clap::{Parser, Subcommand};
use ethers::types::Address;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use valman::{
    config::{self, Network, ValmanConfig},
    context::{Context, Overrides},
    error::Error,
    key, message, staking, validator,
};
use valman_contracts::TokenKind;

#[derive(Parser, Debug)]
#[command(name = "valman", version, about = "Manage validators of an Avalanche L1")]
struct Args {
    #[command(subcommand)]
    cmd: Commands,

    /// The network whose stored RPC url is used: mainnet, fuji, local
    #[arg(long, short, global = true, env = "VALMAN_NETWORK", default_value = "fuji")]
    network: Network,

    /// RPC url of the chain hosting the manager. Overrides the stored url
    #[arg(long, global = true, env = "VALMAN_RPC_URL")]
    rpc_url: Option<String>,

    /// Validator manager address
    #[arg(long, global = true, env = "VALMAN_MANAGER")]
    manager: Option<Address>,

    /// Staking manager address
    #[arg(long, global = true, env = "VALMAN_STAKING_MANAGER")]
    staking_manager: Option<Address>,

    /// How the staking manager takes stake: native or erc20
    #[arg(long, global = true)]
    token: Option<TokenKind>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(name = "config", about = "Manage RPC urls, manager addresses and the keyfile")]
    Config {
        #[command(subcommand)]
        subcmd: config::ConfigCommands,
    },
    #[command(name = "key", about = "Create, import or show the signing key")]
    Key {
        #[command(subcommand)]
        subcmd: key::KeyCommands,
    },
    #[command(name = "validator", about = "Read or complete validator changes on the manager")]
    Validator {
        #[command(subcommand)]
        subcmd: validator::ValidatorCommands,
    },
    #[command(name = "staking", about = "Proof-of-stake validators and delegators")]
    Staking {
        #[command(subcommand)]
        subcmd: staking::StakingCommands,
    },
    #[command(name = "message", about = "Pack and unpack P-Chain messages offline")]
    Message {
        #[command(subcommand)]
        subcmd: message::MessageCommands,
    },
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Lets .env provide the VALMAN_* flags and keyfile passwords
    _ = dotenvy::dotenv();
    let args = Args::parse();

    // Set up tracing. Logs go to stderr so command output can be piped
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::builder().parse("valman=info,valman_contracts=info")?,
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut config = ValmanConfig::load_from_default_path()?;
    let overrides = Overrides {
        rpc_url: args.rpc_url,
        manager: args.manager,
        staking_manager: args.staking_manager,
        token: args.token,
    };
    match args.cmd {
        Commands::Config { subcmd } => config::parse_config_subcommands(subcmd, &mut config)?,
        Commands::Key { subcmd } => key::parse_key_subcommands(subcmd, &mut config)?,
        Commands::Message { subcmd } => message::parse_message_subcommands(subcmd)?,
        Commands::Validator { subcmd } => {
            let context = Context::new(config, args.network, overrides);
            validator::parse_validator_subcommands(subcmd, &context).await?
        }
        Commands::Staking { subcmd } => {
            let context = Context::new(config, args.network, overrides);
            staking::parse_staking_subcommands(subcmd, &context).await?
        }
    }

    Ok(())
}
