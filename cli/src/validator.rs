use clap::Parser;
use ethers::types::BlockNumber;
use tracing::info;
use valman_contracts::{messages::ConversionData, NodeId, ValidationId};

use crate::{context::Context, error::Error, print_json, read_json_arg, WarpArgs};

#[derive(Parser, Debug, Clone)]
pub enum ValidatorCommands {
    #[command(name = "get", about = "Read a validator by validation id")]
    Get { validation_id: ValidationId },
    #[command(name = "lookup", about = "Find the validation of a node, NodeID-… or 0x hex")]
    Lookup { node_id: NodeId },
    #[command(name = "total-weight", about = "Total weight of the L1 validator set")]
    TotalWeight,
    #[command(name = "subnet", about = "Subnet id the manager serves")]
    Subnet,
    #[command(name = "history", about = "Registration requests for a validation")]
    History {
        validation_id: ValidationId,
        #[arg(long, default_value_t = 0)]
        from_block: u64,
    },
    #[command(
        name = "initialize-set",
        about = "Submit the conversion data of a subnet converted to an L1"
    )]
    InitializeSet {
        /// Conversion data as JSON, inline or a file path
        conversion: String,
        #[command(flatten)]
        warp: WarpArgs,
    },
    #[command(name = "complete-registration", about = "Complete a validator registration")]
    CompleteRegistration {
        #[command(flatten)]
        warp: WarpArgs,
    },
    #[command(name = "complete-removal", about = "Complete a validator removal")]
    CompleteRemoval {
        #[command(flatten)]
        warp: WarpArgs,
    },
    #[command(name = "complete-weight-update", about = "Acknowledge a validator weight update")]
    CompleteWeightUpdate {
        #[command(flatten)]
        warp: WarpArgs,
    },
}

pub async fn parse_validator_subcommands(
    subcmd: ValidatorCommands,
    context: &Context,
) -> Result<(), Error> {
    match subcmd {
        ValidatorCommands::Get { validation_id } => {
            let manager = context.validator_manager(context.reader()?)?;
            print_json(&manager.validator(validation_id).await?)?;
        }
        ValidatorCommands::Lookup { node_id } => {
            let manager = context.validator_manager(context.reader()?)?;
            match manager.validator_by_node(node_id).await? {
                Some((validation_id, validator)) => {
                    println!("Validation id: {validation_id}");
                    print_json(&validator)?;
                }
                None => println!("{node_id} is not a validator on this manager"),
            }
        }
        ValidatorCommands::TotalWeight => {
            let manager = context.validator_manager(context.reader()?)?;
            println!("{}", manager.total_weight().await?);
        }
        ValidatorCommands::Subnet => {
            let manager = context.validator_manager(context.reader()?)?;
            let subnet_id = manager.subnet_id().await?;
            println!("{subnet_id} ({})", subnet_id.to_cb58());
        }
        ValidatorCommands::History { validation_id, from_block } => {
            let manager = context.validator_manager(context.reader()?)?;
            let history = manager
                .registration_history(validation_id, BlockNumber::Number(from_block.into()))
                .await?;
            if history.is_empty() {
                println!("No registration found for {validation_id}");
            }
            for (event, meta) in history {
                let (block, tx) = (meta.block_number, meta.transaction_hash);
                println!(
                    "block {block} tx {tx:?}: weight {} expiring at {}",
                    event.weight, event.registration_expiry
                );
            }
        }
        ValidatorCommands::InitializeSet { conversion, warp } => {
            let conversion: ConversionData = read_json_arg(&conversion)?;
            let manager = context.validator_manager(context.signer().await?)?;
            let ids = manager
                .initialize_validator_set(conversion, &warp.warp_messages, warp.message_index)
                .await?;
            info!("Initial validator set registered");
            for id in ids {
                println!("{id}");
            }
        }
        ValidatorCommands::CompleteRegistration { warp } => {
            let manager = context.validator_manager(context.signer().await?)?;
            let validation_id =
                manager.complete_registration(&warp.warp_messages, warp.message_index).await?;
            println!("Registered {validation_id}");
        }
        ValidatorCommands::CompleteRemoval { warp } => {
            let manager = context.validator_manager(context.signer().await?)?;
            let validation_id =
                manager.complete_removal(&warp.warp_messages, warp.message_index).await?;
            println!("Removed {validation_id}");
        }
        ValidatorCommands::CompleteWeightUpdate { warp } => {
            let manager = context.validator_manager(context.signer().await?)?;
            let (validation_id, nonce) =
                manager.complete_weight_update(&warp.warp_messages, warp.message_index).await?;
            println!("Weight update {nonce} of {validation_id} acknowledged");
        }
    }
    Ok(())
}
