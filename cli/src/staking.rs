use clap::Parser;
use ethers::types::{Address, Bytes, U256};
use valman_contracts::{
    ids::parse_pchain_address, messages::PChainOwner, DelegationId, NodeId, ValidationId,
    ValidatorRegistration,
};

use crate::{context::Context, error::Error, print_json, WarpArgs};

/// Parses a token amount in wei. U256's own `FromStr` reads hex.
pub fn parse_wei(amount: &str) -> Result<U256, String> {
    U256::from_dec_str(amount.trim()).map_err(|e| format!("invalid amount {amount}: {e}"))
}

#[derive(Parser, Debug, Clone)]
pub enum StakingCommands {
    #[command(name = "settings", about = "Staking manager settings")]
    Settings,
    #[command(name = "validator", about = "Staking details and reward of a validator")]
    Validator { validation_id: ValidationId },
    #[command(name = "delegator", about = "Delegation details and reward of a delegator")]
    Delegator { delegation_id: DelegationId },
    #[command(name = "register-validator", about = "Stake and initiate a validator registration")]
    RegisterValidator {
        #[arg(long)]
        node_id: NodeId,
        /// 48-byte compressed BLS public key, 0x hex
        #[arg(long)]
        bls_public_key: Bytes,
        /// Stake in wei
        #[arg(long, value_parser = parse_wei)]
        stake: U256,
        #[arg(long)]
        delegation_fee_bips: u16,
        /// Minimum stake duration in seconds
        #[arg(long)]
        min_stake_duration: u64,
        /// P-Chain addresses that receive the remaining balance, P-avax1… or 0x hex
        #[arg(long = "owner", required = true, value_parser = parse_pchain_address)]
        owners: Vec<Address>,
        #[arg(long, default_value_t = 1)]
        owner_threshold: u32,
        /// P-Chain addresses allowed to disable the validator. Defaults to the owners
        #[arg(long = "disable-owner", value_parser = parse_pchain_address)]
        disable_owners: Vec<Address>,
        #[arg(long)]
        disable_threshold: Option<u32>,
        /// Defaults to the signing address
        #[arg(long)]
        reward_recipient: Option<Address>,
    },
    #[command(name = "register-delegator", about = "Stake and initiate a delegation")]
    RegisterDelegator {
        validation_id: ValidationId,
        /// Stake in wei
        #[arg(long, value_parser = parse_wei)]
        amount: U256,
        #[arg(long)]
        reward_recipient: Option<Address>,
    },
    #[command(
        name = "complete-validator-registration",
        about = "Complete a PoS validator registration"
    )]
    CompleteValidatorRegistration {
        #[command(flatten)]
        warp: WarpArgs,
    },
    #[command(name = "complete-delegator-registration", about = "Complete a delegation")]
    CompleteDelegatorRegistration {
        delegation_id: DelegationId,
        #[command(flatten)]
        warp: WarpArgs,
    },
    #[command(name = "remove-validator", about = "Initiate the removal of a PoS validator")]
    RemoveValidator {
        validation_id: ValidationId,
        /// Submit the signed uptime message at --message-index along with the removal
        #[arg(long)]
        include_uptime_proof: bool,
        #[command(flatten)]
        warp: WarpArgs,
        /// Remove even when the validator is not eligible for rewards
        #[arg(long)]
        force: bool,
    },
    #[command(name = "complete-validator-removal", about = "Complete a PoS validator removal")]
    CompleteValidatorRemoval {
        #[command(flatten)]
        warp: WarpArgs,
    },
    #[command(name = "remove-delegator", about = "Initiate the end of a delegation")]
    RemoveDelegator {
        delegation_id: DelegationId,
        #[arg(long)]
        include_uptime_proof: bool,
        #[command(flatten)]
        warp: WarpArgs,
        #[arg(long)]
        force: bool,
    },
    #[command(name = "complete-delegator-removal", about = "Complete the end of a delegation")]
    CompleteDelegatorRemoval {
        delegation_id: DelegationId,
        #[command(flatten)]
        warp: WarpArgs,
    },
    #[command(name = "submit-uptime", about = "Submit a validation uptime proof")]
    SubmitUptime {
        validation_id: ValidationId,
        #[command(flatten)]
        warp: WarpArgs,
    },
    #[command(name = "claim-fees", about = "Claim the delegation fees of a validator")]
    ClaimFees { validation_id: ValidationId },
    #[command(name = "set-reward-recipient", about = "Change where rewards are sent")]
    SetRewardRecipient {
        recipient: Address,
        #[arg(long, required_unless_present = "delegation_id", conflicts_with = "delegation_id")]
        validation_id: Option<ValidationId>,
        #[arg(long)]
        delegation_id: Option<DelegationId>,
    },
    #[command(
        name = "resend-delegator-update",
        about = "Resend the weight update of a delegation"
    )]
    ResendDelegatorUpdate { delegation_id: DelegationId },
}

fn owner(addresses: Vec<Address>, threshold: u32) -> Result<PChainOwner, Error> {
    Ok(PChainOwner::new(threshold, addresses).normalized()?)
}

pub async fn parse_staking_subcommands(
    subcmd: StakingCommands,
    context: &Context,
) -> Result<(), Error> {
    match subcmd {
        StakingCommands::Settings => {
            let manager = context.staking_manager(context.reader()?)?;
            println!("Token: {}", manager.kind());
            if let Some(token) = manager.staking_token().await? {
                println!("Staking token: {token:?}");
            }
            print_json(&manager.settings().await?)?;
        }
        StakingCommands::Validator { validation_id } => {
            let manager = context.staking_manager(context.reader()?)?;
            print_json(&manager.staking_validator(validation_id).await?)?;
            print_json(&manager.validator_reward(validation_id).await?)?;
        }
        StakingCommands::Delegator { delegation_id } => {
            let manager = context.staking_manager(context.reader()?)?;
            print_json(&manager.delegator(delegation_id).await?)?;
            print_json(&manager.delegator_reward(delegation_id).await?)?;
        }
        StakingCommands::RegisterValidator {
            node_id,
            bls_public_key,
            stake,
            delegation_fee_bips,
            min_stake_duration,
            owners,
            owner_threshold,
            disable_owners,
            disable_threshold,
            reward_recipient,
        } => {
            let remaining_balance_owner = owner(owners.clone(), owner_threshold)?;
            let disable_owner = if disable_owners.is_empty() {
                owner(owners, disable_threshold.unwrap_or(owner_threshold))?
            } else {
                owner(disable_owners, disable_threshold.unwrap_or(1))?
            };
            let client = context.signer().await?;
            let request = ValidatorRegistration {
                node_id,
                bls_public_key,
                remaining_balance_owner,
                disable_owner,
                delegation_fee_bips,
                min_stake_duration,
                stake_amount: stake,
                reward_recipient: reward_recipient.unwrap_or(client.address()),
            };
            let manager = context.staking_manager(client)?;
            let validation_id = manager.initiate_validator_registration(request).await?;
            println!("Registration of {node_id} initiated: {validation_id}");
        }
        StakingCommands::RegisterDelegator { validation_id, amount, reward_recipient } => {
            let client = context.signer().await?;
            let recipient = reward_recipient.unwrap_or(client.address());
            let manager = context.staking_manager(client)?;
            let delegation_id =
                manager.initiate_delegator_registration(validation_id, amount, recipient).await?;
            println!("Delegation to {validation_id} initiated: {delegation_id}");
        }
        StakingCommands::CompleteValidatorRegistration { warp } => {
            let manager = context.staking_manager(context.signer().await?)?;
            let validation_id = manager
                .complete_validator_registration(&warp.warp_messages, warp.message_index)
                .await?;
            println!("Registered {validation_id}");
        }
        StakingCommands::CompleteDelegatorRegistration { delegation_id, warp } => {
            let manager = context.staking_manager(context.signer().await?)?;
            manager
                .complete_delegator_registration(
                    delegation_id,
                    &warp.warp_messages,
                    warp.message_index,
                )
                .await?;
            println!("Delegation {delegation_id} active");
        }
        StakingCommands::RemoveValidator { validation_id, include_uptime_proof, warp, force } => {
            let manager = context.staking_manager(context.signer().await?)?;
            manager
                .initiate_validator_removal(
                    validation_id,
                    include_uptime_proof,
                    &warp.warp_messages,
                    warp.message_index,
                    force,
                )
                .await?;
            println!("Removal of {validation_id} initiated");
        }
        StakingCommands::CompleteValidatorRemoval { warp } => {
            let manager = context.staking_manager(context.signer().await?)?;
            let validation_id =
                manager.complete_validator_removal(&warp.warp_messages, warp.message_index).await?;
            println!("Removed {validation_id}");
        }
        StakingCommands::RemoveDelegator { delegation_id, include_uptime_proof, warp, force } => {
            let manager = context.staking_manager(context.signer().await?)?;
            manager
                .initiate_delegator_removal(
                    delegation_id,
                    include_uptime_proof,
                    &warp.warp_messages,
                    warp.message_index,
                    force,
                )
                .await?;
            println!("Removal of delegation {delegation_id} initiated");
        }
        StakingCommands::CompleteDelegatorRemoval { delegation_id, warp } => {
            let manager = context.staking_manager(context.signer().await?)?;
            let (rewards, fees) = manager
                .complete_delegator_removal(delegation_id, &warp.warp_messages, warp.message_index)
                .await?;
            println!("Delegation {delegation_id} ended. Rewards {rewards} wei, fees {fees} wei");
        }
        StakingCommands::SubmitUptime { validation_id, warp } => {
            let manager = context.staking_manager(context.signer().await?)?;
            let messages = &warp.warp_messages;
            match manager.submit_uptime_proof(validation_id, messages, warp.message_index).await? {
                Some(uptime) => println!("Uptime of {validation_id} is now {uptime}s"),
                None => println!("Uptime of {validation_id} unchanged"),
            }
        }
        StakingCommands::ClaimFees { validation_id } => {
            let manager = context.staking_manager(context.signer().await?)?;
            manager.claim_delegation_fees(validation_id).await?;
            println!("Delegation fees of {validation_id} claimed");
        }
        StakingCommands::SetRewardRecipient { recipient, validation_id, delegation_id } => {
            let manager = context.staking_manager(context.signer().await?)?;
            // clap requires exactly one of the two ids
            if let Some(validation_id) = validation_id {
                manager.change_validator_reward_recipient(validation_id, recipient).await?;
            } else if let Some(delegation_id) = delegation_id {
                manager.change_delegator_reward_recipient(delegation_id, recipient).await?;
            }
            println!("Rewards now go to {recipient:?}");
        }
        StakingCommands::ResendDelegatorUpdate { delegation_id } => {
            let manager = context.staking_manager(context.signer().await?)?;
            manager.resend_update_delegator(delegation_id).await?;
            println!("Weight update of delegation {delegation_id} resent");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser, Debug)]
    struct Harness {
        #[command(subcommand)]
        cmd: StakingCommands,
    }

    #[test]
    fn test_parse_wei_reads_decimal() {
        assert_eq!(parse_wei("1000000000000000000").unwrap(), U256::exp10(18));
        assert!(parse_wei("0x10").is_err());
    }

    #[test]
    fn test_owners_are_sorted() {
        let owner = owner(vec![Address::from([2; 20]), Address::from([1; 20])], 1).unwrap();
        assert_eq!(owner.addresses, vec![Address::from([1; 20]), Address::from([2; 20])]);
        assert!(super::owner(vec![Address::from([1; 20])], 2).is_err());
    }

    #[test]
    fn test_register_validator_arguments() {
        let bls = format!("0x{}", "05".repeat(48));
        let owner = format!("0x{}", "01".repeat(20));
        let harness = Harness::try_parse_from([
            "staking",
            "register-validator",
            "--node-id",
            "NodeID-111111111111111111116DBWJs",
            "--bls-public-key",
            &bls,
            "--stake",
            "2000000000000000000",
            "--delegation-fee-bips",
            "100",
            "--min-stake-duration",
            "86400",
            "--owner",
            &owner,
        ])
        .unwrap();
        let StakingCommands::RegisterValidator { stake, owners, disable_owners, .. } = harness.cmd
        else {
            panic!("wrong command");
        };
        assert_eq!(stake, U256::from(2) * U256::exp10(18));
        assert_eq!(owners, vec![Address::from([1; 20])]);
        assert!(disable_owners.is_empty());
    }

    #[test]
    fn test_reward_recipient_needs_exactly_one_target() {
        let recipient = format!("0x{}", "01".repeat(20));
        let id = format!("0x{}", "02".repeat(32));
        assert!(Harness::try_parse_from(["staking", "set-reward-recipient", &recipient]).is_err());
        assert!(Harness::try_parse_from([
            "staking",
            "set-reward-recipient",
            &recipient,
            "--validation-id",
            &id,
            "--delegation-id",
            &id,
        ])
        .is_err());
        assert!(Harness::try_parse_from([
            "staking",
            "set-reward-recipient",
            &recipient,
            "--delegation-id",
            &id,
        ])
        .is_ok());
    }

    #[test]
    fn test_uptime_messages_are_collected() {
        let id = format!("0x{}", "07".repeat(32));
        let harness = Harness::try_parse_from([
            "staking",
            "remove-validator",
            &id,
            "--include-uptime-proof",
            "--warp-message",
            "0x0102",
            "--warp-message",
            "0304",
            "--message-index",
            "1",
        ])
        .unwrap();
        let StakingCommands::RemoveValidator { include_uptime_proof, warp, force, .. } = harness.cmd
        else {
            panic!("expected remove-validator");
        };
        assert!(include_uptime_proof);
        assert!(!force);
        assert_eq!(warp.warp_messages, vec![Bytes::from(vec![1, 2]), Bytes::from(vec![3, 4])]);
        assert_eq!(warp.message_index, 1);
    }
}
