//! Domain views of the tuples the manager contracts return. Statuses become enums and ids become
//! their typed forms, which is what the CLI and scanner print.

use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, FromRepr};

use crate::{
    contracts::{acp99_manager, erc20_token_staking_manager, native_token_staking_manager},
    error::ValmanError,
    ids::{BlockchainId, NodeId, ValidationId},
};

/// Upper bound of a delegation fee, 100% in basis points.
pub const MAXIMUM_DELEGATION_FEE_BIPS: u16 = 10_000;

#[derive(
    Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumIter, FromRepr,
)]
#[repr(u8)]
pub enum ValidatorStatus {
    Unknown = 0,
    PendingAdded,
    Active,
    PendingRemoved,
    Completed,
    Invalidated,
}

impl TryFrom<u8> for ValidatorStatus {
    type Error = ValmanError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_repr(value).ok_or(ValmanError::InvalidStatus { kind: "validator", value })
    }
}

#[derive(
    Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumIter, FromRepr,
)]
#[repr(u8)]
pub enum DelegatorStatus {
    Unknown = 0,
    PendingAdded,
    Active,
    PendingRemoved,
}

impl TryFrom<u8> for DelegatorStatus {
    type Error = ValmanError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_repr(value).ok_or(ValmanError::InvalidStatus { kind: "delegator", value })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorInfo {
    pub status: ValidatorStatus,
    /// Raw node id bytes as registered. Avalanche node ids are 20 bytes, see [`Self::node`].
    pub node_id: Bytes,
    pub starting_weight: u64,
    pub sent_nonce: u64,
    pub received_nonce: u64,
    pub weight: u64,
    pub start_time: u64,
    pub end_time: u64,
}

impl ValidatorInfo {
    pub fn node(&self) -> Option<NodeId> {
        NodeId::try_from(self.node_id.as_ref()).ok()
    }

    /// A weight change has been sent to the P-Chain but not acknowledged yet.
    pub fn has_pending_weight_update(&self) -> bool {
        self.sent_nonce > self.received_nonce
    }
}

impl TryFrom<acp99_manager::Validator> for ValidatorInfo {
    type Error = ValmanError;

    fn try_from(v: acp99_manager::Validator) -> Result<Self, Self::Error> {
        Ok(Self {
            status: v.status.try_into()?,
            node_id: v.node_id,
            starting_weight: v.starting_weight,
            sent_nonce: v.sent_nonce,
            received_nonce: v.received_nonce,
            weight: v.weight,
            start_time: v.start_time,
            end_time: v.end_time,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DelegatorInfo {
    pub status: DelegatorStatus,
    pub owner: Address,
    pub validation_id: ValidationId,
    pub weight: u64,
    pub start_time: u64,
    pub starting_nonce: u64,
    pub ending_nonce: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StakingValidatorInfo {
    pub owner: Address,
    pub delegation_fee_bips: u16,
    pub min_stake_duration: u64,
    pub uptime_seconds: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StakingSettings {
    pub manager: Address,
    pub minimum_stake_amount: U256,
    pub maximum_stake_amount: U256,
    pub minimum_stake_duration: u64,
    pub minimum_delegation_fee_bips: u16,
    pub maximum_stake_multiplier: u8,
    pub weight_to_value_factor: U256,
    pub reward_calculator: Address,
    pub uptime_blockchain_id: BlockchainId,
}

/// Reward owed to a validator or delegator and where it will be sent.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RewardInfo {
    pub recipient: Address,
    pub amount: U256,
}

impl From<(Address, U256)> for RewardInfo {
    fn from((recipient, amount): (Address, U256)) -> Self {
        Self { recipient, amount }
    }
}

macro_rules! impl_staking_views {
    ($($module:ident),+) => {$(
        impl TryFrom<$module::Delegator> for DelegatorInfo {
            type Error = ValmanError;

            fn try_from(d: $module::Delegator) -> Result<Self, Self::Error> {
                Ok(Self {
                    status: d.status.try_into()?,
                    owner: d.owner,
                    validation_id: d.validation_id.into(),
                    weight: d.weight,
                    start_time: d.start_time,
                    starting_nonce: d.starting_nonce,
                    ending_nonce: d.ending_nonce,
                })
            }
        }

        impl From<$module::PoSValidatorInfo> for StakingValidatorInfo {
            fn from(v: $module::PoSValidatorInfo) -> Self {
                Self {
                    owner: v.owner,
                    delegation_fee_bips: v.delegation_fee_bips,
                    min_stake_duration: v.min_stake_duration,
                    uptime_seconds: v.uptime_seconds,
                }
            }
        }

        impl From<$module::StakingManagerSettings> for StakingSettings {
            fn from(s: $module::StakingManagerSettings) -> Self {
                Self {
                    manager: s.manager,
                    minimum_stake_amount: s.minimum_stake_amount,
                    maximum_stake_amount: s.maximum_stake_amount,
                    minimum_stake_duration: s.minimum_stake_duration,
                    minimum_delegation_fee_bips: s.minimum_delegation_fee_bips,
                    maximum_stake_multiplier: s.maximum_stake_multiplier,
                    weight_to_value_factor: s.weight_to_value_factor,
                    reward_calculator: s.reward_calculator,
                    uptime_blockchain_id: s.uptime_blockchain_id.into(),
                }
            }
        }

        impl From<StakingSettings> for $module::StakingManagerSettings {
            fn from(s: StakingSettings) -> Self {
                Self {
                    manager: s.manager,
                    minimum_stake_amount: s.minimum_stake_amount,
                    maximum_stake_amount: s.maximum_stake_amount,
                    minimum_stake_duration: s.minimum_stake_duration,
                    minimum_delegation_fee_bips: s.minimum_delegation_fee_bips,
                    maximum_stake_multiplier: s.maximum_stake_multiplier,
                    weight_to_value_factor: s.weight_to_value_factor,
                    reward_calculator: s.reward_calculator,
                    uptime_blockchain_id: s.uptime_blockchain_id.into(),
                }
            }
        }
    )+};
}

impl_staking_views!(native_token_staking_manager, erc20_token_staking_manager);
