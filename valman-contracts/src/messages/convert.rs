//! Conversions between the native message types and the tuple structs abigen generates for each
//! contract. Every binding module gets its own copy of the Solidity structs, hence the macros.

use super::{ConversionData, InitialValidator, PChainOwner, ValidationPeriod};
use crate::contracts::{
    acp99_manager, erc20_token_staking_manager, native_token_staking_manager, validator_messages,
};

macro_rules! impl_pchain_owner {
    ($($module:ident),+) => {$(
        impl From<PChainOwner> for $module::PchainOwner {
            fn from(owner: PChainOwner) -> Self {
                Self { threshold: owner.threshold, addresses: owner.addresses }
            }
        }

        impl From<$module::PchainOwner> for PChainOwner {
            fn from(owner: $module::PchainOwner) -> Self {
                Self { threshold: owner.threshold, addresses: owner.addresses }
            }
        }
    )+};
}

macro_rules! impl_conversion_data {
    ($($module:ident),+) => {$(
        impl From<ConversionData> for $module::ConversionData {
            fn from(data: ConversionData) -> Self {
                Self {
                    subnet_id: data.subnet_id.into(),
                    validator_manager_blockchain_id: data.validator_manager_blockchain_id.into(),
                    validator_manager_address: data.validator_manager_address,
                    initial_validators: data
                        .initial_validators
                        .into_iter()
                        .map(|v| $module::InitialValidator {
                            node_id: v.node_id,
                            bls_public_key: v.bls_public_key,
                            weight: v.weight,
                        })
                        .collect(),
                }
            }
        }

        impl From<$module::ConversionData> for ConversionData {
            fn from(data: $module::ConversionData) -> Self {
                Self {
                    subnet_id: data.subnet_id.into(),
                    validator_manager_blockchain_id: data.validator_manager_blockchain_id.into(),
                    validator_manager_address: data.validator_manager_address,
                    initial_validators: data
                        .initial_validators
                        .into_iter()
                        .map(|v| InitialValidator {
                            node_id: v.node_id,
                            bls_public_key: v.bls_public_key,
                            weight: v.weight,
                        })
                        .collect(),
                }
            }
        }
    )+};
}

impl_pchain_owner!(native_token_staking_manager, erc20_token_staking_manager, validator_messages);
impl_conversion_data!(acp99_manager, validator_messages);

impl From<ValidationPeriod> for validator_messages::ValidationPeriod {
    fn from(period: ValidationPeriod) -> Self {
        Self {
            subnet_id: period.subnet_id.into(),
            node_id: period.node_id,
            bls_public_key: period.bls_public_key,
            registration_expiry: period.registration_expiry,
            remaining_balance_owner: period.remaining_balance_owner.into(),
            disable_owner: period.disable_owner.into(),
            weight: period.weight,
        }
    }
}

impl From<validator_messages::ValidationPeriod> for ValidationPeriod {
    fn from(period: validator_messages::ValidationPeriod) -> Self {
        Self {
            subnet_id: period.subnet_id.into(),
            node_id: period.node_id,
            bls_public_key: period.bls_public_key,
            registration_expiry: period.registration_expiry,
            remaining_balance_owner: period.remaining_balance_owner.into(),
            disable_owner: period.disable_owner.into(),
            weight: period.weight,
        }
    }
}
