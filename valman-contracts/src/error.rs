use ethers::{
    contract::{ContractError, ContractRevert},
    providers::{JsonRpcError, Middleware, MiddlewareError as _, ProviderError},
    types::{Bytes, TxHash},
    utils::hex,
};
use thiserror::Error;

use crate::{
    contracts::{
        erc20_token_staking_manager::Erc20TokenStakingManagerAbiErrors,
        validator_messages::ValidatorMessagesAbiErrors,
    },
    ids::IdError,
    messages::MessageError,
};

pub type Result<T> = std::result::Result<T, ValmanError>;

#[derive(Debug, Error)]
pub enum ValmanError {
    #[error("Contract call failed: {0}")]
    ContractError(String),

    #[error("Middleware error: {0}")]
    MiddlewareError(String),

    #[error("Contract reverted: {}", describe_revert(.0))]
    ContractRevert(Bytes),

    #[error("JSON RPC Error {0}")]
    JsonRpcError(JsonRpcError),

    #[error(transparent)]
    ProviderError(#[from] ProviderError),

    #[error("Could not decode contract data: {0}")]
    AbiError(#[from] ethers::abi::Error),

    #[error("Signer setup failed: {0}")]
    SignerError(String),

    #[error("Log query failed: {0}")]
    LogQueryError(String),

    #[error("Invalid RPC url {0}")]
    InvalidRpcUrl(String),

    #[error("Transaction {0:?} was dropped from the mempool")]
    TransactionDropped(TxHash),

    #[error("Transaction {0:?} reverted")]
    TransactionReverted(TxHash),

    #[error("Receipt of {tx:?} has no {event} event")]
    MissingEvent { tx: TxHash, event: String },

    #[error("Unknown {kind} status {value}")]
    InvalidStatus { kind: &'static str, value: u8 },

    #[error("Rejected before sending: {0}")]
    Preflight(String),

    #[error(transparent)]
    MessageError(#[from] MessageError),

    #[error(transparent)]
    IdError(#[from] IdError),
}

impl<M: Middleware> From<ContractError<M>> for ValmanError {
    fn from(value: ContractError<M>) -> Self {
        match value {
            ContractError::Revert(bytes) => ValmanError::ContractRevert(bytes),
            ContractError::MiddlewareError { e } => match e.as_error_response().cloned() {
                Some(err) => ValmanError::JsonRpcError(err),
                None => ValmanError::MiddlewareError(e.to_string()),
            },
            ContractError::ProviderError { e } => match e.as_error_response().cloned() {
                Some(err) => ValmanError::JsonRpcError(err),
                None => ValmanError::ProviderError(e),
            },
            ContractError::DecodingError(e) => ValmanError::AbiError(e),
            other => ValmanError::ContractError(other.to_string()),
        }
    }
}

impl ValmanError {
    /// Revert data, whether it came back directly or inside a JSON-RPC error response.
    pub fn revert_data(&self) -> Option<Bytes> {
        match self {
            ValmanError::ContractRevert(bytes) => Some(bytes.clone()),
            ValmanError::JsonRpcError(err) => err.as_revert_data(),
            _ => None,
        }
    }
}

/// Decodes revert data against the custom errors of the staking managers and the message
/// library. The ERC20 staking manager declares a superset of the native manager's errors.
pub fn decode_revert(data: &[u8]) -> Option<String> {
    if let Some(err) = Erc20TokenStakingManagerAbiErrors::decode_with_selector(data) {
        return Some(format!("{err:?}"));
    }
    ValidatorMessagesAbiErrors::decode_with_selector(data).map(|err| format!("{err:?}"))
}

fn describe_revert(data: &Bytes) -> String {
    decode_revert(data).unwrap_or_else(|| format!("0x{}", hex::encode(data)))
}

#[cfg(test)]
mod tests {
    use ethers::{
        abi::AbiEncode,
        providers::{Http, Provider},
    };

    use super::*;
    use crate::contracts::erc20_token_staking_manager::InvalidDelegationFee;

    #[test]
    fn test_revert_is_decoded_by_name() {
        let data: Bytes = Erc20TokenStakingManagerAbiErrors::InvalidDelegationFee(
            InvalidDelegationFee { delegation_fee_bips: 10_001 },
        )
        .encode()
        .into();
        let decoded = decode_revert(&data).unwrap();
        assert!(decoded.contains("InvalidDelegationFee"));

        let err: ValmanError = ContractError::<Provider<Http>>::Revert(data).into();
        assert!(err.to_string().contains("InvalidDelegationFee"));
    }

    #[test]
    fn test_middleware_failure_keeps_its_message() {
        let e = ProviderError::CustomError("signer is locked".to_owned());
        let err: ValmanError = ContractError::<Provider<Http>>::MiddlewareError { e }.into();
        assert!(err.to_string().contains("signer is locked"));
        assert!(matches!(err, ValmanError::MiddlewareError(_)));

        let err: ValmanError = ContractError::<Provider<Http>>::ContractNotDeployed.into();
        assert!(matches!(err, ValmanError::ContractError(_)));
    }

    #[test]
    fn test_unknown_revert_is_shown_as_hex() {
        let err = ValmanError::ContractRevert(Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(err.to_string(), "Contract reverted: 0xdeadbeef");
        assert!(decode_revert(&[0xde, 0xad, 0xbe, 0xef]).is_none());
    }
}
