use ethers::{
    abi::Detokenize,
    contract::{parse_log, ContractCall, EthEvent},
    providers::Middleware,
    types::{TransactionReceipt, U64},
};
use tracing::{debug, info};

use crate::error::ValmanError;

/// Sends a contract transaction and waits for its receipt. A receipt with status 0 is an error.
pub(crate) async fn send_and_confirm<M, D>(
    call: ContractCall<M, D>,
    action: &str,
) -> Result<TransactionReceipt, ValmanError>
where
    M: Middleware + 'static,
    D: Detokenize,
{
    let pending = call.send().await?;
    let tx_hash = pending.tx_hash();
    info!("{action}: submitted {tx_hash:?}");
    let receipt = pending.await?.ok_or(ValmanError::TransactionDropped(tx_hash))?;
    if receipt.status == Some(U64::zero()) {
        return Err(ValmanError::TransactionReverted(tx_hash));
    }
    debug!(
        "{action}: included in block {:?}, gas used {:?}",
        receipt.block_number, receipt.gas_used
    );
    Ok(receipt)
}

/// Every log in the receipt that decodes as `E`, in log order.
pub fn receipt_events<E: EthEvent>(receipt: &TransactionReceipt) -> Vec<E> {
    receipt.logs.iter().filter_map(|log| parse_log::<E>(log.clone()).ok()).collect()
}

/// The first `E` in the receipt. Staking managers emit the validator manager's events from the
/// manager's address, so logs are matched by signature only.
pub fn receipt_event<E: EthEvent>(receipt: &TransactionReceipt) -> Result<E, ValmanError> {
    receipt.logs.iter().find_map(|log| parse_log::<E>(log.clone()).ok()).ok_or_else(|| {
        ValmanError::MissingEvent { tx: receipt.transaction_hash, event: E::name().into_owned() }
    })
}
