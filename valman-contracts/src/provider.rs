use std::sync::Arc;

use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider, Ws},
    signers::LocalWallet,
};
use tracing::debug;
use valman_signer::ValmanWallet;

use crate::error::ValmanError;

pub type ValmanProvider = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Read-only client, enough for every view call and log query.
pub fn connect_http(rpc_url: &str) -> Result<Arc<Provider<Http>>, ValmanError> {
    let provider = Provider::<Http>::try_from(rpc_url)
        .map_err(|e| ValmanError::InvalidRpcUrl(format!("{rpc_url}: {e}")))?;
    Ok(Arc::new(provider))
}

/// Signing client. The wallet is bound to the chain id the endpoint reports so transactions are
/// replay protected.
pub async fn connect_signer(
    rpc_url: &str,
    wallet: ValmanWallet,
) -> Result<Arc<ValmanProvider>, ValmanError> {
    let provider = Provider::<Http>::try_from(rpc_url)
        .map_err(|e| ValmanError::InvalidRpcUrl(format!("{rpc_url}: {e}")))?;
    let chain_id = provider.get_chainid().await?;
    debug!("Connected to chain {chain_id} as {:?}", wallet.address());
    Ok(Arc::new(SignerMiddleware::new(provider, wallet.into_signer(chain_id.as_u64()))))
}

/// Pubsub client for live event subscriptions.
pub async fn connect_ws(rpc_url: &str) -> Result<Arc<Provider<Ws>>, ValmanError> {
    let provider = Provider::<Ws>::connect_with_reconnects(rpc_url, 0).await?;
    Ok(Arc::new(provider))
}
