use std::sync::Arc;

use ethers::{
    providers::{Http, Middleware, Provider},
    types::Address,
};
use tracing::debug;
use valman_contracts::{
    provider::{connect_http, connect_signer},
    StakingManager, TokenKind, ValidatorManager, ValmanProvider,
};

use crate::{
    config::{Network, ValmanConfig},
    error::Error,
};

/// Command line overrides layered over the stored config.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub rpc_url: Option<String>,
    pub manager: Option<Address>,
    pub staking_manager: Option<Address>,
    pub token: Option<TokenKind>,
}

/// Everything a command needs to reach the managers.
#[derive(Clone, Debug)]
pub struct Context {
    pub config: ValmanConfig,
    pub network: Network,
    overrides: Overrides,
}

impl Context {
    pub fn new(config: ValmanConfig, network: Network, overrides: Overrides) -> Self {
        Self { config, network, overrides }
    }

    pub fn rpc_url(&self) -> &str {
        self.overrides.rpc_url.as_deref().unwrap_or_else(|| self.config.rpc_url(self.network))
    }

    pub fn manager_address(&self) -> Result<Address, Error> {
        self.overrides.manager.or(self.config.validator_manager).ok_or(Error::NoManagerAddress)
    }

    /// The staking manager and its token kind. A `--token` flag wins over the stored kind, and an
    /// address given only on the command line defaults to native staking.
    pub fn staking_manager_target(&self) -> Result<(Address, TokenKind), Error> {
        let stored = self.config.staking_manager.as_ref();
        let address = self
            .overrides
            .staking_manager
            .or(stored.map(|s| s.address))
            .ok_or(Error::NoStakingManager)?;
        let token = self
            .overrides
            .token
            .or(stored.filter(|s| s.address == address).map(|s| s.token))
            .unwrap_or(TokenKind::Native);
        Ok((address, token))
    }

    pub fn reader(&self) -> Result<Arc<Provider<Http>>, Error> {
        Ok(connect_http(self.rpc_url())?)
    }

    /// Decrypts the configured keyfile and binds it to the endpoint's chain.
    pub async fn signer(&self) -> Result<Arc<ValmanProvider>, Error> {
        let keyfile = self.config.default_keyfile.as_ref().ok_or(Error::NoKeyfile)?;
        let wallet = keyfile.decrypt_or_prompt()?;
        debug!("Signing as {:?} through {}", keyfile.address, self.rpc_url());
        Ok(connect_signer(self.rpc_url(), wallet).await?)
    }

    pub fn validator_manager<M: Middleware + 'static>(
        &self,
        client: Arc<M>,
    ) -> Result<ValidatorManager<M>, Error> {
        Ok(ValidatorManager::new(self.manager_address()?, client))
    }

    pub fn staking_manager<M: Middleware + 'static>(
        &self,
        client: Arc<M>,
    ) -> Result<StakingManager<M>, Error> {
        let (address, token) = self.staking_manager_target()?;
        Ok(StakingManager::new(address, client, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StakingManagerConfig;

    fn stored() -> ValmanConfig {
        let mut config = ValmanConfig::default();
        config.validator_manager = Some(Address::from([1; 20]));
        config.staking_manager =
            Some(StakingManagerConfig { address: Address::from([2; 20]), token: TokenKind::Erc20 });
        config
    }

    #[test]
    fn test_stored_values_are_used_without_overrides() {
        let context = Context::new(stored(), Network::Mainnet, Overrides::default());
        assert_eq!(context.rpc_url(), "https://api.avax.network/ext/bc/C/rpc");
        assert_eq!(context.manager_address().unwrap(), Address::from([1; 20]));
        assert_eq!(
            context.staking_manager_target().unwrap(),
            (Address::from([2; 20]), TokenKind::Erc20)
        );
    }

    #[test]
    fn test_overrides_win() {
        let overrides = Overrides {
            rpc_url: Some("http://localhost:9650/ext/bc/l1/rpc".to_owned()),
            manager: Some(Address::from([3; 20])),
            staking_manager: Some(Address::from([4; 20])),
            token: None,
        };
        let context = Context::new(stored(), Network::Fuji, overrides);
        assert_eq!(context.rpc_url(), "http://localhost:9650/ext/bc/l1/rpc");
        assert_eq!(context.manager_address().unwrap(), Address::from([3; 20]));
        // The stored token kind belongs to another address
        assert_eq!(
            context.staking_manager_target().unwrap(),
            (Address::from([4; 20]), TokenKind::Native)
        );
    }

    #[test]
    fn test_missing_addresses_are_reported() {
        let context = Context::new(ValmanConfig::default(), Network::Local, Overrides::default());
        assert!(matches!(context.manager_address(), Err(Error::NoManagerAddress)));
        assert!(matches!(context.staking_manager_target(), Err(Error::NoStakingManager)));
        assert!(context.reader().is_ok());
    }

    #[tokio::test]
    async fn test_signer_requires_keyfile() {
        let context = Context::new(ValmanConfig::default(), Network::Local, Overrides::default());
        assert!(matches!(context.signer().await, Err(Error::NoKeyfile)));
    }
}
