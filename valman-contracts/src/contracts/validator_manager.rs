use std::{ops::Deref, sync::Arc};

use ethers::{
    contract::LogMeta,
    providers::Middleware,
    types::{Address, BlockNumber, Bytes, H256},
};
use tracing::debug;

use super::{
    acp99_manager::{
        Acp99ManagerAbi, CompletedValidatorRegistrationFilter, CompletedValidatorRemovalFilter,
        CompletedValidatorWeightUpdateFilter, InitiatedValidatorRegistrationFilter,
        RegisteredInitialValidatorFilter,
    },
    tx::{receipt_event, receipt_events, send_and_confirm},
    warp::with_warp_messages,
};
use crate::{
    error::ValmanError,
    ids::{NodeId, SubnetId, ValidationId},
    messages::ConversionData,
    types::ValidatorInfo,
};

/// An ACP-99 validator manager handle with typed reads and the P-Chain acknowledgement
/// transactions. Derefs to the generated binding for everything else.
#[derive(Debug)]
pub struct ValidatorManager<M> {
    inner: Acp99ManagerAbi<M>,
}

impl<M> Clone for ValidatorManager<M> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<M> Deref for ValidatorManager<M> {
    type Target = Acp99ManagerAbi<M>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<M: Middleware + 'static> ValidatorManager<M> {
    pub fn new(address: Address, client: Arc<M>) -> Self {
        Self { inner: Acp99ManagerAbi::new(address, client) }
    }

    pub async fn subnet_id(&self) -> Result<SubnetId, ValmanError> {
        Ok(self.inner.subnet_id().call().await?.into())
    }

    pub async fn validator(
        &self,
        validation_id: ValidationId,
    ) -> Result<ValidatorInfo, ValmanError> {
        self.inner.get_validator(validation_id.0).call().await?.try_into()
    }

    /// `None` when the node has no validation on this manager.
    pub async fn node_validation_id(
        &self,
        node_id: &[u8],
    ) -> Result<Option<ValidationId>, ValmanError> {
        let id: ValidationId =
            self.get_node_validation_id(Bytes::from(node_id.to_vec())).call().await?.into();
        Ok((!id.is_zero()).then_some(id))
    }

    /// Looks a node up and reads its validator record in one go.
    pub async fn validator_by_node(
        &self,
        node_id: NodeId,
    ) -> Result<Option<(ValidationId, ValidatorInfo)>, ValmanError> {
        let Some(validation_id) = self.node_validation_id(node_id.as_bytes()).await? else {
            return Ok(None);
        };
        Ok(Some((validation_id, self.validator(validation_id).await?)))
    }

    pub async fn total_weight(&self) -> Result<u64, ValmanError> {
        Ok(self.l_1_total_weight().call().await?)
    }

    /// Submits the conversion data the P-Chain committed to, proven by the signed
    /// SubnetToL1ConversionMessage at `message_index` of `warp_messages`. Returns the validation
    /// ids of the initial validators in conversion order.
    pub async fn initialize_validator_set(
        &self,
        conversion: ConversionData,
        warp_messages: &[Bytes],
        message_index: u32,
    ) -> Result<Vec<ValidationId>, ValmanError> {
        let call = self.inner.initialize_validator_set(conversion.into(), message_index);
        let call = with_warp_messages(call, warp_messages, message_index)?;
        let receipt = send_and_confirm(call, "initializeValidatorSet").await?;
        let ids = receipt_events::<RegisteredInitialValidatorFilter>(&receipt)
            .into_iter()
            .map(|event| ValidationId(event.validation_id))
            .collect::<Vec<_>>();
        debug!("Registered {} initial validators", ids.len());
        Ok(ids)
    }

    /// Completes a registration with the P-Chain's signed L1ValidatorRegistrationMessage at
    /// `message_index` of `warp_messages`.
    pub async fn complete_registration(
        &self,
        warp_messages: &[Bytes],
        message_index: u32,
    ) -> Result<ValidationId, ValmanError> {
        let call = self.complete_validator_registration(message_index);
        let call = with_warp_messages(call, warp_messages, message_index)?;
        let receipt = send_and_confirm(call, "completeValidatorRegistration").await?;
        let event: CompletedValidatorRegistrationFilter = receipt_event(&receipt)?;
        Ok(ValidationId(event.validation_id))
    }

    pub async fn complete_removal(
        &self,
        warp_messages: &[Bytes],
        message_index: u32,
    ) -> Result<ValidationId, ValmanError> {
        let call = self.complete_validator_removal(message_index);
        let call = with_warp_messages(call, warp_messages, message_index)?;
        let receipt = send_and_confirm(call, "completeValidatorRemoval").await?;
        let event: CompletedValidatorRemovalFilter = receipt_event(&receipt)?;
        Ok(ValidationId(event.validation_id))
    }

    /// Returns the validation id and the acknowledged nonce.
    pub async fn complete_weight_update(
        &self,
        warp_messages: &[Bytes],
        message_index: u32,
    ) -> Result<(ValidationId, u64), ValmanError> {
        let call = self.complete_validator_weight_update(message_index);
        let call = with_warp_messages(call, warp_messages, message_index)?;
        let receipt = send_and_confirm(call, "completeValidatorWeightUpdate").await?;
        let event: CompletedValidatorWeightUpdateFilter = receipt_event(&receipt)?;
        Ok((ValidationId(event.validation_id), event.nonce))
    }

    /// Registration requests for one validation, oldest first. A validation is only initiated
    /// once, but a re-org can surface the log again.
    pub async fn registration_history(
        &self,
        validation_id: ValidationId,
        from_block: BlockNumber,
    ) -> Result<Vec<(InitiatedValidatorRegistrationFilter, LogMeta)>, ValmanError> {
        Ok(self
            .initiated_validator_registration_filter()
            .topic1(H256::from(validation_id.0))
            .from_block(from_block)
            .query_with_meta()
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use ethers::{
        abi::{encode, Token},
        providers::{MockProvider, Provider},
        types::U256,
    };

    use super::*;
    use crate::types::ValidatorStatus;

    fn mocked() -> (ValidatorManager<Provider<MockProvider>>, MockProvider) {
        let (provider, mock) = Provider::mocked();
        (ValidatorManager::new(Address::from([0x11; 20]), Arc::new(provider)), mock)
    }

    fn call_result(tokens: &[Token]) -> Bytes {
        encode(tokens).into()
    }

    #[tokio::test]
    async fn test_total_weight() {
        let (manager, mock) = mocked();
        mock.push::<Bytes, _>(call_result(&[Token::Uint(U256::from(1_000u64))])).unwrap();
        assert_eq!(manager.total_weight().await.unwrap(), 1_000);
    }

    #[tokio::test]
    async fn test_unknown_node_has_no_validation() {
        let (manager, mock) = mocked();
        mock.push::<Bytes, _>(call_result(&[Token::FixedBytes(vec![0; 32])])).unwrap();
        assert_eq!(manager.node_validation_id(&[1; 20]).await.unwrap(), None);

        mock.push::<Bytes, _>(call_result(&[Token::FixedBytes(vec![9; 32])])).unwrap();
        assert_eq!(
            manager.node_validation_id(&[1; 20]).await.unwrap(),
            Some(ValidationId([9; 32]))
        );
    }

    #[tokio::test]
    async fn test_validator_decodes_tuple() {
        let (manager, mock) = mocked();
        let tuple = Token::Tuple(vec![
            Token::Uint(2.into()),
            Token::Bytes(vec![4; 20]),
            Token::Uint(100.into()),
            Token::Uint(1.into()),
            Token::Uint(1.into()),
            Token::Uint(100.into()),
            Token::Uint(1_700_000_000u64.into()),
            Token::Uint(0.into()),
        ]);
        mock.push::<Bytes, _>(call_result(&[tuple])).unwrap();

        let info = manager.validator(ValidationId([1; 32])).await.unwrap();
        assert_eq!(info.status, ValidatorStatus::Active);
        assert_eq!(info.node(), Some(NodeId([4; 20])));
        assert_eq!(info.weight, 100);
        assert!(!info.has_pending_weight_update());
    }

    #[tokio::test]
    async fn test_validator_rejects_unknown_status() {
        let (manager, mock) = mocked();
        let tuple = Token::Tuple(vec![
            Token::Uint(9.into()),
            Token::Bytes(vec![]),
            Token::Uint(0.into()),
            Token::Uint(0.into()),
            Token::Uint(0.into()),
            Token::Uint(0.into()),
            Token::Uint(0.into()),
            Token::Uint(0.into()),
        ]);
        mock.push::<Bytes, _>(call_result(&[tuple])).unwrap();
        assert!(matches!(
            manager.validator(ValidationId([1; 32])).await,
            Err(ValmanError::InvalidStatus { kind: "validator", value: 9 })
        ));
    }

    #[tokio::test]
    async fn test_completion_requires_signed_message() {
        let (manager, _mock) = mocked();
        assert!(matches!(
            manager.complete_registration(&[], 0).await,
            Err(ValmanError::Preflight(_))
        ));
        let messages = [Bytes::from(vec![1; 10])];
        assert!(matches!(
            manager.complete_weight_update(&messages, 1).await,
            Err(ValmanError::Preflight(_))
        ));
    }
}
