use std::{ops::Deref, sync::Arc};

use ethers::{
    providers::Middleware,
    types::{Address, Bytes, U256},
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, info};

use super::{
    acp99_manager::{CompletedValidatorRegistrationFilter, CompletedValidatorRemovalFilter},
    istaking_manager::{
        CompletedDelegatorRemovalFilter, IStakingManagerAbi, InitiatedDelegatorRegistrationFilter,
        InitiatedStakingValidatorRegistrationFilter, UptimeUpdatedFilter,
    },
    tx::{receipt_event, receipt_events, send_and_confirm},
    warp::with_warp_messages,
    Erc20Token, Erc20TokenStakingManagerAbi, NativeTokenStakingManagerAbi,
};
use crate::{
    error::ValmanError,
    ids::{DelegationId, NodeId, ValidationId},
    messages::{PChainOwner, BLS_PUBLIC_KEY_LENGTH},
    types::{
        DelegatorInfo, RewardInfo, StakingSettings, StakingValidatorInfo,
        MAXIMUM_DELEGATION_FEE_BIPS,
    },
};

/// How a staking manager takes stake: attached value, or an ERC20 allowance.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    Native,
    Erc20,
}

#[derive(Debug)]
enum StakingBinding<M> {
    Native(NativeTokenStakingManagerAbi<M>),
    Erc20(Erc20TokenStakingManagerAbi<M>),
}

impl<M> Clone for StakingBinding<M> {
    fn clone(&self) -> Self {
        match self {
            Self::Native(b) => Self::Native(b.clone()),
            Self::Erc20(b) => Self::Erc20(b.clone()),
        }
    }
}

/// Runs the same expression against whichever binding is loaded. The two bindings generate
/// distinct types for the same Solidity structs, so conversions happen inside the arms.
macro_rules! dispatch {
    ($self:ident, $binding:ident => $body:expr) => {
        match &$self.binding {
            StakingBinding::Native($binding) => $body,
            StakingBinding::Erc20($binding) => $body,
        }
    };
}

/// Request to register a new PoS validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorRegistration {
    pub node_id: NodeId,
    pub bls_public_key: Bytes,
    pub remaining_balance_owner: PChainOwner,
    pub disable_owner: PChainOwner,
    pub delegation_fee_bips: u16,
    pub min_stake_duration: u64,
    pub stake_amount: U256,
    pub reward_recipient: Address,
}

impl ValidatorRegistration {
    /// Client-side copy of the checks the staking manager reverts on.
    pub fn check(&self, settings: &StakingSettings) -> Result<(), ValmanError> {
        if self.node_id == NodeId::default() {
            return Err(ValmanError::Preflight("node id is empty".to_owned()));
        }
        if self.bls_public_key.len() != BLS_PUBLIC_KEY_LENGTH {
            return Err(ValmanError::Preflight(format!(
                "BLS public key is {} bytes, expected {BLS_PUBLIC_KEY_LENGTH}",
                self.bls_public_key.len()
            )));
        }
        self.remaining_balance_owner.validate()?;
        self.disable_owner.validate()?;
        if self.delegation_fee_bips < settings.minimum_delegation_fee_bips ||
            self.delegation_fee_bips > MAXIMUM_DELEGATION_FEE_BIPS
        {
            return Err(ValmanError::Preflight(format!(
                "delegation fee {} bips outside [{}, {MAXIMUM_DELEGATION_FEE_BIPS}]",
                self.delegation_fee_bips, settings.minimum_delegation_fee_bips
            )));
        }
        if self.min_stake_duration < settings.minimum_stake_duration {
            return Err(ValmanError::Preflight(format!(
                "minimum stake duration {}s is below the manager minimum of {}s",
                self.min_stake_duration, settings.minimum_stake_duration
            )));
        }
        check_stake_amount(self.stake_amount, settings)?;
        check_recipient(self.reward_recipient)
    }
}

fn check_stake_amount(amount: U256, settings: &StakingSettings) -> Result<(), ValmanError> {
    if amount < settings.minimum_stake_amount || amount > settings.maximum_stake_amount {
        return Err(ValmanError::Preflight(format!(
            "stake {amount} outside [{}, {}]",
            settings.minimum_stake_amount, settings.maximum_stake_amount
        )));
    }
    Ok(())
}

fn check_recipient(recipient: Address) -> Result<(), ValmanError> {
    if recipient.is_zero() {
        return Err(ValmanError::Preflight("reward recipient is the zero address".to_owned()));
    }
    Ok(())
}

/// Handle to a PoS staking manager. Token-agnostic transactions go through the `IStakingManager`
/// interface, which this derefs to; registration and views go through the token-specific binding.
#[derive(Debug)]
pub struct StakingManager<M> {
    interface: IStakingManagerAbi<M>,
    binding: StakingBinding<M>,
}

impl<M> Clone for StakingManager<M> {
    fn clone(&self) -> Self {
        Self { interface: self.interface.clone(), binding: self.binding.clone() }
    }
}

impl<M> Deref for StakingManager<M> {
    type Target = IStakingManagerAbi<M>;

    fn deref(&self) -> &Self::Target {
        &self.interface
    }
}

impl<M: Middleware + 'static> StakingManager<M> {
    pub fn new(address: Address, client: Arc<M>, kind: TokenKind) -> Self {
        let binding = match kind {
            TokenKind::Native => {
                StakingBinding::Native(NativeTokenStakingManagerAbi::new(address, client.clone()))
            }
            TokenKind::Erc20 => {
                StakingBinding::Erc20(Erc20TokenStakingManagerAbi::new(address, client.clone()))
            }
        };
        Self { interface: IStakingManagerAbi::new(address, client), binding }
    }

    pub fn kind(&self) -> TokenKind {
        match self.binding {
            StakingBinding::Native(_) => TokenKind::Native,
            StakingBinding::Erc20(_) => TokenKind::Erc20,
        }
    }

    pub async fn settings(&self) -> Result<StakingSettings, ValmanError> {
        Ok(dispatch!(self, b => b.get_staking_manager_settings().call().await?.into()))
    }

    pub async fn staking_validator(
        &self,
        validation_id: ValidationId,
    ) -> Result<StakingValidatorInfo, ValmanError> {
        Ok(dispatch!(self, b => b.get_staking_validator(validation_id.0).call().await?.into()))
    }

    pub async fn delegator(
        &self,
        delegation_id: DelegationId,
    ) -> Result<DelegatorInfo, ValmanError> {
        dispatch!(self, b => b.get_delegator_info(delegation_id.0).call().await?.try_into())
    }

    pub async fn validator_reward(
        &self,
        validation_id: ValidationId,
    ) -> Result<RewardInfo, ValmanError> {
        Ok(dispatch!(self, b => b.get_validator_reward_info(validation_id.0).call().await?.into()))
    }

    pub async fn delegator_reward(
        &self,
        delegation_id: DelegationId,
    ) -> Result<RewardInfo, ValmanError> {
        Ok(dispatch!(self, b => b.get_delegator_reward_info(delegation_id.0).call().await?.into()))
    }

    pub async fn value_to_weight(&self, value: U256) -> Result<u64, ValmanError> {
        Ok(dispatch!(self, b => b.value_to_weight(value).call().await?))
    }

    pub async fn weight_to_value(&self, weight: u64) -> Result<U256, ValmanError> {
        Ok(dispatch!(self, b => b.weight_to_value(weight).call().await?))
    }

    /// The staking token, for ERC20 managers only.
    pub async fn staking_token(&self) -> Result<Option<Address>, ValmanError> {
        match &self.binding {
            StakingBinding::Native(_) => Ok(None),
            StakingBinding::Erc20(b) => Ok(Some(b.erc_20().call().await?)),
        }
    }

    /// Approves the manager to pull `amount` of the staking token unless the sender's allowance
    /// already covers it.
    async fn ensure_allowance(&self, amount: U256) -> Result<(), ValmanError> {
        let Some(token) = self.staking_token().await? else {
            return Ok(());
        };
        let client = self.interface.client();
        let spender = self.interface.address();
        let erc20 = Erc20Token::new(token, client.clone());
        if let Some(owner) = client.default_sender() {
            let allowance = erc20.allowance(owner, spender).call().await?;
            if allowance >= amount {
                debug!("Allowance {allowance} already covers {amount}");
                return Ok(());
            }
        }
        send_and_confirm(erc20.approve(spender, amount), "approve").await?;
        Ok(())
    }

    /// Checks the request against the manager's settings, then initiates the registration.
    /// Returns the new validation id.
    pub async fn initiate_validator_registration(
        &self,
        request: ValidatorRegistration,
    ) -> Result<ValidationId, ValmanError> {
        let settings = self.settings().await?;
        request.check(&settings)?;
        info!("Registering {} with stake {}", request.node_id, request.stake_amount);

        let receipt = match &self.binding {
            StakingBinding::Native(b) => {
                let call = b
                    .initiate_validator_registration(
                        request.node_id.to_bytes(),
                        request.bls_public_key,
                        request.remaining_balance_owner.into(),
                        request.disable_owner.into(),
                        request.delegation_fee_bips,
                        request.min_stake_duration,
                        request.reward_recipient,
                    )
                    .value(request.stake_amount);
                send_and_confirm(call, "initiateValidatorRegistration").await?
            }
            StakingBinding::Erc20(b) => {
                self.ensure_allowance(request.stake_amount).await?;
                let call = b.initiate_validator_registration(
                    request.node_id.to_bytes(),
                    request.bls_public_key,
                    request.remaining_balance_owner.into(),
                    request.disable_owner.into(),
                    request.delegation_fee_bips,
                    request.min_stake_duration,
                    request.stake_amount,
                    request.reward_recipient,
                );
                send_and_confirm(call, "initiateValidatorRegistration").await?
            }
        };
        let event: InitiatedStakingValidatorRegistrationFilter = receipt_event(&receipt)?;
        Ok(ValidationId(event.validation_id))
    }

    /// Delegates `amount` to a validator. Returns the new delegation id.
    pub async fn initiate_delegator_registration(
        &self,
        validation_id: ValidationId,
        amount: U256,
        reward_recipient: Address,
    ) -> Result<DelegationId, ValmanError> {
        check_recipient(reward_recipient)?;
        if amount.is_zero() {
            return Err(ValmanError::Preflight("delegation amount is zero".to_owned()));
        }

        let receipt = match &self.binding {
            StakingBinding::Native(b) => {
                let call = b
                    .initiate_delegator_registration(validation_id.0, reward_recipient)
                    .value(amount);
                send_and_confirm(call, "initiateDelegatorRegistration").await?
            }
            StakingBinding::Erc20(b) => {
                self.ensure_allowance(amount).await?;
                let call =
                    b.initiate_delegator_registration(validation_id.0, amount, reward_recipient);
                send_and_confirm(call, "initiateDelegatorRegistration").await?
            }
        };
        let event: InitiatedDelegatorRegistrationFilter = receipt_event(&receipt)?;
        debug!(
            "Delegation {} raises validator weight to {}",
            DelegationId(event.delegation_id),
            event.validator_weight
        );
        Ok(DelegationId(event.delegation_id))
    }

    pub async fn complete_validator_registration(
        &self,
        warp_messages: &[Bytes],
        message_index: u32,
    ) -> Result<ValidationId, ValmanError> {
        let call = self.interface.complete_validator_registration(message_index);
        let call = with_warp_messages(call, warp_messages, message_index)?;
        let receipt = send_and_confirm(call, "completeValidatorRegistration").await?;
        let event: CompletedValidatorRegistrationFilter = receipt_event(&receipt)?;
        Ok(ValidationId(event.validation_id))
    }

    /// `force` skips the reward eligibility check, forfeiting rewards. The uptime proof, when
    /// included, is the signed ValidationUptimeMessage at `message_index` of `warp_messages`.
    pub async fn initiate_validator_removal(
        &self,
        validation_id: ValidationId,
        include_uptime_proof: bool,
        warp_messages: &[Bytes],
        message_index: u32,
        force: bool,
    ) -> Result<(), ValmanError> {
        let call = if force {
            self.interface.force_initiate_validator_removal(
                validation_id.0,
                include_uptime_proof,
                message_index,
            )
        } else {
            self.interface.initiate_validator_removal(
                validation_id.0,
                include_uptime_proof,
                message_index,
            )
        };
        let call = if include_uptime_proof {
            with_warp_messages(call, warp_messages, message_index)?
        } else {
            call
        };
        send_and_confirm(call, "initiateValidatorRemoval").await?;
        Ok(())
    }

    pub async fn complete_validator_removal(
        &self,
        warp_messages: &[Bytes],
        message_index: u32,
    ) -> Result<ValidationId, ValmanError> {
        let call = self.interface.complete_validator_removal(message_index);
        let call = with_warp_messages(call, warp_messages, message_index)?;
        let receipt = send_and_confirm(call, "completeValidatorRemoval").await?;
        let event: CompletedValidatorRemovalFilter = receipt_event(&receipt)?;
        Ok(ValidationId(event.validation_id))
    }

    pub async fn complete_delegator_registration(
        &self,
        delegation_id: DelegationId,
        warp_messages: &[Bytes],
        message_index: u32,
    ) -> Result<(), ValmanError> {
        let call = self.interface.complete_delegator_registration(delegation_id.0, message_index);
        let call = with_warp_messages(call, warp_messages, message_index)?;
        send_and_confirm(call, "completeDelegatorRegistration").await?;
        Ok(())
    }

    pub async fn initiate_delegator_removal(
        &self,
        delegation_id: DelegationId,
        include_uptime_proof: bool,
        warp_messages: &[Bytes],
        message_index: u32,
        force: bool,
    ) -> Result<(), ValmanError> {
        let call = if force {
            self.interface.force_initiate_delegator_removal(
                delegation_id.0,
                include_uptime_proof,
                message_index,
            )
        } else {
            self.interface.initiate_delegator_removal(
                delegation_id.0,
                include_uptime_proof,
                message_index,
            )
        };
        let call = if include_uptime_proof {
            with_warp_messages(call, warp_messages, message_index)?
        } else {
            call
        };
        send_and_confirm(call, "initiateDelegatorRemoval").await?;
        Ok(())
    }

    /// Returns the rewards paid to the delegator and the fees paid to the validator.
    pub async fn complete_delegator_removal(
        &self,
        delegation_id: DelegationId,
        warp_messages: &[Bytes],
        message_index: u32,
    ) -> Result<(U256, U256), ValmanError> {
        let call = self.interface.complete_delegator_removal(delegation_id.0, message_index);
        let call = with_warp_messages(call, warp_messages, message_index)?;
        let receipt = send_and_confirm(call, "completeDelegatorRemoval").await?;
        let event: CompletedDelegatorRemovalFilter = receipt_event(&receipt)?;
        Ok((event.rewards, event.fees))
    }

    pub async fn resend_update_delegator(
        &self,
        delegation_id: DelegationId,
    ) -> Result<(), ValmanError> {
        send_and_confirm(
            self.interface.resend_update_delegator(delegation_id.0),
            "resendUpdateDelegator",
        )
        .await?;
        Ok(())
    }

    /// Returns the new uptime, or `None` when the proof did not raise the recorded uptime.
    pub async fn submit_uptime_proof(
        &self,
        validation_id: ValidationId,
        warp_messages: &[Bytes],
        message_index: u32,
    ) -> Result<Option<u64>, ValmanError> {
        let call = self.interface.submit_uptime_proof(validation_id.0, message_index);
        let call = with_warp_messages(call, warp_messages, message_index)?;
        let receipt = send_and_confirm(call, "submitUptimeProof").await?;
        Ok(receipt_events::<UptimeUpdatedFilter>(&receipt).first().map(|event| event.uptime))
    }

    pub async fn claim_delegation_fees(
        &self,
        validation_id: ValidationId,
    ) -> Result<(), ValmanError> {
        send_and_confirm(
            self.interface.claim_delegation_fees(validation_id.0),
            "claimDelegationFees",
        )
        .await?;
        Ok(())
    }

    pub async fn change_validator_reward_recipient(
        &self,
        validation_id: ValidationId,
        recipient: Address,
    ) -> Result<(), ValmanError> {
        check_recipient(recipient)?;
        let call = self.interface.change_validator_reward_recipient(validation_id.0, recipient);
        send_and_confirm(call, "changeValidatorRewardRecipient").await?;
        Ok(())
    }

    pub async fn change_delegator_reward_recipient(
        &self,
        delegation_id: DelegationId,
        recipient: Address,
    ) -> Result<(), ValmanError> {
        check_recipient(recipient)?;
        let call = self.interface.change_delegator_reward_recipient(delegation_id.0, recipient);
        send_and_confirm(call, "changeDelegatorRewardRecipient").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ethers::{
        abi::{encode, Token},
        providers::{MockProvider, Provider},
    };

    use super::*;
    use crate::{ids::BlockchainId, messages::MessageError};

    fn settings() -> StakingSettings {
        StakingSettings {
            manager: Address::from([1; 20]),
            minimum_stake_amount: U256::from(100u64),
            maximum_stake_amount: U256::from(10_000u64),
            minimum_stake_duration: 3_600,
            minimum_delegation_fee_bips: 100,
            maximum_stake_multiplier: 4,
            weight_to_value_factor: U256::from(1u64),
            reward_calculator: Address::from([2; 20]),
            uptime_blockchain_id: BlockchainId([3; 32]),
        }
    }

    fn request() -> ValidatorRegistration {
        ValidatorRegistration {
            node_id: NodeId([4; 20]),
            bls_public_key: Bytes::from(vec![5; 48]),
            remaining_balance_owner: PChainOwner::new(1, vec![Address::from([6; 20])]),
            disable_owner: PChainOwner::new(1, vec![Address::from([6; 20])]),
            delegation_fee_bips: 200,
            min_stake_duration: 7_200,
            stake_amount: U256::from(1_000u64),
            reward_recipient: Address::from([7; 20]),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(request().check(&settings()).is_ok());
    }

    #[test]
    fn test_fee_bounds() {
        let mut low = request();
        low.delegation_fee_bips = 99;
        assert!(matches!(low.check(&settings()), Err(ValmanError::Preflight(_))));

        let mut high = request();
        high.delegation_fee_bips = 10_001;
        assert!(matches!(high.check(&settings()), Err(ValmanError::Preflight(_))));

        let mut max = request();
        max.delegation_fee_bips = 10_000;
        assert!(max.check(&settings()).is_ok());
    }

    #[test]
    fn test_stake_and_duration_bounds() {
        let mut short = request();
        short.min_stake_duration = 3_599;
        assert!(short.check(&settings()).is_err());

        let mut small = request();
        small.stake_amount = U256::from(99u64);
        assert!(small.check(&settings()).is_err());

        let mut big = request();
        big.stake_amount = U256::from(10_001u64);
        assert!(big.check(&settings()).is_err());
    }

    #[test]
    fn test_key_owner_and_recipient_checks() {
        let mut bad_key = request();
        bad_key.bls_public_key = Bytes::from(vec![5; 32]);
        assert!(matches!(bad_key.check(&settings()), Err(ValmanError::Preflight(_))));

        let mut bad_owner = request();
        bad_owner.disable_owner = PChainOwner::new(2, vec![Address::from([6; 20])]);
        assert!(matches!(
            bad_owner.check(&settings()),
            Err(ValmanError::MessageError(MessageError::InvalidPChainOwnerThreshold { .. }))
        ));

        let mut no_recipient = request();
        no_recipient.reward_recipient = Address::zero();
        assert!(no_recipient.check(&settings()).is_err());

        let mut no_node = request();
        no_node.node_id = NodeId::default();
        assert!(no_node.check(&settings()).is_err());
    }

    #[test]
    fn test_token_kind_parses() {
        assert_eq!("erc20".parse::<TokenKind>().unwrap(), TokenKind::Erc20);
        assert_eq!(TokenKind::Native.to_string(), "native");
    }

    #[tokio::test]
    async fn test_settings_read_through_native_binding() {
        let (provider, mock) = Provider::<MockProvider>::mocked();
        let manager =
            StakingManager::new(Address::from([9; 20]), Arc::new(provider), TokenKind::Native);
        let s = settings();
        let tuple = Token::Tuple(vec![
            Token::Address(s.manager),
            Token::Uint(s.minimum_stake_amount),
            Token::Uint(s.maximum_stake_amount),
            Token::Uint(s.minimum_stake_duration.into()),
            Token::Uint(s.minimum_delegation_fee_bips.into()),
            Token::Uint(s.maximum_stake_multiplier.into()),
            Token::Uint(s.weight_to_value_factor),
            Token::Address(s.reward_calculator),
            Token::FixedBytes(s.uptime_blockchain_id.0.to_vec()),
        ]);
        mock.push::<Bytes, Bytes>(encode(&[tuple]).into()).unwrap();

        assert_eq!(manager.kind(), TokenKind::Native);
        assert_eq!(manager.settings().await.unwrap(), s);
        assert_eq!(manager.staking_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delegation_preflight_rejects_zero_amount() {
        let (provider, _mock) = Provider::<MockProvider>::mocked();
        let manager =
            StakingManager::new(Address::from([9; 20]), Arc::new(provider), TokenKind::Erc20);
        let (id, recipient) = (ValidationId([1; 32]), Address::from([1; 20]));
        let err = manager
            .initiate_delegator_registration(id, U256::zero(), recipient)
            .await
            .unwrap_err();
        assert!(matches!(err, ValmanError::Preflight(_)));
    }

    #[tokio::test]
    async fn test_uptime_proof_requires_signed_message() {
        let (provider, _mock) = Provider::<MockProvider>::mocked();
        let manager =
            StakingManager::new(Address::from([9; 20]), Arc::new(provider), TokenKind::Native);
        let id = ValidationId([1; 32]);

        let err = manager.initiate_validator_removal(id, true, &[], 0, false).await.unwrap_err();
        assert!(matches!(err, ValmanError::Preflight(_)));
        let err = manager.submit_uptime_proof(id, &[], 0).await.unwrap_err();
        assert!(matches!(err, ValmanError::Preflight(_)));
    }
}
