//! Native packing of the P-Chain payloads carried in Warp messages between the validator
//! manager and the P-Chain. Every function produces exactly the bytes the on-chain
//! `ValidatorMessages` library does, so ids and messages can be computed without a node.
//!
//! All integers are big-endian. Every message starts with `codecID (uint16) ‖ typeID (uint32)`.

mod codec;
mod convert;

use ethers::types::{Address, Bytes};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::ids::{BlockchainId, ConversionId, SubnetId, ValidationId};
use codec::{Packer, Unpacker};

pub const CODEC_ID: u16 = 0;

pub const SUBNET_TO_L1_CONVERSION_MESSAGE_TYPE_ID: u32 = 0;
pub const REGISTER_L1_VALIDATOR_MESSAGE_TYPE_ID: u32 = 1;
pub const L1_VALIDATOR_REGISTRATION_MESSAGE_TYPE_ID: u32 = 2;
pub const L1_VALIDATOR_WEIGHT_MESSAGE_TYPE_ID: u32 = 3;
pub const VALIDATION_UPTIME_MESSAGE_TYPE_ID: u32 = 0;

pub const BLS_PUBLIC_KEY_LENGTH: usize = 48;

pub const SUBNET_TO_L1_CONVERSION_MESSAGE_LENGTH: usize = 38;
pub const L1_VALIDATOR_REGISTRATION_MESSAGE_LENGTH: usize = 39;
pub const L1_VALIDATOR_WEIGHT_MESSAGE_LENGTH: usize = 54;
pub const VALIDATION_UPTIME_MESSAGE_LENGTH: usize = 46;

const HEADER_LENGTH: usize = 6;
const ADDRESS_LENGTH: u32 = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("Invalid BLS public key: expected {BLS_PUBLIC_KEY_LENGTH} bytes")]
    InvalidBlsPublicKey,

    #[error("Invalid codec id {0}")]
    InvalidCodecId(u32),

    #[error("Conversion id mismatch: message carries {encoded}, conversion data hashes to {expected}")]
    InvalidConversionId { encoded: ConversionId, expected: ConversionId },

    #[error("Invalid message length {actual}, expected {expected}")]
    InvalidMessageLength { actual: u32, expected: u32 },

    #[error("Invalid message type")]
    InvalidMessageType,

    #[error("Invalid P-Chain owner: threshold {threshold} with {addresses} addresses")]
    InvalidPChainOwnerThreshold { threshold: u32, addresses: usize },

    #[error("P-Chain owner addresses must be sorted and unique")]
    PChainOwnerAddressesNotSorted,
}

/// Addresses on the P-Chain allowed to act on a validator's remaining balance or to disable it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PChainOwner {
    pub threshold: u32,
    pub addresses: Vec<Address>,
}

impl PChainOwner {
    pub fn new(threshold: u32, addresses: Vec<Address>) -> Self {
        Self { threshold, addresses }
    }

    /// Sorts the addresses before validating, since the P-Chain only accepts ascending order.
    pub fn normalized(mut self) -> Result<Self, MessageError> {
        self.addresses.sort();
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), MessageError> {
        let addresses = self.addresses.len();
        if self.threshold as usize > addresses || (self.threshold == 0 && addresses > 0) {
            return Err(MessageError::InvalidPChainOwnerThreshold {
                threshold: self.threshold,
                addresses,
            });
        }
        if !self.addresses.windows(2).all(|pair| pair[0] < pair[1]) {
            return Err(MessageError::PChainOwnerAddressesNotSorted);
        }
        Ok(())
    }

    fn pack(&self, packer: Packer) -> Packer {
        self.addresses
            .iter()
            .fold(packer.u32(self.threshold).u32(self.addresses.len() as u32), |packer, address| {
                packer.fixed(address.as_bytes())
            })
    }

    fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, MessageError> {
        let threshold = unpacker.u32()?;
        let count = unpacker.u32()?;
        let addresses = (0..count)
            .map(|_| unpacker.bytes20().map(Address::from))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { threshold, addresses })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialValidator {
    pub node_id: Bytes,
    pub bls_public_key: Bytes,
    pub weight: u64,
}

/// The validator set a subnet was converted with, as committed to on the P-Chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionData {
    pub subnet_id: SubnetId,
    pub validator_manager_blockchain_id: BlockchainId,
    pub validator_manager_address: Address,
    pub initial_validators: Vec<InitialValidator>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationPeriod {
    pub subnet_id: SubnetId,
    pub node_id: Bytes,
    pub bls_public_key: Bytes,
    pub registration_expiry: u64,
    pub remaining_balance_owner: PChainOwner,
    pub disable_owner: PChainOwner,
    pub weight: u64,
}

fn check_bls_key(key: &[u8]) -> Result<(), MessageError> {
    if key.len() != BLS_PUBLIC_KEY_LENGTH {
        return Err(MessageError::InvalidBlsPublicKey);
    }
    Ok(())
}

fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

fn header(type_id: u32, capacity: usize) -> Packer {
    Packer::with_capacity(capacity).u16(CODEC_ID).u32(type_id)
}

fn read_header(unpacker: &mut Unpacker<'_>, type_id: u32) -> Result<(), MessageError> {
    let codec_id = unpacker.u16()?;
    if codec_id != CODEC_ID {
        return Err(MessageError::InvalidCodecId(codec_id as u32));
    }
    if unpacker.u32()? != type_id {
        return Err(MessageError::InvalidMessageType);
    }
    Ok(())
}

/// Opens a fixed-size message. The length is checked before the codec and type ids.
fn open_fixed(input: &[u8], length: usize, type_id: u32) -> Result<Unpacker<'_>, MessageError> {
    if input.len() != length {
        return Err(MessageError::InvalidMessageLength {
            actual: input.len() as u32,
            expected: length as u32,
        });
    }
    let mut unpacker = Unpacker::new(input);
    read_header(&mut unpacker, type_id)?;
    Ok(unpacker)
}

/// Serializes conversion data the way the P-Chain hashes it into the conversion id. Unlike the
/// messages this has no type id.
pub fn pack_conversion_data(data: &ConversionData) -> Result<Vec<u8>, MessageError> {
    let mut packer = Packer::with_capacity(94 + data.initial_validators.len() * 88)
        .u16(CODEC_ID)
        .fixed(data.subnet_id.as_bytes())
        .fixed(data.validator_manager_blockchain_id.as_bytes())
        .u32(ADDRESS_LENGTH)
        .fixed(data.validator_manager_address.as_bytes())
        .u32(data.initial_validators.len() as u32);
    for validator in &data.initial_validators {
        check_bls_key(&validator.bls_public_key)?;
        packer = packer
            .prefixed(&validator.node_id)
            .fixed(&validator.bls_public_key)
            .u64(validator.weight);
    }
    Ok(packer.finish())
}

pub fn unpack_conversion_data(input: &[u8]) -> Result<ConversionData, MessageError> {
    let mut unpacker = Unpacker::new(input);
    let codec_id = unpacker.u16()?;
    if codec_id != CODEC_ID {
        return Err(MessageError::InvalidCodecId(codec_id as u32));
    }
    let subnet_id = SubnetId(unpacker.bytes32()?);
    let validator_manager_blockchain_id = unpacker.bytes32()?.into();
    let address_length = unpacker.u32()?;
    if address_length != ADDRESS_LENGTH {
        return Err(MessageError::InvalidMessageLength {
            actual: address_length,
            expected: ADDRESS_LENGTH,
        });
    }
    let validator_manager_address = Address::from(unpacker.bytes20()?);
    let count = unpacker.u32()?;
    let mut initial_validators = Vec::new();
    for _ in 0..count {
        let node_id = unpacker.prefixed()?.into();
        let bls_public_key = unpacker.fixed(BLS_PUBLIC_KEY_LENGTH)?.into();
        let weight = unpacker.u64()?;
        initial_validators.push(InitialValidator { node_id, bls_public_key, weight });
    }
    unpacker.finish()?;
    Ok(ConversionData {
        subnet_id,
        validator_manager_blockchain_id,
        validator_manager_address,
        initial_validators,
    })
}

pub fn conversion_id(data: &ConversionData) -> Result<ConversionId, MessageError> {
    Ok(ConversionId(sha256(&pack_conversion_data(data)?)))
}

/// Checks a SubnetToL1ConversionMessage against the conversion data the manager is being
/// initialized with, returning the shared conversion id.
pub fn verify_conversion(
    message: &[u8],
    data: &ConversionData,
) -> Result<ConversionId, MessageError> {
    let encoded = unpack_subnet_to_l1_conversion_message(message)?;
    let expected = conversion_id(data)?;
    if encoded != expected {
        return Err(MessageError::InvalidConversionId { encoded, expected });
    }
    Ok(expected)
}

pub fn pack_subnet_to_l1_conversion_message(conversion_id: ConversionId) -> Vec<u8> {
    header(SUBNET_TO_L1_CONVERSION_MESSAGE_TYPE_ID, SUBNET_TO_L1_CONVERSION_MESSAGE_LENGTH)
        .fixed(conversion_id.as_bytes())
        .finish()
}

pub fn unpack_subnet_to_l1_conversion_message(input: &[u8]) -> Result<ConversionId, MessageError> {
    let mut unpacker = open_fixed(
        input,
        SUBNET_TO_L1_CONVERSION_MESSAGE_LENGTH,
        SUBNET_TO_L1_CONVERSION_MESSAGE_TYPE_ID,
    )?;
    Ok(ConversionId(unpacker.bytes32()?))
}

/// Packs a RegisterL1ValidatorMessage. The validation id is the sha256 of the packed message.
pub fn pack_register_l1_validator_message(
    period: &ValidationPeriod,
) -> Result<(ValidationId, Vec<u8>), MessageError> {
    check_bls_key(&period.bls_public_key)?;
    let owners_length = 16 + 20 * (period.remaining_balance_owner.addresses.len()
        + period.disable_owner.addresses.len());
    let packer = header(
        REGISTER_L1_VALIDATOR_MESSAGE_TYPE_ID,
        HEADER_LENGTH + 32 + 4 + period.node_id.len() + BLS_PUBLIC_KEY_LENGTH + 8 + owners_length + 8,
    )
    .fixed(period.subnet_id.as_bytes())
    .prefixed(&period.node_id)
    .fixed(&period.bls_public_key)
    .u64(period.registration_expiry);
    let packer = period.remaining_balance_owner.pack(packer);
    let packer = period.disable_owner.pack(packer);
    let message = packer.u64(period.weight).finish();
    Ok((ValidationId(sha256(&message)), message))
}

pub fn unpack_register_l1_validator_message(
    input: &[u8],
) -> Result<ValidationPeriod, MessageError> {
    let mut unpacker = Unpacker::new(input);
    read_header(&mut unpacker, REGISTER_L1_VALIDATOR_MESSAGE_TYPE_ID)?;
    let subnet_id = SubnetId(unpacker.bytes32()?);
    let node_id = unpacker.prefixed()?.into();
    let bls_public_key = unpacker.fixed(BLS_PUBLIC_KEY_LENGTH)?.into();
    let registration_expiry = unpacker.u64()?;
    let remaining_balance_owner = PChainOwner::unpack(&mut unpacker)?;
    let disable_owner = PChainOwner::unpack(&mut unpacker)?;
    let weight = unpacker.u64()?;
    unpacker.finish()?;
    Ok(ValidationPeriod {
        subnet_id,
        node_id,
        bls_public_key,
        registration_expiry,
        remaining_balance_owner,
        disable_owner,
        weight,
    })
}

pub fn pack_l1_validator_registration_message(
    validation_id: ValidationId,
    registered: bool,
) -> Vec<u8> {
    header(L1_VALIDATOR_REGISTRATION_MESSAGE_TYPE_ID, L1_VALIDATOR_REGISTRATION_MESSAGE_LENGTH)
        .fixed(validation_id.as_bytes())
        .bool(registered)
        .finish()
}

pub fn unpack_l1_validator_registration_message(
    input: &[u8],
) -> Result<(ValidationId, bool), MessageError> {
    let mut unpacker = open_fixed(
        input,
        L1_VALIDATOR_REGISTRATION_MESSAGE_LENGTH,
        L1_VALIDATOR_REGISTRATION_MESSAGE_TYPE_ID,
    )?;
    Ok((ValidationId(unpacker.bytes32()?), unpacker.bool()?))
}

pub fn pack_l1_validator_weight_message(
    validation_id: ValidationId,
    nonce: u64,
    weight: u64,
) -> Vec<u8> {
    header(L1_VALIDATOR_WEIGHT_MESSAGE_TYPE_ID, L1_VALIDATOR_WEIGHT_MESSAGE_LENGTH)
        .fixed(validation_id.as_bytes())
        .u64(nonce)
        .u64(weight)
        .finish()
}

/// Returns `(validation_id, nonce, weight)`.
pub fn unpack_l1_validator_weight_message(
    input: &[u8],
) -> Result<(ValidationId, u64, u64), MessageError> {
    let mut unpacker = open_fixed(
        input,
        L1_VALIDATOR_WEIGHT_MESSAGE_LENGTH,
        L1_VALIDATOR_WEIGHT_MESSAGE_TYPE_ID,
    )?;
    Ok((ValidationId(unpacker.bytes32()?), unpacker.u64()?, unpacker.u64()?))
}

pub fn pack_validation_uptime_message(validation_id: ValidationId, uptime: u64) -> Vec<u8> {
    header(VALIDATION_UPTIME_MESSAGE_TYPE_ID, VALIDATION_UPTIME_MESSAGE_LENGTH)
        .fixed(validation_id.as_bytes())
        .u64(uptime)
        .finish()
}

pub fn unpack_validation_uptime_message(
    input: &[u8],
) -> Result<(ValidationId, u64), MessageError> {
    let mut unpacker =
        open_fixed(input, VALIDATION_UPTIME_MESSAGE_LENGTH, VALIDATION_UPTIME_MESSAGE_TYPE_ID)?;
    Ok((ValidationId(unpacker.bytes32()?), unpacker.u64()?))
}

/// Validation id of the validator at `index` in the conversion data.
pub fn initial_validation_id(subnet_id: SubnetId, index: u32) -> ValidationId {
    let mut preimage = [0u8; 36];
    preimage[..32].copy_from_slice(subnet_id.as_bytes());
    preimage[32..].copy_from_slice(&index.to_be_bytes());
    ValidationId(sha256(&preimage))
}

/// Any P-Chain payload the validator manager sends or receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PChainMessage {
    SubnetToL1Conversion {
        conversion_id: ConversionId,
    },
    RegisterL1Validator {
        validation_id: ValidationId,
        validation_period: ValidationPeriod,
    },
    L1ValidatorRegistration {
        validation_id: ValidationId,
        registered: bool,
    },
    L1ValidatorWeight {
        validation_id: ValidationId,
        nonce: u64,
        weight: u64,
    },
    ValidationUptime {
        validation_id: ValidationId,
        uptime_seconds: u64,
    },
}

impl PChainMessage {
    /// Decodes by type id. The conversion and uptime messages share type id 0 and are told apart
    /// by length.
    pub fn decode(input: &[u8]) -> Result<Self, MessageError> {
        if input.len() < HEADER_LENGTH {
            return Err(MessageError::InvalidMessageLength {
                actual: input.len() as u32,
                expected: HEADER_LENGTH as u32,
            });
        }
        let type_id = u32::from_be_bytes([input[2], input[3], input[4], input[5]]);
        match type_id {
            VALIDATION_UPTIME_MESSAGE_TYPE_ID
                if input.len() == VALIDATION_UPTIME_MESSAGE_LENGTH =>
            {
                let (validation_id, uptime_seconds) = unpack_validation_uptime_message(input)?;
                Ok(Self::ValidationUptime { validation_id, uptime_seconds })
            }
            SUBNET_TO_L1_CONVERSION_MESSAGE_TYPE_ID => Ok(Self::SubnetToL1Conversion {
                conversion_id: unpack_subnet_to_l1_conversion_message(input)?,
            }),
            REGISTER_L1_VALIDATOR_MESSAGE_TYPE_ID => {
                let validation_period = unpack_register_l1_validator_message(input)?;
                Ok(Self::RegisterL1Validator {
                    validation_id: ValidationId(sha256(input)),
                    validation_period,
                })
            }
            L1_VALIDATOR_REGISTRATION_MESSAGE_TYPE_ID => {
                let (validation_id, registered) = unpack_l1_validator_registration_message(input)?;
                Ok(Self::L1ValidatorRegistration { validation_id, registered })
            }
            L1_VALIDATOR_WEIGHT_MESSAGE_TYPE_ID => {
                let (validation_id, nonce, weight) = unpack_l1_validator_weight_message(input)?;
                Ok(Self::L1ValidatorWeight { validation_id, nonce, weight })
            }
            _ => Err(MessageError::InvalidMessageType),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, MessageError> {
        Ok(match self {
            Self::SubnetToL1Conversion { conversion_id } => {
                pack_subnet_to_l1_conversion_message(*conversion_id)
            }
            Self::RegisterL1Validator { validation_period, .. } => {
                pack_register_l1_validator_message(validation_period)?.1
            }
            Self::L1ValidatorRegistration { validation_id, registered } => {
                pack_l1_validator_registration_message(*validation_id, *registered)
            }
            Self::L1ValidatorWeight { validation_id, nonce, weight } => {
                pack_l1_validator_weight_message(*validation_id, *nonce, *weight)
            }
            Self::ValidationUptime { validation_id, uptime_seconds } => {
                pack_validation_uptime_message(*validation_id, *uptime_seconds)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::utils::hex;

    fn period() -> ValidationPeriod {
        ValidationPeriod {
            subnet_id: SubnetId([1; 32]),
            node_id: Bytes::from(vec![4; 20]),
            bls_public_key: Bytes::from(vec![5; 48]),
            registration_expiry: 1_700_000_000,
            remaining_balance_owner: PChainOwner::new(1, vec![Address::from([7; 20])]),
            disable_owner: PChainOwner::default(),
            weight: 100,
        }
    }

    fn conversion() -> ConversionData {
        ConversionData {
            subnet_id: SubnetId([1; 32]),
            validator_manager_blockchain_id: [2; 32].into(),
            validator_manager_address: Address::from([3; 20]),
            initial_validators: vec![InitialValidator {
                node_id: Bytes::from(vec![4; 20]),
                bls_public_key: Bytes::from(vec![5; 48]),
                weight: 100,
            }],
        }
    }

    #[test]
    fn test_weight_message_layout() {
        let message = pack_l1_validator_weight_message(ValidationId([9; 32]), 2, 300);
        assert_eq!(message.len(), L1_VALIDATOR_WEIGHT_MESSAGE_LENGTH);
        assert_eq!(&message[..6], &[0, 0, 0, 0, 0, 3]);
        assert_eq!(&message[6..38], &[9; 32]);
        assert_eq!(&message[38..46], &2u64.to_be_bytes());
        assert_eq!(&message[46..], &300u64.to_be_bytes());
        assert_eq!(
            unpack_l1_validator_weight_message(&message).unwrap(),
            (ValidationId([9; 32]), 2, 300)
        );
    }

    #[test]
    fn test_fixed_message_lengths() {
        let id = ValidationId([1; 32]);
        assert_eq!(pack_subnet_to_l1_conversion_message(ConversionId([1; 32])).len(), 38);
        assert_eq!(pack_l1_validator_registration_message(id, true).len(), 39);
        assert_eq!(pack_validation_uptime_message(id, 10).len(), 46);
    }

    #[test]
    fn test_unpack_checks_length_before_codec_and_type() {
        let mut message = pack_l1_validator_registration_message(ValidationId([1; 32]), true);

        message.push(0);
        assert_eq!(
            unpack_l1_validator_registration_message(&message),
            Err(MessageError::InvalidMessageLength { actual: 40, expected: 39 })
        );
        message.pop();

        message[1] = 1;
        assert_eq!(
            unpack_l1_validator_registration_message(&message),
            Err(MessageError::InvalidCodecId(1))
        );
        message[1] = 0;

        message[5] = 3;
        assert_eq!(
            unpack_l1_validator_registration_message(&message),
            Err(MessageError::InvalidMessageType)
        );
    }

    #[test]
    fn test_registration_bool_decodes_any_nonzero() {
        let mut message = pack_l1_validator_registration_message(ValidationId([1; 32]), false);
        assert!(!unpack_l1_validator_registration_message(&message).unwrap().1);
        message[38] = 1;
        assert!(unpack_l1_validator_registration_message(&message).unwrap().1);
    }

    #[test]
    fn test_initial_validation_id() {
        assert_eq!(
            hex::encode(initial_validation_id(SubnetId([1; 32]), 0).0),
            "3f6c2724a21a3b29ef886a52aa414bec96c46f7af137c636065209ff892cee6c"
        );
        assert_eq!(
            hex::encode(initial_validation_id(SubnetId([1; 32]), 7).0),
            "5a016e5357104e341642b1b44fcd7d7a6b6416df50574ba44c1c00b2eb2e36b8"
        );
    }

    #[test]
    fn test_conversion_id() {
        let data = conversion();
        let packed = pack_conversion_data(&data).unwrap();
        assert_eq!(packed.len(), 174);
        assert_eq!(&packed[66..70], &20u32.to_be_bytes());
        assert_eq!(
            hex::encode(conversion_id(&data).unwrap().0),
            "700aae0b4b353287b8a1345628ef28b4424d1c0bbee1c58bf2c4c81a76bd4566"
        );
        assert_eq!(unpack_conversion_data(&packed).unwrap(), data);
    }

    #[test]
    fn test_conversion_data_rejects_bad_bls_key() {
        let mut data = conversion();
        data.initial_validators[0].bls_public_key = Bytes::from(vec![5; 47]);
        assert_eq!(pack_conversion_data(&data), Err(MessageError::InvalidBlsPublicKey));
    }

    #[test]
    fn test_verify_conversion() {
        let data = conversion();
        let expected = conversion_id(&data).unwrap();
        let message = pack_subnet_to_l1_conversion_message(expected);
        assert_eq!(verify_conversion(&message, &data).unwrap(), expected);

        let wrong = pack_subnet_to_l1_conversion_message(ConversionId([0; 32]));
        assert_eq!(
            verify_conversion(&wrong, &data),
            Err(MessageError::InvalidConversionId { encoded: ConversionId([0; 32]), expected })
        );
    }

    #[test]
    fn test_register_message_layout_and_id() {
        let period = period();
        let (validation_id, message) = pack_register_l1_validator_message(&period).unwrap();
        // header, subnet, node id, bls, expiry, owner 1 address, empty owner, weight
        assert_eq!(message.len(), 6 + 32 + 24 + 48 + 8 + 28 + 8 + 8);
        assert_eq!(&message[38..42], &20u32.to_be_bytes());
        assert_eq!(validation_id, ValidationId(sha256(&message)));
        assert_eq!(unpack_register_l1_validator_message(&message).unwrap(), period);
    }

    #[test]
    fn test_register_message_truncated() {
        let (_, message) = pack_register_l1_validator_message(&period()).unwrap();
        let truncated = &message[..message.len() - 1];
        assert_eq!(
            unpack_register_l1_validator_message(truncated),
            Err(MessageError::InvalidMessageLength {
                actual: truncated.len() as u32,
                expected: message.len() as u32
            })
        );
    }

    #[test]
    fn test_decode_dispatches_on_type_and_length() {
        let id = ValidationId([3; 32]);
        let uptime = pack_validation_uptime_message(id, 3600);
        assert_eq!(
            PChainMessage::decode(&uptime).unwrap(),
            PChainMessage::ValidationUptime { validation_id: id, uptime_seconds: 3600 }
        );

        let conversion = pack_subnet_to_l1_conversion_message(ConversionId([3; 32]));
        assert_eq!(
            PChainMessage::decode(&conversion).unwrap(),
            PChainMessage::SubnetToL1Conversion { conversion_id: ConversionId([3; 32]) }
        );

        let (validation_id, register) = pack_register_l1_validator_message(&period()).unwrap();
        let decoded = PChainMessage::decode(&register).unwrap();
        assert_eq!(decoded, PChainMessage::RegisterL1Validator {
            validation_id,
            validation_period: period()
        });
        assert_eq!(decoded.encode().unwrap(), register);

        assert_eq!(
            PChainMessage::decode(&[0, 0, 0, 0, 0, 9]),
            Err(MessageError::InvalidMessageType)
        );
        assert_eq!(
            PChainMessage::decode(&[0, 0]),
            Err(MessageError::InvalidMessageLength { actual: 2, expected: 6 })
        );
    }

    #[test]
    fn test_pchain_owner_validation() {
        let low = Address::from([1; 20]);
        let high = Address::from([2; 20]);

        assert!(PChainOwner::default().validate().is_ok());
        assert!(PChainOwner::new(2, vec![low, high]).validate().is_ok());
        assert_eq!(
            PChainOwner::new(3, vec![low, high]).validate(),
            Err(MessageError::InvalidPChainOwnerThreshold { threshold: 3, addresses: 2 })
        );
        assert_eq!(
            PChainOwner::new(0, vec![low]).validate(),
            Err(MessageError::InvalidPChainOwnerThreshold { threshold: 0, addresses: 1 })
        );
        assert_eq!(
            PChainOwner::new(1, vec![high, low]).validate(),
            Err(MessageError::PChainOwnerAddressesNotSorted)
        );
        assert_eq!(
            PChainOwner::new(1, vec![low, low]).validate(),
            Err(MessageError::PChainOwnerAddressesNotSorted)
        );
        assert_eq!(
            PChainOwner::new(1, vec![high, low]).normalized().unwrap().addresses,
            vec![low, high]
        );
    }
}
