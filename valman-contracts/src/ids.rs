//! Avalanche identifiers as they appear around the validator manager: node ids (`NodeID-…`),
//! 32-byte validation/delegation/subnet/blockchain ids, and P-Chain owner addresses.
//!
//! Avalanche renders ids in cb58: base58 over the payload followed by the last four bytes of its
//! sha256 digest.

use std::{fmt, str::FromStr};

use bech32::{FromBase32, ToBase32, Variant};
use ethers::{
    types::{Address, Bytes},
    utils::hex,
};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use thiserror::Error;

const CHECKSUM_LENGTH: usize = 4;

pub const NODE_ID_PREFIX: &str = "NodeID-";
pub const PCHAIN_ADDRESS_PREFIX: &str = "P-";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("Invalid base58 encoding: {0}")]
    Base58(String),

    #[error("cb58 checksum mismatch")]
    Checksum,

    #[error("Invalid hex encoding: {0}")]
    Hex(String),

    #[error("Expected {expected} bytes, found {actual}")]
    Length { expected: usize, actual: usize },

    #[error("Invalid bech32 address: {0}")]
    Bech32(String),
}

pub fn cb58_encode(payload: &[u8]) -> String {
    let digest = Sha256::digest(payload);
    let mut data = Vec::with_capacity(payload.len() + CHECKSUM_LENGTH);
    data.extend_from_slice(payload);
    data.extend_from_slice(&digest[digest.len() - CHECKSUM_LENGTH..]);
    bs58::encode(data).into_string()
}

pub fn cb58_decode(encoded: &str) -> Result<Vec<u8>, IdError> {
    let mut data =
        bs58::decode(encoded).into_vec().map_err(|e| IdError::Base58(e.to_string()))?;
    if data.len() < CHECKSUM_LENGTH {
        return Err(IdError::Length { expected: CHECKSUM_LENGTH, actual: data.len() });
    }
    let checksum = data.split_off(data.len() - CHECKSUM_LENGTH);
    let digest = Sha256::digest(&data);
    if digest[digest.len() - CHECKSUM_LENGTH..] != checksum[..] {
        return Err(IdError::Checksum);
    }
    Ok(data)
}

fn to_array<const N: usize>(bytes: Vec<u8>) -> Result<[u8; N], IdError> {
    let actual = bytes.len();
    bytes.try_into().map_err(|_| IdError::Length { expected: N, actual })
}

fn decode_hex<const N: usize>(encoded: &str) -> Result<[u8; N], IdError> {
    let bytes = hex::decode(encoded.trim_start_matches("0x"))
        .map_err(|e| IdError::Hex(e.to_string()))?;
    to_array(bytes)
}

/// Accepts `0x`-prefixed hex or cb58.
fn decode_id<const N: usize>(encoded: &str) -> Result<[u8; N], IdError> {
    let encoded = encoded.trim();
    if encoded.starts_with("0x") {
        decode_hex(encoded)
    } else {
        to_array(cb58_decode(encoded)?)
    }
}

macro_rules! id32 {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            pub const fn zero() -> Self {
                Self([0u8; 32])
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; 32]
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn to_cb58(&self) -> String {
                cb58_encode(&self.0)
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl From<$name> for [u8; 32] {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_id(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({self})", stringify!($name))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

id32!(
    /// Identifies one validation period; `sha256` of the RegisterL1ValidatorMessage that created
    /// it, or of `subnetID ‖ index` for validators present at conversion.
    ValidationId
);
id32!(
    /// Identifies one delegation to a PoS validator.
    DelegationId
);
id32!(SubnetId);
id32!(BlockchainId);
id32!(
    /// sha256 of the packed conversion data, committed to by the P-Chain at L1 conversion.
    ConversionId
);

/// Avalanche node id: the 20-byte hash of the node's staking certificate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeId(pub [u8; 20]);

impl NodeId {
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_bytes(&self) -> Bytes {
        Bytes::from(self.0.to_vec())
    }
}

impl From<[u8; 20]> for NodeId {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for NodeId {
    type Error = IdError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        to_array(bytes.to_vec()).map(Self)
    }
}

impl FromStr for NodeId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        decode_id(s.strip_prefix(NODE_ID_PREFIX).unwrap_or(s)).map(Self)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{NODE_ID_PREFIX}{}", cb58_encode(&self.0))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({self})")
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Parses a P-Chain owner address given as `P-<hrp>1…` bech32 (the `P-` is optional) or as
/// `0x`-prefixed hex of the 20-byte short id.
pub fn parse_pchain_address(address: &str) -> Result<Address, IdError> {
    let address = address.trim();
    if address.starts_with("0x") {
        return decode_hex::<20>(address).map(Address::from);
    }
    let address = address.strip_prefix(PCHAIN_ADDRESS_PREFIX).unwrap_or(address);
    let (_hrp, data, _variant) =
        bech32::decode(address).map_err(|e| IdError::Bech32(e.to_string()))?;
    let bytes = Vec::<u8>::from_base32(&data).map_err(|e| IdError::Bech32(e.to_string()))?;
    to_array::<20>(bytes).map(Address::from)
}

pub fn format_pchain_address(address: Address, hrp: &str) -> Result<String, IdError> {
    bech32::encode(hrp, address.as_bytes().to_base32(), Variant::Bech32)
        .map(|encoded| format!("{PCHAIN_ADDRESS_PREFIX}{encoded}"))
        .map_err(|e| IdError::Bech32(e.to_string()))
}
