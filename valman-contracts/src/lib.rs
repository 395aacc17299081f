//! Client surface for the Avalanche L1 validator-manager contracts: generated bindings, typed
//! manager handles, event access, and a native codec for the P-Chain messages the managers
//! exchange over Warp.

pub mod contracts;
pub mod error;
pub mod events;
pub mod ids;
pub mod messages;
pub mod provider;
pub mod types;

pub use ethers;

pub use contracts::{StakingManager, TokenKind, ValidatorManager, ValidatorRegistration};
pub use error::{Result, ValmanError};
pub use events::{EventRecord, LiveEvent, ManagerEvent};
pub use ids::{DelegationId, NodeId, SubnetId, ValidationId};
pub use provider::ValmanProvider;
