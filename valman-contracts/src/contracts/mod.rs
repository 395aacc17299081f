//! Generated bindings for the validator-manager contract family. Each contract lives in its own
//! module because the generated tuple structs (`PChainOwner`, `StakingManagerSettings`, ...) share
//! names across contracts.

pub mod acp99_manager;
pub mod erc20_token_staking_manager;
pub mod istaking_manager;
pub mod native_token_staking_manager;
pub mod staking_manager;
pub mod tx;
pub mod validator_manager;
pub mod validator_messages;
pub mod warp;

use ethers::{contract::abigen, types::H160};
use valman_macros::h160;

pub use acp99_manager::Acp99ManagerAbi;
pub use erc20_token_staking_manager::Erc20TokenStakingManagerAbi;
pub use istaking_manager::IStakingManagerAbi;
pub use native_token_staking_manager::NativeTokenStakingManagerAbi;
pub use staking_manager::{StakingManager, TokenKind, ValidatorRegistration};
pub use validator_manager::ValidatorManager;
pub use validator_messages::ValidatorMessagesAbi;
pub use warp::with_warp_messages;

/// Warp messenger precompile, identical on every Avalanche EVM chain.
pub const WARP_PRECOMPILE: H160 = h160!(0x0200000000000000000000000000000000000005);

// Only the calls needed to fund an ERC20 stake.
abigen!(
    Erc20Token,
    r#"[
        function approve(address spender, uint256 amount) external returns (bool)
        function allowance(address owner, address spender) external view returns (uint256)
        function balanceOf(address account) external view returns (uint256)
    ]"#,
);
