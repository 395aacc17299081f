//! Staking manager that takes stake in the chain's native token through payable registration
//! calls.

use ethers::contract::abigen;

abigen!(
    NativeTokenStakingManagerAbi,
    "abi/NativeTokenStakingManager.json",
    event_derives(serde::Deserialize, serde::Serialize)
);
