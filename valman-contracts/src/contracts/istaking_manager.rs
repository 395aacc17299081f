//! Token-agnostic staking interface shared by the native and ERC20 staking managers.

use ethers::contract::abigen;

abigen!(
    IStakingManagerAbi,
    "abi/IStakingManager.json",
    event_derives(serde::Deserialize, serde::Serialize)
);
