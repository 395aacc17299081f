//! Staking manager that pulls stake from an ERC20 allowance.

use ethers::contract::abigen;

abigen!(
    Erc20TokenStakingManagerAbi,
    "abi/ERC20TokenStakingManager.json",
    event_derives(serde::Deserialize, serde::Serialize)
);
