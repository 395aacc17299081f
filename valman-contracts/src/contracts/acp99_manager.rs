//! The ACP-99 validator manager: validator set bookkeeping and the P-Chain acknowledgement entry points.

use ethers::contract::abigen;

abigen!(
    Acp99ManagerAbi,
    "abi/ACP99Manager.json",
    event_derives(serde::Deserialize, serde::Serialize)
);
