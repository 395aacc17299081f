//! Pure P-Chain message packing library. [`crate::messages`] produces the same bytes natively;
//! these bindings are for checking against a deployed copy of the library.

use ethers::contract::abigen;

abigen!(ValidatorMessagesAbi, "abi/ValidatorMessages.json");
