//! Signed Warp messages travel in the transaction's access list. Each message is one access list
//! entry at the Warp precompile, and contracts address them by position through
//! `getVerifiedWarpMessage(index)`.

use ethers::{
    abi::Detokenize,
    contract::ContractCall,
    providers::Middleware,
    types::{transaction::eip2930::AccessListItem, Bytes, H256},
};

use super::WARP_PRECOMPILE;
use crate::error::ValmanError;

const PREDICATE_END_BYTE: u8 = 0xff;

/// Splits a signed message into storage slots: the message, an end byte, then zero padding to a
/// whole slot.
pub fn pack_warp_predicate(signed_message: &[u8]) -> Vec<H256> {
    let mut packed = Vec::with_capacity(signed_message.len() + 32);
    packed.extend_from_slice(signed_message);
    packed.push(PREDICATE_END_BYTE);
    packed.resize(packed.len().div_ceil(32) * 32, 0);
    packed.chunks_exact(32).map(H256::from_slice).collect()
}

/// Attaches `messages` to `call` as Warp predicates. `message_index` is the position the contract
/// will read, so it has to name one of them.
pub fn with_warp_messages<M, D>(
    mut call: ContractCall<M, D>,
    messages: &[Bytes],
    message_index: u32,
) -> Result<ContractCall<M, D>, ValmanError>
where
    M: Middleware,
    D: Detokenize,
{
    if message_index as usize >= messages.len() {
        return Err(ValmanError::Preflight(format!(
            "no signed Warp message at index {message_index}, {} given",
            messages.len()
        )));
    }
    let items = messages
        .iter()
        .map(|message| AccessListItem {
            address: WARP_PRECOMPILE,
            storage_keys: pack_warp_predicate(message),
        })
        .collect::<Vec<_>>();
    call.tx.set_access_list(items.into());
    Ok(call)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ethers::{
        providers::{MockProvider, Provider},
        types::Address,
    };

    use super::*;
    use crate::contracts::Acp99ManagerAbi;

    #[test]
    fn test_predicate_is_delimited_and_padded() {
        let slots = pack_warp_predicate(&[1, 2, 3]);
        assert_eq!(slots.len(), 1);
        assert_eq!(&slots[0][..4], &[1, 2, 3, 0xff]);
        assert!(slots[0][4..].iter().all(|b| *b == 0));

        // A full slot pushes the end byte into a slot of its own.
        let slots = pack_warp_predicate(&[7; 32]);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0], H256::from([7; 32]));
        assert_eq!(slots[1][0], 0xff);
    }

    #[test]
    fn test_messages_become_access_list_entries() {
        let (provider, _mock) = Provider::<MockProvider>::mocked();
        let manager = Acp99ManagerAbi::new(Address::from([1; 20]), Arc::new(provider));
        let messages = vec![Bytes::from(vec![5; 40]), Bytes::from(vec![6; 3])];

        let call = with_warp_messages(manager.complete_validator_registration(1), &messages, 1)
            .unwrap();
        let access_list = call.tx.access_list().unwrap();
        assert_eq!(access_list.0.len(), 2);
        assert!(access_list.0.iter().all(|item| item.address == WARP_PRECOMPILE));
        assert_eq!(access_list.0[0].storage_keys.len(), 2);
        assert_eq!(access_list.0[1].storage_keys, pack_warp_predicate(&[6; 3]));
    }

    #[test]
    fn test_message_index_must_name_a_message() {
        let (provider, _mock) = Provider::<MockProvider>::mocked();
        let manager = Acp99ManagerAbi::new(Address::from([1; 20]), Arc::new(provider));
        let call = manager.complete_validator_registration(0);
        assert!(matches!(with_warp_messages(call, &[], 0), Err(ValmanError::Preflight(_))));
    }
}
