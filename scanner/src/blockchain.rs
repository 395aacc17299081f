use std::{collections::HashSet, path::Path, sync::Arc};

use futures::{Stream, StreamExt};
use tracing::{debug, info};
use valman_contracts::{
    ethers::{
        providers::{Middleware, Provider, Ws},
        types::Address,
    },
    events::{block_windows, fetch_events_between, subscribe_events, PAGE_SIZE},
    provider::connect_ws,
    EventRecord, LiveEvent,
};

use crate::{
    checkpoint::Checkpoint,
    error::{Result, ScannerError},
    sink::EventSink,
};

pub struct ScanOptions<'a> {
    pub rpc_url: &'a str,
    pub addresses: &'a [Address],
    pub start_block: u64,
    pub checkpoint: &'a Path,
    pub reset_checkpoint: bool,
}

/// Backfills history from the checkpoint to the current head, then follows live events until the
/// subscription ends. Returns the last block an event was seen in.
pub async fn scan<S: EventSink>(options: ScanOptions<'_>, sink: &mut S) -> Result<u64> {
    if options.addresses.is_empty() {
        return Err(ScannerError::NoAddresses);
    }
    info!("Starting event scanner under {}", options.rpc_url);

    let client: Arc<Provider<Ws>> = connect_ws(options.rpc_url).await?;
    let chain_id = client.get_chainid().await?.as_u64();
    debug!("Chain id is {chain_id}");
    debug!("We will listen at {:?}", options.addresses);

    let mut checkpoint = if options.reset_checkpoint {
        Checkpoint::empty(options.checkpoint, chain_id)
    } else {
        Checkpoint::load(options.checkpoint, chain_id)?
    };
    let from = checkpoint.resume_from(options.start_block);

    // The subscription buffers while the backfill runs. Every block after `head` reaches it.
    let stream = subscribe_events(&client, options.addresses, from).await?;
    let head = client.get_block_number().await?.as_u64();
    debug!("Head at {head}");

    backfill(client.as_ref(), options.addresses, from, head, sink, &mut checkpoint).await?;

    info!("Start listening...");
    let last_block = follow(stream, head, sink, &mut checkpoint).await?;
    debug!("Subscription closed at block {last_block}. We need a restart");
    Ok(last_block)
}

/// Writes live events until the stream ends. Returns the highest block seen.
///
/// Events up to `backfilled` were already written by the backfill and are skipped, unless a
/// reorg retracts one of those blocks. Once an event from a later block arrives, every block
/// before it is complete and the checkpoint moves there. Events arriving late from an older
/// block are still written.
pub async fn follow<St, S>(
    mut stream: St,
    backfilled: u64,
    sink: &mut S,
    checkpoint: &mut Checkpoint,
) -> Result<u64>
where
    St: Stream<Item = LiveEvent> + Unpin,
    S: EventSink,
{
    let mut skip_through = backfilled;
    let mut last_block = backfilled;
    let mut seen = HashSet::new();
    while let Some(live) = stream.next().await {
        let meta = &live.meta;
        let block = meta.block_number.as_u64();
        if live.removed {
            // Replacement logs for these blocks are not in the backfill.
            skip_through = skip_through.min(block.saturating_sub(1));
        } else if block <= skip_through {
            continue;
        }

        let key = (block, meta.block_hash, meta.transaction_hash, meta.log_index, live.removed);
        if !seen.insert(key) {
            debug!("Duplicate log {:?} at index {}", meta.transaction_hash, meta.log_index);
            continue;
        }

        if !live.removed && block > last_block {
            sink.flush()?;
            checkpoint.advance(block - 1)?;
            last_block = block;
            seen.retain(|(seen_block, ..)| seen_block + 1 >= block);
        }
        report(sink, &EventRecord::from_live(&live)?)?;
    }

    sink.flush()?;
    Ok(last_block)
}

/// Scans `[from, to]` in windows of [`PAGE_SIZE`] blocks, advancing the checkpoint after each.
pub async fn backfill<M: Middleware, S: EventSink>(
    client: &M,
    addresses: &[Address],
    from: u64,
    to: u64,
    sink: &mut S,
    checkpoint: &mut Checkpoint,
) -> Result<()> {
    if from > to {
        debug!("Nothing to backfill, checkpoint is at the head");
        return Ok(());
    }
    info!("Fetching events between {from} and {to}");
    for (start, end) in block_windows(from, to, PAGE_SIZE) {
        let events = fetch_events_between(client, addresses, start, end).await?;
        debug!("{} events between {start} and {end}", events.len());
        for (event, meta) in &events {
            report(sink, &EventRecord::new(event, meta)?)?;
        }
        sink.flush()?;
        checkpoint.advance(end)?;
    }
    info!("Successfully fetched all events between {from} and {to}");
    Ok(())
}

fn report<S: EventSink>(sink: &mut S, record: &EventRecord) -> Result<()> {
    debug!("Reading event {} at block {}", record.event, record.block_number);
    sink.write(record)
}

#[cfg(test)]
mod tests {
    use valman_contracts::{
        contracts::istaking_manager::{IStakingManagerAbiEvents, UptimeUpdatedFilter},
        ethers::{
            contract::LogMeta,
            providers::MockProvider,
            types::{Log, H256, U256, U64},
        },
        ManagerEvent,
    };

    use super::*;
    use crate::sink::JsonLinesSink;

    fn live(block: u64, log_index: u64) -> LiveEvent {
        let uptime = UptimeUpdatedFilter { validation_id: [5; 32], uptime: 60 };
        LiveEvent {
            event: ManagerEvent::Staking(IStakingManagerAbiEvents::UptimeUpdatedFilter(uptime)),
            meta: LogMeta {
                address: Address::from([1; 20]),
                block_number: U64::from(block),
                block_hash: H256::from_low_u64_be(block),
                transaction_hash: H256::from_low_u64_be(1_000 + block),
                transaction_index: U64::zero(),
                log_index: U256::from(log_index),
            },
            removed: false,
        }
    }

    fn written(sink: JsonLinesSink<Vec<u8>>) -> Vec<EventRecord> {
        let output = String::from_utf8(sink.into_inner()).unwrap();
        output.lines().map(|line| serde_json::from_str(line).unwrap()).collect()
    }

    async fn follow_from(
        backfilled: u64,
        events: Vec<LiveEvent>,
    ) -> (Vec<EventRecord>, Checkpoint) {
        let dir = tempfile::tempdir().unwrap();
        let mut checkpoint = Checkpoint::empty(&dir.path().join("checkpoint.json"), 1);
        checkpoint.advance(backfilled).unwrap();
        let mut sink = JsonLinesSink::new(Vec::new());

        let stream = futures::stream::iter(events);
        follow(stream, backfilled, &mut sink, &mut checkpoint).await.unwrap();
        (written(sink), checkpoint)
    }

    #[tokio::test]
    async fn test_follow_writes_blocks_after_backfill() {
        // Block 10 was backfilled while the subscription was already open.
        let events = vec![live(10, 0), live(11, 0), live(11, 1), live(13, 0)];
        let (records, checkpoint) = follow_from(10, events).await;

        let blocks = records.iter().map(|r| (r.block_number, r.log_index)).collect::<Vec<_>>();
        assert_eq!(blocks, vec![(11, 0), (11, 1), (13, 0)]);
        assert_eq!(checkpoint.block(), Some(12));
    }

    #[tokio::test]
    async fn test_follow_holds_checkpoint_within_a_block() {
        let (records, checkpoint) = follow_from(10, vec![live(11, 0), live(11, 1)]).await;
        assert_eq!(records.len(), 2);
        assert_eq!(checkpoint.block(), Some(10));
    }

    #[tokio::test]
    async fn test_follow_keeps_late_blocks_and_drops_duplicates() {
        let events = vec![live(12, 0), live(11, 0), live(12, 0), live(11, 0)];
        let (records, checkpoint) = follow_from(10, events).await;

        let blocks = records.iter().map(|r| r.block_number).collect::<Vec<_>>();
        assert_eq!(blocks, vec![12, 11]);
        assert_eq!(checkpoint.block(), Some(11));
    }

    #[tokio::test]
    async fn test_follow_forwards_reorg_retractions() {
        let mut retracted = live(9, 0);
        retracted.removed = true;
        let mut replacement = live(9, 0);
        replacement.meta.block_hash = H256::from([9; 32]);

        let (records, checkpoint) = follow_from(10, vec![retracted, replacement]).await;
        assert_eq!(records.len(), 2);
        assert!(records[0].removed);
        assert!(!records[1].removed);
        assert_eq!(records[1].block_hash, H256::from([9; 32]));
        assert_eq!(checkpoint.block(), Some(10));
    }

    #[tokio::test]
    async fn test_backfill_advances_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        let mut checkpoint = Checkpoint::empty(&path, 1);
        let mut sink = JsonLinesSink::new(Vec::new());

        let (provider, mock) = Provider::<MockProvider>::mocked();
        let foreign = Log {
            address: Address::from([1; 20]),
            topics: vec![H256::from([9; 32])],
            block_number: Some(U64::from(7)),
            block_hash: Some(H256::zero()),
            transaction_hash: Some(H256::zero()),
            transaction_index: Some(U64::zero()),
            log_index: Some(U256::zero()),
            ..Default::default()
        };
        mock.push::<Vec<Log>, _>(vec![foreign]).unwrap();

        backfill(&provider, &[Address::from([1; 20])], 5, 10, &mut sink, &mut checkpoint)
            .await
            .unwrap();
        assert_eq!(checkpoint.block(), Some(10));
        assert!(sink.into_inner().is_empty());
        assert_eq!(Checkpoint::load(&path, 1).unwrap().block(), Some(10));
    }

    #[tokio::test]
    async fn test_backfill_past_head_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut checkpoint = Checkpoint::empty(&dir.path().join("checkpoint.json"), 1);
        let mut sink = JsonLinesSink::new(Vec::new());
        let (provider, _mock) = Provider::<MockProvider>::mocked();

        backfill(&provider, &[Address::zero()], 11, 10, &mut sink, &mut checkpoint).await.unwrap();
        assert_eq!(checkpoint.block(), None);
    }
}
