//! Event access across the validator manager and its staking manager: paginated history,
//! merged live subscriptions, and a flat record for printing.

use std::pin::Pin;

use ethers::{
    abi::RawLog,
    contract::{parse_log, EthLogDecode, LogMeta},
    providers::{Middleware, Provider, Ws},
    types::{Address, Filter, Log, H256},
    utils::hex,
};
use futures::{stream::SelectAll, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    contracts::{
        acp99_manager::Acp99ManagerAbiEvents, istaking_manager::IStakingManagerAbiEvents,
    },
    error::ValmanError,
};

pub const PAGE_SIZE: u64 = 50_000;

pub type EventStream<'a> = Pin<Box<dyn Stream<Item = LiveEvent> + Send + 'a>>;

/// Any event the validator manager or a staking manager emits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ManagerEvent {
    Validator(Acp99ManagerAbiEvents),
    Staking(IStakingManagerAbiEvents),
}

impl EthLogDecode for ManagerEvent {
    fn decode_log(log: &RawLog) -> Result<Self, ethers::abi::Error> {
        if let Ok(event) = Acp99ManagerAbiEvents::decode_log(log) {
            return Ok(Self::Validator(event));
        }
        IStakingManagerAbiEvents::decode_log(log).map(Self::Staking)
    }
}

macro_rules! describe {
    ($event:expr, $enum:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        match $event {
            $($enum::$variant(e) => ($name, serde_json::to_value(e)),)+
        }
    };
}

impl ManagerEvent {
    pub fn parse(log: Log) -> Result<Self, ValmanError> {
        Ok(parse_log::<Self>(log)?)
    }

    /// Solidity event name and its fields as JSON.
    pub fn describe(&self) -> (&'static str, serde_json::Result<Value>) {
        match self {
            Self::Validator(event) => describe!(event, Acp99ManagerAbiEvents {
                CompletedValidatorRegistrationFilter => "CompletedValidatorRegistration",
                CompletedValidatorRemovalFilter => "CompletedValidatorRemoval",
                CompletedValidatorWeightUpdateFilter => "CompletedValidatorWeightUpdate",
                InitiatedValidatorRegistrationFilter => "InitiatedValidatorRegistration",
                InitiatedValidatorRemovalFilter => "InitiatedValidatorRemoval",
                InitiatedValidatorWeightUpdateFilter => "InitiatedValidatorWeightUpdate",
                RegisteredInitialValidatorFilter => "RegisteredInitialValidator",
            }),
            Self::Staking(event) => describe!(event, IStakingManagerAbiEvents {
                CompletedDelegatorRegistrationFilter => "CompletedDelegatorRegistration",
                CompletedDelegatorRemovalFilter => "CompletedDelegatorRemoval",
                DelegatorRewardClaimedFilter => "DelegatorRewardClaimed",
                DelegatorRewardRecipientChangedFilter => "DelegatorRewardRecipientChanged",
                InitiatedDelegatorRegistrationFilter => "InitiatedDelegatorRegistration",
                InitiatedDelegatorRemovalFilter => "InitiatedDelegatorRemoval",
                InitiatedStakingValidatorRegistrationFilter => "InitiatedStakingValidatorRegistration",
                UptimeUpdatedFilter => "UptimeUpdated",
                ValidatorRewardClaimedFilter => "ValidatorRewardClaimed",
                ValidatorRewardRecipientChangedFilter => "ValidatorRewardRecipientChanged",
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.describe().0
    }
}

/// An event delivered by a subscription. `removed` is set when a reorg retracts a log that was
/// delivered before.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiveEvent {
    pub event: ManagerEvent,
    pub meta: LogMeta,
    pub removed: bool,
}

/// One decoded event with its position on chain, as written by the scanner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub address: Address,
    pub block_number: u64,
    pub block_hash: H256,
    pub transaction_hash: H256,
    pub log_index: u64,
    pub event: String,
    pub fields: Value,
    /// Retracts the record with the same block hash, transaction and log index.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub removed: bool,
}

impl EventRecord {
    pub fn new(event: &ManagerEvent, meta: &LogMeta) -> serde_json::Result<Self> {
        let (name, fields) = event.describe();
        Ok(Self {
            address: meta.address,
            block_number: meta.block_number.as_u64(),
            block_hash: meta.block_hash,
            transaction_hash: meta.transaction_hash,
            log_index: meta.log_index.as_u64(),
            event: name.to_owned(),
            fields: hexify(fields?),
            removed: false,
        })
    }

    pub fn from_live(live: &LiveEvent) -> serde_json::Result<Self> {
        Ok(Self { removed: live.removed, ..Self::new(&live.event, &live.meta)? })
    }
}

/// Fixed-size byte fields serialize as number arrays; ids and node ids read better as hex.
fn hexify(value: Value) -> Value {
    match value {
        Value::Array(items) if matches!(items.len(), 20 | 32) && items.iter().all(is_byte) => {
            let bytes = items.iter().filter_map(Value::as_u64).map(|b| b as u8).collect::<Vec<_>>();
            Value::String(format!("0x{}", hex::encode(bytes)))
        }
        Value::Array(items) => Value::Array(items.into_iter().map(hexify).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, hexify(v))).collect()),
        other => other,
    }
}

fn is_byte(value: &Value) -> bool {
    value.as_u64().is_some_and(|b| b <= u8::MAX as u64)
}

fn decode(log: Log) -> Option<LiveEvent> {
    let removed = log.removed == Some(true);
    let meta = LogMeta::from(&log);
    match parse_log::<ManagerEvent>(log) {
        Ok(event) => Some(LiveEvent { event, meta, removed }),
        Err(e) => {
            debug!("Skipping undecodable log in {:?}: {e}", meta.transaction_hash);
            None
        }
    }
}

/// History queries only see canonical logs, so a removed one there is stale.
fn decode_canonical(log: Log) -> Option<(ManagerEvent, LogMeta)> {
    match decode(log)? {
        LiveEvent { removed: true, meta, .. } => {
            warn!("Ignoring removed log {:?} at index {}", meta.transaction_hash, meta.log_index);
            None
        }
        LiveEvent { event, meta, .. } => Some((event, meta)),
    }
}

/// Inclusive block ranges of at most `size` blocks covering `[from, to]`.
pub fn block_windows(from: u64, to: u64, size: u64) -> impl Iterator<Item = (u64, u64)> {
    (from..=to).step_by(size as usize).map(move |start| (start, to.min(start + size - 1)))
}

/// All manager events emitted by `addresses` in `[from, to]`, queried in windows of
/// [`PAGE_SIZE`] blocks.
pub async fn fetch_events_between<M: Middleware>(
    client: &M,
    addresses: &[Address],
    from: u64,
    to: u64,
) -> Result<Vec<(ManagerEvent, LogMeta)>, ValmanError> {
    let filter = Filter::new().address(addresses.to_vec());
    let mut events = Vec::new();
    for (start, end) in block_windows(from, to, PAGE_SIZE) {
        debug!("Fetching events between {start} and {end}");
        let logs = client
            .get_logs(&filter.clone().from_block(start).to_block(end))
            .await
            .map_err(|e| ValmanError::LogQueryError(e.to_string()))?;
        events.extend(logs.into_iter().filter_map(decode_canonical));
    }
    Ok(events)
}

/// Live events from `addresses`, one subscription per address merged into a single stream.
/// Logs below `from_block` are dropped unless a reorg retracts them.
pub async fn subscribe_events<'a>(
    client: &'a Provider<Ws>,
    addresses: &[Address],
    from_block: u64,
) -> Result<EventStream<'a>, ValmanError> {
    let mut merged = SelectAll::new();
    for address in addresses {
        let filter = Filter::new().address(*address);
        let logs = client.subscribe_logs(&filter).await?;
        let events = logs.filter_map(move |log| async move {
            decode(log)
                .filter(|live| live.removed || live.meta.block_number.as_u64() >= from_block)
        });
        merged.push(events.boxed());
    }
    Ok(Box::pin(merged))
}
