use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// Last fully processed block for one chain, persisted as JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Stored {
    chain_id: u64,
    block: u64,
}

#[derive(Clone, Debug)]
pub struct Checkpoint {
    path: PathBuf,
    chain_id: u64,
    block: Option<u64>,
}

impl Checkpoint {
    /// Reads the stored block. A checkpoint written for another chain is ignored.
    pub fn load(path: &Path, chain_id: u64) -> Result<Self> {
        let block = match valman_io::read_json_if_exists::<Stored>(path)? {
            Some(stored) if stored.chain_id == chain_id => Some(stored.block),
            Some(stored) => {
                warn!(
                    "Checkpoint {} belongs to chain {}, not {chain_id}; ignoring it",
                    path.display(),
                    stored.chain_id
                );
                None
            }
            None => None,
        };
        Ok(Self { path: path.to_path_buf(), chain_id, block })
    }

    pub fn empty(path: &Path, chain_id: u64) -> Self {
        Self { path: path.to_path_buf(), chain_id, block: None }
    }

    pub fn block(&self) -> Option<u64> {
        self.block
    }

    /// First block still to scan given the configured start block.
    pub fn resume_from(&self, start_block: u64) -> u64 {
        self.block.map_or(start_block, |block| start_block.max(block + 1))
    }

    /// Records `block` as processed. Never moves backwards.
    pub fn advance(&mut self, block: u64) -> Result<()> {
        if self.block.is_some_and(|current| current >= block) {
            return Ok(());
        }
        valman_io::write_json(&self.path, &Stored { chain_id: self.chain_id, block })?;
        self.block = Some(block);
        Ok(())
    }
}
