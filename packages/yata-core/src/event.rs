use std::collections::BTreeMap;

use crate::block::BlockSnapshot;
use crate::error::{Error, Result};
use crate::ids::{ClientId, Id};
use crate::state_vector::StateVector;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What an event does to the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EventKind {
    /// Newly authored blocks.
    Insert,
    /// Tombstones for existing blocks; only the ids are significant.
    Delete,
    /// A sync batch: blocks to integrate, tombstones included.
    Integrate,
}

/// Immutable log record exchanged between replicas.
///
/// `state_vector` is what the author had integrated before producing the
/// event, so a receiver can hold the event back until it has caught up.
/// `blocks` groups the carried snapshots by authoring client, each list in
/// clock order.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Event {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: EventKind,
    pub state_vector: StateVector,
    pub blocks: BTreeMap<ClientId, Vec<BlockSnapshot>>,
}

impl Event {
    pub fn new(kind: EventKind, state_vector: StateVector) -> Self {
        Self {
            kind,
            state_vector,
            blocks: BTreeMap::new(),
        }
    }

    /// Append a block under its author's entry.
    pub fn push_block(&mut self, block: BlockSnapshot) {
        self.blocks.entry(block.id.client).or_default().push(block);
    }

    pub fn with_blocks(mut self, blocks: impl IntoIterator<Item = BlockSnapshot>) -> Self {
        for block in blocks {
            self.push_block(block);
        }
        self
    }

    /// Every carried block, grouped by ascending client.
    pub fn iter_blocks(&self) -> impl Iterator<Item = &BlockSnapshot> + '_ {
        self.blocks.values().flatten()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.block_count() == 0
    }

    /// Reject structurally invalid events before they touch a document.
    pub fn validate(&self) -> Result<()> {
        for (client, blocks) in &self.blocks {
            for block in blocks {
                if block.id.client != *client {
                    return Err(Error::MalformedEvent(format!(
                        "block {} listed under client {client}",
                        block.id
                    )));
                }
                match self.kind {
                    EventKind::Delete => {
                        if !block.deleted {
                            return Err(Error::MalformedEvent(format!(
                                "delete event carries live block {}",
                                block.id
                            )));
                        }
                    }
                    EventKind::Insert | EventKind::Integrate => {
                        if block.content.chars().count() != 1 {
                            return Err(Error::MalformedEvent(format!(
                                "block {} must carry exactly one character",
                                block.id
                            )));
                        }
                        if block.left_origin.is_some() && block.left_origin == block.right_origin {
                            return Err(Error::MalformedEvent(format!(
                                "block {} has the same left and right origin",
                                block.id
                            )));
                        }
                        check_origin(block.id, block.left_origin)?;
                        check_origin(block.id, block.right_origin)?;
                    }
                }
            }
        }
        Ok(())
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Decode and validate an event. Missing fields and invalid client keys
    /// surface as [`Error::MalformedEvent`].
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self> {
        let event: Event =
            serde_json::from_str(json).map_err(|e| Error::MalformedEvent(e.to_string()))?;
        event.validate()?;
        Ok(event)
    }
}

/// An origin must be authored before the block that references it.
fn check_origin(id: Id, origin: Option<Id>) -> Result<()> {
    match origin {
        Some(origin) if origin.client == id.client && origin.clock >= id.clock => {
            Err(Error::MalformedEvent(format!(
                "block {id} references origin {origin} that it precedes"
            )))
        }
        _ => Ok(()),
    }
}
