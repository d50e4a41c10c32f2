use std::collections::HashMap;

use crate::block::Block;
use crate::error::{Error, Result};
use crate::ids::Id;
use crate::state_vector::ClockRange;

/// Document order of every integrated block, tombstones included.
///
/// Blocks are addressed by identifier through `index`, which maps an id to its
/// current slot in `blocks`. Origins are kept as identifiers rather than links
/// between slots, so the store owns every block exactly once.
#[derive(Clone, Debug, Default)]
pub struct BlockStore {
    blocks: Vec<Block>,
    index: HashMap<Id, usize>,
    visible: usize,
}

impl BlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, id: &Id) -> Option<&Block> {
        self.index.get(id).map(|&pos| &self.blocks[pos])
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.index.contains_key(id)
    }

    /// Position in the full sequence, tombstones counted.
    pub fn position_of(&self, id: &Id) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, position: usize) -> Option<&Block> {
        self.blocks.get(position)
    }

    /// Place an already-resolved block at `position`.
    pub fn insert_at(&mut self, block: Block, position: usize) -> Result<()> {
        if self.index.contains_key(&block.id) {
            return Err(Error::InconsistentState(format!(
                "block {} is already stored",
                block.id
            )));
        }
        if position > self.blocks.len() {
            return Err(Error::PositionOutOfBounds {
                pos: position,
                len: self.blocks.len(),
            });
        }

        for slot in self.index.values_mut() {
            if *slot >= position {
                *slot += 1;
            }
        }
        self.index.insert(block.id, position);
        if block.is_visible() {
            self.visible += 1;
        }
        self.blocks.insert(position, block);
        Ok(())
    }

    /// Tombstone a block. Returns `true` when the flag flipped.
    pub fn mark_deleted(&mut self, id: &Id) -> Result<bool> {
        let position = self.position_of(id).ok_or(Error::NotFound(*id))?;
        let block = &mut self.blocks[position];
        if block.deleted {
            return Ok(false);
        }
        block.deleted = true;
        self.visible -= 1;
        Ok(true)
    }

    /// Total number of blocks, tombstones included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn visible_len(&self) -> usize {
        self.visible
    }

    /// Store position of the `offset`-th visible block.
    pub fn visible_position(&self, offset: usize) -> Option<usize> {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| block.is_visible())
            .nth(offset)
            .map(|(position, _)| position)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    /// Blocks authored inside `range`, ordered by clock.
    pub fn blocks_in_range(&self, range: &ClockRange) -> Vec<Block> {
        let mut found: Vec<Block> = self
            .blocks
            .iter()
            .filter(|block| range.contains(&block.id))
            .cloned()
            .collect();
        found.sort_by_key(|block| block.id.clock);
        found
    }

    pub fn text(&self) -> String {
        visible_text(&self.blocks)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            blocks: self.blocks.clone(),
        }
    }

    /// Check that the id index agrees with the block order.
    pub fn validate(&self) -> Result<()> {
        if self.index.len() != self.blocks.len() {
            return Err(Error::InconsistentState(format!(
                "index holds {} ids for {} blocks",
                self.index.len(),
                self.blocks.len()
            )));
        }
        for (position, block) in self.blocks.iter().enumerate() {
            if self.index.get(&block.id) != Some(&position) {
                return Err(Error::InconsistentState(format!(
                    "block {} is indexed at the wrong position",
                    block.id
                )));
            }
        }
        let visible = self.blocks.iter().filter(|b| b.is_visible()).count();
        if visible != self.visible {
            return Err(Error::InconsistentState(format!(
                "visible count {} does not match {} live blocks",
                self.visible, visible
            )));
        }
        Ok(())
    }
}

fn visible_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .filter(|block| block.is_visible())
        .map(|block| block.content.as_str())
        .collect()
}

/// Read-only, ordered view of a document at one point in time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    blocks: Vec<Block>,
}

impl Snapshot {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    /// Number of blocks including tombstones.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn visible_len(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_visible()).count()
    }

    pub fn text(&self) -> String {
        visible_text(&self.blocks)
    }
}
