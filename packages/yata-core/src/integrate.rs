//! Placement of remote and local blocks into the sequence.
//!
//! The rule is the one used by Yjs (YATA). Starting right after the left
//! origin, every block up to the right origin is a potential conflict. For
//! each candidate `o`:
//!
//! - `o` shares the new block's left origin: if `o.id` is lower the new block
//!   goes after it; otherwise, if the right origins also match, the scan
//!   stops and the new block goes before `o`.
//! - `o`'s left origin lies inside the region scanned so far: `o` belongs to
//!   the subtree of something already passed, so the new block goes after it
//!   unless that origin is still an unresolved conflict.
//! - otherwise `o` was anchored left of our origin and the scan stops.
//!
//! The outcome only depends on origins and identifiers, so every replica
//! computes the same order no matter how arrivals interleave.

use std::collections::HashSet;

use crate::block::Block;
use crate::block_store::BlockStore;
use crate::error::{Error, Result};
use crate::ids::{Clock, Id};
use crate::state_vector::StateVector;

/// Why a block cannot be integrated yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pending {
    /// An origin has not been integrated.
    UnresolvedOrigin(Id),
    /// Earlier clocks from the same author are still missing.
    ClockGap { expected: Clock },
}

/// Result of offering a block to the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Integration {
    Integrated { position: usize },
    /// Already present; integration is idempotent.
    Duplicate,
    Pending(Pending),
    /// The right origin sits at or before the left origin, so no position
    /// satisfies both. The block can never be integrated.
    Rejected { left: Id, right: Id },
}

/// Integrate `block` into `store`, advancing `state` for its author.
///
/// Missing prerequisites are reported as [`Integration::Pending`] and leave
/// both `store` and `state` untouched; the caller decides how to buffer.
/// Unsatisfiable origins come back as [`Integration::Rejected`], also without
/// touching anything.
pub fn integrate(
    store: &mut BlockStore,
    state: &mut StateVector,
    block: Block,
) -> Result<Integration> {
    let id = block.id;
    let expected = state.get(id.client);
    if id.clock < expected || store.contains(&id) {
        return Ok(Integration::Duplicate);
    }
    if id.clock > expected {
        return Ok(Integration::Pending(Pending::ClockGap { expected }));
    }
    if let Some(origin) = missing_origin(store, &block) {
        return Ok(Integration::Pending(Pending::UnresolvedOrigin(origin)));
    }
    if let Some((left, right)) = inverted_origins(store, &block) {
        return Ok(Integration::Rejected { left, right });
    }

    let position = find_position(store, &block)?;
    tracing::trace!(%id, position, "integrating block");
    store.insert_at(block, position)?;
    state.advance(id.client, id.clock + 1);
    Ok(Integration::Integrated { position })
}

/// First origin of `block` that the store does not know yet.
pub fn missing_origin(store: &BlockStore, block: &Block) -> Option<Id> {
    [block.left_origin, block.right_origin]
        .into_iter()
        .flatten()
        .find(|origin| !store.contains(origin))
}

/// Origins of `block` that are both stored with the right one not after the
/// left one.
pub fn inverted_origins(store: &BlockStore, block: &Block) -> Option<(Id, Id)> {
    let (left, right) = (block.left_origin?, block.right_origin?);
    let left_pos = store.position_of(&left)?;
    let right_pos = store.position_of(&right)?;
    (right_pos <= left_pos).then_some((left, right))
}

/// Position at which `block` must be inserted. Both origins must be present.
pub fn find_position(store: &BlockStore, block: &Block) -> Result<usize> {
    let start = match block.left_origin {
        None => 0,
        Some(left) => resolve(store, &left)? + 1,
    };
    let end = match block.right_origin {
        None => store.len(),
        Some(right) => resolve(store, &right)?,
    };
    if end < start {
        return Err(Error::InconsistentState(format!(
            "right origin of {} precedes its left origin",
            block.id
        )));
    }

    let mut destination = start;
    let mut before_origin: HashSet<Id> = HashSet::new();
    let mut conflicting: HashSet<Id> = HashSet::new();

    for position in start..end {
        let Some(other) = store.get(position) else {
            break;
        };
        before_origin.insert(other.id);
        conflicting.insert(other.id);

        if other.left_origin == block.left_origin {
            if other.id < block.id {
                destination = position + 1;
                conflicting.clear();
            } else if other.right_origin == block.right_origin {
                break;
            }
        } else if let Some(origin) = other
            .left_origin
            .filter(|origin| before_origin.contains(origin))
        {
            if !conflicting.contains(&origin) {
                destination = position + 1;
                conflicting.clear();
            }
        } else {
            break;
        }
    }

    Ok(destination)
}

fn resolve(store: &BlockStore, id: &Id) -> Result<usize> {
    store.position_of(id).ok_or(Error::NotFound(*id))
}
