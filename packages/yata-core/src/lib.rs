#![forbid(unsafe_code)]
//! Core of a YATA text-sequence CRDT.
//!
//! Blocks are identified by `(client, clock)`, anchored by the left and right
//! neighbours they had when authored, and integrated so every replica ends up
//! with the same order. Events carry blocks between replicas and can be
//! replayed into a sequence of snapshots. Storage and transport stay with the
//! host; the log is reached through [`EventLog`].

pub mod block;
pub mod block_store;
pub mod doc;
pub mod error;
pub mod event;
pub mod ids;
pub mod integrate;
pub mod replay;
pub mod state_vector;
pub mod traits;

pub use block::{Block, BlockSnapshot};
pub use block_store::{BlockStore, Snapshot};
pub use doc::Doc;
pub use error::{Error, Result};
pub use event::{Event, EventKind};
pub use ids::{ClientId, Clock, Id, IdAllocator};
pub use integrate::{
    find_position, integrate, inverted_origins, missing_origin, Integration, Pending,
};
pub use replay::{snapshot_at, ReplayCursor, Replayer, SubscriptionId, REPLAY_CLIENT};
pub use state_vector::{ClockRange, StateVector};
pub use traits::{EventLog, MemoryEventLog};
