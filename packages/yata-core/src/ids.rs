use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of a replica (an authoring actor).
pub type ClientId = u64;

/// Per-client operation counter. The first block a client authors has clock 0.
pub type Clock = u64;

/// Globally unique identifier of a block.
///
/// Ordering is lexicographic over `(client, clock)` and is used as the final
/// tie-break between concurrent insertions.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Id {
    pub client: ClientId,
    pub clock: Clock,
}

impl Id {
    pub const fn new(client: ClientId, clock: Clock) -> Self {
        Self { client, clock }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.client, self.clock)
    }
}

/// Hands out identifiers for a single client.
///
/// Exactly one allocator may exist per client and document; clocks never
/// decrease because the allocator is the only writer.
#[derive(Clone, Debug)]
pub struct IdAllocator {
    client: ClientId,
    next: Clock,
}

impl IdAllocator {
    pub fn new(client: ClientId) -> Self {
        Self { client, next: 0 }
    }

    /// Resume allocation after `clock` values have already been used.
    pub fn starting_at(client: ClientId, clock: Clock) -> Self {
        Self {
            client,
            next: clock,
        }
    }

    pub fn client(&self) -> ClientId {
        self.client
    }

    /// Clock the next allocated id will carry.
    pub fn peek(&self) -> Clock {
        self.next
    }

    pub fn next_id(&mut self) -> Id {
        let id = Id::new(self.client, self.next);
        self.next += 1;
        id
    }

    /// Skip ahead so that `clock` is never handed out again.
    pub(crate) fn observe(&mut self, clock: Clock) {
        self.next = self.next.max(clock);
    }
}
