use std::collections::BTreeMap;

use crate::ids::{ClientId, Clock, Id};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A contiguous run of clocks `start..end` authored by one client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClockRange {
    pub client: ClientId,
    pub start: Clock,
    pub end: Clock,
}

impl ClockRange {
    pub fn contains(&self, id: &Id) -> bool {
        id.client == self.client && id.clock >= self.start && id.clock < self.end
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Per-client high-water marks of integrated clocks.
///
/// The stored value for a client is exclusive: every clock strictly below it
/// has been integrated. An unknown client reads as 0, i.e. nothing seen yet.
/// Entries are kept in a `BTreeMap` so iteration and serialization are
/// deterministic across replicas.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct StateVector {
    entries: BTreeMap<ClientId, Clock>,
}

impl StateVector {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, client: ClientId) -> Clock {
        self.entries.get(&client).copied().unwrap_or(0)
    }

    /// Raise the mark for `client` to `clock`. Never lowers it.
    pub fn advance(&mut self, client: ClientId, clock: Clock) {
        if clock == 0 {
            return;
        }
        let entry = self.entries.entry(client).or_insert(0);
        *entry = (*entry).max(clock);
    }

    /// Whether every clock below `id.clock` from its author is integrated and
    /// all of `dependencies` is covered.
    pub fn is_ready(&self, id: &Id, dependencies: &StateVector) -> bool {
        self.get(id.client) >= id.clock && self.covers(dependencies)
    }

    /// Whether this vector has seen at least everything `other` has.
    pub fn covers(&self, other: &StateVector) -> bool {
        other
            .entries
            .iter()
            .all(|(client, clock)| self.get(*client) >= *clock)
    }

    /// Whether the block `id` is already integrated.
    pub fn contains(&self, id: &Id) -> bool {
        id.clock < self.get(id.client)
    }

    /// Clock ranges that `other` has integrated and this vector lacks.
    ///
    /// Ranges come back in ascending client order.
    pub fn diff(&self, other: &StateVector) -> Vec<ClockRange> {
        other
            .entries
            .iter()
            .filter_map(|(client, end)| {
                let start = self.get(*client);
                (start < *end).then_some(ClockRange {
                    client: *client,
                    start,
                    end: *end,
                })
            })
            .collect()
    }

    /// Pointwise maximum.
    pub fn merge(&mut self, other: &StateVector) {
        for (client, clock) in &other.entries {
            self.advance(*client, *clock);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClientId, Clock)> + '_ {
        self.entries.iter().map(|(client, clock)| (*client, *clock))
    }
}

impl FromIterator<(ClientId, Clock)> for StateVector {
    fn from_iter<T: IntoIterator<Item = (ClientId, Clock)>>(iter: T) -> Self {
        let mut sv = StateVector::new();
        for (client, clock) in iter {
            sv.advance(client, clock);
        }
        sv
    }
}
