//! Rebuilding document states from an immutable event log.
//!
//! Replay is a fold of [`Doc::apply`] over the log starting from an empty
//! document, so any prefix can be reconstructed at any time and the result
//! does not depend on how the prefix was reached.
//!
//! An event that fails to apply is reported at its own index and otherwise
//! skipped: it leaves the document unchanged and later events still apply.
//! [`Replayer`], [`snapshot_at`] and [`ReplayCursor`] all follow this rule,
//! so the `k`-th item of a replay equals `snapshot_at(events, k)`.

use crate::block_store::Snapshot;
use crate::doc::Doc;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::ids::ClientId;
use crate::traits::EventLog;

/// Client id of the read-only document that replay folds into. It never
/// authors blocks, so it cannot collide with a writer.
pub const REPLAY_CLIENT: ClientId = ClientId::MAX;

/// Lazy iterator of snapshots, one after each event of the log.
pub struct Replayer<'a> {
    events: &'a [Event],
    next: usize,
    doc: Doc,
}

impl<'a> Replayer<'a> {
    pub fn new(events: &'a [Event]) -> Self {
        Self {
            events,
            next: 0,
            doc: Doc::new(REPLAY_CLIENT),
        }
    }

    /// Number of events consumed so far.
    pub fn position(&self) -> usize {
        self.next
    }

    /// Start over from the empty document.
    pub fn restart(&mut self) {
        self.next = 0;
        self.doc = Doc::new(REPLAY_CLIENT);
    }

    pub fn doc(&self) -> &Doc {
        &self.doc
    }
}

impl Iterator for Replayer<'_> {
    type Item = Result<Snapshot>;

    fn next(&mut self) -> Option<Self::Item> {
        let events = self.events;
        let event = events.get(self.next)?;
        self.next += 1;
        Some(self.doc.apply(event).map(|()| self.doc.snapshot()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.events.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Replayer<'_> {}

/// State after applying the first `count` events (`0..=events.len()`).
///
/// Fails only when the last of those events fails; earlier failures are
/// skipped as in [`Replayer`].
pub fn snapshot_at(events: &[Event], count: usize) -> Result<Snapshot> {
    if count > events.len() {
        return Err(Error::PositionOutOfBounds {
            pos: count,
            len: events.len(),
        });
    }
    let mut doc = Doc::new(REPLAY_CLIENT);
    let mut last = Ok(());
    for event in &events[..count] {
        last = doc.apply(event);
    }
    last.map(|()| doc.snapshot())
}

/// Handle returned by [`ReplayCursor::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(usize, &Snapshot)>;

/// Index-addressable view over a log with change notification.
///
/// The cursor position is the number of applied events. Observers receive the
/// new position and an immutable snapshot whenever the position changes; they
/// never see the document being mutated.
pub struct ReplayCursor {
    events: Vec<Event>,
    position: usize,
    doc: Doc,
    current: Snapshot,
    /// Failure of the event at `position - 1`, if it failed.
    failure: Option<Error>,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl ReplayCursor {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            position: 0,
            doc: Doc::new(REPLAY_CLIENT),
            current: Snapshot::default(),
            failure: None,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn from_log<L: EventLog>(log: &L) -> Result<Self> {
        Ok(Self::new(log.load_from(0)?))
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of events in the log.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    /// The event applied last, if any.
    pub fn current_event(&self) -> Option<&Event> {
        self.position
            .checked_sub(1)
            .and_then(|index| self.events.get(index))
    }

    /// Extend the log, e.g. while following a live feed.
    pub fn push(&mut self, event: Event) -> Result<()> {
        event.validate()?;
        self.events.push(event);
        Ok(())
    }

    pub fn subscribe(&mut self, observer: impl FnMut(usize, &Snapshot) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    /// Move to the state after `position` events.
    ///
    /// Seeking backwards replays from the start. The cursor always lands on
    /// `position`; the result is `Err` when the event at `position - 1`
    /// failed, matching [`snapshot_at`].
    pub fn seek(&mut self, position: usize) -> Result<&Snapshot> {
        if position > self.events.len() {
            return Err(Error::PositionOutOfBounds {
                pos: position,
                len: self.events.len(),
            });
        }
        if position != self.position {
            if position < self.position {
                self.doc = Doc::new(REPLAY_CLIENT);
                self.position = 0;
                self.failure = None;
            }
            while self.position < position {
                self.failure = self.doc.apply(&self.events[self.position]).err();
                self.position += 1;
            }
            self.current = self.doc.snapshot();
            self.notify();
        }
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(&self.current),
        }
    }

    /// Advance one event. Returns `false` at the end of the log. A failing
    /// event is still stepped over, and its error returned.
    pub fn step_forward(&mut self) -> Result<bool> {
        if self.position == self.events.len() {
            return Ok(false);
        }
        self.seek(self.position + 1)?;
        Ok(true)
    }

    /// Go back one event. Returns `false` at the start of the log.
    pub fn step_back(&mut self) -> Result<bool> {
        if self.position == 0 {
            return Ok(false);
        }
        self.seek(self.position - 1)?;
        Ok(true)
    }

    fn notify(&mut self) {
        let (position, current) = (self.position, &self.current);
        for (_, observer) in &mut self.observers {
            observer(position, current);
        }
    }
}
