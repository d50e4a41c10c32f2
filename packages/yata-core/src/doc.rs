use std::collections::{BTreeMap, BTreeSet};

use crate::block::Block;
use crate::block_store::{BlockStore, Snapshot};
use crate::error::{Error, Result};
use crate::event::{Event, EventKind};
use crate::ids::{ClientId, Id, IdAllocator};
use crate::integrate::{integrate, inverted_origins, Integration};
use crate::state_vector::StateVector;

/// One replica of a text sequence.
///
/// Local edits go through [`Doc::insert_text`] and [`Doc::delete_text`], which
/// return the [`Event`] to hand to peers. Remote events go through
/// [`Doc::apply`]. Anything that arrives before its prerequisites is held back
/// and retried after every successful integration.
#[derive(Clone, Debug)]
pub struct Doc {
    ids: IdAllocator,
    store: BlockStore,
    state: StateVector,
    pending_blocks: BTreeMap<Id, Block>,
    pending_deletes: BTreeSet<Id>,
    pending_events: Vec<Event>,
}

impl Doc {
    pub fn new(client: ClientId) -> Self {
        Self {
            ids: IdAllocator::new(client),
            store: BlockStore::new(),
            state: StateVector::new(),
            pending_blocks: BTreeMap::new(),
            pending_deletes: BTreeSet::new(),
            pending_events: Vec::new(),
        }
    }

    pub fn client(&self) -> ClientId {
        self.ids.client()
    }

    pub fn state_vector(&self) -> &StateVector {
        &self.state
    }

    pub fn store(&self) -> &BlockStore {
        &self.store
    }

    pub fn lookup(&self, id: &Id) -> Option<&Block> {
        self.store.lookup(id)
    }

    pub fn position_of(&self, id: &Id) -> Option<usize> {
        self.store.position_of(id)
    }

    /// Visible text.
    pub fn content(&self) -> String {
        self.store.text()
    }

    /// Number of visible blocks.
    pub fn len(&self) -> usize {
        self.store.visible_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// Blocks, deletes and whole events still waiting on prerequisites.
    pub fn pending_len(&self) -> usize {
        self.pending_blocks.len() + self.pending_deletes.len() + self.pending_events.len()
    }

    /// Insert `text` before the visible block at `pos`, one block per char.
    ///
    /// Fails with [`Error::OwnBlocksPending`] while blocks this client authored
    /// earlier (e.g. before a restart) are still buffered, since their clocks
    /// are not free yet.
    pub fn insert_text(&mut self, pos: usize, text: &str) -> Result<Event> {
        let visible = self.store.visible_len();
        if pos > visible {
            return Err(Error::PositionOutOfBounds { pos, len: visible });
        }
        if self.has_own_pending() {
            return Err(Error::OwnBlocksPending(self.client()));
        }

        let mut event = Event::new(EventKind::Insert, self.state.clone());
        let (mut left, right) = self.neighbours(pos)?;
        self.ids.observe(self.state.get(self.client()));

        for ch in text.chars() {
            let id = self.ids.next_id();
            let block = Block::new(id, ch.to_string(), left, right);
            match integrate(&mut self.store, &mut self.state, block.clone())? {
                Integration::Integrated { .. } => {}
                other => {
                    return Err(Error::InconsistentState(format!(
                        "local block {id} was not integrated: {other:?}"
                    )))
                }
            }
            event.push_block(block);
            left = Some(id);
        }
        Ok(event)
    }

    /// Tombstone `len` visible blocks starting at `pos`.
    pub fn delete_text(&mut self, pos: usize, len: usize) -> Result<Event> {
        let visible = self.store.visible_len();
        let end = pos.saturating_add(len);
        if end > visible {
            return Err(Error::PositionOutOfBounds { pos: end, len: visible });
        }

        let targets: Vec<Id> = self
            .store
            .iter()
            .filter(|block| block.is_visible())
            .skip(pos)
            .take(len)
            .map(|block| block.id)
            .collect();

        let mut event = Event::new(EventKind::Delete, self.state.clone());
        for id in targets {
            self.store.mark_deleted(&id)?;
            let block = self.store.lookup(&id).ok_or(Error::NotFound(id))?;
            event.push_block(block.clone());
        }
        Ok(event)
    }

    /// Apply an event authored elsewhere.
    ///
    /// Only structurally invalid events fail, and they fail before anything
    /// changes; anything missing prerequisites is buffered. Applying the same
    /// event again is a no-op.
    pub fn apply(&mut self, event: &Event) -> Result<()> {
        if let Err(err) = event.validate().and_then(|()| self.check_origin_order(event)) {
            tracing::warn!(%err, "rejecting event");
            return Err(err);
        }
        if !self.state.covers(&event.state_vector) {
            if self.pending_events.contains(event) {
                return Ok(());
            }
            tracing::debug!(
                blocks = event.block_count(),
                "event depends on unseen operations, buffering"
            );
            self.pending_events.push(event.clone());
            return Ok(());
        }
        self.apply_ready(event)?;
        self.retry_pending()
    }

    /// Alias of [`Doc::apply`] for state-based sync callers.
    pub fn apply_update(&mut self, update: &Event) -> Result<()> {
        self.apply(update)
    }

    /// Everything this replica holds, as one `integrate` event.
    pub fn encode_state_as_update(&self) -> Event {
        self.encode_diff(&StateVector::new())
    }

    /// The blocks `remote` lacks, plus every tombstone so deletions reach
    /// blocks the remote already holds.
    pub fn encode_diff(&self, remote: &StateVector) -> Event {
        let mut event = Event::new(EventKind::Integrate, remote.clone());
        for range in remote.diff(&self.state) {
            for block in self.store.blocks_in_range(&range) {
                event.push_block(block);
            }
        }
        for block in self.store.iter() {
            if block.deleted && remote.contains(&block.id) {
                event.push_block(block.clone());
            }
        }
        for blocks in event.blocks.values_mut() {
            blocks.sort_by_key(|block| block.id.clock);
        }
        event
    }

    /// Validate store consistency, origin resolution and the state vector.
    /// Intended for tests and debugging.
    pub fn validate_invariants(&self) -> Result<()> {
        self.store.validate()?;

        let mut clocks: BTreeMap<ClientId, Vec<u64>> = BTreeMap::new();
        for block in self.store.iter() {
            for origin in [block.left_origin, block.right_origin].into_iter().flatten() {
                if !self.store.contains(&origin) {
                    return Err(Error::InconsistentState(format!(
                        "block {} has unresolved origin {origin}",
                        block.id
                    )));
                }
            }
            let pos = self.store.position_of(&block.id);
            if let Some(left) = block.left_origin {
                if self.store.position_of(&left) >= pos {
                    return Err(Error::InconsistentState(format!(
                        "block {} precedes its left origin",
                        block.id
                    )));
                }
            }
            if let Some(right) = block.right_origin {
                if self.store.position_of(&right) <= pos {
                    return Err(Error::InconsistentState(format!(
                        "block {} follows its right origin",
                        block.id
                    )));
                }
            }
            clocks.entry(block.id.client).or_default().push(block.id.clock);
        }

        for (client, mut seen) in clocks {
            seen.sort_unstable();
            let contiguous = seen.iter().enumerate().all(|(i, clock)| *clock == i as u64);
            if !contiguous || self.state.get(client) != seen.len() as u64 {
                return Err(Error::InconsistentState(format!(
                    "state vector for client {client} does not match stored clocks"
                )));
            }
        }
        if self.state.len() > self.store.iter().map(|b| b.id.client).collect::<BTreeSet<_>>().len() {
            return Err(Error::InconsistentState(
                "state vector tracks clients without blocks".into(),
            ));
        }
        Ok(())
    }

    /// Reject blocks whose origins are both known but out of order.
    fn check_origin_order(&self, event: &Event) -> Result<()> {
        if event.kind == EventKind::Delete {
            return Ok(());
        }
        for block in event.iter_blocks() {
            if let Some((left, right)) = inverted_origins(&self.store, block) {
                return Err(Error::MalformedEvent(format!(
                    "block {} has right origin {right} at or before left origin {left}",
                    block.id
                )));
            }
        }
        Ok(())
    }

    /// Whether any buffered work carries a clock this client would reuse.
    fn has_own_pending(&self) -> bool {
        let client = self.client();
        let next = self.state.get(client);
        let own = |id: &Id| id.client == client && id.clock >= next;
        self.pending_blocks.keys().any(own)
            || self.pending_deletes.iter().any(own)
            || self
                .pending_events
                .iter()
                .flat_map(|event| event.iter_blocks())
                .any(|block| own(&block.id))
    }

    fn neighbours(&self, pos: usize) -> Result<(Option<Id>, Option<Id>)> {
        if pos == 0 {
            return Ok((None, self.store.get(0).map(|block| block.id)));
        }
        let left = self
            .store
            .visible_position(pos - 1)
            .ok_or(Error::PositionOutOfBounds {
                pos,
                len: self.store.visible_len(),
            })?;
        let left_id = self.store.get(left).map(|block| block.id);
        let right_id = self.store.get(left + 1).map(|block| block.id);
        Ok((left_id, right_id))
    }

    fn apply_ready(&mut self, event: &Event) -> Result<()> {
        match event.kind {
            EventKind::Insert | EventKind::Integrate => {
                for block in event.iter_blocks() {
                    self.offer_block(block.clone())?;
                    if block.deleted {
                        self.offer_delete(block.id)?;
                    }
                }
            }
            EventKind::Delete => {
                for block in event.iter_blocks() {
                    self.offer_delete(block.id)?;
                }
            }
        }
        Ok(())
    }

    fn offer_block(&mut self, block: Block) -> Result<bool> {
        let id = block.id;
        match integrate(&mut self.store, &mut self.state, block.clone())? {
            Integration::Integrated { .. } => Ok(true),
            Integration::Duplicate => Ok(false),
            Integration::Pending(reason) => {
                tracing::debug!(%id, ?reason, "buffering block");
                self.pending_blocks.insert(id, block);
                Ok(false)
            }
            Integration::Rejected { left, right } => {
                tracing::warn!(%id, %left, %right, "dropping block with inverted origins");
                Ok(false)
            }
        }
    }

    fn offer_delete(&mut self, id: Id) -> Result<()> {
        if self.store.contains(&id) {
            self.store.mark_deleted(&id)?;
        } else {
            tracing::debug!(%id, "delete targets unknown block, buffering");
            self.pending_deletes.insert(id);
        }
        Ok(())
    }

    /// Retry buffered work until nothing more can make progress.
    fn retry_pending(&mut self) -> Result<()> {
        loop {
            let mut progressed = false;

            // On error, everything not yet re-offered goes back to its buffer.
            let mut blocks = std::mem::take(&mut self.pending_blocks).into_iter();
            while let Some((_, block)) = blocks.next() {
                match self.offer_block(block) {
                    Ok(integrated) => progressed |= integrated,
                    Err(err) => {
                        self.pending_blocks.extend(blocks);
                        return Err(err);
                    }
                }
            }

            let mut deletes = std::mem::take(&mut self.pending_deletes).into_iter();
            while let Some(id) = deletes.next() {
                if let Err(err) = self.offer_delete(id) {
                    self.pending_deletes.extend(deletes);
                    return Err(err);
                }
            }

            let (ready, waiting): (Vec<Event>, Vec<Event>) = std::mem::take(&mut self.pending_events)
                .into_iter()
                .partition(|event| self.state.covers(&event.state_vector));
            self.pending_events = waiting;
            let mut ready = ready.into_iter();
            while let Some(event) = ready.next() {
                if let Err(err) = self.apply_ready(&event) {
                    self.pending_events.extend(ready);
                    return Err(err);
                }
                progressed = true;
            }

            if !progressed {
                return Ok(());
            }
            tracing::trace!(pending = self.pending_len(), "retrying buffered operations");
        }
    }
}
