use crate::error::{Error, Result};
use crate::event::Event;

/// Append-only event log supplied by the host (file, database, network feed).
pub trait EventLog {
    fn append(&mut self, event: Event) -> Result<()>;
    /// Events at `index` and after, in log order.
    fn load_from(&self, index: usize) -> Result<Vec<Event>>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory vector-backed log for tests and embedded replay.
#[derive(Clone, Debug, Default)]
pub struct MemoryEventLog {
    events: Vec<Event>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

impl From<Vec<Event>> for MemoryEventLog {
    fn from(events: Vec<Event>) -> Self {
        Self { events }
    }
}

impl EventLog for MemoryEventLog {
    fn append(&mut self, event: Event) -> Result<()> {
        event.validate()?;
        self.events.push(event);
        Ok(())
    }

    fn load_from(&self, index: usize) -> Result<Vec<Event>> {
        if index > self.events.len() {
            return Err(Error::PositionOutOfBounds {
                pos: index,
                len: self.events.len(),
            });
        }
        Ok(self.events[index..].to_vec())
    }

    fn len(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::event::EventKind;
    use crate::ids::Id;
    use crate::state_vector::StateVector;

    #[test]
    fn memory_log_appends_and_loads_suffix() {
        let mut log = MemoryEventLog::new();
        let first = Event::new(EventKind::Insert, StateVector::new())
            .with_blocks([Block::new(Id::new(1, 0), "a", None, None)]);
        let second = Event::new(EventKind::Delete, StateVector::new())
            .with_blocks([Block::new(Id::new(1, 0), "a", None, None).tombstoned()]);
        log.append(first).unwrap();
        log.append(second.clone()).unwrap();

        assert_eq!(log.len(), 2);
        assert_eq!(log.load_from(1).unwrap(), vec![second]);
        assert!(log.load_from(2).unwrap().is_empty());
        assert!(log.load_from(3).is_err());
    }

    #[test]
    fn memory_log_rejects_malformed_events() {
        let mut log = MemoryEventLog::new();
        let bad = Event::new(EventKind::Delete, StateVector::new())
            .with_blocks([Block::new(Id::new(1, 0), "a", None, None)]);
        assert!(matches!(log.append(bad), Err(Error::MalformedEvent(_))));
        assert!(log.is_empty());
    }
}
