use crate::ids::Id;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One atomic unit of sequence content.
///
/// `left_origin` and `right_origin` record the neighbours at authoring time
/// (`None` is the start or end of the sequence). They are never rewritten,
/// even when concurrent inserts later land between the block and its origins.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Block {
    pub id: Id,
    pub content: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub deleted: bool,
    pub left_origin: Option<Id>,
    pub right_origin: Option<Id>,
}

/// Wire form of a block inside an [`Event`](crate::event::Event).
pub type BlockSnapshot = Block;

impl Block {
    pub fn new(
        id: Id,
        content: impl Into<String>,
        left_origin: Option<Id>,
        right_origin: Option<Id>,
    ) -> Self {
        Self {
            id,
            content: content.into(),
            deleted: false,
            left_origin,
            right_origin,
        }
    }

    /// Copy of the block with the tombstone set.
    pub fn tombstoned(mut self) -> Self {
        self.deleted = true;
        self
    }

    pub fn is_visible(&self) -> bool {
        !self.deleted
    }
}
