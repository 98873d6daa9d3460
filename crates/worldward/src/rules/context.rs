//! Event-scoped context a rule predicate evaluates against.

use serde::{Deserialize, Serialize};

use crate::ActorId;

/// A block kind at the time of the event. The material name is the game's
/// stable identifier (e.g. `"fire"`, `"sponge"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockState {
    pub material: String,
}

impl BlockState {
    pub fn new(material: impl Into<String>) -> Self {
        Self {
            material: material.into(),
        }
    }
}

/// An item stack involved in the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub material: String,
    pub count: u32,
}

impl ItemStack {
    pub fn new(material: impl Into<String>, count: u32) -> Self {
        Self {
            material: material.into(),
            count,
        }
    }
}

/// An ephemeral bag of optional typed references describing one event.
///
/// Built fresh per evaluation and never shared across two attachment
/// evaluations, even when a single physical event fans out into several (the
/// ignite-cause dispatch builds a distinct context per cause).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    pub actor: Option<ActorId>,
    pub source_block: Option<BlockState>,
    pub target_block: Option<BlockState>,
    pub placed_block: Option<BlockState>,
    pub item: Option<ItemStack>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_actor(mut self, actor: impl Into<ActorId>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn with_source_block(mut self, block: BlockState) -> Self {
        self.source_block = Some(block);
        self
    }

    pub fn with_target_block(mut self, block: BlockState) -> Self {
        self.target_block = Some(block);
        self
    }

    pub fn with_placed_block(mut self, block: BlockState) -> Self {
        self.placed_block = Some(block);
        self
    }

    pub fn with_item(mut self, item: ItemStack) -> Self {
        self.item = Some(item);
        self
    }
}
