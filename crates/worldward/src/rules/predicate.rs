//! Rule predicates as interpretable data.
//!
//! Predicates are a discriminated expression over context attributes rather
//! than a trait-object hierarchy, so rule configuration serializes directly
//! and the evaluator stays in one place.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::context::Context;

/// A predicate over an event context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "test", rename_all = "snake_case")]
pub enum Predicate {
    Always,
    Never,
    /// The source block's material is one of these.
    SourceMaterial { materials: Vec<String> },
    /// The target block's material is one of these.
    TargetMaterial { materials: Vec<String> },
    /// The resulting (placed) block's material is one of these.
    PlacedMaterial { materials: Vec<String> },
    /// The involved item's material is one of these.
    ItemMaterial { materials: Vec<String> },
    /// An actor is present on the context.
    HasActor,
    AllOf { tests: Vec<Predicate> },
    AnyOf { tests: Vec<Predicate> },
    Not { not: Box<Predicate> },
}

/// A predicate referenced a context field the event did not populate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateError {
    pub missing: &'static str,
}

impl fmt::Display for PredicateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "predicate needs context field '{}'", self.missing)
    }
}

impl std::error::Error for PredicateError {}

impl Predicate {
    /// Evaluate against a context. Missing context fields are an error so the
    /// pipeline can treat the rule as no-match and keep going.
    pub fn matches(&self, context: &Context) -> Result<bool, PredicateError> {
        match self {
            Predicate::Always => Ok(true),
            Predicate::Never => Ok(false),
            Predicate::SourceMaterial { materials } => {
                let block = context
                    .source_block
                    .as_ref()
                    .ok_or(PredicateError {
                        missing: "source_block",
                    })?;
                Ok(materials.iter().any(|m| *m == block.material))
            }
            Predicate::TargetMaterial { materials } => {
                let block = context
                    .target_block
                    .as_ref()
                    .ok_or(PredicateError {
                        missing: "target_block",
                    })?;
                Ok(materials.iter().any(|m| *m == block.material))
            }
            Predicate::PlacedMaterial { materials } => {
                let block = context
                    .placed_block
                    .as_ref()
                    .ok_or(PredicateError {
                        missing: "placed_block",
                    })?;
                Ok(materials.iter().any(|m| *m == block.material))
            }
            Predicate::ItemMaterial { materials } => {
                let item = context.item.as_ref().ok_or(PredicateError { missing: "item" })?;
                Ok(materials.iter().any(|m| *m == item.material))
            }
            Predicate::HasActor => Ok(context.actor.is_some()),
            Predicate::AllOf { tests } => {
                for test in tests {
                    if !test.matches(context)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::AnyOf { tests } => {
                for test in tests {
                    if test.matches(context)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Not { not } => Ok(!not.matches(context)?),
        }
    }
}
