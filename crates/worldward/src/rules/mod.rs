//! Ordered rule pipeline evaluated against event contexts.
//!
//! Rule lists are keyed by attachment point (one per event category). A list
//! is evaluated in registration order and stops at the first matching veto;
//! rule order is a user-visible contract, not an optimization detail.

mod context;
mod predicate;
mod ruleset;

pub use context::{BlockState, Context, ItemStack};
pub use predicate::{Predicate, PredicateError};
pub use ruleset::{
    Attachment, Rule, RuleAction, RuleList, RuleListConfig, RuleOutcome, RuleSet,
};
