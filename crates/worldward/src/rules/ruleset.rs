//! Rule sets, attachment points, and the per-world rule list.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use super::context::Context;
use super::predicate::Predicate;

/// Event categories a rule set can be registered under. Each attachment is
/// independent: a veto on one has no effect on the others.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Attachment {
    BlockBreak,
    BlockPlace,
    BlockSpread,
    BlockForm,
    BlockFade,
    BlockPhysics,
    BlockInteract,
    ItemUse,
    ItemDrop,
}

impl Attachment {
    pub const ALL: [Attachment; 9] = [
        Attachment::BlockBreak,
        Attachment::BlockPlace,
        Attachment::BlockSpread,
        Attachment::BlockForm,
        Attachment::BlockFade,
        Attachment::BlockPhysics,
        Attachment::BlockInteract,
        Attachment::ItemUse,
        Attachment::ItemDrop,
    ];
}

/// What a matching rule does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// Cancel the action; evaluation stops here.
    Veto,
    /// Match without vetoing; evaluation continues.
    Pass,
}

/// One configured rule: a predicate plus an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub when: Predicate,
    pub action: RuleAction,
}

/// The result of evaluating a rule set against one context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Allow,
    /// Cancelled by the named rule (if the rule was named).
    Veto { rule: Option<String> },
}

impl RuleOutcome {
    pub fn is_veto(&self) -> bool {
        matches!(self, RuleOutcome::Veto { .. })
    }
}

/// An ordered rule sequence for one attachment point. Immutable during
/// evaluation; reconfiguration replaces the whole set atomically via
/// [`RuleList::install`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run each rule's predicate in registration order; the first matching
    /// veto decides. A predicate that fails to evaluate counts as no-match and
    /// is logged for operator visibility.
    pub fn process(&self, context: &Context) -> RuleOutcome {
        for rule in &self.rules {
            match rule.when.matches(context) {
                Ok(true) => {
                    if rule.action == RuleAction::Veto {
                        return RuleOutcome::Veto {
                            rule: rule.name.clone(),
                        };
                    }
                }
                Ok(false) => {}
                Err(err) => {
                    log::warn!(
                        "rule {} skipped: {err}",
                        rule.name.as_deref().unwrap_or("<unnamed>")
                    );
                }
            }
        }
        RuleOutcome::Allow
    }
}

/// Serializable configuration for a world's whole rule list: one rule sequence
/// per attachment point. Parsing is all-or-nothing, so a malformed document
/// never partially installs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleListConfig {
    #[serde(default)]
    pub attachments: BTreeMap<Attachment, Vec<Rule>>,
}

impl RuleListConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Per-world table of rule sets keyed by attachment. Lookups hand out the
/// current `Arc`, so an in-flight evaluation keeps the set it started with
/// even if a reload swaps in a replacement.
pub struct RuleList {
    sets: RwLock<BTreeMap<Attachment, Arc<RuleSet>>>,
    empty: Arc<RuleSet>,
}

impl Default for RuleList {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleList {
    pub fn new() -> Self {
        Self {
            sets: RwLock::new(BTreeMap::new()),
            empty: Arc::new(RuleSet::default()),
        }
    }

    pub fn from_config(config: RuleListConfig) -> Self {
        let list = Self::new();
        for (attachment, rules) in config.attachments {
            list.install(attachment, RuleSet::new(rules));
        }
        list
    }

    /// The current rule set for an attachment; an unconfigured attachment
    /// yields the shared empty set, which always allows.
    pub fn get(&self, attachment: Attachment) -> Arc<RuleSet> {
        self.sets
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&attachment)
            .map_or_else(|| Arc::clone(&self.empty), Arc::clone)
    }

    /// Atomically replace the rule set for one attachment.
    pub fn install(&self, attachment: Attachment, set: RuleSet) {
        self.sets
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(attachment, Arc::new(set));
    }

    /// Evaluate the attachment's rules against a context.
    pub fn process(&self, attachment: Attachment, context: &Context) -> RuleOutcome {
        self.get(attachment).process(context)
    }
}
