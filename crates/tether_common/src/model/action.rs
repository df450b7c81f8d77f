//! Actions: operator instances with preconditions and effects.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::plan::LinkId;
use super::state::{format_assignments, Assignment};

pub const START_OPERATOR: &str = "start";
pub const GOAL_OPERATOR: &str = "goal";

/// Index of an action in a compiled plan. Equal to the action's location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(pub usize);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub operator: String,
    pub preconditions: Vec<Assignment>,
    pub effects: Vec<Assignment>,

    /// Position in the encoded sequence; the start action is 0.
    #[serde(default)]
    pub location: usize,

    // Populated once during compilation.
    #[serde(skip)]
    pub predecessor_actions: Vec<ActionId>,
    #[serde(skip)]
    pub successor_actions: Vec<ActionId>,
    /// Links this action consumes.
    #[serde(skip)]
    pub predecessor_links: Vec<LinkId>,
    /// Links this action produces.
    #[serde(skip)]
    pub successor_links: Vec<LinkId>,
}

impl Action {
    pub fn new(
        operator: impl Into<String>,
        preconditions: Vec<Assignment>,
        effects: Vec<Assignment>,
    ) -> Self {
        Self {
            operator: operator.into(),
            preconditions,
            effects,
            location: 0,
            predecessor_actions: Vec::new(),
            successor_actions: Vec::new(),
            predecessor_links: Vec::new(),
            successor_links: Vec::new(),
        }
    }

    pub fn id(&self) -> ActionId {
        ActionId(self.location)
    }

    /// True if some effect assigns the condition's variable a different value.
    pub fn threatens(&self, condition: &Assignment) -> bool {
        self.effects.iter().any(|effect| effect.contradicts(condition))
    }

    /// Drop all compiled relations, keeping the operator definition.
    pub(crate) fn clear_relations(&mut self) {
        self.predecessor_actions.clear();
        self.successor_actions.clear();
        self.predecessor_links.clear();
        self.successor_links.clear();
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}->{}",
            self.operator,
            format_assignments(&self.preconditions),
            format_assignments(&self.effects)
        )
    }
}
