//! Assignments and states.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Observed changes, keyed by variable.
pub type StateDelta = BTreeMap<String, String>;

/// A variable/value fact. Equal iff both variable and value match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Assignment {
    pub variable: String,
    pub value: String,
}

impl Assignment {
    pub fn new(variable: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            value: value.into(),
        }
    }

    /// True if `other` assigns the same variable a different value.
    pub fn contradicts(&self, other: &Assignment) -> bool {
        self.variable == other.variable && self.value != other.value
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.variable, self.value)
    }
}

/// Render a list of assignments as `{a=1, b=2}`.
pub fn format_assignments(assignments: &[Assignment]) -> String {
    let parts: Vec<String> = assignments.iter().map(|a| a.to_string()).collect();
    format!("{{{}}}", parts.join(", "))
}

/// Variable to value mapping, last write wins.
///
/// Serves both as a snapshot and as the live tracked state of a monitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State {
    values: BTreeMap<String, String>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_assignments<'a>(assignments: impl IntoIterator<Item = &'a Assignment>) -> Self {
        let mut state = Self::new();
        for assignment in assignments {
            state.assign(&assignment.variable, &assignment.value);
        }
        state
    }

    pub fn value(&self, variable: &str) -> Option<&str> {
        self.values.get(variable).map(String::as_str)
    }

    pub fn assign(&mut self, variable: impl Into<String>, value: impl Into<String>) {
        self.values.insert(variable.into(), value.into());
    }

    pub fn apply(&mut self, delta: &StateDelta) {
        for (variable, value) in delta {
            self.assign(variable.clone(), value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn assignments(&self) -> Vec<Assignment> {
        self.values
            .iter()
            .map(|(variable, value)| Assignment::new(variable.clone(), value.clone()))
            .collect()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_assignments(&self.assignments()))
    }
}
