//! Idealized world where every action has exactly its declared effects.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Actor;
use crate::error::Result;
use crate::model::{Action, ActionId, State, StateDelta};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// First candidate in frontier order.
    #[default]
    FirstEnabled,
    /// Candidate with the lowest location in the encoded sequence.
    EarliestLocation,
}

#[derive(Debug, Clone)]
pub struct SimulatedActor {
    name: String,
    policy: SelectionPolicy,
    pending: StateDelta,
}

impl SimulatedActor {
    pub fn new(name: impl Into<String>, policy: SelectionPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            pending: StateDelta::new(),
        }
    }
}

impl Actor for SimulatedActor {
    fn name(&self) -> &str {
        &self.name
    }

    fn select_enabled_action(&mut self, candidates: &[&Action]) -> Result<Option<ActionId>> {
        let selected = match self.policy {
            SelectionPolicy::FirstEnabled => candidates.first(),
            SelectionPolicy::EarliestLocation => candidates.iter().min_by_key(|a| a.location),
        };
        Ok(selected.map(|a| a.id()))
    }

    fn execute_action(&mut self, action: &Action) -> Result<()> {
        debug!("{}: simulates {}", self.name, action.operator);
        self.pending = action
            .effects
            .iter()
            .map(|e| (e.variable.clone(), e.value.clone()))
            .collect();
        Ok(())
    }

    fn observe_state_change(&mut self, current_state: &State) -> Result<StateDelta> {
        let mut changes = std::mem::take(&mut self.pending);
        changes.retain(|variable, value| current_state.value(variable) != Some(value.as_str()));
        Ok(changes)
    }
}
