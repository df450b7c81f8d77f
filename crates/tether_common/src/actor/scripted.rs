//! Replay of a recorded execution scenario.

use tracing::{debug, warn};

use super::Actor;
use crate::error::Result;
use crate::model::{Action, ActionId, State, StateDelta};
use crate::scenario::{ExecutionScenario, ScenarioStage};

/// Selects the action named by the current stage and reports that stage's
/// state change. Each observation advances to the next stage.
#[derive(Debug, Clone)]
pub struct ScriptedActor {
    name: String,
    stages: Vec<ScenarioStage>,
    index: usize,
}

impl ScriptedActor {
    pub fn new(scenario: &ExecutionScenario) -> Self {
        Self {
            name: scenario.name.clone(),
            stages: scenario.encoded_stages(),
            index: 0,
        }
    }

    pub fn remaining_stages(&self) -> usize {
        self.stages.len().saturating_sub(self.index)
    }
}

impl Actor for ScriptedActor {
    fn name(&self) -> &str {
        &self.name
    }

    fn select_enabled_action(&mut self, candidates: &[&Action]) -> Result<Option<ActionId>> {
        if candidates.is_empty() {
            debug!("{}: no action selected", self.name);
            return Ok(None);
        }
        let Some(stage) = self.stages.get(self.index) else {
            warn!("{}: script exhausted with {} actions enabled", self.name, candidates.len());
            return Ok(None);
        };
        let selected = candidates
            .iter()
            .find(|a| a.operator == stage.action)
            .map(|a| a.id());
        match selected {
            Some(_) => debug!("{}: selects {}", self.name, stage.action),
            None => warn!("{}: scripted action {} is not enabled", self.name, stage.action),
        }
        Ok(selected)
    }

    fn execute_action(&mut self, action: &Action) -> Result<()> {
        debug!("{}: dispatches {}", self.name, action.operator);
        Ok(())
    }

    fn observe_state_change(&mut self, _current_state: &State) -> Result<StateDelta> {
        let Some(stage) = self.stages.get(self.index) else {
            warn!("{}: script exhausted, observing no change", self.name);
            return Ok(StateDelta::new());
        };
        self.index += 1;
        debug!("{}: observes {:?}", self.name, stage.state_change);
        Ok(stage.state_change.clone())
    }
}
