//! Execution scenarios: scripted action choices and observations for a plan.

use serde::{Deserialize, Serialize};

use crate::model::{Assignment, StateDelta, GOAL_OPERATOR, START_OPERATOR};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioStage {
    pub action: String,
    #[serde(default)]
    pub state_change: StateDelta,
}

impl ScenarioStage {
    pub fn new(action: impl Into<String>, state_change: StateDelta) -> Self {
        Self {
            action: action.into(),
            state_change,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionScenario {
    pub name: String,
    pub plan_name: String,
    /// State observed when the start action runs.
    pub start: Vec<Assignment>,
    pub stages: Vec<ScenarioStage>,
}

impl ExecutionScenario {
    pub fn new(
        name: impl Into<String>,
        plan_name: impl Into<String>,
        start: Vec<Assignment>,
        stages: Vec<ScenarioStage>,
    ) -> Self {
        Self {
            name: name.into(),
            plan_name: plan_name.into(),
            start,
            stages,
        }
    }

    /// No scripted stages: the execution has to be supplied interactively.
    pub fn is_interactive(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stages with the start observation first and an empty goal stage last.
    pub fn encoded_stages(&self) -> Vec<ScenarioStage> {
        let start: StateDelta = self
            .start
            .iter()
            .map(|a| (a.variable.clone(), a.value.clone()))
            .collect();

        let mut stages = Vec::with_capacity(self.stages.len() + 2);
        stages.push(ScenarioStage::new(START_OPERATOR, start));
        stages.extend(self.stages.iter().cloned());
        stages.push(ScenarioStage::new(GOAL_OPERATOR, StateDelta::new()));
        stages
    }
}
