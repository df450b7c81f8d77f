//! Plan library: reads plan and scenario descriptions and keeps them by name.
//!
//! Plan file:
//! ```json
//! {"plan_name": "plan_1",
//!  "start": {"P": "True", "Q": "True"},
//!  "goal": {"P": "False"},
//!  "sequence": [{"action": "A1", "precondition": {"P": "True"}, "effect": {"Q": "False"}}]}
//! ```
//! Scenario file:
//! ```json
//! {"scenario_name": "scenario_1", "plan_name": "plan_1",
//!  "start": {"P": "True", "Q": "True"},
//!  "sequence": [{"action": "A1", "state_change": {"Q": "False"}}]}
//! ```
//! Values may be any JSON scalar; non-strings are kept as their JSON text.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::actor::ScriptedActor;
use crate::dispatcher::{DispatchReport, Dispatcher};
use crate::error::{Result, TetherError};
use crate::model::{Action, Assignment, StateDelta, TotalOrderPlan, GOAL_OPERATOR, START_OPERATOR};
use crate::scenario::{ExecutionScenario, ScenarioStage};

type AssignmentMap = BTreeMap<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDescription {
    pub plan_name: String,
    #[serde(default)]
    pub start: AssignmentMap,
    #[serde(default)]
    pub goal: AssignmentMap,
    #[serde(default)]
    pub sequence: Vec<ActionDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDescription {
    pub action: String,
    #[serde(default)]
    pub precondition: AssignmentMap,
    #[serde(default)]
    pub effect: AssignmentMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDescription {
    pub scenario_name: String,
    pub plan_name: String,
    #[serde(default)]
    pub start: AssignmentMap,
    #[serde(default)]
    pub sequence: Vec<StageDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDescription {
    pub action: String,
    #[serde(default)]
    pub state_change: AssignmentMap,
}

fn scalar_text(variable: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(_) | Value::Number(_) | Value::Null => Ok(value.to_string()),
        _ => Err(TetherError::InvalidPlan(format!(
            "value of {} must be a scalar, got {}",
            variable, value
        ))),
    }
}

fn to_assignments(map: &AssignmentMap) -> Result<Vec<Assignment>> {
    let mut assignments = Vec::with_capacity(map.len());
    for (variable, value) in map {
        assignments.push(Assignment::new(variable.clone(), scalar_text(variable, value)?));
    }
    Ok(assignments)
}

fn to_delta(map: &AssignmentMap) -> Result<StateDelta> {
    let mut delta = StateDelta::new();
    for (variable, value) in map {
        delta.insert(variable.clone(), scalar_text(variable, value)?);
    }
    Ok(delta)
}

impl PlanDescription {
    /// Validate and compile into a total-order plan.
    pub fn into_plan(self) -> Result<TotalOrderPlan> {
        if self.plan_name.trim().is_empty() {
            return Err(TetherError::InvalidPlan("plan_name is empty".to_string()));
        }
        let mut sequence = Vec::with_capacity(self.sequence.len());
        for step in &self.sequence {
            if step.action == START_OPERATOR || step.action == GOAL_OPERATOR {
                return Err(TetherError::InvalidPlan(format!(
                    "{}: action name {} is reserved",
                    self.plan_name, step.action
                )));
            }
            sequence.push(Action::new(
                step.action.clone(),
                to_assignments(&step.precondition)?,
                to_assignments(&step.effect)?,
            ));
        }
        let start = to_assignments(&self.start)?;
        let goal = to_assignments(&self.goal)?;
        Ok(TotalOrderPlan::new(self.plan_name, sequence, start, goal))
    }
}

impl ScenarioDescription {
    pub fn into_scenario(self) -> Result<ExecutionScenario> {
        if self.scenario_name.trim().is_empty() {
            return Err(TetherError::InvalidPlan("scenario_name is empty".to_string()));
        }
        let mut stages = Vec::with_capacity(self.sequence.len());
        for stage in &self.sequence {
            stages.push(ScenarioStage::new(stage.action.clone(), to_delta(&stage.state_change)?));
        }
        Ok(ExecutionScenario::new(
            self.scenario_name,
            self.plan_name,
            to_assignments(&self.start)?,
            stages,
        ))
    }
}

pub fn parse_plan(json: &str) -> Result<TotalOrderPlan> {
    let description: PlanDescription = serde_json::from_str(json)?;
    description.into_plan()
}

pub fn parse_scenario(json: &str) -> Result<ExecutionScenario> {
    let description: ScenarioDescription = serde_json::from_str(json)?;
    description.into_scenario()
}

/// Replay `scenario` against `plan` with a scripted actor.
pub fn dispatch_scenario(plan: &TotalOrderPlan, scenario: &ExecutionScenario) -> Result<DispatchReport> {
    if scenario.plan_name != plan.name {
        return Err(TetherError::ScenarioMismatch {
            scenario: scenario.name.clone(),
            expected: scenario.plan_name.clone(),
            actual: plan.name.clone(),
        });
    }
    let actor = ScriptedActor::new(scenario);
    let name = format!("{}/{}", plan.name, scenario.name);
    Dispatcher::new(name, &plan.partial_order_plan, actor).dispatch()
}

#[derive(Debug, Default)]
pub struct PlanLibrary {
    plans: BTreeMap<String, TotalOrderPlan>,
    scenarios: BTreeMap<String, ExecutionScenario>,
}

impl PlanLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plan, replacing any plan with the same name.
    pub fn add_plan(&mut self, plan: TotalOrderPlan) -> &TotalOrderPlan {
        let name = plan.name.clone();
        if self.plans.insert(name.clone(), plan).is_some() {
            warn!("Replaced plan {}", name);
        }
        &self.plans[&name]
    }

    pub fn add_scenario(&mut self, scenario: ExecutionScenario) -> &ExecutionScenario {
        let name = scenario.name.clone();
        if !self.plans.contains_key(&scenario.plan_name) {
            debug!("Scenario {} targets plan {} which is not loaded yet", name, scenario.plan_name);
        }
        if self.scenarios.insert(name.clone(), scenario).is_some() {
            warn!("Replaced scenario {}", name);
        }
        &self.scenarios[&name]
    }

    pub fn load_plan_str(&mut self, json: &str) -> Result<&TotalOrderPlan> {
        let plan = parse_plan(json)?;
        Ok(self.add_plan(plan))
    }

    pub fn load_scenario_str(&mut self, json: &str) -> Result<&ExecutionScenario> {
        let scenario = parse_scenario(json)?;
        Ok(self.add_scenario(scenario))
    }

    pub fn load_plan_file(&mut self, path: impl AsRef<Path>) -> Result<&TotalOrderPlan> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        info!("Loading plan from {}", path.display());
        self.load_plan_str(&content)
    }

    pub fn load_scenario_file(&mut self, path: impl AsRef<Path>) -> Result<&ExecutionScenario> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        info!("Loading scenario from {}", path.display());
        self.load_scenario_str(&content)
    }

    /// Load every `*.json` plan in `dir`, in file-name order. Returns the count.
    pub fn load_plan_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let files = json_files(dir.as_ref())?;
        for file in &files {
            self.load_plan_file(file)?;
        }
        Ok(files.len())
    }

    pub fn load_scenario_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let files = json_files(dir.as_ref())?;
        for file in &files {
            self.load_scenario_file(file)?;
        }
        Ok(files.len())
    }

    pub fn plan(&self, name: &str) -> Result<&TotalOrderPlan> {
        self.plans
            .get(name)
            .ok_or_else(|| TetherError::UnknownPlan(name.to_string()))
    }

    pub fn scenario(&self, name: &str) -> Result<&ExecutionScenario> {
        self.scenarios
            .get(name)
            .ok_or_else(|| TetherError::UnknownScenario(name.to_string()))
    }

    pub fn plan_names(&self) -> Vec<&str> {
        self.plans.keys().map(String::as_str).collect()
    }

    pub fn scenario_names(&self) -> Vec<&str> {
        self.scenarios.keys().map(String::as_str).collect()
    }

    pub fn scenarios_for(&self, plan_name: &str) -> Vec<&ExecutionScenario> {
        self.scenarios
            .values()
            .filter(|s| s.plan_name == plan_name)
            .collect()
    }

    /// Replay a registered scenario against the plan it names.
    pub fn dispatch_scenario(&self, scenario_name: &str) -> Result<DispatchReport> {
        let scenario = self.scenario(scenario_name)?;
        let plan = self.plan(&scenario.plan_name)?;
        dispatch_scenario(plan, scenario)
    }
}

fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
