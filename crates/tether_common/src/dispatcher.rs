//! Plan dispatcher.
//!
//! Walks the partial-order plan one action at a time: the actor picks from
//! the enabled frontier, executes, and reports what changed; the monitor
//! validates the observation and the links the action establishes. The first
//! conflict ends the run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::actor::Actor;
use crate::error::{Result, TetherError};
use crate::model::{ActionId, Assignment, LinkConflict, LinkId, PartialOrderPlan, State, StateDelta};
use crate::monitor::{CausalLinkMonitor, LinkCheck};

/// How a dispatch run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    /// Frontier emptied after the goal action completed.
    Success,
    /// An observation or a newly activated link conflicted with a link.
    AbortedConflict,
    /// Frontier emptied before the goal action completed.
    Stalled,
}

impl std::fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::AbortedConflict => "aborted (conflict)",
            Self::Stalled => "stalled",
        };
        write!(f, "{}", s)
    }
}

/// One monitored step of a dispatch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub action: String,
    pub deactivated: Vec<Assignment>,
    pub activated: Vec<Assignment>,
    pub state_change: StateDelta,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReport {
    pub run_id: Uuid,
    pub plan: String,
    pub completed: Vec<ActionId>,
    pub final_state: State,
    pub status: DispatchStatus,
    pub conflicts: Vec<LinkConflict>,
    pub steps: Vec<StepRecord>,
}

impl DispatchReport {
    pub fn success(&self) -> bool {
        self.status == DispatchStatus::Success
    }

    pub fn completed_operators<'p>(&self, plan: &'p PartialOrderPlan) -> Vec<&'p str> {
        self.completed
            .iter()
            .map(|&id| plan.action(id).operator.as_str())
            .collect()
    }
}

pub struct Dispatcher<'p, A> {
    name: String,
    plan: &'p PartialOrderPlan,
    monitor: CausalLinkMonitor<'p>,
    actor: A,
    enabled_actions: Vec<ActionId>,
    completed_actions: Vec<ActionId>,
    dispatched: bool,
}

impl<'p, A: Actor> Dispatcher<'p, A> {
    /// The frontier starts with the start action, which has no preconditions.
    pub fn new(name: impl Into<String>, plan: &'p PartialOrderPlan, actor: A) -> Self {
        Self {
            name: name.into(),
            plan,
            monitor: CausalLinkMonitor::new(plan),
            actor,
            enabled_actions: vec![plan.start_action],
            completed_actions: Vec::new(),
            dispatched: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn enabled_actions(&self) -> &[ActionId] {
        &self.enabled_actions
    }

    pub fn completed_actions(&self) -> &[ActionId] {
        &self.completed_actions
    }

    pub fn monitor(&self) -> &CausalLinkMonitor<'p> {
        &self.monitor
    }

    pub fn actor(&self) -> &A {
        &self.actor
    }

    /// Run the plan to completion, conflict or stall.
    ///
    /// A dispatcher runs once; a second call is an error.
    pub fn dispatch(&mut self) -> Result<DispatchReport> {
        if self.dispatched {
            return Err(TetherError::AlreadyDispatched(self.name.clone()));
        }
        self.dispatched = true;

        let run_id = Uuid::new_v4();
        let plan = self.plan;
        let mut steps = Vec::new();
        info!("Dispatching {} (run {})", plan.name, run_id);

        loop {
            let candidates: Vec<_> = self.enabled_actions.iter().map(|&id| plan.action(id)).collect();
            let Some(action) = self.actor.select_enabled_action(&candidates)? else {
                break;
            };
            if !self.enabled_actions.contains(&action) {
                return Err(TetherError::Actor(format!(
                    "{} selected action {}, which is not enabled",
                    self.actor.name(),
                    action
                )));
            }
            info!("Next action {}", plan.action(action));

            let deactivated = self.monitor.monitor_action_start(action);

            self.actor.execute_action(plan.action(action))?;

            let changes = self.actor.observe_state_change(self.monitor.current_state())?;
            debug!("Observed {:?}", changes);
            let observed = self.monitor.check_state_change(&changes);
            self.monitor.update_state(&changes);

            let mut record = StepRecord {
                action: plan.action(action).operator.clone(),
                deactivated: conditions(plan, &deactivated),
                activated: Vec::new(),
                state_change: changes,
                at: Utc::now(),
            };

            if let LinkCheck::Violated(conflicts) = observed {
                steps.push(record);
                return Ok(self.abort(run_id, conflicts, steps));
            }

            let activated = self.monitor.monitor_completed_action(action);
            record.activated = conditions(plan, &plan.action(action).successor_links);
            steps.push(record);
            if let LinkCheck::Violated(conflicts) = activated {
                return Ok(self.abort(run_id, conflicts, steps));
            }

            if self.completed_actions.contains(&plan.goal_action) {
                debug!("{} completed after the goal", plan.action(action).operator);
            }
            self.completed_actions.push(action);
            let successors = self.enabled_successors(action);
            if successors.is_empty() {
                debug!("Success, no enabled successors");
            }
            for &successor in &successors {
                debug!("Success, enables {}", plan.action(successor));
            }
            self.enabled_actions.retain(|&id| id != action);
            self.enabled_actions.extend(successors);
        }

        let status = if self.completed_actions.contains(&plan.goal_action) {
            info!(
                "Plan {} dispatched: {} actions completed",
                plan.name,
                self.completed_actions.len()
            );
            DispatchStatus::Success
        } else {
            warn!(
                "Plan {} stalled after {} of {} actions",
                plan.name,
                self.completed_actions.len(),
                plan.actions.len()
            );
            DispatchStatus::Stalled
        };

        Ok(self.report(run_id, status, Vec::new(), steps))
    }

    /// Successors of `action` whose predecessors have all completed and that
    /// are not already enabled or done.
    fn enabled_successors(&self, action: ActionId) -> Vec<ActionId> {
        let mut enabled: Vec<ActionId> = Vec::new();
        for &successor in &self.plan.action(action).successor_actions {
            if enabled.contains(&successor)
                || self.enabled_actions.contains(&successor)
                || self.completed_actions.contains(&successor)
            {
                continue;
            }
            let ready = self
                .plan
                .action(successor)
                .predecessor_actions
                .iter()
                .all(|p| self.completed_actions.contains(p));
            if ready {
                enabled.push(successor);
            }
        }
        enabled
    }

    fn abort(&self, run_id: Uuid, conflicts: Vec<LinkConflict>, steps: Vec<StepRecord>) -> DispatchReport {
        for conflict in &conflicts {
            warn!("Conflict: {}", conflict);
        }
        self.report(run_id, DispatchStatus::AbortedConflict, conflicts, steps)
    }

    fn report(
        &self,
        run_id: Uuid,
        status: DispatchStatus,
        conflicts: Vec<LinkConflict>,
        steps: Vec<StepRecord>,
    ) -> DispatchReport {
        DispatchReport {
            run_id,
            plan: self.plan.name.clone(),
            completed: self.completed_actions.clone(),
            final_state: self.monitor.current_state().clone(),
            status,
            conflicts,
            steps,
        }
    }
}

fn conditions(plan: &PartialOrderPlan, links: &[LinkId]) -> Vec<Assignment> {
    links.iter().map(|&id| plan.link(id).condition.clone()).collect()
}
