//! JSON output for a compiled plan and its monitored execution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dispatcher::{DispatchReport, DispatchStatus, StepRecord};
use crate::error::Result;
use crate::model::{Assignment, CompileDiagnostic, TotalOrderPlan};

fn assignment_map(assignments: &[Assignment]) -> BTreeMap<String, String> {
    assignments
        .iter()
        .map(|a| (a.variable.clone(), a.value.clone()))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionView {
    pub name: String,
    pub location: usize,
    pub precondition: BTreeMap<String, String>,
    pub effect: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkView {
    pub condition: BTreeMap<String, String>,
    pub producer: Option<String>,
    pub consumer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderingView {
    pub predecessor: String,
    pub successor: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialPlanView {
    pub actions: Vec<ActionView>,
    pub links: Vec<LinkView>,
    pub orderings: Vec<OrderingView>,
    pub diagnostics: Vec<String>,
}

impl PartialPlanView {
    pub fn new(plan: &TotalOrderPlan) -> Self {
        let pop = &plan.partial_order_plan;
        let actions = pop
            .actions
            .iter()
            .map(|a| ActionView {
                name: a.operator.clone(),
                location: a.location,
                precondition: assignment_map(&a.preconditions),
                effect: assignment_map(&a.effects),
            })
            .collect();
        let links = pop
            .links
            .iter()
            .map(|l| LinkView {
                condition: assignment_map(std::slice::from_ref(&l.condition)),
                producer: l.producer.map(|p| pop.action(p).operator.clone()),
                consumer: pop.action(l.consumer).operator.clone(),
            })
            .collect();
        let orderings = pop
            .orderings
            .iter()
            .map(|o| OrderingView {
                predecessor: pop.action(o.predecessor).operator.clone(),
                successor: pop.action(o.successor).operator.clone(),
            })
            .collect();
        let diagnostics = plan
            .diagnostics()
            .iter()
            .map(|d| match d {
                CompileDiagnostic::OpenPrecondition { link } => {
                    format!("open precondition {}", pop.describe_link(*link))
                }
                CompileDiagnostic::UnresolvedThreat { link, action } => format!(
                    "{} threatens {}",
                    pop.action(*action).operator,
                    pop.describe_link(*link)
                ),
            })
            .collect();

        Self {
            actions,
            links,
            orderings,
            diagnostics,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoredExecution {
    pub run_id: String,
    pub status: DispatchStatus,
    pub completed: Vec<String>,
    pub final_state: BTreeMap<String, String>,
    pub conflicts: Vec<String>,
    pub steps: Vec<StepRecord>,
}

impl MonitoredExecution {
    pub fn new(plan: &TotalOrderPlan, report: &DispatchReport) -> Self {
        let pop = &plan.partial_order_plan;
        Self {
            run_id: report.run_id.to_string(),
            status: report.status,
            completed: report
                .completed_operators(pop)
                .into_iter()
                .map(str::to_string)
                .collect(),
            final_state: assignment_map(&report.final_state.assignments()),
            conflicts: report.conflicts.iter().map(|c| c.to_string()).collect(),
            steps: report.steps.clone(),
        }
    }
}

/// Compiled plan plus, when it was dispatched, its monitored execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutput {
    pub plan_name: String,
    pub partial_plan: PartialPlanView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitored_execution: Option<MonitoredExecution>,
}

impl ScenarioOutput {
    pub fn new(plan: &TotalOrderPlan, report: Option<&DispatchReport>) -> Self {
        Self {
            plan_name: plan.name.clone(),
            partial_plan: PartialPlanView::new(plan),
            monitored_execution: report.map(|r| MonitoredExecution::new(plan, r)),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
