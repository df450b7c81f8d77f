//! Causal links, orderings, threats and the two plan forms.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::action::{Action, ActionId};
use super::state::{format_assignments, Assignment};
use crate::compiler;

/// Index of a causal link in a compiled plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId(pub usize);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// The producer's effect establishes the consumer's precondition `condition`.
/// A link with no producer is an open precondition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CausalLink {
    pub condition: Assignment,
    pub producer: Option<ActionId>,
    pub consumer: ActionId,
}

impl CausalLink {
    pub fn is_open(&self) -> bool {
        self.producer.is_none()
    }
}

/// Before-relation needed to resolve a threat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ordering {
    pub predecessor: ActionId,
    pub successor: ActionId,
}

/// `action` may clobber `link`'s condition and no order-preserving
/// resolution exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Threat {
    pub link: LinkId,
    pub action: ActionId,
}

/// An observed or activated value disagrees with an active link's condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConflict {
    pub link: LinkId,
    pub condition: Assignment,
    pub observed: String,
}

impl fmt::Display for LinkConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={} violates active link {} ({})",
            self.condition.variable, self.observed, self.link, self.condition
        )
    }
}

/// Non-fatal findings produced while compiling a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompileDiagnostic {
    OpenPrecondition { link: LinkId },
    UnresolvedThreat { link: LinkId, action: ActionId },
}

/// Least-commitment plan: actions, causal links and the minimal orderings.
///
/// Actions are stored in encoded-sequence order, so `ActionId(i)` is the
/// action at location `i`. Links and actions refer to each other by id.
#[derive(Debug, Clone)]
pub struct PartialOrderPlan {
    pub name: String,
    pub actions: Vec<Action>,
    pub links: Vec<CausalLink>,
    pub orderings: Vec<Ordering>,
    pub start_action: ActionId,
    pub goal_action: ActionId,
}

impl PartialOrderPlan {
    pub fn action(&self, id: ActionId) -> &Action {
        &self.actions[id.0]
    }

    pub fn link(&self, id: LinkId) -> &CausalLink {
        &self.links[id.0]
    }

    pub fn action_named(&self, operator: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.operator == operator)
    }

    pub fn link_ids(&self) -> impl Iterator<Item = LinkId> {
        (0..self.links.len()).map(LinkId)
    }

    /// Links that no action in the sequence produces.
    pub fn open_links(&self) -> Vec<LinkId> {
        self.link_ids().filter(|&id| self.link(id).is_open()).collect()
    }

    /// Preconditions of non-start actions not consumed through a closed link.
    pub fn uncovered_preconditions(&self) -> Vec<(ActionId, Assignment)> {
        let mut uncovered = Vec::new();
        for action in &self.actions {
            if action.id() == self.start_action {
                continue;
            }
            for precondition in &action.preconditions {
                let covered = action.predecessor_links.iter().any(|&id| {
                    let link = self.link(id);
                    !link.is_open() && link.condition == *precondition
                });
                if !covered {
                    uncovered.push((action.id(), precondition.clone()));
                }
            }
        }
        uncovered
    }

    pub fn describe_link(&self, id: LinkId) -> String {
        let link = self.link(id);
        let producer = link
            .producer
            .map(|p| self.action(p).operator.clone())
            .unwrap_or_else(|| "?".to_string());
        format!(
            "{}: {}->{}",
            link.condition,
            producer,
            self.action(link.consumer).operator
        )
    }

    pub fn describe_ordering(&self, ordering: &Ordering) -> String {
        format!(
            "{} < {}",
            self.action(ordering.predecessor).operator,
            self.action(ordering.successor).operator
        )
    }
}

impl fmt::Display for PartialOrderPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "POP {}:", self.name)?;
        writeln!(f, "   Actions:")?;
        for action in &self.actions {
            writeln!(f, "      {}", action)?;
        }
        writeln!(f, "   Causal links:")?;
        for id in self.link_ids() {
            writeln!(f, "      {}", self.describe_link(id))?;
        }
        writeln!(f, "   Orderings:")?;
        if self.orderings.is_empty() {
            writeln!(f, "      none")?;
        }
        for ordering in &self.orderings {
            writeln!(f, "      {}", self.describe_ordering(ordering))?;
        }
        Ok(())
    }
}

/// A grounded action sequence with its start and goal assignments.
///
/// Construction encodes and compiles the sequence; the result is immutable.
#[derive(Debug, Clone)]
pub struct TotalOrderPlan {
    pub name: String,
    pub action_sequence: Vec<Action>,
    pub start: Vec<Assignment>,
    pub goal: Vec<Assignment>,
    pub partial_order_plan: PartialOrderPlan,
    pub threats: Vec<Threat>,
}

impl TotalOrderPlan {
    pub fn new(
        name: impl Into<String>,
        action_sequence: Vec<Action>,
        start: Vec<Assignment>,
        goal: Vec<Assignment>,
    ) -> Self {
        let name = name.into();
        let (partial_order_plan, threats) =
            compiler::compile(&name, &action_sequence, &start, &goal);

        for threat in &threats {
            warn!(
                "In plan {}: link {} is threatened by action {}",
                name,
                partial_order_plan.describe_link(threat.link),
                partial_order_plan.action(threat.action)
            );
        }

        Self {
            name,
            action_sequence,
            start,
            goal,
            partial_order_plan,
            threats,
        }
    }

    /// The sequence with the synthetic start and goal actions, location-stamped.
    pub fn encoded_sequence(&self) -> &[Action] {
        &self.partial_order_plan.actions
    }

    pub fn diagnostics(&self) -> Vec<CompileDiagnostic> {
        let plan = &self.partial_order_plan;
        let mut diagnostics: Vec<CompileDiagnostic> = plan
            .open_links()
            .into_iter()
            .map(|link| CompileDiagnostic::OpenPrecondition { link })
            .collect();
        diagnostics.extend(self.threats.iter().map(|t| CompileDiagnostic::UnresolvedThreat {
            link: t.link,
            action: t.action,
        }));
        diagnostics
    }
}

impl fmt::Display for TotalOrderPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TOP {}:", self.name)?;
        writeln!(f, "   Start: {}", format_assignments(&self.start))?;
        writeln!(f, "   Goal: {}", format_assignments(&self.goal))?;
        writeln!(f, "   Sequence:")?;
        for action in &self.action_sequence {
            writeln!(f, "      {}", action)?;
        }
        Ok(())
    }
}
