//! Causal link monitor.
//!
//! A link becomes active when its producer completes and stays active until
//! its consumer starts. While active, any observed value of its condition's
//! variable must equal the condition's value.

use tracing::debug;

use crate::model::{ActionId, CausalLink, LinkConflict, LinkId, PartialOrderPlan, State, StateDelta};

/// Result of a single monitor check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCheck {
    Satisfied,
    Violated(Vec<LinkConflict>),
}

impl LinkCheck {
    fn from_conflicts(conflicts: Vec<LinkConflict>) -> Self {
        if conflicts.is_empty() {
            LinkCheck::Satisfied
        } else {
            LinkCheck::Violated(conflicts)
        }
    }

    pub fn is_satisfied(&self) -> bool {
        matches!(self, LinkCheck::Satisfied)
    }

    pub fn conflicts(&self) -> &[LinkConflict] {
        match self {
            LinkCheck::Satisfied => &[],
            LinkCheck::Violated(conflicts) => conflicts,
        }
    }

    pub fn into_conflicts(self) -> Vec<LinkConflict> {
        match self {
            LinkCheck::Satisfied => Vec::new(),
            LinkCheck::Violated(conflicts) => conflicts,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CausalLinkMonitor<'p> {
    plan: &'p PartialOrderPlan,
    active_links: Vec<LinkId>,
    current_state: State,
}

impl<'p> CausalLinkMonitor<'p> {
    /// No links are active and the state is empty until the start action runs.
    pub fn new(plan: &'p PartialOrderPlan) -> Self {
        Self {
            plan,
            active_links: Vec::new(),
            current_state: State::new(),
        }
    }

    pub fn links(&self) -> &'p [CausalLink] {
        &self.plan.links
    }

    pub fn active_links(&self) -> &[LinkId] {
        &self.active_links
    }

    pub fn is_active(&self, link: LinkId) -> bool {
        self.active_links.contains(&link)
    }

    pub fn current_state(&self) -> &State {
        &self.current_state
    }

    pub fn current_value(&self, variable: &str) -> Option<&str> {
        self.current_state.value(variable)
    }

    /// Record observed changes. Must be called with every observed delta,
    /// otherwise later checks run against a stale state.
    pub fn update_state(&mut self, changes: &StateDelta) {
        self.current_state.apply(changes);
    }

    /// Deactivate the links `action` consumes; returns them.
    pub fn monitor_action_start(&mut self, action: ActionId) -> Vec<LinkId> {
        let plan = self.plan;
        let (consumed, kept): (Vec<LinkId>, Vec<LinkId>) = self
            .active_links
            .iter()
            .partition(|&&id| plan.link(id).consumer == action);
        self.active_links = kept;

        if consumed.is_empty() {
            debug!("{} consumes no links", plan.action(action).operator);
        }
        for id in &consumed {
            debug!("{} consumes link {}", plan.action(action).operator, plan.describe_link(*id));
        }
        consumed
    }

    /// Activate the links `action` produces and check each one against the
    /// current state. Every new link is checked.
    pub fn monitor_completed_action(&mut self, action: ActionId) -> LinkCheck {
        let plan = self.plan;
        let mut conflicts = Vec::new();

        for &id in &plan.action(action).successor_links {
            if !self.active_links.contains(&id) {
                self.active_links.push(id);
            }
            let condition = &plan.link(id).condition;
            match self.current_state.value(&condition.variable) {
                Some(observed) if observed != condition.value => {
                    debug!("State violates new link {}", plan.describe_link(id));
                    conflicts.push(LinkConflict {
                        link: id,
                        condition: condition.clone(),
                        observed: observed.to_string(),
                    });
                }
                _ => debug!("State satisfies new link {}", plan.describe_link(id)),
            }
        }
        LinkCheck::from_conflicts(conflicts)
    }

    /// Check every changed assignment against every active link on the same
    /// variable.
    pub fn check_state_change(&self, changes: &StateDelta) -> LinkCheck {
        let plan = self.plan;
        let mut conflicts = Vec::new();

        for (variable, value) in changes {
            for &id in &self.active_links {
                let condition = &plan.link(id).condition;
                if condition.variable == *variable && condition.value != *value {
                    debug!("{}={} violates link {}", variable, value, plan.describe_link(id));
                    conflicts.push(LinkConflict {
                        link: id,
                        condition: condition.clone(),
                        observed: value.clone(),
                    });
                }
            }
        }
        LinkCheck::from_conflicts(conflicts)
    }
}
