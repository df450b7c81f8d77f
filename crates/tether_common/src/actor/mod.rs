//! Actors perform actions in the world and report what they observe.
//!
//! The dispatcher only talks to the [`Actor`] trait. Implementations:
//! - [`ScriptedActor`]: replays an [`ExecutionScenario`](crate::scenario::ExecutionScenario)
//! - [`SimulatedActor`]: picks by policy, observes exactly the intended effects
//! - [`InteractiveActor`]: asks a person on a terminal

mod interactive;
mod scripted;
mod simulated;

pub use interactive::InteractiveActor;
pub use scripted::ScriptedActor;
pub use simulated::{SelectionPolicy, SimulatedActor};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Action, ActionId, State, StateDelta};

pub trait Actor {
    fn name(&self) -> &str;

    /// Pick one of the enabled actions, or `None` to stop.
    fn select_enabled_action(&mut self, candidates: &[&Action]) -> Result<Option<ActionId>>;

    /// Perform the action; returns once its effects are final.
    fn execute_action(&mut self, action: &Action) -> Result<()>;

    /// Report the variables that changed since `current_state`.
    fn observe_state_change(&mut self, current_state: &State) -> Result<StateDelta>;
}

impl<A: Actor + ?Sized> Actor for Box<A> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn select_enabled_action(&mut self, candidates: &[&Action]) -> Result<Option<ActionId>> {
        (**self).select_enabled_action(candidates)
    }

    fn execute_action(&mut self, action: &Action) -> Result<()> {
        (**self).execute_action(action)
    }

    fn observe_state_change(&mut self, current_state: &State) -> Result<StateDelta> {
        (**self).observe_state_change(current_state)
    }
}

/// Actor variant selected by configuration or the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    #[default]
    Scripted,
    Simulated,
    Interactive,
}

impl ActorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorKind::Scripted => "scripted",
            ActorKind::Simulated => "simulated",
            ActorKind::Interactive => "interactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "scripted" | "script" => Some(ActorKind::Scripted),
            "simulated" | "sim" => Some(ActorKind::Simulated),
            "interactive" | "user" => Some(ActorKind::Interactive),
            _ => None,
        }
    }
}
