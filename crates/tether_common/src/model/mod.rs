//! Plan data model.

pub mod action;
pub mod plan;
pub mod state;

pub use action::{Action, ActionId, GOAL_OPERATOR, START_OPERATOR};
pub use plan::{
    CausalLink, CompileDiagnostic, LinkConflict, LinkId, Ordering, PartialOrderPlan, Threat,
    TotalOrderPlan,
};
pub use state::{format_assignments, Assignment, State, StateDelta};
