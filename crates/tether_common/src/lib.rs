//! Tether: compile grounded plans into least-commitment plans and dispatch
//! them under causal-link monitoring.
//!
//! - [`compiler`] turns a total order into causal links and minimal orderings
//! - [`monitor`] tracks active links against observed state
//! - [`dispatcher`] runs the plan frontier through an [`actor::Actor`]

pub mod actor;
pub mod compiler;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod graph;
pub mod library;
pub mod minimizer;
pub mod model;
pub mod monitor;
pub mod report;
pub mod scenario;

pub use compiler::compile;
pub use dispatcher::{DispatchReport, DispatchStatus, Dispatcher};
pub use error::{Result, TetherError};
pub use model::{Action, ActionId, Assignment, PartialOrderPlan, State, TotalOrderPlan};
