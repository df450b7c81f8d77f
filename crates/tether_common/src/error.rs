//! Error types for Tether.
//!
//! Compile diagnostics and dispatch conflicts are not errors; they are
//! returned as data on the compiled plan and on the dispatch report.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TetherError {
    #[error("Duplicate edge id: {0}")]
    DuplicateEdge(String),

    #[error("Unknown plan: {0}")]
    UnknownPlan(String),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Scenario {scenario} targets plan {expected}, not {actual}")]
    ScenarioMismatch {
        scenario: String,
        expected: String,
        actual: String,
    },

    #[error("Dispatcher {0} already ran; create a new dispatcher to retry")]
    AlreadyDispatched(String),

    #[error("Actor error: {0}")]
    Actor(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl TetherError {
    pub fn code(&self) -> i32 {
        match self {
            TetherError::DuplicateEdge(_) => -33001,
            TetherError::UnknownPlan(_) => -33002,
            TetherError::UnknownScenario(_) => -33003,
            TetherError::InvalidPlan(_) => -33004,
            TetherError::ScenarioMismatch { .. } => -33005,
            TetherError::AlreadyDispatched(_) => -33006,
            TetherError::Actor(_) => -33007,
            TetherError::Config(_) => -33008,
            TetherError::Io(_) => -33100,
            TetherError::Json(_) => -33700,
            TetherError::Toml(_) => -33701,
        }
    }
}

pub type Result<T> = std::result::Result<T, TetherError>;
