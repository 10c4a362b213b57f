//! Error types for assignment runs.

use crate::config::ConfigError;
use thiserror::Error;

/// Errors raised while building, solving or projecting an assignment.
///
/// Every variant is fatal to the run. The runner only recovers from
/// [`AssignError::Infeasible`] and [`AssignError::Timeout`], which it
/// reports as a fully unassigned [`AssignmentReport`](crate::assign::AssignmentReport).
#[derive(Debug, Error)]
pub enum AssignError {
    /// A preference names a category outside the catalog.
    #[error("agent {agent}: unknown category {name:?}")]
    UnknownCategory { agent: String, name: String },

    /// A capacity declaration has `min > max`.
    #[error("category {category}: invalid capacity range [{min}, {max}]")]
    InvalidRange {
        category: String,
        min: usize,
        max: usize,
    },

    /// No assignment satisfies coverage and capacity constraints together.
    #[error("infeasible: {reason}")]
    Infeasible { reason: String },

    /// The same agent identifier appears twice in the input.
    #[error("duplicate agent {agent}")]
    DuplicateAgent { agent: String },

    /// The solver hit its time limit before proving optimality.
    #[error("solver exceeded time limit of {limit_ms} ms")]
    Timeout { limit_ms: u64 },

    /// A preference row has a blank agent identifier.
    #[error("row {row}: missing agent identifier")]
    MissingAgentId { row: usize },

    /// A preference row ranks more categories than allowed.
    #[error(
        "agent {agent}: {count} choices given, at most {max} allowed",
        max = crate::preference::MAX_CHOICES
    )]
    TooManyChoices { agent: String, count: usize },

    /// Two capacity declarations name the same category.
    #[error("category {category}: capacity declared more than once")]
    DuplicateCapacity { category: String },

    /// A capacity declaration names a category outside the catalog.
    #[error("capacity declared for unknown category {name:?}")]
    UnknownCapacityCategory { name: String },

    /// The solver returned a solution that selects several categories for one agent.
    #[error("agent {agent}: solution selects more than one category")]
    InconsistentSolution { agent: String },

    /// The constraint model was rejected by the solver.
    #[error("invalid model: {0}")]
    ModelInvalid(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result alias for assignment operations.
pub type Result<T> = std::result::Result<T, AssignError>;
