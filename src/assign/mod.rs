//! Preference-based capacitated assignment.
//!
//! Turns normalized preferences and a capacity table into a 0/1 model,
//! solves it exactly and projects the result onto every agent.
//!
//! # Unassigned agents
//!
//! [`AssignmentOptimizer`] is strict: it returns a proven optimum or an
//! error. [`AssignRunner`] turns `Infeasible` and `Timeout` errors into a
//! report in which every agent is [`Placement::Unassigned`] and the status
//! says why. Partial assignments are never produced.

mod optimizer;
mod projector;
mod runner;
mod types;

pub use optimizer::{AssignmentModel, AssignmentOptimizer, SolvedModel};
pub use projector::{ResultProjector, SolveOutcome};
pub use runner::AssignRunner;
pub use types::{
    AssignStatus, AssignmentReport, AssignmentRow, CategoryCount, Placement, UNASSIGNED,
};
