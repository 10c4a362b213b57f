//! Constraint Programming (CP) layer for 0/1 assignment models.
//!
//! Provides a small modeling layer over boolean variables and two exact
//! solvers for it.
//!
//! # Key Components
//!
//! - **Variables**: [`BoolVar`], addressed by [`VarId`]
//! - **Constraints**: [`Constraint`] (`ExactlyOne` and `Range`)
//! - **Model**: [`CpModel`], the container for variables and constraints
//! - **Solver**: [`CpSolver`] trait, implemented by [`FlowSolver`]
//!   (min-cost flow) and [`BranchAndBoundSolver`]
//!
//! # Design
//!
//! Solvers never return an unproven solution as [`SolverStatus::Optimal`].
//! Infeasibility, time limits and malformed models are reported through
//! [`SolverStatus`]; interpreting them is left to the caller.
//!
//! # References
//!
//! - Ahuja, Magnanti & Orlin (1993), "Network Flows", ch. 9 (successive
//!   shortest paths)
//! - Land & Doig (1960), "An Automatic Method of Solving Discrete
//!   Programming Problems"

mod bab;
mod flow;
mod model;
mod solver;
mod variables;

pub use bab::BranchAndBoundSolver;
pub use flow::FlowSolver;
pub use model::{Constraint, CpModel, Objective};
pub use solver::{CpSolution, CpSolver, SolverConfig, SolverStatus};
pub use variables::{BoolVar, VarId};
