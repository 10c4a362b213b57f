//! Preference-based capacitated assignment.
//!
//! Places every agent (e.g. a student) into exactly one category (e.g. an
//! observation subject) so that the total preference score is maximal and
//! every category's head count stays within its declared range.
//!
//! - **Catalog**: fixed, ordered category names ([`catalog`])
//! - **Preferences**: up to three ranked choices per agent, scored
//!   3 / 2 / 1 / 0 ([`preference`])
//! - **Capacities**: inclusive `[min, max]` per category, unbounded by
//!   default ([`capacity`])
//! - **CP layer**: 0/1 model with exact min-cost flow and branch-and-bound
//!   solvers ([`cp`])
//! - **Assignment**: model construction, solve, projection to a report
//!   ([`assign`])
//! - **Configuration**: TOML-loadable run settings ([`config`])
//!
//! # Examples
//!
//! ```
//! use u_assign::assign::AssignRunner;
//! use u_assign::config::AssignConfig;
//! use u_assign::preference::PreferenceRow;
//!
//! let config = AssignConfig::new()
//!     .with_catalog(["Geodesy", "Seismology"])
//!     .with_capacity("Geodesy", 1, 1);
//! let rows = vec![
//!     PreferenceRow::new("1001", ["Geodesy", "Seismology"]),
//!     PreferenceRow::new("1002", ["Geodesy"]),
//! ];
//!
//! let report = AssignRunner::run(&config, &rows).unwrap();
//! for (agent, category) in report.records() {
//!     println!("{agent},{category}");
//! }
//! println!("{report}");
//! ```

pub mod assign;
pub mod capacity;
pub mod catalog;
pub mod config;
pub mod cp;
pub mod error;
pub mod preference;

pub use error::{AssignError, Result};
