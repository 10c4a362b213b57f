//! Assignment pipeline: rows in, report out.

use super::optimizer::AssignmentOptimizer;
use super::projector::{ResultProjector, SolveOutcome};
use super::types::{AssignStatus, AssignmentReport};
use crate::capacity::CapacityTable;
use crate::catalog::Catalog;
use crate::config::{AssignConfig, SolverSettings};
use crate::error::{AssignError, Result};
use crate::preference::{PreferenceModel, PreferenceRow};
use tracing::{info, warn};

/// Executes one assignment run.
///
/// Data errors (unknown categories, bad ranges, duplicate agents) abort the
/// run. An infeasible model or an exhausted time limit does not: the report
/// carries that status and lists every agent as unassigned.
///
/// # Examples
///
/// ```
/// use u_assign::assign::{AssignRunner, AssignStatus};
/// use u_assign::config::AssignConfig;
/// use u_assign::preference::PreferenceRow;
///
/// let config = AssignConfig::new()
///     .with_catalog(["A", "B"])
///     .with_capacity("A", 1, 1);
/// let rows = vec![
///     PreferenceRow::new("s1", ["A", "B"]),
///     PreferenceRow::new("s2", ["A"]),
/// ];
///
/// let report = AssignRunner::run(&config, &rows).unwrap();
/// assert_eq!(report.status, AssignStatus::Optimal);
/// assert_eq!(report.total_score, 5);
/// ```
pub struct AssignRunner;

impl AssignRunner {
    /// Validates the configuration, normalizes rows, solves and projects.
    pub fn run(config: &AssignConfig, rows: &[PreferenceRow]) -> Result<AssignmentReport> {
        config.validate()?;
        let catalog = config.build_catalog()?;
        let capacities = CapacityTable::new(&catalog, &config.capacity)?;
        let preferences = PreferenceModel::from_rows(&catalog, rows)?;
        Self::run_model(&catalog, &preferences, &capacities, &config.solver)
    }

    /// Runs on already built inputs.
    pub fn run_model(
        catalog: &Catalog,
        preferences: &PreferenceModel,
        capacities: &CapacityTable,
        settings: &SolverSettings,
    ) -> Result<AssignmentReport> {
        let optimizer = AssignmentOptimizer::new(catalog, preferences, capacities);
        let outcome = match optimizer.solve(settings) {
            Ok(solved) => SolveOutcome::Solved(solved),
            Err(AssignError::Infeasible { reason }) => {
                warn!(
                    %reason,
                    agents = preferences.len(),
                    "infeasible, reporting all agents unassigned"
                );
                SolveOutcome::Failed {
                    status: AssignStatus::Infeasible,
                    reason,
                }
            }
            Err(AssignError::Timeout { limit_ms }) => {
                warn!(
                    limit_ms,
                    agents = preferences.len(),
                    "time limit hit, reporting all agents unassigned"
                );
                SolveOutcome::Failed {
                    status: AssignStatus::Timeout,
                    reason: format!("no proven optimum within {limit_ms} ms"),
                }
            }
            Err(e) => return Err(e),
        };

        let report = ResultProjector::project(catalog, preferences, &outcome)?;
        info!(
            event = "report",
            status = %report.status,
            assigned = report.assigned_count(),
            unassigned = report.unassigned_count(),
            total_score = report.total_score,
        );
        Ok(report)
    }
}
