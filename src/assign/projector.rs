//! Maps solver output back onto agents and categories.

use super::optimizer::SolvedModel;
use super::types::{AssignStatus, AssignmentReport, AssignmentRow, CategoryCount, Placement};
use crate::catalog::Catalog;
use crate::error::{AssignError, Result};
use crate::preference::PreferenceModel;

/// What the optimizer produced for a run.
#[derive(Debug, Clone)]
pub enum SolveOutcome {
    /// A proven optimal solve.
    Solved(SolvedModel),
    /// No accepted solution; every agent will be reported unassigned.
    Failed { status: AssignStatus, reason: String },
}

/// Builds the total agent → placement mapping.
pub struct ResultProjector;

impl ResultProjector {
    /// Projects an outcome onto every agent of `preferences`, in input order.
    ///
    /// Agents with no selected variable are `Unassigned`; an agent with
    /// several selected variables is an [`AssignError::InconsistentSolution`].
    pub fn project(
        catalog: &Catalog,
        preferences: &PreferenceModel,
        outcome: &SolveOutcome,
    ) -> Result<AssignmentReport> {
        let mut counts: Vec<CategoryCount> = catalog
            .ids()
            .map(|id| CategoryCount {
                category: id,
                name: catalog.name(id).to_string(),
                count: 0,
            })
            .collect();
        let mut rows = Vec::with_capacity(preferences.len());
        let mut total_score = 0;

        let (status, reason) = match outcome {
            SolveOutcome::Solved(_) => (AssignStatus::Optimal, None),
            SolveOutcome::Failed { status, reason } => (*status, Some(reason.clone())),
        };

        for (index, agent) in preferences.agents().iter().enumerate() {
            let placement = match outcome {
                SolveOutcome::Solved(solved) => {
                    let mut selected = catalog.ids().filter(|&c| {
                        solved
                            .model
                            .vars
                            .get(index)
                            .and_then(|row| row.get(c.0))
                            .is_some_and(|&var| solved.solution.value(var))
                    });
                    match (selected.next(), selected.next()) {
                        (Some(c), None) => Placement::Assigned(c),
                        (None, _) => Placement::Unassigned,
                        (Some(_), Some(_)) => {
                            return Err(AssignError::InconsistentSolution {
                                agent: agent.id.to_string(),
                            })
                        }
                    }
                }
                SolveOutcome::Failed { .. } => Placement::Unassigned,
            };

            let score = match placement {
                Placement::Assigned(c) => {
                    counts[c.0].count += 1;
                    agent.score(c)
                }
                Placement::Unassigned => 0,
            };
            total_score += score;
            rows.push(AssignmentRow {
                agent: agent.id.clone(),
                placement,
                score,
            });
        }

        Ok(AssignmentReport {
            status,
            reason,
            rows,
            counts,
            total_score,
        })
    }
}
