//! Builds and solves the assignment integer program.

use crate::capacity::CapacityTable;
use crate::catalog::{Catalog, CategoryId};
use crate::config::{SolverKind, SolverSettings};
use crate::cp::{
    BoolVar, BranchAndBoundSolver, CpModel, CpSolution, CpSolver, FlowSolver, Objective,
    SolverConfig, SolverStatus, VarId,
};
use crate::error::{AssignError, Result};
use crate::preference::PreferenceModel;
use tracing::{debug, info};

/// The integer program of one run together with its variable grid.
#[derive(Debug, Clone)]
pub struct AssignmentModel {
    pub model: CpModel,
    /// `vars[agent][category]`, agents in input order, categories in catalog order.
    pub vars: Vec<Vec<VarId>>,
}

impl AssignmentModel {
    pub fn var(&self, agent: usize, category: CategoryId) -> VarId {
        self.vars[agent][category.0]
    }
}

/// A proven optimal solve.
#[derive(Debug, Clone)]
pub struct SolvedModel {
    pub model: AssignmentModel,
    pub solution: CpSolution,
}

/// Formulates and solves:
///
/// ```text
/// maximize    Σ_a Σ_c score(a,c) · x[a,c]
/// subject to  Σ_c x[a,c] = 1                 for every agent a
///             lo_c <= Σ_a x[a,c] <= hi_c     for every declared range c
///             x[a,c] ∈ {0,1}
/// ```
///
/// Only proven optima are returned. Infeasibility and time limits are
/// errors; deciding what to report instead is the caller's job.
pub struct AssignmentOptimizer<'a> {
    catalog: &'a Catalog,
    preferences: &'a PreferenceModel,
    capacities: &'a CapacityTable,
}

impl<'a> AssignmentOptimizer<'a> {
    pub fn new(
        catalog: &'a Catalog,
        preferences: &'a PreferenceModel,
        capacities: &'a CapacityTable,
    ) -> Self {
        Self {
            catalog,
            preferences,
            capacities,
        }
    }

    /// One variable per (agent, category), one coverage constraint per
    /// agent, one range constraint per declared capacity.
    pub fn build_model(&self) -> AssignmentModel {
        let mut model = CpModel::new("StudentAssignment");
        let mut vars = Vec::with_capacity(self.preferences.len());
        let mut terms = Vec::new();

        for agent in self.preferences.agents() {
            let mut row = Vec::with_capacity(self.catalog.len());
            for category in self.catalog.ids() {
                let var = model.add_bool_var(BoolVar::new(format!("x_{}_{}", agent.id, category)));
                let score = agent.score(category);
                if score != 0 {
                    terms.push((var, score));
                }
                row.push(var);
            }
            model.add_exactly_one(row.clone());
            vars.push(row);
        }

        for (category, range) in self.capacities.iter_declared() {
            let column = vars.iter().map(|row| row[category.0]).collect();
            model.add_range(column, range.min, range.max);
        }
        model.set_objective(Objective::Maximize { terms });

        debug!(
            variables = model.var_count(),
            constraints = model.constraint_count(),
            "assignment model built"
        );
        AssignmentModel { model, vars }
    }

    /// Cheap infeasibility checks on capacity totals.
    pub fn check_totals(&self) -> Result<()> {
        let agents = self.preferences.len();
        let total_min = self.capacities.total_min();
        if total_min > agents {
            return Err(AssignError::Infeasible {
                reason: format!("category minimums sum to {total_min}, only {agents} agents"),
            });
        }
        if let Some(total_max) = self.capacities.total_max() {
            if total_max < agents {
                return Err(AssignError::Infeasible {
                    reason: format!(
                        "category maximums sum to {total_max}, {agents} agents need seats"
                    ),
                });
            }
        }
        Ok(())
    }

    /// Solves with the solver selected in `settings`.
    pub fn solve(&self, settings: &SolverSettings) -> Result<SolvedModel> {
        let config = SolverConfig::default().with_time_limit_ms(settings.time_limit_ms);
        match settings.kind {
            SolverKind::Flow => self.solve_with(&FlowSolver::new(), &config),
            SolverKind::BranchAndBound => self.solve_with(&BranchAndBoundSolver::new(), &config),
        }
    }

    /// Solves with an explicit solver.
    pub fn solve_with<S: CpSolver>(
        &self,
        solver: &S,
        config: &SolverConfig,
    ) -> Result<SolvedModel> {
        self.check_totals()?;
        let model = self.build_model();

        info!(
            event = "solve_start",
            agents = self.preferences.len(),
            categories = self.catalog.len(),
            declared_ranges = self.capacities.iter_declared().count(),
        );
        let solution = solver.solve(&model.model, config);
        info!(
            event = "solve_end",
            status = %solution.status,
            objective = ?solution.objective_value,
            duration_ms = solution.solve_time_ms,
        );

        let detail = solution.message.clone().unwrap_or_default();
        match solution.status {
            SolverStatus::Optimal => Ok(SolvedModel { model, solution }),
            SolverStatus::Infeasible => Err(AssignError::Infeasible { reason: detail }),
            SolverStatus::Timeout | SolverStatus::Feasible => Err(AssignError::Timeout {
                limit_ms: config.time_limit_ms,
            }),
            SolverStatus::ModelInvalid => Err(AssignError::ModelInvalid(detail)),
            SolverStatus::Unknown => Err(AssignError::ModelInvalid(format!(
                "solver returned no solution: {detail}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::CapacityLimit;
    use crate::preference::PreferenceRow;

    fn setup(
        names: &[&str],
        limits: &[CapacityLimit],
        rows: &[PreferenceRow],
    ) -> (Catalog, PreferenceModel, CapacityTable) {
        let catalog = Catalog::new(names).unwrap();
        let preferences = PreferenceModel::from_rows(&catalog, rows).unwrap();
        let capacities = CapacityTable::new(&catalog, limits).unwrap();
        (catalog, preferences, capacities)
    }

    #[test]
    fn test_model_shape() {
        let rows = vec![
            PreferenceRow::new("s1", ["A", "B"]),
            PreferenceRow::new("s2", ["C"]),
        ];
        let (catalog, prefs, caps) =
            setup(&["A", "B", "C"], &[CapacityLimit::new("B", 0, 1)], &rows);
        let built = AssignmentOptimizer::new(&catalog, &prefs, &caps).build_model();

        assert_eq!(built.model.var_count(), 6);
        // 2 coverage + 1 declared range
        assert_eq!(built.model.constraint_count(), 3);
        assert_eq!(built.model.bool_vars[built.var(0, CategoryId(1)).0].name, "x_s1_1");
        assert!(built.model.validate().is_ok());
    }

    #[test]
    fn test_solve_prefers_first_choices() {
        let rows = vec![
            PreferenceRow::new("s1", ["A", "B"]),
            PreferenceRow::new("s2", ["B", "A"]),
        ];
        let (catalog, prefs, caps) = setup(&["A", "B"], &[], &rows);
        let solved = AssignmentOptimizer::new(&catalog, &prefs, &caps)
            .solve(&SolverSettings::default())
            .unwrap();
        assert_eq!(solved.solution.objective_value, Some(6));
        assert!(solved.solution.value(solved.model.var(0, CategoryId(0))));
        assert!(solved.solution.value(solved.model.var(1, CategoryId(1))));
    }

    #[test]
    fn test_totals_below_agent_count() {
        let rows: Vec<_> = (0..10).map(|i| PreferenceRow::new(format!("s{i}"), ["A"])).collect();
        let (catalog, prefs, caps) = setup(
            &["A", "B"],
            &[CapacityLimit::new("A", 0, 4), CapacityLimit::new("B", 0, 4)],
            &rows,
        );
        let err = AssignmentOptimizer::new(&catalog, &prefs, &caps)
            .solve(&SolverSettings::default())
            .unwrap_err();
        assert!(matches!(err, AssignError::Infeasible { .. }));
    }

    #[test]
    fn test_minimums_above_agent_count() {
        let rows = vec![PreferenceRow::new("s1", ["A"])];
        let (catalog, prefs, caps) = setup(
            &["A", "B"],
            &[CapacityLimit::new("A", 1, 1), CapacityLimit::new("B", 1, 1)],
            &rows,
        );
        let err = AssignmentOptimizer::new(&catalog, &prefs, &caps)
            .check_totals()
            .unwrap_err();
        assert!(err.to_string().contains("minimums"));
    }

    #[test]
    fn test_tight_minimums() {
        // A takes both agents even though s2 scores nothing there.
        let rows = vec![PreferenceRow::new("s1", ["A"]), PreferenceRow::new("s2", ["B"])];
        let (catalog, prefs, caps) = setup(
            &["A", "B", "C"],
            &[CapacityLimit::new("A", 2, 2), CapacityLimit::new("B", 0, 0)],
            &rows,
        );
        let solved = AssignmentOptimizer::new(&catalog, &prefs, &caps)
            .solve(&SolverSettings::default())
            .unwrap();
        assert_eq!(solved.solution.objective_value, Some(3));

        // One more mandatory seat than agents.
        let caps = CapacityTable::new(
            &catalog,
            &[
                CapacityLimit::new("A", 2, 2),
                CapacityLimit::new("B", 0, 0),
                CapacityLimit::new("C", 1, 1),
            ],
        )
        .unwrap();
        let err = AssignmentOptimizer::new(&catalog, &prefs, &caps)
            .solve(&SolverSettings::default())
            .unwrap_err();
        assert!(matches!(err, AssignError::Infeasible { .. }));
    }

    #[test]
    fn test_timeout_maps_to_error() {
        let rows = vec![PreferenceRow::new("s1", ["A"])];
        let (catalog, prefs, caps) = setup(&["A"], &[], &rows);
        let config = SolverConfig::default().with_time_limit_ms(0);
        let err = AssignmentOptimizer::new(&catalog, &prefs, &caps)
            .solve_with(&FlowSolver::new(), &config)
            .unwrap_err();
        assert!(matches!(err, AssignError::Timeout { limit_ms: 0 }));
    }

    #[test]
    fn test_both_solvers_agree() {
        let rows = vec![
            PreferenceRow::new("s1", ["A", "B", "C"]),
            PreferenceRow::new("s2", ["A", "C", "B"]),
            PreferenceRow::new("s3", ["A", "B"]),
            PreferenceRow::new("s4", ["B", "A"]),
            PreferenceRow::new("s5", ["C"]),
        ];
        let (catalog, prefs, caps) = setup(
            &["A", "B", "C"],
            &[CapacityLimit::new("A", 1, 2), CapacityLimit::new("C", 2, 2)],
            &rows,
        );
        let optimizer = AssignmentOptimizer::new(&catalog, &prefs, &caps);
        let flow = optimizer.solve(&SolverSettings::default()).unwrap();
        let bab = optimizer
            .solve(&SolverSettings {
                kind: SolverKind::BranchAndBound,
                ..SolverSettings::default()
            })
            .unwrap();
        assert_eq!(flow.solution.objective_value, bab.solution.objective_value);
    }
}
