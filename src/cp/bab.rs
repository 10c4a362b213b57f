//! Depth-first branch and bound over exactly-one groups.
//!
//! Each [`Constraint::ExactlyOne`] group is one branching level: the search
//! picks one admissible variable per group, in group order, trying higher
//! objective gains first. Range constraints may overlap freely.
//!
//! Pruning:
//! - a choice that would push any range above its maximum is skipped;
//! - a partial assignment whose ranges can no longer reach their minimum
//!   with the groups left is abandoned;
//! - a node whose optimistic bound (current gain plus the best gain of each
//!   remaining group) cannot strictly beat the incumbent is cut.
//!
//! Exhaustive in the worst case; intended for small models and as an
//! independent check of [`FlowSolver`](super::FlowSolver).

use super::model::{Constraint, CpModel};
use super::solver::{CpSolution, CpSolver, Deadline, SolverConfig, SolverStatus};
use tracing::debug;

/// How many nodes are expanded between clock checks.
const CLOCK_INTERVAL: u64 = 1024;

struct Search<'a> {
    groups: Vec<Vec<usize>>,
    gains: &'a [i64],
    /// Range constraints containing each variable.
    ranges_of: Vec<Vec<usize>>,
    /// (min, max) per range constraint.
    bounds: Vec<(usize, usize)>,
    /// Ranges each group can still contribute to.
    touches: Vec<Vec<usize>>,
    /// Best gain available in each group and all later ones.
    suffix_best: Vec<i64>,
    counts: Vec<usize>,
    remaining: Vec<usize>,
    chosen: Vec<usize>,
    best: Option<(i64, Vec<usize>)>,
    deadline: Deadline,
    stop_after_first: bool,
    nodes: u64,
    timed_out: bool,
}

impl Search<'_> {
    fn stop(&self) -> bool {
        self.timed_out || (self.stop_after_first && self.best.is_some())
    }

    fn dive(&mut self, group: usize, gain: i64) {
        self.nodes += 1;
        if self.nodes % CLOCK_INTERVAL == 0 && self.deadline.expired() {
            self.timed_out = true;
        }
        if self.stop() {
            return;
        }

        if group == self.groups.len() {
            if self.best.as_ref().is_none_or(|(b, _)| gain > *b) {
                self.best = Some((gain, self.chosen.clone()));
            }
            return;
        }
        if let Some((b, _)) = &self.best {
            if gain + self.suffix_best[group] <= *b {
                return;
            }
        }

        for &k in &self.touches[group] {
            self.remaining[k] -= 1;
        }

        for i in 0..self.groups[group].len() {
            let v = self.groups[group][i];
            if self.ranges_of[v]
                .iter()
                .any(|&k| self.counts[k] + 1 > self.bounds[k].1)
            {
                continue;
            }
            for &k in &self.ranges_of[v] {
                self.counts[k] += 1;
            }

            let reachable = self
                .bounds
                .iter()
                .enumerate()
                .all(|(k, &(min, _))| self.counts[k] + self.remaining[k] >= min);
            if reachable {
                self.chosen.push(v);
                self.dive(group + 1, gain + self.gains[v]);
                self.chosen.pop();
            }

            for &k in &self.ranges_of[v] {
                self.counts[k] -= 1;
            }
            if self.stop() {
                break;
            }
        }

        for &k in &self.touches[group] {
            self.remaining[k] += 1;
        }
    }
}

/// Exact branch-and-bound solver for pure-binary models.
///
/// The optimistic bound takes each remaining group's best gain without
/// regard to capacities, so runtime grows quickly once ranges bind. Prefer
/// [`FlowSolver`](super::FlowSolver) for anything beyond small inputs.
///
/// Every variable must belong to exactly one exactly-one group; other
/// models are rejected with [`SolverStatus::ModelInvalid`]. When the time
/// limit ends the search early, the incumbent is returned with status
/// [`SolverStatus::Feasible`] (or [`SolverStatus::Timeout`] if none exists).
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchAndBoundSolver;

impl BranchAndBoundSolver {
    pub fn new() -> Self {
        Self
    }
}

impl CpSolver for BranchAndBoundSolver {
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        if let Err(msg) = model.validate() {
            return CpSolution::empty(SolverStatus::ModelInvalid).with_message(msg);
        }

        let n = model.var_count();
        let gains = model
            .objective
            .as_ref()
            .map_or_else(|| vec![0; n], |o| o.gains(n));

        let mut group_of = vec![None; n];
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut ranges_of: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut bounds = Vec::new();
        for constraint in &model.constraints {
            match constraint {
                Constraint::ExactlyOne { vars } => {
                    for v in vars {
                        if group_of[v.0].replace(groups.len()).is_some() {
                            return CpSolution::empty(SolverStatus::ModelInvalid).with_message(
                                format!("variable {v} belongs to two exactly-one groups"),
                            );
                        }
                    }
                    groups.push(vars.iter().map(|v| v.0).collect());
                }
                Constraint::Range { vars, min, max } => {
                    for v in vars {
                        ranges_of[v.0].push(bounds.len());
                    }
                    bounds.push((*min, *max));
                }
            }
        }
        if let Some(v) = group_of.iter().position(Option::is_none) {
            return CpSolution::empty(SolverStatus::ModelInvalid)
                .with_message(format!("variable v{v} is in no exactly-one group"));
        }

        // Honour fixed values: a variable fixed true is the only candidate of its group.
        for group in &mut groups {
            let forced: Vec<usize> = group
                .iter()
                .copied()
                .filter(|&v| model.bool_vars[v].fixed == Some(true))
                .collect();
            if forced.len() > 1 {
                return CpSolution::empty(SolverStatus::Infeasible)
                    .with_message("group has two variables fixed true");
            }
            if forced.is_empty() {
                group.retain(|&v| model.bool_vars[v].allows(true));
            } else {
                *group = forced;
            }
            // Stable: equal gains keep model order.
            group.sort_by_key(|&v| std::cmp::Reverse(gains[v]));
        }

        let touches: Vec<Vec<usize>> = groups
            .iter()
            .map(|g| {
                let mut ks: Vec<usize> = g
                    .iter()
                    .flat_map(|&v| ranges_of[v].iter().copied())
                    .collect();
                ks.sort_unstable();
                ks.dedup();
                ks
            })
            .collect();
        let mut remaining = vec![0usize; bounds.len()];
        for ks in &touches {
            for &k in ks {
                remaining[k] += 1;
            }
        }
        let mut suffix_best = vec![0i64; groups.len() + 1];
        for g in (0..groups.len()).rev() {
            let best = groups[g].iter().map(|&v| gains[v]).max().unwrap_or(0);
            suffix_best[g] = suffix_best[g + 1] + best;
        }

        let start_ok = bounds
            .iter()
            .enumerate()
            .all(|(k, &(min, _))| remaining[k] >= min);

        let mut search = Search {
            groups,
            gains: &gains,
            ranges_of,
            counts: vec![0; bounds.len()],
            bounds,
            touches,
            suffix_best,
            remaining,
            chosen: Vec::new(),
            best: None,
            deadline: config.deadline(),
            stop_after_first: config.stop_after_first,
            nodes: 0,
            timed_out: false,
        };
        if start_ok && !search.groups.iter().any(Vec::is_empty) {
            search.dive(0, 0);
        }

        debug!(
            nodes = search.nodes,
            timed_out = search.timed_out,
            found = search.best.is_some(),
            "branch and bound finished"
        );

        let solve_time_ms = search.deadline.elapsed_ms();
        let Some((_, chosen)) = search.best else {
            let status = if search.timed_out {
                SolverStatus::Timeout
            } else {
                SolverStatus::Infeasible
            };
            let mut solution =
                CpSolution::empty(status).with_message(format!("{} nodes explored", search.nodes));
            solution.solve_time_ms = solve_time_ms;
            return solution;
        };

        let mut values = vec![false; n];
        for v in chosen {
            values[v] = true;
        }
        let proven = !search.timed_out && !search.stop_after_first;
        CpSolution {
            status: if proven {
                SolverStatus::Optimal
            } else {
                SolverStatus::Feasible
            },
            objective_value: model.objective.as_ref().map(|o| o.evaluate(&values)),
            values,
            message: (!proven).then(|| "search stopped before optimality proof".to_string()),
            solve_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{BoolVar, Objective, VarId};

    fn grid(scores: &[Vec<i64>], ranges: &[Option<(usize, usize)>]) -> CpModel {
        let mut model = CpModel::new("grid");
        let mut terms = Vec::new();
        let mut columns: Vec<Vec<VarId>> = vec![Vec::new(); ranges.len()];
        for (r, row) in scores.iter().enumerate() {
            let vars: Vec<VarId> = row
                .iter()
                .enumerate()
                .map(|(c, &s)| {
                    let v = model.add_bool_var(BoolVar::new(format!("x_{r}_{c}")));
                    terms.push((v, s));
                    columns[c].push(v);
                    v
                })
                .collect();
            model.add_exactly_one(vars);
        }
        for (c, range) in ranges.iter().enumerate() {
            if let Some((min, max)) = *range {
                model.add_range(columns[c].clone(), min, max);
            }
        }
        model.set_objective(Objective::Maximize { terms });
        model
    }

    #[test]
    fn test_optimal_with_capacity() {
        let model = grid(
            &[vec![3, 2, 1], vec![3, 1, 2], vec![3, 2, 0]],
            &[Some((1, 1)), Some((0, 1)), None],
        );
        let s = BranchAndBoundSolver::new().solve(&model, &SolverConfig::default());
        assert_eq!(s.status, SolverStatus::Optimal);
        // One row takes column 0 (3), one column 1 (2), the other column 2.
        assert_eq!(s.objective_value, Some(7));
        assert!(model.is_satisfied(&s.values));
    }

    #[test]
    fn test_infeasible() {
        let model = grid(&[vec![1, 1], vec![1, 1], vec![1, 1]], &[Some((0, 1)), Some((0, 1))]);
        let s = BranchAndBoundSolver::new().solve(&model, &SolverConfig::default());
        assert_eq!(s.status, SolverStatus::Infeasible);
    }

    #[test]
    fn test_minimum_unreachable_up_front() {
        let model = grid(&[vec![1, 1]], &[Some((2, 2)), None]);
        let s = BranchAndBoundSolver::new().solve(&model, &SolverConfig::default());
        assert_eq!(s.status, SolverStatus::Infeasible);
    }

    #[test]
    fn test_overlapping_ranges_allowed() {
        let mut model = grid(&[vec![3, 1], vec![3, 1]], &[None, None]);
        // Both column-0 variables together are capped at one, plus a
        // redundant cap over everything.
        model.add_range(vec![VarId(0), VarId(2)], 0, 1);
        model.add_range((0..4).map(VarId).collect(), 0, 2);
        let s = BranchAndBoundSolver::new().solve(&model, &SolverConfig::default());
        assert_eq!(s.status, SolverStatus::Optimal);
        assert_eq!(s.objective_value, Some(4));
    }

    #[test]
    fn test_stop_after_first() {
        let model = grid(&[vec![1, 2], vec![2, 1]], &[None, None]);
        let config = SolverConfig::default().with_stop_after_first(true);
        let s = BranchAndBoundSolver::new().solve(&model, &config);
        assert_eq!(s.status, SolverStatus::Feasible);
        assert!(model.is_satisfied(&s.values));
    }

    #[test]
    fn test_fixed_true() {
        let mut model = grid(&[vec![3, 0]], &[None, None]);
        model.bool_vars[1] = BoolVar::fixed("x_0_1", true);
        let s = BranchAndBoundSolver::new().solve(&model, &SolverConfig::default());
        assert_eq!(s.objective_value, Some(0));
        assert!(s.values[1]);
    }

    #[test]
    fn test_free_variable_rejected() {
        let mut model = CpModel::new("free");
        model.add_bool_var(BoolVar::new("a"));
        let s = BranchAndBoundSolver::new().solve(&model, &SolverConfig::default());
        assert_eq!(s.status, SolverStatus::ModelInvalid);
    }
}
