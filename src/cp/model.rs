//! CP model definition.

use super::variables::{BoolVar, VarId};
use std::collections::HashSet;

/// A linear constraint over boolean variables.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Exactly one of the variables is true: `Σ vars = 1`.
    ExactlyOne {
        /// Variables of the group.
        vars: Vec<VarId>,
    },

    /// Count of true variables within an inclusive range:
    /// `min <= Σ vars <= max`.
    Range {
        /// Variables being counted.
        vars: Vec<VarId>,
        /// Minimum number of true variables.
        min: usize,
        /// Maximum number of true variables.
        max: usize,
    },
}

/// Objective function for the CP model.
#[derive(Debug, Clone)]
pub enum Objective {
    /// Minimize a linear combination of boolean variables.
    Minimize {
        /// (variable, coefficient) pairs.
        terms: Vec<(VarId, i64)>,
    },

    /// Maximize a linear combination of boolean variables.
    Maximize {
        /// (variable, coefficient) pairs.
        terms: Vec<(VarId, i64)>,
    },
}

impl Objective {
    /// Per-variable gain in maximization form (minimization is negated).
    ///
    /// Repeated terms for one variable are summed.
    pub fn gains(&self, var_count: usize) -> Vec<i64> {
        let (terms, sign) = match self {
            Objective::Maximize { terms } => (terms, 1),
            Objective::Minimize { terms } => (terms, -1),
        };
        let mut gains = vec![0i64; var_count];
        for &(var, coef) in terms {
            if let Some(g) = gains.get_mut(var.0) {
                *g += sign * coef;
            }
        }
        gains
    }

    /// Objective value of an assignment of all variables.
    pub fn evaluate(&self, values: &[bool]) -> i64 {
        let terms = match self {
            Objective::Maximize { terms } | Objective::Minimize { terms } => terms,
        };
        terms
            .iter()
            .filter(|(var, _)| values.get(var.0).copied().unwrap_or(false))
            .map(|&(_, coef)| coef)
            .sum()
    }
}

/// A constraint programming model over boolean variables.
///
/// # Examples
///
/// ```
/// use u_assign::cp::{CpModel, BoolVar, Objective};
///
/// let mut model = CpModel::new("example");
/// let a = model.add_bool_var(BoolVar::new("a"));
/// let b = model.add_bool_var(BoolVar::new("b"));
/// model.add_exactly_one(vec![a, b]);
/// model.add_range(vec![a], 0, 1);
/// model.set_objective(Objective::Maximize { terms: vec![(a, 2), (b, 1)] });
/// assert!(model.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CpModel {
    /// Model name.
    pub name: String,
    /// Boolean variables, addressed by [`VarId`].
    pub bool_vars: Vec<BoolVar>,
    /// Constraints.
    pub constraints: Vec<Constraint>,
    /// Objective function.
    pub objective: Option<Objective>,
}

impl CpModel {
    /// Creates a new empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bool_vars: Vec::new(),
            constraints: Vec::new(),
            objective: None,
        }
    }

    /// Adds a boolean variable and returns its handle.
    pub fn add_bool_var(&mut self, var: BoolVar) -> VarId {
        self.bool_vars.push(var);
        VarId(self.bool_vars.len() - 1)
    }

    /// Adds a constraint.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Convenience: add an exactly-one constraint.
    pub fn add_exactly_one(&mut self, vars: Vec<VarId>) {
        self.constraints.push(Constraint::ExactlyOne { vars });
    }

    /// Convenience: add a range constraint.
    pub fn add_range(&mut self, vars: Vec<VarId>, min: usize, max: usize) {
        self.constraints.push(Constraint::Range { vars, min, max });
    }

    /// Sets the objective function.
    pub fn set_objective(&mut self, objective: Objective) {
        self.objective = Some(objective);
    }

    /// Looks up a variable.
    pub fn var(&self, id: VarId) -> Option<&BoolVar> {
        self.bool_vars.get(id.0)
    }

    /// Validates the model for consistency.
    ///
    /// Checks that all referenced variables exist, that no constraint lists
    /// a variable twice and that ranges are well ordered.
    pub fn validate(&self) -> Result<(), String> {
        fn check_vars(vars: &[VarId], n: usize) -> Result<(), String> {
            let mut seen = HashSet::with_capacity(vars.len());
            for &v in vars {
                if v.0 >= n {
                    return Err(format!("undefined variable: {v}"));
                }
                if !seen.insert(v) {
                    return Err(format!("variable {v} repeated in constraint"));
                }
            }
            Ok(())
        }

        let n = self.bool_vars.len();
        for constraint in &self.constraints {
            match constraint {
                Constraint::ExactlyOne { vars } => check_vars(vars, n)?,
                Constraint::Range { vars, min, max } => {
                    check_vars(vars, n)?;
                    if min > max {
                        return Err(format!("range: min {min} exceeds max {max}"));
                    }
                }
            }
        }

        if let Some(Objective::Maximize { terms } | Objective::Minimize { terms }) =
            &self.objective
        {
            if let Some((v, _)) = terms.iter().find(|(v, _)| v.0 >= n) {
                return Err(format!("objective references undefined variable: {v}"));
            }
        }
        Ok(())
    }

    /// Whether `values` satisfies every constraint and fixed value.
    pub fn is_satisfied(&self, values: &[bool]) -> bool {
        if values.len() != self.bool_vars.len() {
            return false;
        }
        if self
            .bool_vars
            .iter()
            .zip(values)
            .any(|(var, &value)| !var.allows(value))
        {
            return false;
        }
        self.constraints.iter().all(|c| match c {
            Constraint::ExactlyOne { vars } => vars.iter().filter(|v| values[v.0]).count() == 1,
            Constraint::Range { vars, min, max } => {
                let count = vars.iter().filter(|v| values[v.0]).count();
                *min <= count && count <= *max
            }
        })
    }

    /// Returns the number of boolean variables.
    pub fn var_count(&self) -> usize {
        self.bool_vars.len()
    }

    /// Returns the number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> (CpModel, Vec<VarId>) {
        let mut model = CpModel::new("test");
        let vars: Vec<VarId> = (0..4)
            .map(|i| model.add_bool_var(BoolVar::new(format!("x{i}"))))
            .collect();
        model.add_exactly_one(vec![vars[0], vars[1]]);
        model.add_exactly_one(vec![vars[2], vars[3]]);
        model.add_range(vec![vars[0], vars[2]], 1, 1);
        (model, vars)
    }

    #[test]
    fn test_model_creation() {
        let (mut model, vars) = two_by_two();
        model.set_objective(Objective::Maximize {
            terms: vec![(vars[0], 3), (vars[3], 1)],
        });

        assert_eq!(model.var_count(), 4);
        assert_eq!(model.constraint_count(), 3);
        assert!(model.objective.is_some());
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_undefined_variable() {
        let mut model = CpModel::new("test");
        model.add_exactly_one(vec![VarId(0)]);
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_repeated_variable() {
        let mut model = CpModel::new("test");
        let a = model.add_bool_var(BoolVar::new("a"));
        model.add_range(vec![a, a], 0, 2);
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_inverted_range() {
        let mut model = CpModel::new("test");
        let a = model.add_bool_var(BoolVar::new("a"));
        model.add_range(vec![a], 1, 0);
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_objective_undefined_variable() {
        let mut model = CpModel::new("test");
        model.set_objective(Objective::Minimize {
            terms: vec![(VarId(3), 1)],
        });
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_is_satisfied() {
        let (model, _) = two_by_two();
        assert!(model.is_satisfied(&[true, false, false, true]));
        assert!(!model.is_satisfied(&[true, false, true, false])); // range max
        assert!(!model.is_satisfied(&[false, true, false, true])); // range min
        assert!(!model.is_satisfied(&[true, true, false, true])); // exactly one
        assert!(!model.is_satisfied(&[true]));
    }

    #[test]
    fn test_gains_and_evaluate() {
        let max = Objective::Maximize {
            terms: vec![(VarId(0), 3), (VarId(1), 2), (VarId(0), 1)],
        };
        assert_eq!(max.gains(2), vec![4, 2]);
        assert_eq!(max.evaluate(&[true, false]), 4);

        let min = Objective::Minimize {
            terms: vec![(VarId(1), 5)],
        };
        assert_eq!(min.gains(2), vec![0, -5]);
        assert_eq!(min.evaluate(&[true, true]), 5);
    }
}
