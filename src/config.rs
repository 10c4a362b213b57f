//! Run configuration: catalog, capacity limits and solver settings.
//!
//! Load from TOML to change the catalog or limits without code changes.
//!
//! # Examples
//!
//! ```
//! use u_assign::config::{AssignConfig, SolverKind};
//!
//! let config = AssignConfig::from_toml_str(r#"
//!     catalog = ["A", "B"]
//!
//!     [[capacity]]
//!     category = "A"
//!     min = 2
//!     max = 2
//!
//!     [solver]
//!     kind = "branch_and_bound"
//!     time_limit_ms = 5000
//! "#).unwrap();
//!
//! assert_eq!(config.catalog, vec!["A", "B"]);
//! assert_eq!(config.capacity.len(), 1);
//! assert_eq!(config.solver.kind, SolverKind::BranchAndBound);
//! ```
//!
//! Fall back to the built-in observation catalog when no file exists:
//!
//! ```
//! use u_assign::config::AssignConfig;
//!
//! let config = AssignConfig::load("assign.toml").unwrap_or_default();
//! assert_eq!(config.catalog.len(), 7);
//! ```

use crate::capacity::CapacityLimit;
use crate::catalog::{Catalog, OBSERVATION_SUBJECTS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which exact solver the optimizer uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    /// Min-cost flow over the transportation structure of the model.
    #[default]
    Flow,
    /// Depth-first branch and bound over agent choices.
    ///
    /// Exact but exponential in the worst case. Its bound ignores
    /// capacities, so a few dozen agents under tight ranges can run for
    /// seconds. Meant for small inputs and for checking [`SolverKind::Flow`].
    BranchAndBound,
}

/// Solver settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SolverSettings {
    #[serde(default)]
    pub kind: SolverKind,

    /// Maximum solve time in milliseconds.
    #[serde(default = "default_time_limit_ms")]
    pub time_limit_ms: u64,
}

fn default_time_limit_ms() -> u64 {
    60_000
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            kind: SolverKind::default(),
            time_limit_ms: default_time_limit_ms(),
        }
    }
}

/// Complete configuration of an assignment run.
///
/// `Default` gives the observation-subject catalog with its standard limits.
/// A TOML file that omits `catalog` gets the same catalog, but with no
/// capacity limits unless `[[capacity]]` entries are given.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AssignConfig {
    /// Category names in catalog order.
    #[serde(default = "default_catalog")]
    pub catalog: Vec<String>,

    /// Declared capacity ranges. Undeclared categories are unbounded.
    #[serde(default)]
    pub capacity: Vec<CapacityLimit>,

    #[serde(default)]
    pub solver: SolverSettings,
}

fn default_catalog() -> Vec<String> {
    OBSERVATION_SUBJECTS.iter().map(|s| s.to_string()).collect()
}

impl Default for AssignConfig {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            capacity: vec![
                CapacityLimit::new("測地観測", 4, 5),
                CapacityLimit::new("大気物理・化学観測", 1, 2),
                CapacityLimit::new("火山化学観測", 4, 5),
                CapacityLimit::new("地球電磁気学観測", 4, 5),
                CapacityLimit::new("海洋物理学観測", 5, 5),
                CapacityLimit::new("夜間大気光観測", 3, 3),
                CapacityLimit::new("地震観測", 4, 5),
            ],
            solver: SolverSettings::default(),
        }
    }
}

impl AssignConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Replaces the catalog and clears capacity limits.
    pub fn with_catalog<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.catalog = names.into_iter().map(Into::into).collect();
        self.capacity.clear();
        self
    }

    /// Declares a capacity range for one category.
    pub fn with_capacity(mut self, category: impl Into<String>, min: usize, max: usize) -> Self {
        self.capacity.push(CapacityLimit::new(category, min, max));
        self
    }

    pub fn with_solver_kind(mut self, kind: SolverKind) -> Self {
        self.solver.kind = kind;
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.solver.time_limit_ms = ms;
        self
    }

    /// Builds the catalog described by this configuration.
    pub fn build_catalog(&self) -> Result<Catalog, ConfigError> {
        Catalog::new(&self.catalog)
    }

    /// Validates structural consistency.
    ///
    /// Range and category-name checks happen when the capacity table is
    /// built against the catalog.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.build_catalog()?;

        let mut seen = HashSet::new();
        for limit in &self.capacity {
            if !seen.insert(limit.category.trim()) {
                return Err(ConfigError::Invalid(format!(
                    "capacity for {:?} declared twice",
                    limit.category.trim()
                )));
            }
        }

        if self.solver.time_limit_ms == 0 {
            return Err(ConfigError::Invalid("time_limit_ms must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AssignConfig::default();
        assert_eq!(config.catalog.len(), 7);
        assert_eq!(config.capacity.len(), 7);
        assert_eq!(config.solver.kind, SolverKind::Flow);
        assert_eq!(config.solver.time_limit_ms, 60_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_toml() {
        let config = AssignConfig::from_toml_str("").unwrap();
        assert_eq!(config.catalog.len(), 7);
        assert!(config.capacity.is_empty());
        assert_eq!(config.solver, SolverSettings::default());
    }

    #[test]
    fn test_capacity_min_defaults_to_zero() {
        let config = AssignConfig::from_toml_str(
            r#"
            catalog = ["A"]
            [[capacity]]
            category = "A"
            max = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.capacity[0], CapacityLimit::new("A", 0, 4));
    }

    #[test]
    fn test_bad_toml() {
        let err = AssignConfig::from_toml_str("catalog = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_duplicate_catalog_name() {
        let err = AssignConfig::from_toml_str(r#"catalog = ["A", "A"]"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_duplicate_capacity() {
        let config = AssignConfig::new()
            .with_catalog(["A", "B"])
            .with_capacity("A", 0, 1)
            .with_capacity(" A", 1, 2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_time_limit() {
        let config = AssignConfig::new().with_time_limit_ms(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = AssignConfig::load("/nonexistent/assign.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_builders() {
        let config = AssignConfig::new()
            .with_catalog(["X", "Y"])
            .with_capacity("X", 1, 1)
            .with_solver_kind(SolverKind::BranchAndBound)
            .with_time_limit_ms(10);
        assert_eq!(config.catalog, vec!["X", "Y"]);
        assert_eq!(config.capacity, vec![CapacityLimit::new("X", 1, 1)]);
        assert_eq!(config.solver.kind, SolverKind::BranchAndBound);
        assert_eq!(config.solver.time_limit_ms, 10);
    }
}
