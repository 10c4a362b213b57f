//! Per-category capacity ranges.

use crate::catalog::{Catalog, CategoryId};
use crate::error::{AssignError, Result};
use serde::{Deserialize, Serialize};

/// Upper bound reported for categories without a declared range.
///
/// Undeclared categories generate no capacity constraint, so this value is
/// only ever used for reporting and range checks.
pub const UNBOUNDED: usize = u32::MAX as usize;

/// Inclusive `[min, max]` range of agents admitted to one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityRange {
    pub min: usize,
    pub max: usize,
}

impl CapacityRange {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// The default range of an undeclared category.
    pub fn unbounded() -> Self {
        Self {
            min: 0,
            max: UNBOUNDED,
        }
    }

    pub fn contains(&self, count: usize) -> bool {
        self.min <= count && count <= self.max
    }
}

/// A capacity declaration as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CapacityLimit {
    /// Category name, matched against the catalog after trimming.
    pub category: String,
    #[serde(default)]
    pub min: usize,
    pub max: usize,
}

impl CapacityLimit {
    pub fn new(category: impl Into<String>, min: usize, max: usize) -> Self {
        Self {
            category: category.into(),
            min,
            max,
        }
    }
}

/// Read-only mapping from category to its admissible range.
///
/// # Examples
///
/// ```
/// use u_assign::capacity::{CapacityLimit, CapacityTable, UNBOUNDED};
/// use u_assign::catalog::{Catalog, CategoryId};
///
/// let catalog = Catalog::new(["A", "B"]).unwrap();
/// let table = CapacityTable::new(&catalog, &[CapacityLimit::new("A", 2, 3)]).unwrap();
///
/// assert_eq!(table.range(CategoryId(0)).max, 3);
/// assert_eq!(table.range(CategoryId(1)).max, UNBOUNDED);
/// assert!(table.declared(CategoryId(1)).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct CapacityTable {
    declared: Vec<Option<CapacityRange>>,
}

impl CapacityTable {
    /// Builds the table, validating each declaration.
    ///
    /// A category may be declared at most once.
    pub fn new(catalog: &Catalog, limits: &[CapacityLimit]) -> Result<Self> {
        let mut declared = vec![None; catalog.len()];
        for limit in limits {
            let id = catalog
                .resolve(&limit.category)
                .ok_or_else(|| AssignError::UnknownCapacityCategory {
                    name: limit.category.clone(),
                })?;
            if limit.min > limit.max {
                return Err(AssignError::InvalidRange {
                    category: catalog.name(id).to_string(),
                    min: limit.min,
                    max: limit.max,
                });
            }
            if declared[id.0].is_some() {
                return Err(AssignError::DuplicateCapacity {
                    category: catalog.name(id).to_string(),
                });
            }
            declared[id.0] = Some(CapacityRange::new(limit.min, limit.max));
        }
        Ok(Self { declared })
    }

    /// A table with no declared ranges.
    pub fn unbounded(catalog: &Catalog) -> Self {
        Self {
            declared: vec![None; catalog.len()],
        }
    }

    /// Effective range: the declared one or `[0, UNBOUNDED]`.
    pub fn range(&self, category: CategoryId) -> CapacityRange {
        self.declared(category)
            .unwrap_or_else(CapacityRange::unbounded)
    }

    /// Explicitly declared range, if any.
    pub fn declared(&self, category: CategoryId) -> Option<CapacityRange> {
        self.declared.get(category.0).copied().flatten()
    }

    /// Declared ranges in catalog order.
    pub fn iter_declared(&self) -> impl Iterator<Item = (CategoryId, CapacityRange)> + '_ {
        self.declared
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.map(|r| (CategoryId(i), r)))
    }

    /// Sum of minimums over declared ranges.
    pub fn total_min(&self) -> usize {
        self.iter_declared().map(|(_, r)| r.min).sum()
    }

    /// Sum of maximums, or `None` if any category is undeclared.
    pub fn total_max(&self) -> Option<usize> {
        self.declared
            .iter()
            .map(|r| r.map(|r| r.max))
            .try_fold(0usize, |acc, max| max.map(|m| acc.saturating_add(m)))
    }
}
