//! Assignment results.

use crate::capacity::CapacityTable;
use crate::catalog::CategoryId;
use crate::preference::AgentId;
use serde::Serialize;
use std::fmt;

/// Output marker for agents without a category.
pub const UNASSIGNED: &str = "unassigned";

/// Outcome of the solve behind a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignStatus {
    /// Proven optimal assignment.
    Optimal,
    /// Constraints cannot be met; every agent is unassigned.
    Infeasible,
    /// Time limit reached before optimality was proven; every agent is unassigned.
    Timeout,
}

impl fmt::Display for AssignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AssignStatus::Optimal => "Optimal",
            AssignStatus::Infeasible => "Infeasible",
            AssignStatus::Timeout => "Timeout",
        })
    }
}

/// Where an agent ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Placement {
    Assigned(CategoryId),
    Unassigned,
}

impl Placement {
    pub fn category(self) -> Option<CategoryId> {
        match self {
            Placement::Assigned(c) => Some(c),
            Placement::Unassigned => None,
        }
    }
}

/// One output row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentRow {
    pub agent: AgentId,
    pub placement: Placement,
    /// Preference score earned by this placement (0 when unassigned).
    pub score: i64,
}

/// Number of agents placed in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: CategoryId,
    pub name: String,
    pub count: usize,
}

/// Total agent → placement mapping of one run.
///
/// `rows` follow input order; `counts` follow catalog order and include
/// empty categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentReport {
    pub status: AssignStatus,
    /// Why the run degraded, for non-optimal statuses.
    pub reason: Option<String>,
    pub rows: Vec<AssignmentRow>,
    pub counts: Vec<CategoryCount>,
    pub total_score: i64,
}

impl AssignmentReport {
    /// `(agent, category name or UNASSIGNED)` pairs, in input order.
    pub fn records(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.rows.iter().map(|row| {
            let category = match row.placement {
                Placement::Assigned(c) => self.counts[c.0].name.as_str(),
                Placement::Unassigned => UNASSIGNED,
            };
            (row.agent.as_str(), category)
        })
    }

    /// Placement of one agent.
    pub fn placement_of(&self, agent: &str) -> Option<Placement> {
        self.rows
            .iter()
            .find(|row| row.agent.as_str() == agent)
            .map(|row| row.placement)
    }

    /// Agents placed in `category`.
    pub fn count(&self, category: CategoryId) -> usize {
        self.counts.get(category.0).map_or(0, |c| c.count)
    }

    pub fn assigned_count(&self) -> usize {
        self.counts.iter().map(|c| c.count).sum()
    }

    pub fn unassigned_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.placement == Placement::Unassigned)
            .count()
    }

    /// Categories whose count falls outside the effective range.
    pub fn capacity_violations<'a>(
        &'a self,
        capacities: &'a CapacityTable,
    ) -> impl Iterator<Item = &'a CategoryCount> + 'a {
        self.counts
            .iter()
            .filter(move |c| !capacities.range(c.category).contains(c.count))
    }
}

impl fmt::Display for AssignmentReport {
    /// Console summary: status, then non-empty categories by descending count.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Solver status: {}", self.status)?;
        if let Some(reason) = &self.reason {
            writeln!(f, "Reason: {reason}")?;
        }

        let mut counts: Vec<&CategoryCount> = self.counts.iter().filter(|c| c.count > 0).collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then(a.category.cmp(&b.category)));
        for c in counts {
            writeln!(f, "{}: {}", c.name, c.count)?;
        }

        let unassigned = self.unassigned_count();
        if unassigned > 0 {
            writeln!(f, "{UNASSIGNED}: {unassigned}")?;
        }
        write!(f, "Total score: {}", self.total_score)
    }
}
