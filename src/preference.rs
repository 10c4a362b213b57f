//! Preference model: ranked choices and the scoring function.

use crate::catalog::{Catalog, CategoryId};
use crate::error::{AssignError, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

/// Maximum number of ranked choices per agent.
pub const MAX_CHOICES: usize = 3;

/// Opaque agent identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One raw input row: an agent and its ranked category names.
///
/// Choices may be blank; blank entries are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceRow {
    pub agent: String,
    pub choices: Vec<String>,
}

impl PreferenceRow {
    pub fn new<I, S>(agent: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            agent: agent.into(),
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }
}

/// An agent with its normalized preference list (rank 0 = most preferred).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub id: AgentId,
    pub preferences: Vec<CategoryId>,
}

impl Agent {
    /// Score for placing this agent in `category`.
    ///
    /// `MAX_CHOICES - rank` for a listed category, `0` otherwise.
    pub fn score(&self, category: CategoryId) -> i64 {
        self.preferences
            .iter()
            .position(|&c| c == category)
            .map_or(0, |rank| MAX_CHOICES.saturating_sub(rank) as i64)
    }

    /// 0-based rank of `category`, if listed.
    pub fn rank(&self, category: CategoryId) -> Option<usize> {
        self.preferences.iter().position(|&c| c == category)
    }
}

/// All agents of a run, in input order.
///
/// # Examples
///
/// ```
/// use u_assign::catalog::{Catalog, CategoryId};
/// use u_assign::preference::{PreferenceModel, PreferenceRow};
///
/// let catalog = Catalog::new(["A", "B", "C"]).unwrap();
/// let rows = vec![PreferenceRow::new("s1", ["B", "", "A"])];
/// let model = PreferenceModel::from_rows(&catalog, &rows).unwrap();
///
/// assert_eq!(model.score(0, CategoryId(1)), 3);
/// assert_eq!(model.score(0, CategoryId(0)), 2);
/// assert_eq!(model.score(0, CategoryId(2)), 0);
/// ```
#[derive(Debug, Clone)]
pub struct PreferenceModel {
    agents: Vec<Agent>,
}

impl PreferenceModel {
    /// Normalizes raw rows against the catalog.
    ///
    /// Fails on blank or repeated agent identifiers, unknown category names
    /// and rows with more than [`MAX_CHOICES`] choices.
    pub fn from_rows(catalog: &Catalog, rows: &[PreferenceRow]) -> Result<Self> {
        let mut seen = HashSet::with_capacity(rows.len());
        let mut agents = Vec::with_capacity(rows.len());

        for (row_index, row) in rows.iter().enumerate() {
            let id = row.agent.trim();
            if id.is_empty() {
                return Err(AssignError::MissingAgentId { row: row_index });
            }
            if !seen.insert(id.to_string()) {
                return Err(AssignError::DuplicateAgent {
                    agent: id.to_string(),
                });
            }

            let named: Vec<&str> = row
                .choices
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .collect();
            if named.len() > MAX_CHOICES {
                return Err(AssignError::TooManyChoices {
                    agent: id.to_string(),
                    count: named.len(),
                });
            }

            let mut preferences = Vec::with_capacity(named.len());
            for name in named {
                let category = catalog
                    .resolve(name)
                    .ok_or_else(|| AssignError::UnknownCategory {
                        agent: id.to_string(),
                        name: name.to_string(),
                    })?;
                if preferences.contains(&category) {
                    warn!(agent = id, category = name, "repeated choice dropped");
                    continue;
                }
                preferences.push(category);
            }

            agents.push(Agent {
                id: AgentId(id.to_string()),
                preferences,
            });
        }

        Ok(Self { agents })
    }

    /// Builds a model from already normalized agents.
    ///
    /// Fails on repeated identifiers, on more than [`MAX_CHOICES`]
    /// preferences and on category ids outside `catalog`.
    pub fn from_agents(catalog: &Catalog, agents: Vec<Agent>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(agents.len());
        for agent in &agents {
            if !seen.insert(&agent.id) {
                return Err(AssignError::DuplicateAgent {
                    agent: agent.id.to_string(),
                });
            }
            if agent.preferences.len() > MAX_CHOICES {
                return Err(AssignError::TooManyChoices {
                    agent: agent.id.to_string(),
                    count: agent.preferences.len(),
                });
            }
            if let Some(c) = agent.preferences.iter().find(|c| c.0 >= catalog.len()) {
                return Err(AssignError::UnknownCategory {
                    agent: agent.id.to_string(),
                    name: c.to_string(),
                });
            }
        }
        Ok(Self { agents })
    }

    /// Score of agent at `agent_index` for `category`.
    ///
    /// # Panics
    ///
    /// Panics if `agent_index` is out of range.
    pub fn score(&self, agent_index: usize, category: CategoryId) -> i64 {
        self.agents[agent_index].score(category)
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
