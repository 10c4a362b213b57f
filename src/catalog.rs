//! Fixed category catalog.

use crate::config::ConfigError;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Observation subjects of the default catalog, in catalog order.
pub const OBSERVATION_SUBJECTS: [&str; 7] = [
    "測地観測",
    "大気物理・化学観測",
    "火山化学観測",
    "地球電磁気学観測",
    "海洋物理学観測",
    "夜間大気光観測",
    "地震観測",
];

/// Index of a category within its [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CategoryId(pub usize);

impl CategoryId {
    /// Position in catalog order.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered, immutable list of category names.
///
/// # Examples
///
/// ```
/// use u_assign::catalog::{Catalog, CategoryId};
///
/// let catalog = Catalog::new(["A", "B"]).unwrap();
/// assert_eq!(catalog.resolve(" B "), Some(CategoryId(1)));
/// assert_eq!(catalog.name(CategoryId(0)), "A");
/// ```
#[derive(Debug, Clone)]
pub struct Catalog {
    names: Vec<String>,
    lookup: HashMap<String, CategoryId>,
}

impl Catalog {
    /// Builds a catalog from names in order.
    ///
    /// Names are trimmed. Empty catalogs, blank names and repeated names are
    /// rejected.
    pub fn new<I, S>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalog = Self {
            names: Vec::new(),
            lookup: HashMap::new(),
        };
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                return Err(ConfigError::Invalid("blank category name in catalog".into()));
            }
            let id = CategoryId(catalog.names.len());
            if catalog.lookup.insert(name.to_string(), id).is_some() {
                return Err(ConfigError::Invalid(format!(
                    "category {name:?} listed twice in catalog"
                )));
            }
            catalog.names.push(name.to_string());
        }
        if catalog.names.is_empty() {
            return Err(ConfigError::Invalid("catalog is empty".into()));
        }
        Ok(catalog)
    }

    /// The default catalog of observation subjects.
    pub fn observation_subjects() -> Self {
        Self::new(OBSERVATION_SUBJECTS).expect("default catalog is well formed")
    }

    /// Resolves a (possibly padded) name to its identifier.
    pub fn resolve(&self, name: &str) -> Option<CategoryId> {
        self.lookup.get(name.trim()).copied()
    }

    /// Name of a category.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this catalog.
    pub fn name(&self, id: CategoryId) -> &str {
        &self.names[id.0]
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false for a constructed catalog.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Category identifiers in catalog order.
    pub fn ids(&self) -> impl Iterator<Item = CategoryId> + '_ {
        (0..self.names.len()).map(CategoryId)
    }

    /// Category names in catalog order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_trims() {
        let catalog = Catalog::new(["A", "B", "C"]).unwrap();
        assert_eq!(catalog.resolve("A"), Some(CategoryId(0)));
        assert_eq!(catalog.resolve("  C\t"), Some(CategoryId(2)));
        assert_eq!(catalog.resolve("D"), None);
        assert_eq!(catalog.resolve(""), None);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        assert!(Catalog::new(["A", "B", " A"]).is_err());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(Catalog::new(Vec::<String>::new()).is_err());
        assert!(Catalog::new(["A", "  "]).is_err());
    }

    #[test]
    fn test_observation_subjects() {
        let catalog = Catalog::observation_subjects();
        assert_eq!(catalog.len(), 7);
        assert_eq!(catalog.resolve("地震観測"), Some(CategoryId(6)));
        assert_eq!(catalog.name(CategoryId(0)), "測地観測");
        let ids: Vec<_> = catalog.ids().collect();
        assert_eq!(ids.first(), Some(&CategoryId(0)));
        assert_eq!(ids.len(), 7);
    }
}
