//! Rule registries.
//!
//! A registry is built explicitly per invocation, filled once at startup and read-only
//! afterwards. Duplicate ids fail registration, so a bad catalog is caught while the
//! registry is being built rather than while rules run.
use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::rules::{Action, Check, Rule};

mod selector;

pub use selector::Selector;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("duplicate rule id `{0}`")]
    DuplicateId(String),
    #[error("invalid selector `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("unknown rule id `{0}`")]
    NotFound(String),
}

pub struct Registry<R: ?Sized + Rule> {
    rules: Vec<Arc<R>>,
    index: HashMap<String, usize>,
}

pub type CheckRegistry = Registry<dyn Check>;
pub type ActionRegistry = Registry<dyn Action>;

impl<R: ?Sized + Rule> Default for Registry<R> {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<R: ?Sized + Rule> Registry<R> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns `DuplicateId` when a rule with the same id is already registered; the
    /// registry is left unchanged.
    pub fn register(&mut self, rule: Arc<R>) -> Result<(), RegistryError> {
        let id = rule.id().to_string();
        if self.index.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }
        self.index.insert(id, self.rules.len());
        self.rules.push(rule);
        Ok(())
    }

    /// Build a registry from rules in order.
    ///
    /// # Errors
    /// Returns `DuplicateId` on the first repeated id.
    pub fn from_rules(rules: impl IntoIterator<Item = Arc<R>>) -> Result<Self, RegistryError> {
        let mut reg = Self::new();
        for r in rules {
            reg.register(r)?;
        }
        Ok(reg)
    }

    /// # Errors
    /// Returns `NotFound` for an unknown id.
    pub fn get(&self, id: &str) -> Result<Arc<R>, RegistryError> {
        self.index
            .get(id)
            .map(|&i| Arc::clone(&self.rules[i]))
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Every rule in registration order.
    #[must_use]
    pub fn list_all(&self) -> Vec<Arc<R>> {
        self.rules.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Resolve one selector, optionally narrowed to `category`, in registration order.
    ///
    /// # Errors
    /// Returns `InvalidPattern` when the pattern is not a valid glob.
    pub fn list_by_pattern(
        &self,
        pattern: &str,
        category: Option<R::Group>,
    ) -> Result<Vec<Arc<R>>, RegistryError> {
        let sel = Selector::parse(pattern)?;
        Ok(self.matching(std::slice::from_ref(&sel), category))
    }

    /// Union of several selectors: a rule is selected when any selector matches it.
    /// Output keeps registration order and contains each rule once. Every pattern is
    /// validated before anything is selected.
    ///
    /// # Errors
    /// Returns `InvalidPattern` for the first pattern that does not compile.
    pub fn select<S: AsRef<str>>(
        &self,
        patterns: &[S],
        category: Option<R::Group>,
    ) -> Result<Vec<Arc<R>>, RegistryError> {
        let selectors = if patterns.is_empty() {
            vec![Selector::All]
        } else {
            patterns
                .iter()
                .map(|p| Selector::parse(p.as_ref()))
                .collect::<Result<Vec<_>, _>>()?
        };
        Ok(self.matching(&selectors, category))
    }

    fn matching(
        &self,
        selectors: &[Selector<R::Group>],
        category: Option<R::Group>,
    ) -> Vec<Arc<R>> {
        self.rules
            .iter()
            .filter(|r| category.map_or(true, |c| r.group() == c))
            .filter(|r| selectors.iter().any(|s| s.matches(r.id(), r.group())))
            .cloned()
            .collect()
    }
}
