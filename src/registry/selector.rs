use globset::{Glob, GlobMatcher};

use crate::types::Group;

use super::RegistryError;

/// One parsed selector token.
///
/// - `*` or empty: every rule.
/// - a category name (`components`, `service`, ...): every rule in that category.
/// - anything else: a shell-style glob over rule ids.
#[derive(Clone, Debug)]
pub enum Selector<G> {
    All,
    Group(G),
    Glob(GlobMatcher),
}

impl<G: Group> Selector<G> {
    /// # Errors
    /// Returns `InvalidPattern` when the glob does not compile.
    pub fn parse(pattern: &str) -> Result<Self, RegistryError> {
        let p = pattern.trim();
        if p.is_empty() || p == "*" {
            return Ok(Self::All);
        }
        if let Some(g) = G::from_selector(p) {
            return Ok(Self::Group(g));
        }
        let glob = Glob::new(p).map_err(|e| RegistryError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.kind().to_string(),
        })?;
        Ok(Self::Glob(glob.compile_matcher()))
    }

    #[must_use]
    pub fn matches(&self, id: &str, group: G) -> bool {
        match self {
            Self::All => true,
            Self::Group(g) => *g == group,
            Self::Glob(m) => m.is_match(id),
        }
    }
}
