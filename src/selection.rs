//! Set of section names currently visible.

use serde::{Deserialize, Serialize};

use std::collections::BTreeSet;

/// Visible sections. Single-select is the singleton case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    sections: BTreeSet<String>,
}

impl Selection {
    pub fn all<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sections: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn only(name: impl Into<String>) -> Self {
        Self::all([name])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sections.contains(name)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(String::as_str)
    }

    /// Flip membership of `name`, returning the new selection.
    pub fn toggled(&self, name: &str) -> Self {
        let mut next = self.clone();
        if !next.sections.remove(name) {
            next.sections.insert(name.to_string());
        }
        next
    }
}
