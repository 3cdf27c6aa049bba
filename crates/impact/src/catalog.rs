//! Practice keys and the practice metadata table.
//!
//! Classifier labels are free-form strings, sometimes decorated with a glyph
//! ("🐄 Factory Farming"). The engine never looks inside them: a label is an
//! opaque, interned [`PracticeKey`], and everything known *about* a practice
//! (category, remediation) lives in a [`PracticeCatalog`] row.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::Remediation;

/// Opaque practice identifier. Cloning is a refcount bump.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PracticeKey(Arc<str>);

impl PracticeKey {
    pub fn new(label: &str) -> Self {
        Self(Arc::from(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PracticeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for PracticeKey {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for PracticeKey {
    fn from(label: String) -> Self {
        Self(Arc::from(label))
    }
}

impl Borrow<str> for PracticeKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Metadata attached to a practice key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PracticeMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<Remediation>,
}

/// Interner + lookup table mapping practice key → metadata.
///
/// Rows are filled first-writer-wins: once a field is known it is never
/// overwritten by a later observation.
#[derive(Debug, Clone, Default)]
pub struct PracticeCatalog {
    keys: HashSet<PracticeKey>,
    meta: BTreeMap<PracticeKey, PracticeMeta>,
}

impl PracticeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared key for `label`, allocating it on first use.
    pub fn intern(&mut self, label: &str) -> PracticeKey {
        if let Some(key) = self.keys.get(label) {
            return key.clone();
        }
        let key = PracticeKey::new(label);
        self.keys.insert(key.clone());
        key
    }

    pub fn get(&self, key: &str) -> Option<&PracticeMeta> {
        self.meta.get(key)
    }

    pub fn len(&self) -> usize {
        self.meta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meta.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PracticeKey, &PracticeMeta)> {
        self.meta.iter()
    }

    /// Merge `incoming` into the row for `label`, keeping fields already set.
    pub fn record(&mut self, label: &str, incoming: PracticeMeta) -> PracticeKey {
        let key = self.intern(label);
        let row = self.meta.entry(key.clone()).or_default();
        if row.category.is_none() {
            row.category = incoming.category;
        }
        if row.remediation.is_none() {
            row.remediation = incoming.remediation;
        }
        key
    }
}
