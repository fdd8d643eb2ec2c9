//! Declarative facet schema.
//!
//! One schema per category describes which attributes are filterable and how
//! a selection is compared against an item's value. The engine reads the
//! match mode from here instead of each page hardcoding its own comparisons.

use crate::errors::{CatalogError, Result};
use crate::query::ConstraintSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Item value must equal one of the selected values.
    #[default]
    Exact,
    /// Item value must contain one of the selected values as a substring,
    /// e.g. switch type "Cherry MX Red" against the token "Red".
    Token,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FacetKind {
    Discrete {
        #[serde(default)]
        match_mode: MatchMode,
        #[serde(default)]
        options: Vec<String>,
    },
    Boolean,
    Range,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetDef {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(flatten)]
    pub kind: FacetKind,
}

impl FacetDef {
    pub fn discrete(key: impl Into<String>, options: &[&str]) -> Self {
        Self {
            key: key.into(),
            label: None,
            kind: FacetKind::Discrete {
                match_mode: MatchMode::Exact,
                options: options.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    pub fn token(key: impl Into<String>, options: &[&str]) -> Self {
        Self {
            key: key.into(),
            label: None,
            kind: FacetKind::Discrete {
                match_mode: MatchMode::Token,
                options: options.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    pub fn boolean(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: None,
            kind: FacetKind::Boolean,
        }
    }

    pub fn range(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: None,
            kind: FacetKind::Range,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FacetSchema {
    #[serde(default)]
    pub facets: Vec<FacetDef>,
}

impl FacetSchema {
    pub fn new(facets: Vec<FacetDef>) -> Self {
        Self { facets }
    }

    pub fn get(&self, key: &str) -> Option<&FacetDef> {
        self.facets.iter().find(|f| f.key == key)
    }

    /// Match mode for a discrete facet. Undeclared facets compare exactly.
    pub fn match_mode(&self, key: &str) -> MatchMode {
        match self.get(key).map(|f| &f.kind) {
            Some(FacetKind::Discrete { match_mode, .. }) => *match_mode,
            _ => MatchMode::Exact,
        }
    }

    pub fn discrete(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.facets.iter().filter_map(|f| match &f.kind {
            FacetKind::Discrete { options, .. } => Some((f.key.as_str(), options.as_slice())),
            _ => None,
        })
    }

    /// Rejects constraints that name undeclared facets or use a facet with the
    /// wrong kind. An empty schema accepts anything.
    pub fn validate(&self, constraints: &ConstraintSet) -> Result<()> {
        if self.facets.is_empty() {
            return Ok(());
        }
        for facet in constraints.selections.keys() {
            match self.get(facet).map(|f| &f.kind) {
                Some(FacetKind::Discrete { .. }) => {}
                Some(_) => {
                    return Err(CatalogError::Invalid(format!(
                        "facet {} does not take discrete selections",
                        facet
                    )))
                }
                None => {
                    return Err(CatalogError::Invalid(format!("unknown facet {}", facet)));
                }
            }
        }
        for facet in constraints.booleans.keys() {
            match self.get(facet).map(|f| &f.kind) {
                Some(FacetKind::Boolean) => {}
                Some(_) => {
                    return Err(CatalogError::Invalid(format!(
                        "facet {} is not a yes/no facet",
                        facet
                    )))
                }
                None => {
                    return Err(CatalogError::Invalid(format!("unknown facet {}", facet)));
                }
            }
        }
        if let Some(r) = constraints.price_range {
            if r.min.is_nan() || r.max.is_nan() || r.min > r.max {
                return Err(CatalogError::Invalid(format!(
                    "price range [{}, {}] is empty",
                    r.min, r.max
                )));
            }
        }
        Ok(())
    }
}
