use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Yes/No facet toggle that can be cleared again.
///
/// On the wire this is `null`, `true` or `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum TriState {
    #[default]
    Unset,
    Yes,
    No,
}

impl TriState {
    /// Clicking the already active side clears it; anything else selects it.
    pub fn toggle(self, incoming: bool) -> TriState {
        let next = TriState::from(incoming);
        if self == next {
            TriState::Unset
        } else {
            next
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        self.into()
    }

    pub fn is_unset(self) -> bool {
        self == TriState::Unset
    }
}

impl From<bool> for TriState {
    fn from(b: bool) -> Self {
        if b {
            TriState::Yes
        } else {
            TriState::No
        }
    }
}

impl From<Option<bool>> for TriState {
    fn from(b: Option<bool>) -> Self {
        b.map(TriState::from).unwrap_or(TriState::Unset)
    }
}

impl From<TriState> for Option<bool> {
    fn from(t: TriState) -> Self {
        match t {
            TriState::Unset => None,
            TriState::Yes => Some(true),
            TriState::No => Some(false),
        }
    }
}

/// Inclusive price window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, price: f64) -> bool {
        self.min <= price && price <= self.max
    }
}

/// Adds `value` when absent, removes it when present.
pub fn toggle(set: &mut BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}

/// One UI control interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintEvent {
    ToggleValue { facet: String, value: String },
    SetFlag { facet: String, value: bool },
    SetPriceCeiling { max: f64 },
    SetPriceRange { min: f64, max: f64 },
    ClearPrice,
    SetQuery { query: String },
    Reset,
}

/// Active filter state of one catalog page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConstraintSet {
    #[serde(default)]
    pub price_range: Option<PriceRange>,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub selections: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    pub booleans: BTreeMap<String, TriState>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price_range(mut self, min: f64, max: f64) -> Self {
        self.price_range = Some(PriceRange::new(min, max));
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_selection<I, S>(mut self, facet: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if !set.is_empty() {
            self.selections.insert(facet.into(), set);
        }
        self
    }

    pub fn with_flag(mut self, facet: impl Into<String>, value: bool) -> Self {
        self.booleans.insert(facet.into(), TriState::from(value));
        self
    }

    pub fn toggle_value(&mut self, facet: &str, value: &str) {
        let set = self.selections.entry(facet.to_string()).or_default();
        toggle(set, value);
        if set.is_empty() {
            self.selections.remove(facet);
        }
    }

    pub fn set_flag(&mut self, facet: &str, value: bool) {
        let cur = self.flag(facet);
        match cur.toggle(value) {
            TriState::Unset => {
                self.booleans.remove(facet);
            }
            next => {
                self.booleans.insert(facet.to_string(), next);
            }
        }
    }

    pub fn flag(&self, facet: &str) -> TriState {
        self.booleans.get(facet).copied().unwrap_or_default()
    }

    pub fn selection(&self, facet: &str) -> Option<&BTreeSet<String>> {
        self.selections.get(facet).filter(|s| !s.is_empty())
    }

    /// Reducer step: the next constraint set after `event`.
    pub fn apply(mut self, event: &ConstraintEvent) -> Self {
        match event {
            ConstraintEvent::ToggleValue { facet, value } => self.toggle_value(facet, value),
            ConstraintEvent::SetFlag { facet, value } => self.set_flag(facet, *value),
            ConstraintEvent::SetPriceCeiling { max } => {
                let min = self.price_range.map(|r| r.min).unwrap_or(0.0);
                self.price_range = Some(PriceRange::new(min, *max));
            }
            ConstraintEvent::SetPriceRange { min, max } => {
                self.price_range = Some(PriceRange::new(*min, *max));
            }
            ConstraintEvent::ClearPrice => self.price_range = None,
            ConstraintEvent::SetQuery { query } => self.query = query.clone(),
            ConstraintEvent::Reset => return Self::default(),
        }
        self
    }

    /// True when no facet, price or text constraint is active.
    pub fn is_unconstrained(&self) -> bool {
        self.price_range.is_none()
            && self.query.trim().is_empty()
            && self.selections.values().all(|s| s.is_empty())
            && self.booleans.values().all(|b| b.is_unset())
    }
}
