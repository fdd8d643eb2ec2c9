//! Facet filter engine.
//!
//! Evaluation is a pure conjunction of gates (price, text, discrete
//! selections, yes/no flags) over one item. Filtering a snapshot keeps the
//! original order; nothing here ever sorts.

use crate::model::{AttrValue, CatalogItem};
use crate::query::ConstraintSet;
use crate::schema::{FacetSchema, MatchMode};
use crate::util::contains_ci;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

static EMPTY_SCHEMA: FacetSchema = FacetSchema { facets: Vec::new() };

/// Result of filtering a snapshot, keeping "nothing loaded" apart from
/// "nothing matched".
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogView {
    NoData,
    NoMatches,
    Matches(Vec<CatalogItem>),
}

impl CatalogView {
    pub fn state(&self) -> &'static str {
        match self {
            CatalogView::NoData => "no_data",
            CatalogView::NoMatches => "no_matches",
            CatalogView::Matches(_) => "matches",
        }
    }

    pub fn items(&self) -> &[CatalogItem] {
        match self {
            CatalogView::Matches(items) => items,
            _ => &[],
        }
    }

    pub fn into_items(self) -> Vec<CatalogItem> {
        match self {
            CatalogView::Matches(items) => items,
            _ => Vec::new(),
        }
    }
}

/// option value -> item count, per discrete facet
pub type FacetCounts = BTreeMap<String, BTreeMap<String, usize>>;

#[derive(Debug, Clone, Copy)]
pub struct FacetFilter<'s> {
    schema: &'s FacetSchema,
}

impl Default for FacetFilter<'static> {
    fn default() -> Self {
        Self {
            schema: &EMPTY_SCHEMA,
        }
    }
}

struct Prepared<'c> {
    constraints: &'c ConstraintSet,
    query: Option<String>,
}

impl<'s> FacetFilter<'s> {
    pub fn new(schema: &'s FacetSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FacetSchema {
        self.schema
    }

    // a whitespace-only query is inactive; any other query matches verbatim
    fn prepare<'c>(&self, constraints: &'c ConstraintSet) -> Prepared<'c> {
        let q = &constraints.query;
        Prepared {
            constraints,
            query: (!q.trim().is_empty()).then(|| q.to_lowercase()),
        }
    }

    pub fn evaluate(&self, item: &CatalogItem, constraints: &ConstraintSet) -> bool {
        self.eval_prepared(item, &self.prepare(constraints))
    }

    fn eval_prepared(&self, item: &CatalogItem, p: &Prepared<'_>) -> bool {
        price_gate(item, p.constraints)
            && text_gate(item, p.query.as_deref())
            && self.selection_gate(item, p.constraints)
            && flag_gate(item, p.constraints)
    }

    fn selection_gate(&self, item: &CatalogItem, c: &ConstraintSet) -> bool {
        c.selections.iter().all(|(facet, accepted)| {
            if accepted.is_empty() {
                return true;
            }
            let value = match item.facet_value(facet) {
                Some(v) => v,
                None => return false,
            };
            value_matches(self.schema.match_mode(facet), value, accepted)
        })
    }

    /// Borrowing filter over a snapshot, in snapshot order.
    pub fn matches<'a>(
        &self,
        items: &'a [CatalogItem],
        constraints: &'a ConstraintSet,
    ) -> impl Iterator<Item = &'a CatalogItem> + 'a
    where
        's: 'a,
    {
        let this: FacetFilter<'a> = FacetFilter {
            schema: self.schema,
        };
        let p = this.prepare(constraints);
        items.iter().filter(move |item| this.eval_prepared(item, &p))
    }

    pub fn filter(&self, items: &[CatalogItem], constraints: &ConstraintSet) -> Vec<CatalogItem> {
        let out: Vec<CatalogItem> = self.matches(items, constraints).cloned().collect();
        debug!(total = items.len(), matched = out.len(), "facet filter pass");
        out
    }

    pub fn view(&self, items: &[CatalogItem], constraints: &ConstraintSet) -> CatalogView {
        if items.is_empty() {
            return CatalogView::NoData;
        }
        let out = self.filter(items, constraints);
        if out.is_empty() {
            CatalogView::NoMatches
        } else {
            CatalogView::Matches(out)
        }
    }

    /// Counts, for every declared option of every discrete facet, how many of
    /// `items` would match if that option were selected alone.
    ///
    /// Each facet is counted against the other active constraints only, so
    /// picking one brand still reports counts for the remaining brands.
    pub fn facet_counts(&self, items: &[CatalogItem], constraints: &ConstraintSet) -> FacetCounts {
        let mut out = FacetCounts::new();
        for (facet, options) in self.schema.discrete() {
            let mode = self.schema.match_mode(facet);
            let mut others = constraints.clone();
            others.selections.remove(facet);
            let values: Vec<&str> = self
                .matches(items, &others)
                .filter_map(|i| i.facet_value(facet))
                .collect();
            let counts = out.entry(facet.to_string()).or_default();
            for opt in options {
                let single: BTreeSet<String> = std::iter::once(opt.clone()).collect();
                let n = values
                    .iter()
                    .filter(|v| value_matches(mode, v, &single))
                    .count();
                counts.insert(opt.clone(), n);
            }
        }
        out
    }
}

fn price_gate(item: &CatalogItem, c: &ConstraintSet) -> bool {
    match c.price_range {
        None => true,
        Some(_) if item.price == 0.0 => true,
        Some(r) => r.contains(item.price),
    }
}

fn text_gate(item: &CatalogItem, query_lower: Option<&str>) -> bool {
    match query_lower {
        None => true,
        Some(q) => contains_ci(&item.display_name, q) || contains_ci(&item.brand, q),
    }
}

fn flag_gate(item: &CatalogItem, c: &ConstraintSet) -> bool {
    c.booleans.iter().all(|(facet, want)| match want.as_bool() {
        None => true,
        Some(want) => item.attributes.get(facet).and_then(AttrValue::as_flag) == Some(want),
    })
}

fn value_matches(mode: MatchMode, value: &str, accepted: &BTreeSet<String>) -> bool {
    match mode {
        MatchMode::Exact => accepted.contains(value),
        MatchMode::Token => accepted.iter().any(|tok| value.contains(tok.as_str())),
    }
}

/// `evaluate` with every facet compared exactly.
pub fn evaluate(item: &CatalogItem, constraints: &ConstraintSet) -> bool {
    FacetFilter::default().evaluate(item, constraints)
}

/// `filter` with every facet compared exactly.
pub fn filter(items: &[CatalogItem], constraints: &ConstraintSet) -> Vec<CatalogItem> {
    FacetFilter::default().filter(items, constraints)
}
