pub mod errors;
pub mod extract;
pub mod filter;
pub mod model;
pub mod query;
pub mod schema;
pub mod util;

pub use errors::*;
pub use extract::{ExtractRule, RuleKind, SpecExtractor};
pub use filter::{evaluate, filter, CatalogView, FacetCounts, FacetFilter};
pub use model::*;
pub use query::*;
pub use schema::*;
