use rigcat_core::{CatalogItem, CategoryId, Result};

/// Anything that can hand out a full item list for a category.
///
/// Sources return whole snapshots; there is no paging and no partial result.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn categories(&self) -> Vec<CategoryId>;

    async fn items_by_category(&self, category: &str) -> Result<Vec<CatalogItem>>;
}
