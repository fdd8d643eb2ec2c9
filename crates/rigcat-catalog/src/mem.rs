use crate::traits::CatalogSource;
use rigcat_core::{CatalogError, CatalogItem, CategoryId, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Static per-category item lists.
///
/// Readers clone the `Arc` and filter without holding the lock; `replace`
/// swaps a whole list.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    inner: Arc<RwLock<BTreeMap<CategoryId, Arc<[CatalogItem]>>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(self, category: &str, items: Vec<CatalogItem>) -> Self {
        self.replace(category, items);
        self
    }

    /// Installs `items` as the category's snapshot, stamping the category id
    /// onto each item.
    pub fn replace(&self, category: &str, mut items: Vec<CatalogItem>) {
        for item in items.iter_mut() {
            if item.category.is_empty() {
                item.category = category.to_string();
            }
        }
        self.inner
            .write()
            .insert(category.to_string(), Arc::from(items));
    }

    pub fn snapshot(&self, category: &str) -> Option<Arc<[CatalogItem]>> {
        self.inner.read().get(category).cloned()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.inner.read().contains_key(category)
    }

    pub fn all_items(&self) -> Vec<CatalogItem> {
        let inner = self.inner.read();
        let mut out = Vec::new();
        for items in inner.values() {
            out.extend(items.iter().cloned());
        }
        out
    }
}

#[async_trait::async_trait]
impl CatalogSource for InMemoryCatalog {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn categories(&self) -> Vec<CategoryId> {
        self.inner.read().keys().cloned().collect()
    }

    async fn items_by_category(&self, category: &str) -> Result<Vec<CatalogItem>> {
        self.snapshot(category)
            .map(|items| items.to_vec())
            .ok_or(CatalogError::NotFound)
    }
}
