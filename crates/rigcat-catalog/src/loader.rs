use crate::snapshot::{Snapshot, SnapshotOrigin};
use crate::traits::CatalogSource;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use prometheus::{register_histogram_vec, HistogramVec};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

static CATALOG_LOAD_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "catalog_load_seconds",
        "Catalog snapshot load latency",
        &["source", "result"]
    )
    .unwrap()
});

/// Turns a [`CatalogSource`] into snapshots.
///
/// At most one load per category is outstanding; a second caller waits for
/// the first to finish and then loads again. There are no retries: any source
/// error yields an empty snapshot marked [`SnapshotOrigin::Failed`].
#[derive(Clone)]
pub struct SnapshotLoader {
    source: Arc<dyn CatalogSource>,
    origin: SnapshotOrigin,
    inflight: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl SnapshotLoader {
    pub fn new(source: Arc<dyn CatalogSource>, origin: SnapshotOrigin) -> Self {
        Self {
            source,
            origin,
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn source(&self) -> &Arc<dyn CatalogSource> {
        &self.source
    }

    fn gate(&self, category: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.inflight
            .lock()
            .entry(category.to_string())
            .or_default()
            .clone()
    }

    pub async fn load(&self, category: &str) -> Snapshot {
        let gate = self.gate(category);
        let _guard = gate.lock().await;
        let timer_source = self.source.name();
        let started = std::time::Instant::now();
        let snap = match self.source.items_by_category(category).await {
            Ok(items) => {
                info!(%category, source = timer_source, items = items.len(), "catalog loaded");
                Snapshot::new(category, items, self.origin)
            }
            Err(e) => {
                warn!(%category, source = timer_source, error = %e, "catalog load failed, serving empty snapshot");
                Snapshot::failed(category)
            }
        };
        let result = if snap.origin == SnapshotOrigin::Failed {
            "failed"
        } else {
            "ok"
        };
        CATALOG_LOAD_SECONDS
            .with_label_values(&[timer_source, result])
            .observe(started.elapsed().as_secs_f64());
        snap
    }

    pub async fn load_all(&self) -> Vec<Snapshot> {
        let mut out = Vec::new();
        for category in self.source.categories() {
            out.push(self.load(&category).await);
        }
        out
    }
}
