use crate::error::ApiError;
use crate::metrics::{FILTER_RESULTS_TOTAL, FILTER_SECONDS, OPS_TOTAL, SNAPSHOT_ITEMS};
use crate::params::constraints_from_params;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parking_lot::RwLock;
use prometheus::{Encoder, TextEncoder};
use rigcat_catalog::{Snapshot, SnapshotLoader};
use rigcat_core::{CatalogError, CategoryId, ConstraintSet, FacetFilter, FacetSchema};
use serde::Deserialize;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    snapshots: Arc<RwLock<BTreeMap<CategoryId, Snapshot>>>,
    schemas: Arc<HashMap<CategoryId, Arc<FacetSchema>>>,
    loader: Option<SnapshotLoader>,
}

impl AppState {
    pub fn new(loader: Option<SnapshotLoader>, schemas: HashMap<CategoryId, FacetSchema>) -> Self {
        Self {
            snapshots: Arc::new(RwLock::new(BTreeMap::new())),
            schemas: Arc::new(
                schemas
                    .into_iter()
                    .map(|(k, v)| (k, Arc::new(v)))
                    .collect(),
            ),
            loader,
        }
    }

    pub fn install(&self, snap: Snapshot) {
        SNAPSHOT_ITEMS
            .with_label_values(&[snap.category.as_str()])
            .set(snap.items.len() as f64);
        self.snapshots.write().insert(snap.category.clone(), snap);
    }

    fn snapshot(&self, category: &str) -> Result<Snapshot, CatalogError> {
        self.snapshots
            .read()
            .get(category)
            .cloned()
            .ok_or(CatalogError::NotFound)
    }

    fn schema(&self, category: &str) -> Arc<FacetSchema> {
        self.schemas.get(category).cloned().unwrap_or_default()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/categories", get(list_categories))
        .route("/v1/categories/:category/items", get(items))
        .route("/v1/categories/:category/filter", post(filter_items))
        .route("/v1/categories/:category/facets", get(facets))
        .route("/v1/categories/:category/reload", post(reload))
        .route("/v1/deals", get(deals))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn list_categories(State(app): State<AppState>) -> impl IntoResponse {
    OPS_TOTAL.with_label_values(&["categories"]).inc();
    let snaps = app.snapshots.read();
    let list: Vec<_> = snaps
        .values()
        .map(|s| {
            json!({
                "category": s.category,
                "origin": s.origin,
                "items": s.items.len(),
                "loaded_at": s.loaded_at.to_rfc3339(),
                "fingerprint": s.fingerprint,
            })
        })
        .collect();
    Json(list)
}

fn render_view(
    app: &AppState,
    category: &str,
    constraints: &ConstraintSet,
) -> Result<Response, ApiError> {
    let snap = app.snapshot(category)?;
    let schema = app.schema(category);
    schema.validate(constraints)?;
    let timer = FILTER_SECONDS.with_label_values(&[category]).start_timer();
    let view = FacetFilter::new(&schema).view(&snap.items, constraints);
    timer.observe_duration();
    FILTER_RESULTS_TOTAL
        .with_label_values(&[view.state()])
        .inc();
    let body = json!({
        "category": category,
        "state": view.state(),
        "origin": snap.origin,
        "total": snap.items.len(),
        "count": view.items().len(),
        "items": view.items(),
    });
    Ok((
        [("x-snapshot-fingerprint", snap.fingerprint.clone())],
        Json(body),
    )
        .into_response())
}

async fn items(
    State(app): State<AppState>,
    Path(category): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    OPS_TOTAL.with_label_values(&["items"]).inc();
    let constraints = constraints_from_params(&params)?;
    render_view(&app, &category, &constraints)
}

async fn filter_items(
    State(app): State<AppState>,
    Path(category): Path<String>,
    Json(constraints): Json<ConstraintSet>,
) -> Result<Response, ApiError> {
    OPS_TOTAL.with_label_values(&["filter"]).inc();
    render_view(&app, &category, &constraints)
}

async fn facets(
    State(app): State<AppState>,
    Path(category): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    OPS_TOTAL.with_label_values(&["facets"]).inc();
    let constraints = constraints_from_params(&params)?;
    let snap = app.snapshot(&category)?;
    let schema = app.schema(&category);
    schema.validate(&constraints)?;
    let engine = FacetFilter::new(&schema);
    let matched = engine.filter(&snap.items, &constraints);
    let counts = engine.facet_counts(&snap.items, &constraints);
    Ok(Json(json!({
        "category": category,
        "facets": schema.facets,
        "matched": matched.len(),
        "counts": counts,
    }))
    .into_response())
}

async fn reload(
    State(app): State<AppState>,
    Path(category): Path<String>,
) -> Result<Response, ApiError> {
    OPS_TOTAL.with_label_values(&["reload"]).inc();
    let loader = app
        .loader
        .clone()
        .ok_or_else(|| CatalogError::Invalid("no catalog source configured".into()))?;
    let known = app.snapshots.read().contains_key(&category)
        || loader.source().categories().contains(&category);
    if !known {
        return Err(CatalogError::NotFound.into());
    }
    let snap = loader.load(&category).await;
    info!(%category, items = snap.items.len(), origin = ?snap.origin, "snapshot reloaded");
    let body = json!({
        "category": snap.category,
        "origin": snap.origin,
        "items": snap.items.len(),
        "fingerprint": snap.fingerprint,
    });
    app.install(snap);
    Ok(Json(body).into_response())
}

#[derive(Debug, Deserialize)]
struct DealsQuery {
    limit: Option<usize>,
    min_discount: Option<f64>,
}

async fn deals(State(app): State<AppState>, Query(q): Query<DealsQuery>) -> impl IntoResponse {
    OPS_TOTAL.with_label_values(&["deals"]).inc();
    let floor = q.min_discount.unwrap_or(0.0);
    let limit = q.limit.unwrap_or(50);
    let snaps: Vec<Snapshot> = app.snapshots.read().values().cloned().collect();
    let feed: Vec<_> = snaps
        .iter()
        .flat_map(|s| s.items.iter())
        .filter_map(|item| {
            item.discount_pct()
                .filter(|pct| *pct >= floor)
                .map(|pct| json!({"discount_pct": (pct * 100.0).round() / 100.0, "item": item}))
        })
        .take(limit)
        .collect();
    Json(feed)
}

async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buf) {
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }
    (
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buf,
    )
        .into_response()
}
