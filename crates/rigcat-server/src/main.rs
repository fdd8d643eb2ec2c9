use anyhow::Context;
use rigcat_catalog::{
    CatalogSource, Normalizer, RemoteCatalog, RemoteConfig, SnapshotDir, SnapshotLoader,
    SnapshotOrigin,
};
use rigcat_core::{CategoryId, ExtractRule, FacetSchema, SpecExtractor};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};

mod config;
mod error;
mod metrics;
mod params;
mod routes;

use config::Config;
use routes::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::load()?;
    let schemas = match &config.schema_dir {
        Some(dir) => load_schemas(dir)?,
        None => HashMap::new(),
    };
    let loader = build_source(&config)?.map(|(src, origin)| SnapshotLoader::new(src, origin));

    let state = AppState::new(loader.clone(), schemas);
    match &loader {
        Some(loader) => {
            for snap in loader.load_all().await {
                state.install(snap);
            }
        }
        None => warn!("no catalog source configured, every category will be empty"),
    }

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("bind {}", config.http_addr))?;
    info!("http listening on {}", config.http_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_source(
    config: &Config,
) -> anyhow::Result<Option<(Arc<dyn CatalogSource>, SnapshotOrigin)>> {
    if let Some(base) = &config.api_base {
        let mut remote_cfg = RemoteConfig::new(base.clone(), config.categories.clone());
        if let Some(path) = &config.api_path {
            remote_cfg.path_template = path.clone();
        }
        remote_cfg.timeout = Duration::from_secs(config.fetch_timeout_secs);
        let default_image = config
            .default_image
            .clone()
            .unwrap_or_else(|| rigcat_catalog::remote::DEFAULT_IMAGE_URL.to_string());
        let mut remote = RemoteCatalog::new(remote_cfg)?.with_default_normalizer(Normalizer::new(
            default_image.clone(),
            SpecExtractor::default(),
        ));
        if let Some(dir) = &config.rules_dir {
            for category in &config.categories {
                if let Some(extractor) = load_rules(dir, category)? {
                    remote = remote
                        .with_normalizer(category, Normalizer::new(default_image.clone(), extractor));
                }
            }
        }
        info!(%base, categories = config.categories.len(), "using remote catalog");
        return Ok(Some((Arc::new(remote), SnapshotOrigin::Remote)));
    }
    if let Some(dir) = &config.snapshot_dir {
        info!(dir = %dir.display(), "using snapshot directory");
        return Ok(Some((Arc::new(SnapshotDir::new(dir.clone())), SnapshotOrigin::File)));
    }
    Ok(None)
}

fn load_rules(dir: &Path, category: &str) -> anyhow::Result<Option<SpecExtractor>> {
    let path = dir.join(format!("{}.json", category));
    if !path.is_file() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let rules: Vec<ExtractRule> =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    info!(%category, rules = rules.len(), "extraction rules loaded");
    Ok(Some(SpecExtractor::new(rules)?))
}

fn load_schemas(dir: &Path) -> anyhow::Result<HashMap<CategoryId, FacetSchema>> {
    let mut out = HashMap::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().map(|e| e != "json").unwrap_or(true) {
            continue;
        }
        let Some(category) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            continue;
        };
        let raw = std::fs::read_to_string(&path)?;
        let schema: FacetSchema =
            serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
        info!(%category, facets = schema.facets.len(), "facet schema loaded");
        out.insert(category, schema);
    }
    Ok(out)
}
