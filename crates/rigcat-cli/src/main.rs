use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rigcat_catalog::{
    read_snapshot, remote::DEFAULT_IMAGE_URL, write_snapshot, CatalogSource, Normalizer,
    RemoteCatalog, RemoteConfig,
};
use rigcat_core::{
    ConstraintEvent, ConstraintSet, ExtractRule, FacetFilter, FacetSchema, SpecExtractor,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rigcat")]
#[command(about="Parts catalog admin CLI", long_about=None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Fetch one category from the parts API into a snapshot file
    Fetch {
        #[arg(long)]
        base_url: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        path_template: Option<String>,
        #[arg(long)]
        rules: Option<PathBuf>,
        #[arg(long)]
        default_image: Option<String>,
    },
    /// Filter a snapshot file and print the matching items as JSON
    Filter {
        #[arg(long)]
        snapshot: PathBuf,
        #[arg(long)]
        schema: Option<PathBuf>,
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        min: Option<f64>,
        #[arg(long)]
        max: Option<f64>,
        /// facet=value, repeatable
        #[arg(long = "select")]
        selections: Vec<String>,
        /// facet=true|false, repeatable
        #[arg(long = "flag")]
        flags: Vec<String>,
        /// JSON array of constraint events applied after the flags above
        #[arg(long)]
        events: Option<PathBuf>,
    },
    /// Run extraction rules against a spec string
    Extract {
        #[arg(long)]
        rules: PathBuf,
        text: String,
    },
}

fn split_pair(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim(), v.trim())),
        _ => bail!("expected facet=value, got {:?}", raw),
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => bail!("expected true or false, got {:?}", other),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
}

fn build_constraints(
    query: Option<String>,
    min: Option<f64>,
    max: Option<f64>,
    selections: &[String],
    flags: &[String],
    events: &[ConstraintEvent],
) -> Result<ConstraintSet> {
    let mut c = ConstraintSet::new();
    if min.is_some() || max.is_some() {
        c = c.with_price_range(min.unwrap_or(0.0), max.unwrap_or(f64::MAX));
    }
    if let Some(q) = query {
        c = c.with_query(q);
    }
    for raw in selections {
        let (facet, value) = split_pair(raw)?;
        c = c.apply(&ConstraintEvent::ToggleValue {
            facet: facet.to_string(),
            value: value.to_string(),
        });
    }
    for raw in flags {
        let (facet, value) = split_pair(raw)?;
        c = c.apply(&ConstraintEvent::SetFlag {
            facet: facet.to_string(),
            value: parse_bool(value)?,
        });
    }
    Ok(events.iter().fold(c, |c, ev| c.apply(ev)))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Fetch {
            base_url,
            category,
            out,
            path_template,
            rules,
            default_image,
        } => {
            let mut cfg = RemoteConfig::new(base_url, vec![category.clone()]);
            if let Some(p) = path_template {
                cfg.path_template = p;
            }
            let extractor = match rules {
                Some(path) => SpecExtractor::new(read_json::<Vec<ExtractRule>>(&path)?)?,
                None => SpecExtractor::default(),
            };
            let normalizer = Normalizer::new(
                default_image.unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string()),
                extractor,
            );
            let remote = RemoteCatalog::new(cfg)?.with_default_normalizer(normalizer);
            let items = remote.items_by_category(&category).await?;
            let manifest = write_snapshot(out, &category, &items)?;
            println!("{}", serde_json::to_string_pretty(&manifest)?);
        }
        Cmd::Filter {
            snapshot,
            schema,
            query,
            min,
            max,
            selections,
            flags,
            events,
        } => {
            let items = read_snapshot(&snapshot)
                .with_context(|| format!("read {}", snapshot.display()))?;
            let schema: FacetSchema = match schema {
                Some(path) => read_json(&path)?,
                None => FacetSchema::default(),
            };
            let events: Vec<ConstraintEvent> = match events {
                Some(path) => read_json(&path)?,
                None => Vec::new(),
            };
            let c = build_constraints(query, min, max, &selections, &flags, &events)?;
            schema.validate(&c)?;
            let view = FacetFilter::new(&schema).view(&items, &c);
            let report = serde_json::json!({
                "state": view.state(),
                "total": items.len(),
                "count": view.items().len(),
                "items": view.items(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Cmd::Extract { rules, text } => {
            let extractor = SpecExtractor::new(read_json::<Vec<ExtractRule>>(&rules)?)?;
            println!("{}", serde_json::to_string_pretty(&extractor.extract(&text))?);
        }
    }
    Ok(())
}
