use crate::traits::CatalogSource;
use chrono::{DateTime, Utc};
use rigcat_core::{util::blake3_hex, CatalogError, CatalogItem, CategoryId, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotOrigin {
    Static,
    Remote,
    File,
    /// The source failed; the snapshot is empty on purpose.
    Failed,
}

/// Immutable item list for one category plus where it came from.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub category: CategoryId,
    pub items: Arc<[CatalogItem]>,
    pub origin: SnapshotOrigin,
    pub loaded_at: DateTime<Utc>,
    pub fingerprint: String,
}

impl Snapshot {
    pub fn new(category: &str, items: Vec<CatalogItem>, origin: SnapshotOrigin) -> Self {
        let fingerprint = fingerprint(&items);
        Self {
            category: category.to_string(),
            items: Arc::from(items),
            origin,
            loaded_at: Utc::now(),
            fingerprint,
        }
    }

    pub fn failed(category: &str) -> Self {
        Self::new(category, Vec::new(), SnapshotOrigin::Failed)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn fingerprint(items: &[CatalogItem]) -> String {
    let bytes = serde_json::to_vec(items).unwrap_or_default();
    blake3_hex(&bytes)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotManifest {
    pub created_ts: i64,
    pub category: CategoryId,
    pub items: usize,
    pub path: String,
}

fn is_zstd(path: &Path) -> bool {
    path.extension().map(|e| e == "zst").unwrap_or(false)
}

enum Sink {
    Plain(BufWriter<File>),
    Zstd(zstd::Encoder<'static, BufWriter<File>>),
}

impl Sink {
    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Sink::Plain(w) => w,
            Sink::Zstd(w) => w,
        }
    }

    fn close(self) -> std::io::Result<()> {
        let mut inner = match self {
            Sink::Plain(w) => w,
            Sink::Zstd(enc) => enc.finish()?,
        };
        inner.flush()?;
        inner.get_ref().sync_all()
    }
}

/// Writes items as JSON lines; a `.zst` path is zstd-compressed.
pub struct SnapshotWriter {
    out: Sink,
    count: usize,
    pub path: PathBuf,
}

impl SnapshotWriter {
    pub fn create(path: PathBuf) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        let file = BufWriter::new(file);
        let out = if is_zstd(&path) {
            Sink::Zstd(zstd::Encoder::new(file, 3)?)
        } else {
            Sink::Plain(file)
        };
        Ok(Self {
            out,
            count: 0,
            path,
        })
    }

    pub fn write_item(&mut self, item: &CatalogItem) -> std::io::Result<()> {
        let s = serde_json::to_string(item)?;
        let out = self.out.writer();
        out.write_all(s.as_bytes())?;
        out.write_all(b"\n")?;
        self.count += 1;
        Ok(())
    }

    /// Ends the zstd frame (if any) and flushes; errors here mean the file
    /// is incomplete.
    pub fn finish(self, category: &str) -> std::io::Result<SnapshotManifest> {
        self.out.close()?;
        Ok(SnapshotManifest {
            created_ts: Utc::now().timestamp(),
            category: category.to_string(),
            items: self.count,
            path: self.path.display().to_string(),
        })
    }
}

pub fn write_snapshot(
    path: PathBuf,
    category: &str,
    items: &[CatalogItem],
) -> std::io::Result<SnapshotManifest> {
    let mut w = SnapshotWriter::create(path)?;
    for item in items {
        w.write_item(item)?;
    }
    w.finish(category)
}

/// Reads a JSON-lines snapshot. Lines that do not parse are skipped.
pub fn read_snapshot(path: &Path) -> std::io::Result<Vec<CatalogItem>> {
    let fh = File::open(path)?;
    let reader: Box<dyn Read> = if is_zstd(path) {
        Box::new(zstd::Decoder::new(fh)?)
    } else {
        Box::new(fh)
    };
    let br = BufReader::new(reader);
    let mut out = Vec::new();
    for (n, line) in br.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(item) => out.push(item),
            Err(e) => warn!(path = %path.display(), line = n + 1, error = %e, "skipping snapshot line"),
        }
    }
    Ok(out)
}

/// Catalog backed by a directory of `<category>.jsonl` / `<category>.jsonl.zst`
/// snapshot files.
#[derive(Debug, Clone)]
pub struct SnapshotDir {
    root: PathBuf,
}

impl SnapshotDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, category: &str) -> Option<PathBuf> {
        ["jsonl", "jsonl.zst"]
            .iter()
            .map(|ext| self.root.join(format!("{}.{}", category, ext)))
            .find(|p| p.is_file())
    }
}

#[async_trait::async_trait]
impl CatalogSource for SnapshotDir {
    fn name(&self) -> &'static str {
        "file"
    }

    fn categories(&self) -> Vec<CategoryId> {
        let mut out: Vec<CategoryId> = std::fs::read_dir(&self.root)
            .map(|rd| {
                rd.filter_map(|e| e.ok())
                    .filter_map(|e| {
                        let name = e.file_name().to_string_lossy().to_string();
                        name.strip_suffix(".jsonl.zst")
                            .or_else(|| name.strip_suffix(".jsonl"))
                            .map(str::to_string)
                    })
                    .collect()
            })
            .unwrap_or_default();
        out.sort();
        out.dedup();
        out
    }

    async fn items_by_category(&self, category: &str) -> Result<Vec<CatalogItem>> {
        let path = self.path_for(category).ok_or(CatalogError::NotFound)?;
        let items =
            read_snapshot(&path).map_err(|e| CatalogError::Source(format!("{}: {}", path.display(), e)))?;
        Ok(items
            .into_iter()
            .map(|mut i| {
                if i.category.is_empty() {
                    i.category = category.to_string();
                }
                i
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn snapshot_dir_lists_and_loads_categories() {
        let dir = tempfile::tempdir().unwrap();
        write_snapshot(dir.path().join("storage.jsonl"), "storage", &items()).unwrap();
        write_snapshot(dir.path().join("psu.jsonl.zst"), "psu", &items()[..1]).unwrap();
        std::fs::write(dir.path().join("README.txt"), "ignored").unwrap();
        let src = SnapshotDir::new(dir.path());
        assert_eq!(src.categories(), vec!["psu".to_string(), "storage".to_string()]);
        let psu = src.items_by_category("psu").await.unwrap();
        assert_eq!(psu.len(), 1);
        assert_eq!(psu[0].category, "psu");
        assert!(matches!(
            src.items_by_category("webcams").await,
            Err(CatalogError::NotFound)
        ));
    }

    fn items() -> Vec<CatalogItem> {
        vec![
            CatalogItem::new(1, "990 Pro", "Samsung").with_price(169.0),
            CatalogItem::new(2, "SN850X", "WD").with_attr("interface", "NVMe"),
        ]
    }

    #[test]
    fn plain_and_zstd_files_read_back() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["storage.jsonl", "storage.jsonl.zst"] {
            let path = dir.path().join(name);
            let manifest = write_snapshot(path.clone(), "storage", &items()).unwrap();
            assert_eq!(manifest.items, 2);
            assert_eq!(read_snapshot(&path).unwrap(), items());
        }
    }

    #[test]
    fn zstd_writer_finish_closes_the_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("psu.jsonl.zst");
        let mut w = SnapshotWriter::create(path.clone()).unwrap();
        for item in items() {
            w.write_item(&item).unwrap();
        }
        let manifest = w.finish("psu").unwrap();
        assert_eq!(manifest.items, 2);
        let raw = zstd::decode_all(File::open(&path).unwrap()).unwrap();
        assert_eq!(raw.iter().filter(|b| **b == b'\n').count(), 2);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.jsonl");
        let good = serde_json::to_string(&items()[0]).unwrap();
        std::fs::write(&path, format!("{}\nnot json\n\n{{\"id\": \"x\"}}\n", good)).unwrap();
        let read = read_snapshot(&path).unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].id, 1);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = Snapshot::new("storage", items(), SnapshotOrigin::Static);
        let b = Snapshot::new("storage", items(), SnapshotOrigin::Remote);
        let c = Snapshot::new("storage", items()[..1].to_vec(), SnapshotOrigin::Static);
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_ne!(a.fingerprint, c.fingerprint);
        assert!(Snapshot::failed("storage").is_empty());
    }
}
