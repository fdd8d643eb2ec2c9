pub mod loader;
pub mod mem;
pub mod remote;
pub mod snapshot;
pub mod traits;

pub use loader::SnapshotLoader;
pub use mem::InMemoryCatalog;
pub use remote::{Normalizer, RawRecord, RemoteCatalog, RemoteConfig};
pub use snapshot::{
    read_snapshot, write_snapshot, Snapshot, SnapshotDir, SnapshotManifest, SnapshotOrigin,
    SnapshotWriter,
};
pub use traits::*;
