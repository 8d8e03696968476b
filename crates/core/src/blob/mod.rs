//! Storage for the contents of attached files.
//!
//! Request rows only reference blobs by key. The workflow writes new blobs
//! before it touches the database and removes replaced blobs after commit,
//! so a committed row never points at a partially written file.

mod error;
mod fs_store;
mod traits;

pub use error::BlobError;
pub use fs_store::FsBlobStore;
pub use traits::{BlobStore, StoredBlob};
