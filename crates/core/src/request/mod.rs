//! Print request records and their storage.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteRequestStore;
pub use store::{
    CreatePrintRequest, RequestError, RequestFilter, RequestStore, RequestUpdate, RequestWindow,
    Search, UpdatePrintRequest,
};
pub use types::{
    AttachedFile, NewAttachedFile, PrintRequest, PrintType, RequestFields, RequestStatus,
};
