//! Image storage for uploaded school pictures.
//!
//! Uploads go either to a local directory served under the configured public
//! path, or to a remote object store that hands back absolute URLs. The
//! record service only sees the [`ImageStore`] trait.

mod local;
mod remote;
mod storage;

pub use local::LocalImageStore;
pub use remote::RemoteImageStore;
pub use storage::{build_store, timestamp_millis, ImageStore};
