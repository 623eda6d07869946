//! hcrypt-store: the only I/O boundary of hcrypt
//!
//! Every write is staged into a hidden sibling file and renamed over its
//! target, so readers never observe a truncated file. [`WriteBatch`] extends
//! that to several files: all of them are published or none are.

pub mod batch;
pub mod store;

pub use batch::WriteBatch;
pub use store::FileStore;
