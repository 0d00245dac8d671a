//! Model discovery adapters.

mod directory;
mod http;

pub use directory::DirectoryModelLister;
pub use http::{HttpModelLister, normalize_models};
