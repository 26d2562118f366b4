//! # Arbor Library
//!
//! The per-workspace canonical map of components. Whenever a document's
//! embedded copy of a component disagrees with the library, the library wins.
//!
//! Components go in and come out by value: `merge` clones what it is given
//! and `checkout` hands back a clone, so a document never aliases the
//! library's copy.

mod error;
mod store;

pub use error::LibraryError;
pub use store::{LibraryStore, LIBRARY_FILE_NAME};
