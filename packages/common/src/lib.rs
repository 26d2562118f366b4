//! Pieces shared by the Arbor crates: the host filesystem contract the
//! engine consumes, and a read-only visitor over documents.

pub mod error;
pub mod filesystem;
pub mod visitor;

pub use error::*;
pub use filesystem::*;
pub use visitor::*;
