//! # Arbor Workspace
//!
//! Keeps every document in a folder consistent with the workspace library.
//!
//! ```text
//!            open_document                    save_document
//!                 │                                 │
//!   read → parse → detect ─ decide ─┐     write doc → merge+write library
//!                                   │                 │
//!              overwrite: library copy          other indexed files that
//!              abort: OpenAborted               reference a modified
//!                                               component are rewritten
//! ```
//!
//! All I/O goes through [`arbor_common::FileSystem`]; nothing here touches
//! the disk directly.

mod config;
mod error;
mod index;
mod propagate;
mod reconcile;
mod session;

pub use config::{WorkspaceConfig, CONFIG_FILE_NAME};
pub use error::WorkspaceError;
pub use index::{IndexedFile, WorkspaceIndex};
pub use propagate::{FailureStage, PropagationFailure, Propagator, SaveOutcome};
pub use reconcile::{
    detect_discrepancy, resolve, Aborted, ComponentComparator, Discrepancy, DiscrepancyReport,
    ReconcilePolicy, Shape, ShapeComparator,
};
pub use session::Workspace;
