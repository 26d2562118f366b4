pub mod check;
pub mod fmt;
pub mod init;
pub mod ls;
pub mod save;
pub mod sync;

pub use check::{check, CheckArgs};
pub use fmt::{fmt, FmtArgs};
pub use init::{init, InitArgs};
pub use ls::{ls, LsArgs};
pub use save::{save, SaveArgs};
pub use sync::{sync, SyncArgs};

use std::path::{Path, PathBuf};

/// File arguments are taken relative to the workspace root
pub(crate) fn workspace_path(root: &Path, file: &Path) -> PathBuf {
    root.join(file)
}

/// Path as shown to the user, relative to the workspace when possible
pub(crate) fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
