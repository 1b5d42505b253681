//! Path expansion for paths written in configuration.

use std::path::{Path, PathBuf};

/// Expand a configured path.
///
/// A leading `~` becomes the home directory; other relative paths are
/// joined onto `base`.
pub fn expand_path(raw: &str, base: &Path) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }

    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
