pub mod manifest;
pub mod samples;
pub mod strategy;

use crate::error::Result;
use std::path::Path;

/// transactional text write: everything lands in a sibling temp
/// file first and renames into place, so a crash never leaves a
/// half written artifact behind.
pub(crate) fn replace(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut temp = path.as_os_str().to_os_string();
    temp.push(".tmp");
    let temp = std::path::PathBuf::from(temp);
    std::fs::write(&temp, contents)?;
    std::fs::rename(&temp, path)?;
    Ok(())
}
