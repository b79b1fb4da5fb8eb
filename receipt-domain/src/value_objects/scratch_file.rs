// Scratch file value object
// A downloaded object on local disk, removed when the guard is dropped

use std::path::{Component, Path, PathBuf};

use anyhow::{anyhow, Result};
use tracing::{debug, warn};

/// Local path for an object key under the scratch directory.
///
/// The key is used as a relative path, so `receipts/a.jpg` lands in
/// `<scratch_dir>/receipts/a.jpg`. Keys that would leave the scratch
/// directory are rejected.
pub fn scratch_path(scratch_dir: &Path, object_key: &str) -> Result<PathBuf> {
    let key = object_key.trim();
    if key.is_empty() {
        return Err(anyhow!("object key is empty"));
    }
    let relative = Path::new(key);
    for component in relative.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => return Err(anyhow!("object key '{}' escapes the scratch directory", key)),
        }
    }
    Ok(scratch_dir.join(relative))
}

/// Owns a downloaded object until dropped.
///
/// Drop unlinks synchronously; `Drop` cannot await, and the file is local.
/// Two guards for the same key point at the same path, so whichever drops
/// first removes the file for both.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("removed scratch file {}", self.path.display()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!("failed to remove scratch file {}: {}", self.path.display(), err),
        }
    }
}
