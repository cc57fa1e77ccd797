//! Patch-then-relocate sequence driven by the command line.

use std::path::{Component, Path, PathBuf};
use tracing::info;

use crate::error::{Error, Result};
use crate::patch::{patch_executable, PatchReport};
use crate::relocate::Relocation;

/// Library subdirectory used when none is given.
pub const DEFAULT_LIBRARY_DIR: &str = "bin";

/// Move the companion library of `exe_path` from `old_dir` to `new_dir` and
/// patch the executable to match.
///
/// The executable is patched first, so a failed patch leaves the directory
/// tree untouched. Relative executable paths are resolved against the
/// current directory and `..` components are folded away.
///
/// # Errors
///
/// Returns an error if:
/// - The executable does not exist
/// - The executable's directory has no parent
/// - The old library path is not embedded in the executable, or either
///   path is too long
/// - Any directory or file move fails
pub fn deploy(exe_path: &Path, new_dir: &str, old_dir: &str) -> Result<PatchReport> {
    let exe_path = resolve_executable(exe_path)?;
    let relocation = Relocation::for_executable(&exe_path, old_dir, new_dir)?;
    if old_dir.is_empty() {
        // Fail before patching if the tree cannot be parked
        relocation.scratch_path()?;
    }

    let report = patch_executable(&exe_path, old_dir, new_dir)?;
    relocation.apply()?;

    info!(
        "Library of {} now under {}",
        exe_path.display(),
        relocation.library_dir().display()
    );
    Ok(report)
}

fn resolve_executable(exe_path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(exe_path)
        .map_err(|_| Error::InvalidExecutableRoot(exe_path.to_path_buf()))?;
    let absolute = normalize_lexically(&absolute);
    if !absolute.is_file() {
        return Err(Error::FileNotFound(absolute));
    }
    Ok(absolute)
}

/// Drop `.` and fold each `..` into the component before it, without
/// touching the filesystem. `..` at the root stays at the root.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
