//! Directory moves that make the on-disk layout match a patched executable.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Name of the scratch directory created beside the executable root.
pub const SCRATCH_DIR_NAME: &str = "tempBin";

/// One planned relocation of an executable's library directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    executable: PathBuf,
    root: PathBuf,
    old_dir: String,
    new_dir: String,
}

impl Relocation {
    /// Plan moving the library of `exe_path` from `old_dir` to `new_dir`,
    /// both relative to the directory holding the executable.
    ///
    /// An empty `old_dir` means the library currently sits beside the
    /// executable.
    pub fn for_executable(exe_path: &Path, old_dir: &str, new_dir: &str) -> Result<Self> {
        let root = exe_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .ok_or_else(|| Error::InvalidExecutableRoot(exe_path.to_path_buf()))?;
        if exe_path.file_name().is_none() {
            return Err(Error::InvalidExecutableName(exe_path.to_path_buf()));
        }

        Ok(Self {
            executable: exe_path.to_path_buf(),
            root: root.to_path_buf(),
            old_dir: old_dir.to_string(),
            new_dir: new_dir.to_string(),
        })
    }

    /// Directory holding the executable.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the library directory ends up.
    pub fn library_dir(&self) -> PathBuf {
        if self.new_dir.is_empty() {
            self.root.clone()
        } else {
            self.root.join(&self.new_dir)
        }
    }

    /// Sibling of the root used to park the tree while it is restructured.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExecutableRoot`] if the root has no parent.
    pub fn scratch_path(&self) -> Result<PathBuf> {
        self.root
            .parent()
            .map(|parent| parent.join(SCRATCH_DIR_NAME))
            .ok_or_else(|| Error::InvalidExecutableRoot(self.executable.clone()))
    }

    /// Perform the moves.
    ///
    /// With an empty `old_dir` the whole root is parked at
    /// [`scratch_path`](Self::scratch_path), moved back in under `new_dir`,
    /// and the executable is moved out again to its original path. Otherwise
    /// `old_dir` is renamed to `new_dir`.
    ///
    /// The steps are not rolled back. If one fails, the tree stays as the
    /// previous steps left it; in the worst case everything is under the
    /// scratch path and must be moved back by hand.
    pub fn apply(&self) -> Result<()> {
        if self.old_dir.is_empty() {
            self.nest_root()
        } else {
            move_path(&self.root.join(&self.old_dir), &self.library_dir())
        }
    }

    fn nest_root(&self) -> Result<()> {
        let scratch = self.scratch_path()?;
        let library_dir = self.library_dir();
        debug!(
            "Nesting {} under {} via {}",
            self.root.display(),
            library_dir.display(),
            scratch.display()
        );

        move_path(&self.root, &scratch)?;
        // Recreates the root when the library goes into a subdirectory
        move_path(&scratch, &library_dir)?;

        let exe_name = self
            .executable
            .file_name()
            .ok_or_else(|| Error::InvalidExecutableName(self.executable.clone()))?;
        let moved_exe = library_dir.join(exe_name);
        if moved_exe != self.executable {
            move_path(&moved_exe, &self.executable)?;
        }
        Ok(())
    }
}

/// Move the library directory of `exe_path` from `old_dir` to `new_dir`.
///
/// See [`Relocation::apply`] for the sequence of moves.
pub fn relocate_library_dir(exe_path: &Path, old_dir: &str, new_dir: &str) -> Result<()> {
    Relocation::for_executable(exe_path, old_dir, new_dir)?.apply()
}

/// Rename `from` to `to`, creating the parent of `to` if needed.
///
/// Fails if `to` already exists; a plain rename would replace an empty
/// directory.
fn move_path(from: &Path, to: &Path) -> Result<()> {
    let fail = |source: io::Error| Error::FilesystemMoveFailure {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    if to.exists() || to.is_symlink() {
        return Err(fail(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "destination already exists",
        )));
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(fail)?;
    }
    fs::rename(from, to).map_err(fail)?;

    info!("Moved {} to {}", from.display(), to.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_file(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_nest_library_beside_executable() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("app");
        let exe = root.join("app.exe");
        create_file(&exe, "exe");
        create_file(&root.join("app.dll"), "dll");
        create_file(&root.join("app.deps.json"), "{}");

        relocate_library_dir(&exe, "", "bin").unwrap();

        assert_eq!(fs::read_to_string(&exe).unwrap(), "exe");
        assert_eq!(fs::read_to_string(root.join("bin/app.dll")).unwrap(), "dll");
        assert!(root.join("bin/app.deps.json").exists());
        assert!(!root.join("app.dll").exists());
        assert!(!root.join("bin/app.exe").exists());
        assert!(!temp.path().join(SCRATCH_DIR_NAME).exists());
    }

    #[test]
    fn test_nest_into_nested_directory() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("app");
        let exe = root.join("app");
        create_file(&exe, "exe");
        create_file(&root.join("app.dll"), "dll");

        relocate_library_dir(&exe, "", "lib/net").unwrap();

        assert!(exe.is_file());
        assert!(root.join("lib/net/app.dll").is_file());
    }

    #[test]
    fn test_nest_with_empty_new_dir_keeps_layout() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("app");
        let exe = root.join("app.exe");
        create_file(&exe, "exe");
        create_file(&root.join("app.dll"), "dll");

        relocate_library_dir(&exe, "", "").unwrap();

        assert!(exe.is_file());
        assert!(root.join("app.dll").is_file());
        assert!(!temp.path().join(SCRATCH_DIR_NAME).exists());
    }

    #[test]
    fn test_rename_library_dir() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("app");
        let exe = root.join("app.exe");
        create_file(&exe, "exe");
        create_file(&root.join("dll/app.dll"), "dll");

        relocate_library_dir(&exe, "dll", "bin").unwrap();

        assert!(exe.is_file());
        assert_eq!(fs::read_to_string(root.join("bin/app.dll")).unwrap(), "dll");
        assert!(!root.join("dll").exists());
    }

    #[test]
    fn test_rename_missing_old_dir() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("app");
        let exe = root.join("app.exe");
        create_file(&exe, "exe");

        let result = relocate_library_dir(&exe, "dll", "bin");
        assert!(matches!(result, Err(Error::FilesystemMoveFailure { .. })));
    }

    #[test]
    fn test_rename_onto_existing_dir_fails() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("app");
        let exe = root.join("app.exe");
        create_file(&exe, "exe");
        create_file(&root.join("dll/app.dll"), "dll");
        fs::create_dir_all(root.join("bin")).unwrap();

        match relocate_library_dir(&exe, "dll", "bin") {
            Err(Error::FilesystemMoveFailure { source, .. }) => {
                assert_eq!(source.kind(), io::ErrorKind::AlreadyExists);
            }
            other => panic!("Expected FilesystemMoveFailure, got {:?}", other),
        }
        assert!(root.join("dll/app.dll").is_file());
    }

    #[test]
    fn test_existing_scratch_dir_blocks_nesting() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("app");
        let exe = root.join("app.exe");
        create_file(&exe, "exe");
        create_file(&root.join("app.dll"), "dll");
        fs::create_dir_all(temp.path().join(SCRATCH_DIR_NAME)).unwrap();

        let result = relocate_library_dir(&exe, "", "bin");
        assert!(matches!(result, Err(Error::FilesystemMoveFailure { .. })));
        // Nothing moved
        assert!(exe.is_file());
        assert!(root.join("app.dll").is_file());
    }

    #[test]
    fn test_root_without_parent() {
        let relocation = Relocation::for_executable(Path::new("/app.exe"), "", "bin").unwrap();
        assert_eq!(relocation.root(), Path::new("/"));
        assert!(matches!(
            relocation.scratch_path(),
            Err(Error::InvalidExecutableRoot(_))
        ));
    }

    #[test]
    fn test_bare_file_name_has_no_root() {
        let result = Relocation::for_executable(Path::new("app.exe"), "", "bin");
        assert!(matches!(result, Err(Error::InvalidExecutableRoot(_))));
    }
}
