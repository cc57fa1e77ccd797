//! In-place rewrite of the embedded library path.

use memchr::memmem;
use std::fs::{self, File};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::pattern::{EmbeddedPathPattern, PatternRole};

/// Where and how an image was patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchReport {
    /// Byte offset of the old pattern in the image.
    pub offset: usize,
    pub old_len: usize,
    pub new_len: usize,
}

impl PatchReport {
    /// Signed difference `new_len - old_len`. Only zero is length-safe.
    pub fn length_delta(&self) -> isize {
        self.new_len as isize - self.old_len as isize
    }
}

/// Offset of the first occurrence of `pattern` in `image`.
#[must_use]
pub fn find_pattern(image: &[u8], pattern: &[u8]) -> Option<usize> {
    memmem::find(image, pattern)
}

/// Replace the embedded library path of `exe_path`.
///
/// Looks for `old_dir` + separator + library name + `\0` and overwrites it
/// with the same built from `new_dir`. An empty directory means the library
/// sits beside the executable.
///
/// Only `new_len` bytes starting at the match are rewritten and the file
/// keeps its length. When the two patterns differ in length this leaves the
/// tail of a longer old pattern in place, or overwrites the bytes after a
/// shorter one; callers should keep the lengths equal when that matters.
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist or has no UTF-8 file name
/// - Either pattern exceeds [`crate::MAX_PATTERN_LEN`] bytes
/// - The old pattern is not in the image
/// - The new pattern would run past the end of the image
/// - The file cannot be read or written
///
/// Nothing is written unless every check passes.
pub fn patch_executable(exe_path: &Path, old_dir: &str, new_dir: &str) -> Result<PatchReport> {
    if !exe_path.is_file() {
        return Err(Error::FileNotFound(exe_path.to_path_buf()));
    }

    let exe_name = exe_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::InvalidExecutableName(exe_path.to_path_buf()))?;

    let old_pattern = EmbeddedPathPattern::for_executable(exe_name, old_dir);
    let new_pattern = EmbeddedPathPattern::for_executable(exe_name, new_dir);
    debug!(
        library = old_pattern.library(),
        separator = %old_pattern.separator(),
        "Derived library name"
    );

    let old_bytes = old_pattern.to_bytes(PatternRole::Old)?;
    let new_bytes = new_pattern.to_bytes(PatternRole::New)?;

    let image = fs::read(exe_path).map_err(|source| Error::Read {
        path: exe_path.to_path_buf(),
        source,
    })?;

    let offset = find_pattern(&image, &old_bytes).ok_or_else(|| Error::PatternNotFound {
        pattern: old_pattern.path(),
        path: exe_path.to_path_buf(),
    })?;

    let room = image.len() - offset;
    if new_bytes.len() > room {
        return Err(Error::PatternTooLong {
            role: PatternRole::New,
            len: new_bytes.len(),
            limit: room,
        });
    }

    let report = PatchReport {
        offset,
        old_len: old_bytes.len(),
        new_len: new_bytes.len(),
    };
    if report.length_delta() != 0 {
        warn!(
            delta = report.length_delta(),
            "Old and new library paths differ in length, bytes after the match will not line up"
        );
    }

    write_at(exe_path, offset, &new_bytes)?;

    info!(
        "Patched {} at offset {:#x}: {:?} -> {:?}",
        exe_path.display(),
        offset,
        old_pattern.path(),
        new_pattern.path()
    );
    Ok(report)
}

/// Overwrite `bytes.len()` bytes at `offset` without truncating the file.
fn write_at(path: &Path, offset: usize, bytes: &[u8]) -> Result<()> {
    let to_err = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::options().write(true).open(path).map_err(to_err)?;
    file.seek(SeekFrom::Start(offset as u64)).map_err(to_err)?;
    file.write_all(bytes).map_err(to_err)?;
    file.sync_all().map_err(to_err)?;
    Ok(())
}
