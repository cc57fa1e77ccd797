//! Embedded library path patterns.
//!
//! A built executable records where its companion library lives as a
//! null-terminated UTF-8 string such as `bin\app.dll\0`. The separator is
//! the one the original build embedded, not the host's: executables named
//! `*.exe` use a back-slash, everything else a forward slash.

use std::fmt;

use crate::error::{Error, Result};

/// Longest serialized pattern accepted, terminator included.
pub const MAX_PATTERN_LEN: usize = 1024;

const EXECUTABLE_SUFFIX: &str = ".exe";
const LIBRARY_SUFFIX: &str = ".dll";

/// Which side of the rewrite a pattern belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternRole {
    Old,
    New,
}

impl fmt::Display for PatternRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternRole::Old => write!(f, "old"),
            PatternRole::New => write!(f, "new"),
        }
    }
}

/// Whether the file name carries the executable suffix (case-insensitive).
pub fn is_windows_executable(exe_name: &str) -> bool {
    exe_name
        .len()
        .checked_sub(EXECUTABLE_SUFFIX.len())
        .and_then(|start| exe_name.get(start..))
        .is_some_and(|suffix| suffix.eq_ignore_ascii_case(EXECUTABLE_SUFFIX))
}

/// Name of the companion library for an executable.
///
/// `app.exe` becomes `app.dll`; a name without the executable suffix gets
/// the library suffix appended, so `app` also becomes `app.dll`.
#[must_use]
pub fn library_file_name(exe_name: &str) -> String {
    if is_windows_executable(exe_name) {
        let stem = &exe_name[..exe_name.len() - EXECUTABLE_SUFFIX.len()];
        format!("{}{}", stem, LIBRARY_SUFFIX)
    } else {
        format!("{}{}", exe_name, LIBRARY_SUFFIX)
    }
}

/// Separator used between directory and library name in the embedded path.
pub fn path_separator(exe_name: &str) -> char {
    if is_windows_executable(exe_name) {
        '\\'
    } else {
        '/'
    }
}

/// An embedded library path: optional directory prefix plus library name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedPathPattern {
    directory: String,
    library: String,
    separator: char,
}

impl EmbeddedPathPattern {
    /// Pattern for the companion library of `exe_name` inside `directory`.
    ///
    /// An empty `directory` means the library sits beside the executable.
    pub fn for_executable(exe_name: &str, directory: &str) -> Self {
        Self {
            directory: directory.to_string(),
            library: library_file_name(exe_name),
            separator: path_separator(exe_name),
        }
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn library(&self) -> &str {
        &self.library
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// The embedded path as text, without the terminator.
    pub fn path(&self) -> String {
        if self.directory.is_empty() {
            self.library.clone()
        } else {
            format!("{}{}{}", self.directory, self.separator, self.library)
        }
    }

    /// Serialize to `UTF8(path) + 0x00`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PatternTooLong`] if the result exceeds
    /// [`MAX_PATTERN_LEN`] bytes.
    pub fn to_bytes(&self, role: PatternRole) -> Result<Vec<u8>> {
        let mut bytes = self.path().into_bytes();
        bytes.push(0);
        if bytes.len() > MAX_PATTERN_LEN {
            return Err(Error::PatternTooLong {
                role,
                len: bytes.len(),
                limit: MAX_PATTERN_LEN,
            });
        }
        Ok(bytes)
    }
}
