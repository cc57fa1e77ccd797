//! Error types for patching and relocation.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::pattern::PatternRole;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{} not found", .0.display())]
    FileNotFound(PathBuf),

    #[error("Executable {} has no usable root directory", .0.display())]
    InvalidExecutableRoot(PathBuf),

    #[error("Executable {} has no UTF-8 file name", .0.display())]
    InvalidExecutableName(PathBuf),

    #[error("The {role} library path is too long ({len} bytes, at most {limit} allowed)")]
    PatternTooLong {
        role: PatternRole,
        len: usize,
        limit: usize,
    },

    #[error("Could not find old library path '{pattern}' in {}", .path.display())]
    PatternNotFound { pattern: String, path: PathBuf },

    #[error("Failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to move {} to {}", .from.display(), .to.display())]
    FilesystemMoveFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
