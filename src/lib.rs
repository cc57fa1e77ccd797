//! Embedded library path patching and library directory relocation.
//!
//! A built executable records the relative path of its companion library
//! (`app.dll`, `bin\app.dll`, ...) as a null-terminated string. This crate
//! rewrites that string in place and moves the library directory so the
//! pair still loads afterwards. The image is scanned as a flat byte blob;
//! no executable format is parsed.

mod deploy;
mod error;
mod logging;
mod patch;
mod pattern;
mod relocate;

pub use deploy::{deploy, DEFAULT_LIBRARY_DIR};
pub use error::{Error, Result};
pub use logging::init_tracing;
pub use patch::{find_pattern, patch_executable, PatchReport};
pub use pattern::{
    is_windows_executable, library_file_name, path_separator, EmbeddedPathPattern, PatternRole,
    MAX_PATTERN_LEN,
};
pub use relocate::{relocate_library_dir, Relocation, SCRATCH_DIR_NAME};
