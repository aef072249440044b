//! File system collaborators: existence checks, filename validation, and
//! document load/save

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Characters a filename may not contain (Windows reserved set)
const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// File I/O failure kinds. Reported to the operator, never fatal.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("Unable to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unable to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unable to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Reasons a filename is rejected. The Display text doubles as the
/// operator-facing message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("Filename cannot be empty")]
    Empty,

    #[error("Filename cannot contain '{0}'")]
    Reserved(char),

    #[error("Filename cannot contain more than one '.'")]
    TooManyDots,
}

/// Whether a regular file is present at `path`
pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}

/// Validate a filename: non-empty, free of reserved characters, and at
/// most one `.`
pub fn validate_file_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if let Some(c) = name.chars().find(|c| RESERVED_CHARS.contains(c)) {
        return Err(NameError::Reserved(c));
    }
    if name.matches('.').count() > 1 {
        return Err(NameError::TooManyDots);
    }
    Ok(())
}

/// Append `extension` when `name` carries no `.` anywhere.
///
/// The check covers the whole name rather than the final path component;
/// names where that distinction matters contain a separator and are
/// rejected by validation anyway.
pub fn ensure_extension(name: &str, extension: &str) -> String {
    if name.contains('.') {
        name.to_string()
    } else {
        format!("{}{}", name, extension)
    }
}

/// Read a file into one entry per line read
pub fn load_lines(path: &Path) -> Result<Vec<String>, FileError> {
    let file = File::open(path).map_err(|source| FileError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    BufReader::new(file)
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| FileError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Overwrite `path` with the given lines, newline-joined, with no trailing
/// newline after the final line
pub fn save_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> Result<(), FileError> {
    let mut file = File::create(path).map_err(|source| FileError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let joined = lines
        .iter()
        .map(|line| line.as_ref())
        .collect::<Vec<_>>()
        .join("\n");

    file.write_all(joined.as_bytes())
        .map_err(|source| FileError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    // Release failures are reported but never escalated.
    if let Err(e) = file.sync_all() {
        tracing::warn!("Failed to sync {}: {}", path.display(), e);
    }

    Ok(())
}
