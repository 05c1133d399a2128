// crates/cmakefmt-cli/src/services/sink.rs - Output side of the pipeline
//
// Every sink receives the complete encoded output in a single call, after
// all fallible processing is done. Nothing is written on a failed run.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};
use tracing::debug;

use super::source::StreamError;

/// Where the formatted listfile goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    Stdout,
    File(PathBuf),
    /// Overwrite the source file itself
    InPlace(PathBuf),
}

impl Sink {
    /// Write the complete output
    ///
    /// `stdout` is only used for [`Sink::Stdout`].
    pub fn write_all<W: Write>(&self, bytes: &[u8], mut stdout: W) -> Result<(), StreamError> {
        let result = match self {
            Self::Stdout => stdout.write_all(bytes).and_then(|()| stdout.flush()),
            Self::File(path) => write_file(path, bytes),
            Self::InPlace(path) => replace_file(path, bytes),
        };

        result.map_err(|source| StreamError::SinkWrite {
            target: self.to_string(),
            source,
        })?;

        debug!("Wrote {} bytes to {}", bytes.len(), self);
        Ok(())
    }
}

/// Create or replace the output file at `path` with `bytes`
///
/// Goes through the same temp-then-rename path as in-place rewriting, so a
/// failed write never leaves a truncated outfile behind. A new file gets
/// the usual default mode (subject to the umask); an existing one keeps
/// its permissions.
fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let target = match fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == io::ErrorKind::NotFound => path.to_path_buf(),
        Err(e) => return Err(e),
    };
    let permissions = match fs::metadata(&target) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };
    persist_atomically(&target, bytes, permissions)
}

/// Replace the existing file at `path` with `bytes`
///
/// Symlinks are followed: the file the link points at is rewritten and the
/// link itself stays in place.
fn replace_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let target = fs::canonicalize(path)?;
    let permissions = fs::metadata(&target)?.permissions();
    persist_atomically(&target, bytes, Some(permissions))
}

/// Write `bytes` over `target` via a sibling temporary file
///
/// ALGORITHM:
/// 1. Write to a temporary file in the target's directory (same filesystem)
/// 2. Apply `permissions`, or a default mode for a brand new file
/// 3. Flush to disk and rename it over the target
///
/// A crash or error at any step leaves the target untouched; the
/// temporary file is removed when dropped.
fn persist_atomically(
    target: &Path,
    bytes: &[u8],
    permissions: Option<fs::Permissions>,
) -> io::Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = new_temp_file(dir, permissions.is_none())?;
    temp.write_all(bytes)?;

    if let Some(permissions) = permissions {
        temp.as_file().set_permissions(permissions)?;
    }
    temp.as_file().sync_all()?;

    temp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(unix)]
fn new_temp_file(dir: &Path, fresh: bool) -> io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;

    let mut builder = Builder::new();
    if fresh {
        // Same mode File::create would use, before the umask
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

#[cfg(not(unix))]
fn new_temp_file(dir: &Path, _fresh: bool) -> io::Result<NamedTempFile> {
    Builder::new().tempfile_in(dir)
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("<stdout>"),
            Self::File(path) | Self::InPlace(path) => write!(f, "{}", path.display()),
        }
    }
}
