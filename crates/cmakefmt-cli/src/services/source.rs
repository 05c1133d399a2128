// crates/cmakefmt-cli/src/services/source.rs - Input side of the pipeline
//
// Presents input as one opaque byte sequence whether it came from standard
// input or a named file. Handles are scoped to the read call, so they are
// released on every path, including errors.

use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::stdin;

/// Filesystem and stream failures on either end of the pipeline
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Input file not found: {0}")]
    SourceNotFound(String),

    #[error("Failed to read {origin}: {source}")]
    SourceRead {
        origin: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {target}: {source}")]
    SinkWrite {
        target: String,
        #[source]
        source: io::Error,
    },
}

/// Where the listfile is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Stdin,
    File(PathBuf),
}

impl Source {
    /// Interpret the INFILE argument; "-" selects standard input
    pub fn from_arg(arg: &Path) -> Self {
        if arg.as_os_str() == "-" {
            Self::Stdin
        } else {
            Self::File(arg.to_path_buf())
        }
    }

    /// The file path, if this source is a file
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Stdin => None,
            Self::File(path) => Some(path),
        }
    }

    /// Read the whole input
    ///
    /// `stdin` is only consumed for [`Source::Stdin`].
    pub fn read_all<R: Read>(&self, stdin: R) -> Result<Vec<u8>, StreamError> {
        let bytes = match self {
            Self::Stdin => {
                stdin::announce_if_terminal();
                stdin::read_until_eof(stdin).map_err(|source| StreamError::SourceRead {
                    origin: self.to_string(),
                    source,
                })?
            }
            Self::File(path) => fs::read(path).map_err(|source| {
                if source.kind() == io::ErrorKind::NotFound {
                    StreamError::SourceNotFound(path.display().to_string())
                } else {
                    StreamError::SourceRead {
                        origin: self.to_string(),
                        source,
                    }
                }
            })?,
        };

        debug!("Read {} bytes from {}", bytes.len(), self);
        Ok(bytes)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("<stdin>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}
