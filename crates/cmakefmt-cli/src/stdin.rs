// crates/cmakefmt-cli/src/stdin.rs - Standard input handling
//
// Follows Unix conventions: "-" as INFILE means read the listfile from stdin.
// The upstream writer and this process run concurrently, connected by a pipe
// with a finite buffer, so input may arrive in many short reads.

use std::io::{self, IsTerminal, Read};
use tracing::{debug, info};

/// Read a reader until end-of-stream
///
/// Blocks until the producer closes its end. `read_to_end` already retries
/// short and interrupted reads; only real I/O errors are returned.
pub fn read_until_eof<R: Read>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;
    debug!("Read {} bytes from stdin", buffer.len());
    Ok(buffer)
}

/// Hint for interactive use, where nothing is piped in
pub fn announce_if_terminal() {
    if io::stdin().is_terminal() {
        info!("Reading listfile from the terminal; finish with Ctrl-D");
    }
}
