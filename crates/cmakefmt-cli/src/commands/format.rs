// crates/cmakefmt-cli/src/commands/format.rs - Invocation Orchestrator
//
// Composes one run of the tool:
//
//   config ──┐
//            ▼
//   source → decode → format → encode → sink
//
// Each stage either hands a complete value to the next or aborts the run.
// The sink is only touched after every fallible stage has succeeded, so a
// failed run never leaves partial output behind.

use cmakefmt_core::{
    CodecError, ConfigError, ConfigManager, FormatError, Formatter, ResolvedConfig,
};
use std::io::{Read, Write};
use thiserror::Error;
use tracing::{debug, info};

use crate::context::InvocationRequest;
use crate::services::{Sink, StreamError};

/// A failed stage of the pipeline
#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("Failed to load configuration")]
    Config(#[from] ConfigError),

    #[error("Failed to decode {origin}")]
    Decode {
        origin: String,
        #[source]
        source: CodecError,
    },

    #[error("Failed to format {origin}")]
    Transform {
        origin: String,
        #[source]
        source: FormatError,
    },

    #[error("Failed to encode output for {origin}")]
    Encode {
        origin: String,
        #[source]
        source: CodecError,
    },

    #[error(transparent)]
    Stream(#[from] StreamError),
}

/// How a successful run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Output was written to the sink
    Written { bytes: usize },
    /// In-place run where the file was already formatted; nothing rewritten
    Unchanged,
    /// Check mode, input already formatted
    CheckPassed,
    /// Check mode, formatting would change the input
    CheckFailed,
}

/// Decoded input text plus where it came from, for diagnostics
#[derive(Debug)]
pub struct DecodedDocument {
    pub text: String,
    pub origin: String,
}

/// Run the whole pipeline for one request
///
/// `stdin` and `stdout` are the process streams in production and
/// in-memory buffers in tests; they are only used when the request's
/// source or sink selects them.
pub fn run<F, R, W>(
    request: &InvocationRequest,
    formatter: &F,
    stdin: R,
    stdout: W,
) -> Result<Outcome, InvocationError>
where
    F: Formatter + ?Sized,
    R: Read,
    W: Write,
{
    // Step 1: configuration (standard input never triggers discovery)
    let resolved = ConfigManager::resolve(
        request.explicit_config.as_deref(),
        request.source.path(),
    )?
    .with_overrides(&request.overrides)?;
    info!("Configuration: {}", resolved.origin);

    // Step 2: read the whole input; the handle is released on return
    let input = request.source.read_all(stdin)?;

    // Step 3: decode
    let document = decode(request, &input)?;

    // Step 4: transform
    let formatted = transform(formatter, &document, &resolved)?;

    // Step 5: encode
    let output = request
        .output_codec
        .encode(&formatted)
        .map_err(|source| InvocationError::Encode {
            origin: document.origin.clone(),
            source,
        })?;

    // Step 6: write (or compare)
    if request.check {
        let outcome = if output == input {
            Outcome::CheckPassed
        } else {
            Outcome::CheckFailed
        };
        debug!("Check of {}: {:?}", document.origin, outcome);
        return Ok(outcome);
    }

    if matches!(request.sink, Sink::InPlace(_)) && output == input {
        info!("{} is already formatted", document.origin);
        return Ok(Outcome::Unchanged);
    }

    request.sink.write_all(&output, stdout)?;
    Ok(Outcome::Written {
        bytes: output.len(),
    })
}

fn decode(request: &InvocationRequest, input: &[u8]) -> Result<DecodedDocument, InvocationError> {
    let origin = request.source.to_string();
    debug!("Decoding {} as {}", origin, request.input_codec);

    match request.input_codec.decode(input) {
        Ok(text) => Ok(DecodedDocument { text, origin }),
        Err(source) => Err(InvocationError::Decode { origin, source }),
    }
}

fn transform<F: Formatter + ?Sized>(
    formatter: &F,
    document: &DecodedDocument,
    resolved: &ResolvedConfig,
) -> Result<String, InvocationError> {
    formatter
        .format(&document.text, &resolved.config)
        .map_err(|source| InvocationError::Transform {
            origin: document.origin.clone(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use cmakefmt_core::{FormatConfig, ListFileFormatter};
    use std::fs;
    use std::io;
    use tempfile::TempDir;

    const MESSY: &str = "PROJECT(demo)\n\n\nIF(A)\nset(X 1)   \nENDIF()\n";
    const TIDY: &str = "project(demo)\n\nif(A)\n  set(X 1)\nendif()\n";

    fn request(args: &[&str]) -> InvocationRequest {
        let mut argv = vec!["cmake-format"];
        argv.extend_from_slice(args);
        InvocationRequest::from_cli(&Cli::try_parse_from(argv).unwrap()).unwrap()
    }

    fn arg(path: &std::path::Path) -> &str {
        path.to_str().unwrap()
    }

    #[test]
    fn test_stdin_to_stdout() {
        let mut stdout = Vec::new();
        let outcome = run(&request(&["-"]), &ListFileFormatter, MESSY.as_bytes(), &mut stdout).unwrap();
        assert_eq!(outcome, Outcome::Written { bytes: TIDY.len() });
        assert_eq!(String::from_utf8(stdout).unwrap(), TIDY);
    }

    #[test]
    fn test_all_shapes_agree() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("CMakeLists.txt");
        let output = temp.path().join("out.cmake");
        fs::write(&input, MESSY).unwrap();

        let mut piped = Vec::new();
        run(&request(&["-"]), &ListFileFormatter, MESSY.as_bytes(), &mut piped).unwrap();

        let mut printed = Vec::new();
        run(&request(&[arg(&input)]), &ListFileFormatter, io::empty(), &mut printed).unwrap();

        run(&request(&["-o", arg(&output), arg(&input)]), &ListFileFormatter, io::empty(), io::sink()).unwrap();

        run(&request(&["-i", arg(&input)]), &ListFileFormatter, io::empty(), io::sink()).unwrap();

        assert_eq!(piped, TIDY.as_bytes());
        assert_eq!(printed, TIDY.as_bytes());
        assert_eq!(fs::read(&output).unwrap(), TIDY.as_bytes());
        assert_eq!(fs::read(&input).unwrap(), TIDY.as_bytes());
    }

    #[test]
    fn test_discovered_config_applies() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("CMakeLists.txt");
        fs::write(&input, "if(A)\nset(X)\nendif()\n").unwrap();
        fs::write(temp.path().join(".cmake-format.toml"), "tab_size = 4\n").unwrap();

        let mut stdout = Vec::new();
        run(&request(&[arg(&input)]), &ListFileFormatter, io::empty(), &mut stdout).unwrap();
        assert_eq!(String::from_utf8(stdout).unwrap(), "if(A)\n    set(X)\nendif()\n");

        // Command-line overrides beat the discovered file
        let mut stdout = Vec::new();
        run(&request(&["--tab-size", "3", arg(&input)]), &ListFileFormatter, io::empty(), &mut stdout).unwrap();
        assert_eq!(String::from_utf8(stdout).unwrap(), "if(A)\n   set(X)\nendif()\n");
    }

    #[test]
    fn test_decode_failure_leaves_sink_untouched() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("latin1.cmake");
        let output = temp.path().join("out.cmake");
        fs::write(&input, b"set(NAME caf\xe9)\n").unwrap();

        let err = run(&request(&["-o", arg(&output), arg(&input)]), &ListFileFormatter, io::empty(), io::sink())
            .unwrap_err();
        assert!(matches!(
            err,
            InvocationError::Decode {
                source: CodecError::Decode { offset: 12, .. },
                ..
            }
        ));
        assert!(!output.exists());

        let req = request(&[
            "--input-encoding=latin1",
            "--output-encoding=latin1",
            "-o",
            arg(&output),
            arg(&input),
        ]);
        run(&req, &ListFileFormatter, io::empty(), io::sink()).unwrap();
        assert_eq!(fs::read(&output).unwrap(), b"set(NAME caf\xe9)\n");
    }

    #[test]
    fn test_decode_failure_keeps_existing_outfile_and_source() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("latin1.cmake");
        let output = temp.path().join("out.cmake");
        fs::write(&input, b"set(NAME caf\xe9)\n").unwrap();
        fs::write(&output, "project(previous)\n").unwrap();

        let err = run(&request(&["-o", arg(&output), arg(&input)]), &ListFileFormatter, io::empty(), io::sink())
            .unwrap_err();
        assert!(matches!(err, InvocationError::Decode { .. }));
        assert_eq!(fs::read(&output).unwrap(), b"project(previous)\n");

        let err = run(&request(&["-i", arg(&input)]), &ListFileFormatter, io::empty(), io::sink()).unwrap_err();
        assert!(matches!(err, InvocationError::Decode { .. }));
        assert_eq!(fs::read(&input).unwrap(), b"set(NAME caf\xe9)\n");
    }

    #[test]
    fn test_transform_failure_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("broken.cmake");
        fs::write(&input, "if(A)\nset(X 1\n").unwrap();

        let mut stdout = Vec::new();
        let err = run(&request(&[arg(&input)]), &ListFileFormatter, io::empty(), &mut stdout).unwrap_err();
        assert!(matches!(err, InvocationError::Transform { .. }));
        assert!(stdout.is_empty());

        let err = run(&request(&["-i", arg(&input)]), &ListFileFormatter, io::empty(), io::sink()).unwrap_err();
        assert!(matches!(err, InvocationError::Transform { .. }));
        assert_eq!(fs::read_to_string(&input).unwrap(), "if(A)\nset(X 1\n");
    }

    #[test]
    fn test_encode_failure_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out.cmake");

        let req = request(&["--output-encoding=latin1", "-o", arg(&output), "-"]);
        let err = run(&req, &ListFileFormatter, "message(\"→\")\n".as_bytes(), io::sink()).unwrap_err();
        assert!(matches!(err, InvocationError::Encode { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn test_malformed_explicit_config_is_fatal() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("bad.toml");
        fs::write(&config, "tab_size = [").unwrap();

        let mut stdout = Vec::new();
        let err = run(&request(&["-c", arg(&config), "-"]), &ListFileFormatter, "a()\n".as_bytes(), &mut stdout)
            .unwrap_err();
        assert!(matches!(err, InvocationError::Config(ConfigError::ParseError { .. })));
        assert!(stdout.is_empty());
    }

    #[test]
    fn test_missing_source() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.cmake");
        let err = run(&request(&[arg(&missing)]), &ListFileFormatter, io::empty(), io::sink()).unwrap_err();
        assert!(matches!(err, InvocationError::Stream(StreamError::SourceNotFound(_))));
    }

    #[test]
    fn test_check_mode_and_unchanged_in_place() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("CMakeLists.txt");
        fs::write(&input, MESSY).unwrap();

        let mut stdout = Vec::new();
        let outcome = run(&request(&["--check", arg(&input)]), &ListFileFormatter, io::empty(), &mut stdout).unwrap();
        assert_eq!(outcome, Outcome::CheckFailed);
        assert!(stdout.is_empty());
        assert_eq!(fs::read_to_string(&input).unwrap(), MESSY);

        fs::write(&input, TIDY).unwrap();
        let outcome = run(&request(&["--check", arg(&input)]), &ListFileFormatter, io::empty(), io::sink()).unwrap();
        assert_eq!(outcome, Outcome::CheckPassed);

        let outcome = run(&request(&["-i", arg(&input)]), &ListFileFormatter, io::empty(), io::sink()).unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
    }

    /// Formatter stub that upper-cases everything
    struct Shouting;

    impl Formatter for Shouting {
        fn format(&self, text: &str, _config: &FormatConfig) -> Result<String, FormatError> {
            Ok(text.to_uppercase())
        }
    }

    #[test]
    fn test_any_formatter_can_be_plugged_in() {
        let mut stdout = Vec::new();
        let formatter: &dyn Formatter = &Shouting;
        run(&request(&["-"]), formatter, "set(x)\n".as_bytes(), &mut stdout).unwrap();
        assert_eq!(stdout, b"SET(X)\n");
    }
}
