use cmakefmt_core::{Codec, CodecError, ConfigOverrides};
use std::path::PathBuf;
use thiserror::Error;

use crate::cli::Cli;
use crate::services::{Sink, Source};

/// Invalid combinations of arguments that clap cannot express
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("--in-place requires an input file, not standard input")]
    InPlaceFromStdin,

    #[error("No input given; pass a listfile path or '-' for standard input")]
    MissingInput,

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Everything one run needs, resolved from the command line
///
/// Built exactly once per process and never modified afterwards. Codec
/// names are resolved here so an unknown encoding fails before any file
/// or stream is opened.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub source: Source,
    pub sink: Sink,
    pub input_codec: Codec,
    pub output_codec: Codec,
    pub explicit_config: Option<PathBuf>,
    pub overrides: ConfigOverrides,
    /// Compare instead of writing
    pub check: bool,
}

impl InvocationRequest {
    pub fn from_cli(cli: &Cli) -> Result<Self, RequestError> {
        let input_codec = Codec::for_name(&cli.input_encoding)?;
        let output_codec = Codec::for_output(&cli.output_encoding)?;

        let source = cli
            .infile
            .as_deref()
            .map(Source::from_arg)
            .ok_or(RequestError::MissingInput)?;

        // Determine sink: in-place > outfile > stdout
        let sink = if cli.in_place {
            match &source {
                Source::File(path) => Sink::InPlace(path.clone()),
                Source::Stdin => return Err(RequestError::InPlaceFromStdin),
            }
        } else if let Some(path) = &cli.outfile_path {
            Sink::File(path.clone())
        } else {
            Sink::Stdout
        };

        Ok(Self {
            source,
            sink,
            input_codec,
            output_codec,
            explicit_config: cli.config.clone(),
            overrides: cli.overrides(),
            check: cli.check,
        })
    }
}
