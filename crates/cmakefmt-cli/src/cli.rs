use clap::{Parser, ValueEnum};
use cmakefmt_core::{CommandCase, ConfigFormat, ConfigOverrides, DEFAULT_ENCODING, LineEnding};
use std::path::PathBuf;

/// Main CLI structure
#[derive(Parser, Debug)]
#[command(name = "cmake-format")]
#[command(about = "Reformat CMake listfiles")]
#[command(version)]
#[command(after_help = "\
Examples:
  cmake-format CMakeLists.txt                 # Print formatted file to stdout
  cmake-format -i CMakeLists.txt              # Rewrite the file in place
  cmake-format -o out.cmake in.cmake          # Write to another file
  cat CMakeLists.txt | cmake-format -         # Stream stdin to stdout
  cmake-format --dump-config=yaml             # Show the effective configuration")]
pub struct Cli {
    /// Listfile to format, or "-" to read standard input
    #[arg(value_name = "INFILE", required_unless_present = "dump_config")]
    pub infile: Option<PathBuf>,

    /// Write formatted output to this file instead of stdout
    #[arg(short = 'o', long = "outfile-path", value_name = "PATH", conflicts_with = "in_place")]
    pub outfile_path: Option<PathBuf>,

    /// Rewrite INFILE with the formatted result
    #[arg(short = 'i', long)]
    pub in_place: bool,

    /// Write nothing; exit non-zero if INFILE is not already formatted
    #[arg(long, conflicts_with_all = ["in_place", "outfile_path"])]
    pub check: bool,

    /// Configuration file to use (disables auto-discovery)
    #[arg(short = 'c', long, value_name = "PATH", env = "CMAKE_FORMAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Encoding used to decode the input
    #[arg(long, value_name = "NAME", default_value = DEFAULT_ENCODING)]
    pub input_encoding: String,

    /// Encoding used to encode the output
    #[arg(long, value_name = "NAME", default_value = DEFAULT_ENCODING)]
    pub output_encoding: String,

    /// Print the effective configuration (toml, yaml or json) and exit
    #[arg(
        long,
        value_name = "FORMAT",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "toml"
    )]
    pub dump_config: Option<ConfigFormat>,

    /// Override: spaces per indentation level
    #[arg(long, value_name = "N")]
    pub tab_size: Option<usize>,

    /// Override: indent with tab characters
    #[arg(long)]
    pub use_tabchars: bool,

    /// Override: maximum consecutive blank lines
    #[arg(long, value_name = "N")]
    pub max_empty_lines: Option<usize>,

    /// Override: command name case (lower, upper, unchanged)
    #[arg(long, value_name = "CASE")]
    pub command_case: Option<CommandCase>,

    /// Override: output line ending (unix, windows, auto)
    #[arg(long, value_name = "STYLE")]
    pub line_ending: Option<LineEnding>,

    /// Diagnostics written to stderr at or above this level
    #[arg(short = 'l', long, value_enum, default_value_t = LogLevel::Warning)]
    pub log_level: LogLevel,
}

/// Verbosity of stderr diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warning => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
        }
    }
}

impl Cli {
    /// Configuration options given directly on the command line
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            tab_size: self.tab_size,
            use_tabchars: self.use_tabchars.then_some(true),
            max_empty_lines: self.max_empty_lines,
            command_case: self.command_case,
            line_ending: self.line_ending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_outfile_and_in_place_conflict() {
        let result = Cli::try_parse_from(["cmake-format", "-i", "-o", "out.cmake", "in.cmake"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_check_conflicts_with_sinks() {
        assert!(Cli::try_parse_from(["cmake-format", "--check", "-i", "in.cmake"]).is_err());
        assert!(Cli::try_parse_from(["cmake-format", "--check", "in.cmake"]).is_ok());
    }

    #[test]
    fn test_infile_required_unless_dumping() {
        assert!(Cli::try_parse_from(["cmake-format"]).is_err());
        let cli = Cli::try_parse_from(["cmake-format", "--dump-config"]).unwrap();
        assert_eq!(cli.dump_config, Some(ConfigFormat::Toml));
        let cli = Cli::try_parse_from(["cmake-format", "--dump-config=json"]).unwrap();
        assert_eq!(cli.dump_config, Some(ConfigFormat::Json));
    }

    #[test]
    fn test_encoding_flags_and_overrides() {
        let cli = Cli::try_parse_from([
            "cmake-format",
            "--input-encoding=latin1",
            "--output-encoding",
            "latin1",
            "--tab-size",
            "4",
            "--command-case",
            "upper",
            "--use-tabchars",
            "in.cmake",
        ])
        .unwrap();
        assert_eq!(cli.input_encoding, "latin1");
        assert_eq!(cli.output_encoding, "latin1");

        let overrides = cli.overrides();
        assert_eq!(overrides.tab_size, Some(4));
        assert_eq!(overrides.command_case, Some(CommandCase::Upper));
        assert_eq!(overrides.use_tabchars, Some(true));
        assert_eq!(overrides.line_ending, None);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["cmake-format", "-"]).unwrap();
        assert_eq!(cli.input_encoding, DEFAULT_ENCODING);
        assert_eq!(cli.log_level, LogLevel::Warning);
        assert!(cli.overrides().is_empty());
    }
}
