// crates/cmakefmt-cli/src/commands/dump_config.rs - Print the effective configuration
//
// Resolves configuration exactly like a formatting run would (explicit file,
// else discovery from INFILE, else defaults, then command-line overrides)
// and prints it. Input is never read.

use anyhow::{Context as AnyhowContext, Result};
use cmakefmt_core::{ConfigFormat, ConfigManager};
use std::io::Write;
use tracing::info;

use crate::cli::Cli;
use crate::services::Source;

pub fn handle<W: Write>(cli: &Cli, format: ConfigFormat, mut stdout: W) -> Result<()> {
    let source = cli.infile.as_deref().map(Source::from_arg);
    let target = source.as_ref().and_then(Source::path);

    let resolved = ConfigManager::resolve(cli.config.as_deref(), target)?
        .with_overrides(&cli.overrides())?;
    info!("Dumping configuration from {}", resolved.origin);

    let rendered = ConfigManager::render(&resolved.config, format)?;
    stdout
        .write_all(rendered.as_bytes())
        .and_then(|()| stdout.flush())
        .context("Failed to write configuration to stdout")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use cmakefmt_core::FormatConfig;
    use std::fs;
    use tempfile::TempDir;

    fn dump(args: &[&str]) -> Result<String> {
        let mut argv = vec!["cmake-format"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).unwrap();
        let format = cli.dump_config.unwrap_or(ConfigFormat::Toml);
        let mut out = Vec::new();
        handle(&cli, format, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_dump_defaults_round_trips() {
        let text = dump(&["--dump-config"]).unwrap();
        assert!(text.contains("tab_size = 2"));
        let parsed = ConfigManager::parse_str(&text, ConfigFormat::Toml, "dump").unwrap();
        assert_eq!(parsed, FormatConfig::default());
    }

    #[test]
    fn test_dump_reflects_discovery_and_overrides() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("CMakeLists.txt");
        fs::write(&input, "project(x)\n").unwrap();
        fs::write(temp.path().join(".cmake-format.yaml"), "max_empty_lines: 3\n").unwrap();

        let text = dump(&["--dump-config=json", "--line-ending", "windows", input.to_str().unwrap()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["max_empty_lines"], 3);
        assert_eq!(value["line_ending"], "windows");
    }

    #[test]
    fn test_dump_with_broken_explicit_config_fails() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("broken.json");
        fs::write(&config, "{ not json").unwrap();
        assert!(dump(&["--dump-config", "-c", config.to_str().unwrap()]).is_err());
    }
}
