// crates/cmakefmt-cli/src/commands/mod.rs - Command Handler Modules
//
// - format: the formatting pipeline (the default action)
// - dump_config: print the effective configuration and exit

pub mod dump_config;
pub mod format;
