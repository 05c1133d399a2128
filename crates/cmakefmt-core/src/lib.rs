//! # cmakefmt-core
//!
//! Pure building blocks behind the `cmake-format` command line tool:
//!
//! - [`codec`]: resolve encoding names and decode/encode strictly
//! - [`config`]: the formatter's configuration schema, file loading,
//!   auto-discovery and precedence
//! - [`format`]: the [`Formatter`](format::Formatter) seam and the built-in
//!   listfile formatter
//!
//! Nothing in this crate touches standard input or output; stream handling
//! lives in the CLI crate.

pub mod codec;
pub mod config;
pub mod format;

pub use codec::{Codec, CodecError, DEFAULT_ENCODING};
pub use config::{
    CommandCase, ConfigError, ConfigFormat, ConfigManager, ConfigOrigin, ConfigOverrides,
    FormatConfig, LineEnding, ResolvedConfig,
};
pub use format::{FormatError, Formatter, ListFileFormatter};
