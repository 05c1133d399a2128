// crates/cmakefmt-cli/src/services/mod.rs - Service layer modules
pub mod sink;
pub mod source;

pub use sink::Sink;
pub use source::{Source, StreamError};
