//! Process-wide `tracing` setup shared by the connwatch binaries.

mod tracing;

pub use crate::tracing::{LogFormat, init_tracing, init_tracing_with_level};
