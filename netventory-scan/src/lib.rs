//! Driving the external scanner: one supervised process per host, and the
//! line-oriented parser that turns its output into a [`netventory_types::Device`].

pub mod parser;
pub mod probe;

pub use parser::OutputParser;
pub use probe::{NmapLauncher, ProbeError, ProbeHandle, ProbeLauncher, probe_args};
