pub mod engine;
pub mod target;

pub use engine::{EngineError, ScanEngine, ScanEvent, ScanProgress};
pub use target::{TargetParseError, expand_targets};
pub use tokio_util::sync::CancellationToken;
