pub mod replay;
pub mod settings;

pub use replay::{load_requests, parse_requests, replay, ReplayInput, ReplayReport, SkippedLine};
pub use settings::{load_config, ConfigOverrides};
