pub mod export;
pub mod models;
pub mod projection;
pub mod stats;
pub mod usage;

pub use models::{ModelInfo, ModelRegistry};
pub use usage::*;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
