//! Data models for the device benchmark

pub mod config;
pub mod device;
pub mod samples;
pub mod tree;

// Re-export main model types
pub use config::{BenchKind, Config};
pub use device::{Device, DeviceRegistry};
pub use samples::{MessageRow, ThroughputRow, TokenRow};
pub use tree::{ResultNode, ResultTree};
