//! Harborwatch Monitor
//!
//! Headless host for `harborwatch-core`: reads an AIS JSON feed line by line,
//! keeps a monitoring session and periodically reports collision risks, zone
//! events, clusters, tracks and notifications as JSON lines.

pub mod config;
pub mod feed;
pub mod monitor;

pub use config::{ConfigError, MonitorConfig};
pub use feed::{parse_message, FeedError, FeedUpdate, TimeSource};
pub use monitor::{Monitor, MonitorStats};
