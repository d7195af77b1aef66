//! Configuration loading and management for the extraction engine.
//!
//! This module loads detection thresholds, the default block layout, the
//! dynamic-zone window, billing multipliers and label extensions from YAML.
//!
//! # Example
//!
//! ```no_run
//! use payroll_extract::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap().into_config();
//! println!("Block width: {}", config.layout.employee_block_width);
//! ```

mod loader;
mod types;

pub use loader::{ConfigLoader, ENGINE_CONFIG_FILE};
pub use types::{
    BillingConfig, DetectionConfig, DynamicZoneConfig, EngineConfig, LayoutConfig,
    TRANSPORT_TOLERANCE,
};
