pub mod config;
pub mod feature;
pub mod filter;
pub mod point;
pub mod point_cloud;
pub mod points;

pub use self::config::{threshold_sweep_len, ConfigError, SolidConfig, MAX_THRESHOLDS};
