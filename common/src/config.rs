//! Run configuration, loadable from YAML.
//!
//! Every field falls back to the values used by the reference SOLiD setup for
//! a 64-beam sensor, so an empty file is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on the number of thresholds a sweep may produce.
pub const MAX_THRESHOLDS: usize = 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    InvalidBinCount { name: &'static str, value: usize },
    #[error("upper field of view {upper} must be above the lower bound {lower}")]
    InvalidFov { upper: f64, lower: f64 },
    #[error("invalid range: {0}")]
    InvalidRange(String),
    #[error("threshold sweep [{start}, {stop}) with step {step} is empty")]
    EmptyThresholdSweep { start: f64, stop: f64, step: f64 },
    #[error("threshold sweep [{start}, {stop}) with step {step} exceeds {max} values")]
    TooManyThresholds {
        start: f64,
        stop: f64,
        step: f64,
        max: usize,
    },
    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },
    #[error("threshold step must be positive, got {0}")]
    InvalidStep(f64),
    #[error("voxel size must be positive, got {0}")]
    InvalidVoxelSize(f64),
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolidConfig {
    /// Points closer than this (meters) are dropped before description.
    pub min_distance: f64,
    /// Points farther than this are dropped; also the extent of the range bins.
    pub max_distance: f64,
    /// Upper bound of the vertical field of view, in degrees.
    pub fov_u: f64,
    /// Lower bound of the vertical field of view, in degrees.
    pub fov_d: f64,
    pub num_angle: usize,
    pub num_elevation: usize,
    pub num_range: usize,
    pub voxel_size: f64,
    /// First (strictest) cosine distance threshold of the sweep.
    pub loop_threshold: f64,
    /// Exclusive end of the threshold sweep.
    pub threshold_stop: f64,
    pub threshold_step: f64,
    /// Number of most recent scans never considered as closure candidates.
    pub exclusion_window: usize,
}

impl Default for SolidConfig {
    fn default() -> Self {
        SolidConfig {
            min_distance: 3.0,
            max_distance: 80.0,
            fov_u: 24.8,
            fov_d: -2.0,
            num_angle: 60,
            num_elevation: 64,
            num_range: 40,
            voxel_size: 0.5,
            loop_threshold: 0.004,
            threshold_stop: 0.04,
            threshold_step: 0.004,
            exclusion_window: 100,
        }
    }
}

/// Checks the sweep `start, start + step, ...` below `stop` and returns an
/// upper bound on its length, which never exceeds [`MAX_THRESHOLDS`].
pub fn threshold_sweep_len(start: f64, stop: f64, step: f64) -> Result<usize, ConfigError> {
    for (name, value) in [
        ("loop_threshold", start),
        ("threshold_stop", stop),
        ("threshold_step", step),
    ] {
        if !value.is_finite() {
            return Err(ConfigError::NonFinite { name, value });
        }
    }
    if !(step > 0.0) {
        return Err(ConfigError::InvalidStep(step));
    }
    if !(start < stop) {
        return Err(ConfigError::EmptyThresholdSweep { start, stop, step });
    }
    // Overflows to infinity for a step that is tiny relative to the span.
    let len = ((stop - start) / step).ceil();
    if !(len <= MAX_THRESHOLDS as f64) {
        return Err(ConfigError::TooManyThresholds {
            start,
            stop,
            step,
            max: MAX_THRESHOLDS,
        });
    }
    Ok(len as usize)
}

impl SolidConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parses and validates a configuration.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: SolidConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("num_angle", self.num_angle),
            ("num_elevation", self.num_elevation),
            ("num_range", self.num_range),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidBinCount { name, value });
            }
        }
        // NaN bounds fail these comparisons too.
        if !(self.fov_u > self.fov_d) {
            return Err(ConfigError::InvalidFov {
                upper: self.fov_u,
                lower: self.fov_d,
            });
        }
        if !(self.max_distance > 0.0) || !(self.min_distance >= 0.0) {
            return Err(ConfigError::InvalidRange(format!(
                "distances must satisfy 0 <= min ({}) and 0 < max ({})",
                self.min_distance, self.max_distance
            )));
        }
        if !(self.min_distance < self.max_distance) {
            return Err(ConfigError::InvalidRange(format!(
                "min distance {} is not below max distance {}",
                self.min_distance, self.max_distance
            )));
        }
        if !(self.voxel_size > 0.0) {
            return Err(ConfigError::InvalidVoxelSize(self.voxel_size));
        }
        threshold_sweep_len(self.loop_threshold, self.threshold_stop, self.threshold_step)?;
        Ok(())
    }
}
