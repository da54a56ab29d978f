use std::ops::{Deref, Index};

use nalgebra::{convert, RealField};
use num::ToPrimitive;
use solid_common::{threshold_sweep_len, ConfigError, SolidConfig};

/// Cosine distance thresholds, strictly increasing, never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdSet<T> {
    values: Vec<T>,
}

impl<T: RealField + Copy + ToPrimitive> ThresholdSet<T> {
    /// `start, start + step, ...` while below `stop`. Each value is computed
    /// from `start` directly so errors do not accumulate along the sweep.
    ///
    /// A value that lands a rounding error below `stop` is kept, and one that
    /// lands on or above it is not: the default `0.004, 0.008, ...` sweep
    /// below `0.04` has nine thresholds, the last being `0.036`.
    pub fn sweep(start: T, stop: T, step: T) -> Result<Self, ConfigError> {
        let len = threshold_sweep_len(
            start.to_f64().unwrap_or(f64::NAN),
            stop.to_f64().unwrap_or(f64::NAN),
            step.to_f64().unwrap_or(f64::NAN),
        )?;
        let values = (0..=len)
            .map(|i| start + convert::<_, T>(i as f64) * step)
            .take_while(|&value| value < stop)
            .collect::<Vec<_>>();
        if values.is_empty() {
            return Err(ConfigError::EmptyThresholdSweep {
                start: start.to_f64().unwrap_or(f64::NAN),
                stop: stop.to_f64().unwrap_or(f64::NAN),
                step: step.to_f64().unwrap_or(f64::NAN),
            });
        }
        Ok(ThresholdSet { values })
    }

    /// Takes an explicit list, which is sorted and deduplicated.
    pub fn from_values(mut values: Vec<T>) -> Result<Self, ConfigError> {
        if values.is_empty() || values.iter().any(|value| !value.is_finite()) {
            return Err(ConfigError::EmptyThresholdSweep {
                start: f64::NAN,
                stop: f64::NAN,
                step: f64::NAN,
            });
        }
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup();
        Ok(ThresholdSet { values })
    }

    pub fn from_config(config: &SolidConfig) -> Result<Self, ConfigError> {
        Self::sweep(
            convert(config.loop_threshold),
            convert(config.threshold_stop),
            convert(config.threshold_step),
        )
    }

    /// Index of the strictest threshold that `distance` passes (`distance <
    /// threshold`). Every looser threshold is passed as well.
    pub fn first_passed(&self, distance: T) -> Option<usize> {
        if !distance.is_finite() {
            return None;
        }
        let index = self.values.partition_point(|&threshold| threshold <= distance);
        (index < self.values.len()).then_some(index)
    }
}

impl<T> Deref for ThresholdSet<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl<T> Index<usize> for ThresholdSet<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}
