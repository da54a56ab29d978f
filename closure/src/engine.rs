use std::{collections::BTreeSet, ops::Range};

use nalgebra::RealField;
use num::ToPrimitive;
use rayon::prelude::*;
use solid_common::{ConfigError, SolidConfig};
use solid_features::{Heading, HeadingEstimation};

use crate::{DescriptorDatabase, ThresholdSet};

/// One query/candidate comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison<T> {
    pub query: usize,
    pub candidate: usize,
    /// Cosine distance of the range profiles; NaN if either is all zero.
    pub distance: T,
    /// Index of the strictest threshold passed, if any.
    pub passed: Option<usize>,
    /// Only estimated for comparisons that passed some threshold.
    pub heading: Option<Heading<T>>,
}

impl<T> Comparison<T> {
    #[inline]
    pub fn is_closure(&self) -> bool {
        self.passed.is_some()
    }

    /// Whether this comparison is a closure under the threshold at `index`.
    #[inline]
    pub fn passes(&self, index: usize) -> bool {
        self.passed.is_some_and(|passed| passed <= index)
    }
}

/// For each threshold, the `(older, newer)` scan pairs declared a closure.
/// Only ever grows.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictedClosures<T> {
    thresholds: ThresholdSet<T>,
    pairs: Vec<BTreeSet<(usize, usize)>>,
}

impl<T: RealField + Copy> PredictedClosures<T> {
    pub fn new(thresholds: ThresholdSet<T>) -> Self {
        let pairs = vec![BTreeSet::new(); thresholds.len()];
        PredictedClosures { thresholds, pairs }
    }

    #[inline]
    pub fn thresholds(&self) -> &ThresholdSet<T> {
        &self.thresholds
    }

    /// Pairs predicted under the threshold at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&BTreeSet<(usize, usize)>> {
        self.pairs.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (T, &BTreeSet<(usize, usize)>)> + '_ {
        self.thresholds.iter().copied().zip(&self.pairs)
    }

    /// Adds the pair to every threshold the comparison passed.
    pub fn insert(&mut self, comparison: &Comparison<T>) {
        if let Some(first) = comparison.passed {
            let pair = (
                comparison.candidate.min(comparison.query),
                comparison.candidate.max(comparison.query),
            );
            for set in &mut self.pairs[first..] {
                set.insert(pair);
            }
        }
    }
}

/// Compares a query descriptor against every old enough entry of the
/// database, under all thresholds at once.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosureEngine<T> {
    thresholds: ThresholdSet<T>,
    exclusion_window: usize,
    heading: HeadingEstimation,
}

impl<T> ClosureEngine<T>
where
    T: RealField + Copy + ToPrimitive,
{
    pub fn new(
        thresholds: ThresholdSet<T>,
        exclusion_window: usize,
        heading: HeadingEstimation,
    ) -> Self {
        ClosureEngine {
            thresholds,
            exclusion_window,
            heading,
        }
    }

    pub fn from_config(config: &SolidConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(
            ThresholdSet::from_config(config)?,
            config.exclusion_window,
            HeadingEstimation::new(config.num_angle),
        ))
    }

    #[inline]
    pub fn thresholds(&self) -> &ThresholdSet<T> {
        &self.thresholds
    }

    #[inline]
    pub fn exclusion_window(&self) -> usize {
        self.exclusion_window
    }

    /// Scans older than the exclusion window, i.e. `0..query - window`.
    #[inline]
    pub fn candidates(&self, query: usize) -> Range<usize> {
        0..query.saturating_sub(self.exclusion_window)
    }

    /// Compares `query` against all of its candidates. The database is only
    /// read below `query`, and the result is in candidate order.
    pub fn evaluate(&self, query: usize, database: &DescriptorDatabase<T>) -> Vec<Comparison<T>> {
        if query >= database.len() {
            log::warn!(
                "closure: query {query} is not in a database of {} descriptors",
                database.len()
            );
            return Vec::new();
        }

        { self.candidates(query).into_par_iter() }
            .map(|candidate| {
                let distance = database.cosine_distance(query, candidate);
                let passed = self.thresholds.first_passed(distance);
                let heading = passed.and_then(|_| {
                    let (newer, older) = (database.get(query)?, database.get(candidate)?);
                    self.heading.estimate(&newer.azimuth, &older.azimuth)
                });
                log::trace!("closure: {query} vs {candidate}: {distance:?}");
                Comparison {
                    query,
                    candidate,
                    distance,
                    passed,
                    heading,
                }
            })
            .collect()
    }
}
