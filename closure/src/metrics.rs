use std::collections::BTreeSet;

use nalgebra::RealField;

use crate::PredictedClosures;

/// Known revisits of a sequence, each stored as `(older, newer)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroundTruth {
    pairs: BTreeSet<(usize, usize)>,
}

impl GroundTruth {
    pub fn new(pairs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        pairs.into_iter().collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    #[inline]
    pub fn contains(&self, a: usize, b: usize) -> bool {
        self.pairs.contains(&(a.min(b), a.max(b)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &(usize, usize)> + '_ {
        self.pairs.iter()
    }
}

impl FromIterator<(usize, usize)> for GroundTruth {
    fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
        GroundTruth {
            pairs: { iter.into_iter() }.map(|(a, b)| (a.min(b), a.max(b))).collect(),
        }
    }
}

/// Confusion counts of one threshold. Ratios with a zero denominator are NaN.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Metrics {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl Metrics {
    pub fn new(true_positives: usize, false_positives: usize, false_negatives: usize) -> Self {
        let ratio = |num: usize, den: usize| {
            if den == 0 {
                f64::NAN
            } else {
                num as f64 / den as f64
            }
        };
        let precision = ratio(true_positives, true_positives + false_positives);
        let recall = ratio(true_positives, true_positives + false_negatives);
        let f1 = if precision + recall == 0. {
            f64::NAN
        } else {
            2. * precision * recall / (precision + recall)
        };
        Metrics {
            true_positives,
            false_positives,
            false_negatives,
            precision,
            recall,
            f1,
        }
    }

    pub fn compute(predicted: &BTreeSet<(usize, usize)>, ground_truth: &GroundTruth) -> Self {
        let predicted = { predicted.iter() }
            .map(|&(a, b)| (a.min(b), a.max(b)))
            .collect::<BTreeSet<_>>();
        let true_positives = predicted.intersection(&ground_truth.pairs).count();
        Metrics::new(
            true_positives,
            predicted.len() - true_positives,
            ground_truth.len() - true_positives,
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ThresholdMetrics<T> {
    pub threshold: T,
    pub metrics: Metrics,
}

impl<T: RealField + Copy> PredictedClosures<T> {
    /// Scores every threshold against the ground truth, in threshold order.
    pub fn compute_metrics(&self, ground_truth: &GroundTruth) -> Vec<ThresholdMetrics<T>> {
        self.iter()
            .map(|(threshold, predicted)| ThresholdMetrics {
                threshold,
                metrics: Metrics::compute(predicted, ground_truth),
            })
            .collect()
    }
}
