use std::cmp::Ordering;

use nalgebra::{convert, DVector, RealField};
use rayon::prelude::*;
use solid_common::feature::Feature;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Heading<T> {
    /// Number of azimuth bins the query was rolled by.
    pub shift: usize,
    /// `shift` expressed in degrees.
    pub degrees: T,
    /// L1 distance left after alignment.
    pub residual: T,
}

/// Estimates the relative heading of two matched scans by rolling the query
/// azimuth profile over every possible shift and keeping the one closest, in
/// L1 distance, to the candidate profile.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HeadingEstimation {
    pub num_angle: usize,
}

impl HeadingEstimation {
    #[inline]
    pub fn new(num_angle: usize) -> Self {
        HeadingEstimation { num_angle }
    }

    /// `roll(query, shift)[i] == query[(i - shift) mod n]`.
    fn rolled_l1<T>(query: &DVector<T>, candidate: &DVector<T>, shift: usize) -> T
    where
        T: RealField + Copy,
    {
        let n = query.len();
        candidate.iter().enumerate().fold(T::zero(), |acc, (i, &c)| {
            let q = query[(i + n - shift) % n];
            acc + if c > q { c - q } else { q - c }
        })
    }

    /// Orders by residual, NaN last, then by shift so that ties go to the
    /// smallest shift however the search was split.
    fn better<T: RealField + Copy>(a: (usize, T), b: (usize, T)) -> (usize, T) {
        match a.1.partial_cmp(&b.1) {
            Some(Ordering::Less) => a,
            Some(Ordering::Greater) => b,
            None if a.1.is_finite() => a,
            None if b.1.is_finite() => b,
            _ if a.0 <= b.0 => a,
            _ => b,
        }
    }

    pub fn estimate<T>(&self, query: &DVector<T>, candidate: &DVector<T>) -> Option<Heading<T>>
    where
        T: RealField + Copy + Send + Sync,
    {
        if query.len() != self.num_angle || candidate.len() != self.num_angle {
            log::warn!(
                "heading: profile lengths {} and {} do not match {} azimuth bins",
                query.len(),
                candidate.len(),
                self.num_angle
            );
            return None;
        }

        let (shift, residual) = { (0..self.num_angle).into_par_iter() }
            .map(|shift| (shift, Self::rolled_l1(query, candidate, shift)))
            .reduce_with(|a, b| Self::better(a, b))?;

        let gap = convert::<_, T>(360.) / convert(self.num_angle as f64);
        Some(Heading {
            shift,
            degrees: convert::<_, T>(shift as f64) * gap,
            residual,
        })
    }
}

impl<'a, T> Feature<(&'a DVector<T>, &'a DVector<T>), Option<Heading<T>>> for HeadingEstimation
where
    T: RealField + Copy + Send + Sync,
{
    /// The input is `(query, candidate)` azimuth profiles.
    fn compute(
        &self,
        &(query, candidate): &(&'a DVector<T>, &'a DVector<T>),
    ) -> Option<Heading<T>> {
        self.estimate(query, candidate)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    fn roll(profile: &DVector<f64>, shift: usize) -> DVector<f64> {
        let n = profile.len();
        DVector::from_fn(n, |i, _| profile[(i + n - shift) % n])
    }

    #[test]
    fn test_exact_shift() {
        let mut rng = StdRng::seed_from_u64(3);
        let query = DVector::from_fn(60, |_, _| rng.gen_range(0.0..100.0));
        let estimation = HeadingEstimation::new(60);

        for k in [0, 1, 17, 59] {
            let candidate = roll(&query, k);
            let heading = estimation.estimate(&query, &candidate).unwrap();
            assert_eq!(heading.shift, k);
            assert_eq!(heading.degrees, k as f64 * 6.);
            assert_eq!(heading.residual, 0.);
        }
    }

    #[test]
    fn test_tie_breaks_to_smallest_shift() {
        // Period 4: shifts 1, 5, 9, ... all align perfectly.
        let query = DVector::from_fn(12, |i, _| [0., 1., 2., 3.][i % 4]);
        let candidate = roll(&query, 5);
        let heading = HeadingEstimation::new(12).compute(&(&query, &candidate)).unwrap();
        assert_eq!(heading.shift, 1);
        assert_eq!(heading.degrees, 30.);

        let flat = DVector::from_element(12, 1.);
        let heading = HeadingEstimation::new(12).estimate(&flat, &flat).unwrap();
        assert_eq!(heading.shift, 0);
    }

    #[test]
    fn test_mismatched_lengths() {
        let estimation = HeadingEstimation::new(8);
        let a = DVector::<f32>::zeros(8);
        let b = DVector::<f32>::zeros(6);
        assert!(estimation.estimate(&a, &b).is_none());
        assert!(estimation.estimate(&b, &b).is_none());
    }
}
