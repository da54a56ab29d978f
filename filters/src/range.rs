use nalgebra::{RealField, Scalar};
use solid_common::{
    filter::{ApproxFilter, Filter},
    point::Point,
    point_cloud::PointCloud,
};

/// Keeps the points whose distance to the sensor origin lies strictly between
/// `min` and `max`. Non-finite points never pass.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RangeFilter<T: Scalar> {
    pub min: T,
    pub max: T,
}

impl<T: Scalar> RangeFilter<T> {
    #[inline]
    pub fn new(min: T, max: T) -> Self {
        RangeFilter { min, max }
    }
}

impl<T: RealField> RangeFilter<T> {
    fn inner<P: Point<Data = T>>(&self) -> impl FnMut(&P) -> bool + '_ {
        let min = self.min.clone() * self.min.clone();
        let max = self.max.clone() * self.max.clone();
        move |point| {
            let squared = point.xyz().norm_squared();
            min < squared && squared < max
        }
    }
}

impl<T: RealField, P: Point<Data = T>> Filter<[P]> for RangeFilter<T> {
    fn filter_indices(&mut self, input: &[P]) -> Vec<usize> {
        self.inner().filter_indices(input)
    }

    fn filter_all_indices(&mut self, input: &[P]) -> (Vec<usize>, Vec<usize>) {
        self.inner().filter_all_indices(input)
    }
}

impl<T: RealField, P: Point<Data = T>> ApproxFilter<PointCloud<P>> for RangeFilter<T> {
    fn filter(&mut self, input: &PointCloud<P>) -> PointCloud<P> {
        self.inner().filter(input)
    }
}

#[cfg(test)]
mod tests {
    use solid_common::points::PointXyz;

    use super::*;

    #[test]
    fn test_range_filter() {
        let cloud: PointCloud<_> = [
            PointXyz::new(1., 0., 0.),
            PointXyz::new(3., 4., 0.),
            PointXyz::new(0., 0., -10.),
            PointXyz::new(80., 0., 0.),
            PointXyz::new(f64::INFINITY, 0., 0.),
            PointXyz::new(0., 30., 40.),
        ]
        .into_iter()
        .collect();

        let mut filter = RangeFilter::new(3., 80.);
        let (kept, removed) = filter.filter_all_indices(&*cloud);
        assert_eq!(kept, vec![1, 2, 5]);
        assert_eq!(removed, vec![0, 3, 4]);

        let filtered = filter.filter(&cloud);
        assert!(filtered.is_bounded());
        assert_eq!(filtered.len(), 3);
        assert_eq!(filtered[2], PointXyz::new(0., 30., 40.));
    }
}
