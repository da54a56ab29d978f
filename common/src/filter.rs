use nalgebra::ComplexField;

use crate::{point::Point, point_cloud::PointCloud};

/// A filter that keeps some parts of input, for example, some elements of an
/// array, and transfers them to the output.
pub trait Filter<T: ?Sized> {
    /// Only the indices of the kept elements are returned, in ascending order.
    fn filter_indices(&mut self, input: &T) -> Vec<usize>;

    /// Returns both the kept and the removed indices.
    fn filter_all_indices(&mut self, input: &T) -> (Vec<usize>, Vec<usize>);
}

/// A filter that generates a new output, possibly made of points that do not
/// exist in the input, e.g. voxel centroids.
pub trait ApproxFilter<T> {
    fn filter(&mut self, input: &T) -> T;
}

impl<T, F: FnMut(&T) -> bool> Filter<[T]> for F {
    fn filter_indices(&mut self, input: &[T]) -> Vec<usize> {
        let mut indices = (0..input.len()).collect::<Vec<_>>();
        indices.retain(|&index| (self)(&input[index]));
        indices
    }

    fn filter_all_indices(&mut self, input: &[T]) -> (Vec<usize>, Vec<usize>) {
        let mut indices = (0..input.len()).collect::<Vec<_>>();
        let mut removed = Vec::with_capacity(indices.len());
        indices.retain(|&index| {
            let ret = (self)(&input[index]);
            if !ret {
                removed.push(index)
            }
            ret
        });
        (indices, removed)
    }
}

impl<P, F> ApproxFilter<PointCloud<P>> for F
where
    P: Point,
    P::Data: ComplexField,
    F: FnMut(&P) -> bool,
{
    fn filter(&mut self, input: &PointCloud<P>) -> PointCloud<P> {
        let mut storage = Vec::from(&**input);
        storage.retain(|point| (self)(point));
        PointCloud::from_points(storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points::PointXyz;

    #[test]
    fn test_closure_filter() {
        let cloud: PointCloud<_> = (0..5).map(|i| PointXyz::new(i as f32, 0., 0.)).collect();
        let mut keep_even = |p: &PointXyz<f32>| (p.coords.x as usize) % 2 == 0;

        let (kept, removed) = keep_even.filter_all_indices(&*cloud);
        assert_eq!(kept, vec![0, 2, 4]);
        assert_eq!(removed, vec![1, 3]);

        let filtered = keep_even.filter(&cloud);
        assert_eq!(filtered.len(), 3);
        assert_eq!(filtered[1].coords.x, 2.);
    }
}
