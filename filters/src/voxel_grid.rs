use nalgebra::{convert, RealField, Scalar, Vector3};
use num::ToPrimitive;
use rayon::prelude::*;
use solid_common::{filter::ApproxFilter, point::Point, point_cloud::PointCloud};

/// Replaces the points falling into each cubic voxel of side `leaf` by their
/// centroid. Voxels are anchored half a leaf below the minimum corner of the
/// finite bounding box, so that the lowest point sits mid-voxel, and the output
/// is ordered by voxel index.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VoxelGrid<T: Scalar> {
    pub leaf: T,
}

impl<T: Scalar> VoxelGrid<T> {
    #[inline]
    pub fn new(leaf: T) -> Self {
        VoxelGrid { leaf }
    }
}

impl<T, P> ApproxFilter<PointCloud<P>> for VoxelGrid<T>
where
    T: RealField + ToPrimitive,
    P: Point<Data = T> + Default + Sync,
{
    fn filter(&mut self, input: &PointCloud<P>) -> PointCloud<P> {
        let [min, _] = match input.finite_bound() {
            Some(bound) => bound,
            None => return PointCloud::new(),
        };
        let half = self.leaf.clone() / convert::<_, T>(2.);
        let min = min.xyz() - Vector3::repeat(half);

        let mut key_point = { input.finite_iter() }
            .filter_map(|point| {
                let key = (point.xyz() - &min) / self.leaf.clone();
                let key = [
                    key.x.clone().floor().to_usize()?,
                    key.y.clone().floor().to_usize()?,
                    key.z.clone().floor().to_usize()?,
                ];
                Some((key, point))
            })
            .collect::<Vec<_>>();
        if key_point.len() < input.finite_iter().count() {
            log::warn!(
                "voxel grid: {} points out of the indexable range were dropped",
                input.finite_iter().count() - key_point.len()
            );
        }

        // Stable, so that the accumulation order inside a voxel never changes.
        key_point.par_sort_by_key(|&(key, _)| key);

        let storage = { key_point.chunk_by(|(k1, _), (k2, _)| k1 == k2) }
            .map(|voxel| {
                let sum = voxel
                    .iter()
                    .fold(Vector3::zeros(), |acc, (_, point)| acc + point.xyz());
                let centroid = sum / convert::<_, T>(voxel.len() as f64);
                P::default().with_coords(centroid.insert_row(3, T::one()))
            })
            .collect::<Vec<_>>();

        PointCloud::from_points(storage)
    }
}

#[cfg(test)]
mod tests {
    use solid_common::points::PointXyz;

    use super::*;

    #[test]
    fn test_voxel_centroids() {
        let cloud: PointCloud<_> = [
            PointXyz::new(0.1, 0.1, 0.1),
            PointXyz::new(2.2, 0.2, 0.0),
            PointXyz::new(0.3, 0.3, 0.3),
            PointXyz::new(f64::NAN, 0., 0.),
            PointXyz::new(2.4, 0.4, 0.2),
            PointXyz::new(0.0, 1.7, 0.0),
        ]
        .into_iter()
        .collect();

        let filtered = VoxelGrid::new(1.).filter(&cloud);
        assert!(filtered.is_bounded());
        assert_eq!(filtered.len(), 3);

        let expected = [
            Vector3::new(0.2, 0.2, 0.2),
            Vector3::new(0.0, 1.7, 0.0),
            Vector3::new(2.3, 0.3, 0.1),
        ];
        for (point, expected) in filtered.iter().zip(expected) {
            assert!((point.xyz() - expected).norm() < 1e-12);
            assert_eq!(point.coords.w, 1.);
        }
    }

    #[test]
    fn test_half_leaf_anchor() {
        let cloud: PointCloud<_> = [PointXyz::new(0., 0., 0.), PointXyz::new(0.3, 0., 0.)]
            .into_iter()
            .collect();
        // The grid starts at x = -0.25, so 0.3 is already in the second voxel.
        let filtered = VoxelGrid::new(0.5).filter(&cloud);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].coords.x, 0.);
        assert_eq!(filtered[1].coords.x, 0.3);

        let filtered = VoxelGrid::new(0.5).filter(&PointCloud::from_points(vec![
            PointXyz::new(0., 0., 0.),
            PointXyz::new(0.2, 0., 0.),
        ]));
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_empty() {
        let cloud = PointCloud::<PointXyz<f32>>::new();
        assert!(VoxelGrid::new(0.5).filter(&cloud).is_empty());
    }

    #[test]
    fn test_deterministic() {
        let cloud: PointCloud<_> = (0..500)
            .map(|i| {
                let t = i as f64 * 0.37;
                PointXyz::new(t.sin() * 10., t.cos() * 10., (t * 0.1).sin())
            })
            .collect();
        let mut grid = VoxelGrid::new(0.5);
        assert_eq!(grid.filter(&cloud), grid.filter(&cloud));
    }
}
