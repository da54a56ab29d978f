mod transforms;

use std::ops::{Deref, Index, IndexMut};

use nalgebra::{ComplexField, RealField, Vector4};

pub use self::transforms::Transform;
use crate::point::Point;

/// An organized (`width > 1`) or unorganized (`width == 1`) set of points.
///
/// `bounded` caches whether every point has finite coordinates, so that
/// consumers can skip the per-point check on the common path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointCloud<P> {
    storage: Vec<P>,
    width: usize,
    bounded: bool,
}

impl<P> PointCloud<P> {
    #[inline]
    pub fn new() -> Self {
        PointCloud {
            storage: Vec::new(),
            width: 1,
            bounded: true,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.storage.len() / self.width
    }

    #[inline]
    pub fn is_bounded(&self) -> bool {
        self.bounded
    }

    #[inline]
    pub fn into_vec(self) -> Vec<P> {
        self.storage
    }
}

impl<P: Point> PointCloud<P>
where
    P::Data: ComplexField,
{
    pub fn try_from_vec(storage: Vec<P>, width: usize) -> Result<Self, Vec<P>> {
        if width > 0 && storage.len() % width == 0 {
            let bounded = storage.iter().all(|p| p.is_finite());
            Ok(PointCloud {
                storage,
                width,
                bounded,
            })
        } else {
            Err(storage)
        }
    }

    /// Builds an unorganized cloud, which always succeeds.
    #[inline]
    pub fn from_points(storage: Vec<P>) -> Self {
        let bounded = storage.iter().all(|p| p.is_finite());
        PointCloud {
            storage,
            width: 1,
            bounded,
        }
    }

    pub fn map<F, R>(&self, f: F) -> PointCloud<R>
    where
        F: FnMut(&P) -> R,
        R: Point,
        R::Data: ComplexField,
    {
        let storage = self.storage.iter().map(f).collect::<Vec<_>>();
        let bounded = storage.iter().all(|p| p.is_finite());
        PointCloud {
            storage,
            width: self.width,
            bounded,
        }
    }

    /// Iterates over the points with finite coordinates only.
    pub fn finite_iter(&self) -> impl Iterator<Item = &P> + '_ {
        let bounded = self.bounded;
        self.storage.iter().filter(move |p| bounded || p.is_finite())
    }

    pub fn transform<Z: Transform<P::Data>>(&self, z: &Z, out: &mut Self) {
        out.storage.clone_from(&self.storage);
        out.width = self.width;
        out.bounded = self.bounded;

        for (from, to) in self.storage.iter().zip(out.storage.iter_mut()) {
            if !self.bounded && !from.is_finite() {
                continue;
            }
            z.se3(from.coords(), to.coords_mut())
        }
    }

    #[inline]
    pub fn transformed<Z: Transform<P::Data>>(&self, z: &Z) -> Self {
        let mut out = Self::new();
        self.transform(z, &mut out);
        out
    }
}

impl<P: Point> PointCloud<P>
where
    P::Data: RealField,
{
    /// Component-wise minimum and maximum of the finite points, or `None` when
    /// there are none.
    pub fn finite_bound(&self) -> Option<[Vector4<P::Data>; 2]> {
        self.finite_iter().fold(None, |acc, v| match acc {
            None => Some([v.coords().clone(), v.coords().clone()]),
            Some([min, max]) => Some([min.inf(v.coords()), max.sup(v.coords())]),
        })
    }
}

impl<P: Point> FromIterator<P> for PointCloud<P>
where
    P::Data: ComplexField,
{
    fn from_iter<T: IntoIterator<Item = P>>(iter: T) -> Self {
        PointCloud::from_points(iter.into_iter().collect())
    }
}

impl<P> Default for PointCloud<P> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Deref for PointCloud<P> {
    type Target = [P];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.storage
    }
}

impl<P> Index<usize> for PointCloud<P> {
    type Output = P;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.storage[index]
    }
}

impl<P> IndexMut<usize> for PointCloud<P> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.storage[index]
    }
}

impl<P> Index<(usize, usize)> for PointCloud<P> {
    type Output = P;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.storage[y * self.width + x]
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{Rotation3, Vector3};

    use super::*;
    use crate::points::PointXyz;

    #[test]
    fn test_organized() {
        let points = (0..6).map(|i| PointXyz::new(i as f64, 0., 0.)).collect();
        let cloud = PointCloud::try_from_vec(points, 3).unwrap();
        assert_eq!(cloud.width(), 3);
        assert_eq!(cloud.height(), 2);
        assert_eq!(cloud[(1, 1)].coords.x, 4.);

        let points = (0..5).map(|i| PointXyz::new(i as f64, 0., 0.)).collect();
        assert!(PointCloud::try_from_vec(points, 3).is_err());
    }

    #[test]
    fn test_bound_skips_non_finite() {
        let cloud: PointCloud<_> = [
            PointXyz::new(1., -2., 3.),
            PointXyz::new(f64::NAN, 100., 100.),
            PointXyz::new(-1., 2., 0.),
        ]
        .into_iter()
        .collect();
        assert!(!cloud.is_bounded());
        assert_eq!(cloud.finite_iter().count(), 2);

        let [min, max] = cloud.finite_bound().unwrap();
        assert_eq!(min.xyz(), Vector3::new(-1., -2., 0.));
        assert_eq!(max.xyz(), Vector3::new(1., 2., 3.));

        assert!(PointCloud::<PointXyz<f64>>::new().finite_bound().is_none());
    }

    #[test]
    fn test_rotation() {
        let cloud: PointCloud<_> = [PointXyz::new(1., 0., 2.)].into_iter().collect();
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2);
        let rotated = cloud.transformed(&rotation);
        assert!((rotated[0].coords - Vector4::new(0., 1., 2., 1.)).norm() < 1e-12);
    }
}
