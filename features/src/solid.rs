use nalgebra::{convert, DMatrix, DVector, RealField};
use num::ToPrimitive;
use solid_common::{
    config::{ConfigError, SolidConfig},
    feature::Feature,
    point::Point,
    point_cloud::PointCloud,
};

/// Replacement for coordinates that are exactly zero on `x` or `y`.
const AXIS_EPSILON: f64 = 0.001;

/// Non-fatal irregularities met while describing one scan.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Degeneracy {
    /// Points whose `x` or `y` coordinate was moved off the axis.
    pub substituted: usize,
    /// The elevation profile had no spread, so both profiles are all zero.
    pub flat_elevation: bool,
    /// The scan had no finite point at all.
    pub empty: bool,
}

impl Degeneracy {
    #[inline]
    pub fn is_clean(&self) -> bool {
        *self == Degeneracy::default()
    }
}

/// The SOLiD descriptor of one scan: a range profile, invariant to rotations
/// about the vertical axis, and an azimuth profile, which those rotations
/// shift circularly.
#[derive(Debug, Clone, PartialEq)]
pub struct SolidDescriptor<T: RealField> {
    pub range: DVector<T>,
    pub azimuth: DVector<T>,
    pub degeneracy: Degeneracy,
}

impl<T: RealField> SolidDescriptor<T> {
    pub fn zeros(num_range: usize, num_angle: usize) -> Self {
        SolidDescriptor {
            range: DVector::zeros(num_range),
            azimuth: DVector::zeros(num_angle),
            degeneracy: Degeneracy::default(),
        }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.range.iter().all(|x| x.is_zero()) && self.azimuth.iter().all(|x| x.is_zero())
    }
}

/// Builds [`SolidDescriptor`]s by binning points in range, azimuth and
/// elevation, then collapsing the elevation axis with a normalized weight.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SolidEstimation<T: RealField> {
    num_range: usize,
    num_angle: usize,
    num_elevation: usize,
    fov_upper: T,
    fov_lower: T,
    max_range: T,
}

impl<T: RealField + Copy + ToPrimitive> SolidEstimation<T> {
    /// The field of view bounds are in degrees.
    pub fn new(
        num_range: usize,
        num_angle: usize,
        num_elevation: usize,
        fov_upper: T,
        fov_lower: T,
        max_range: T,
    ) -> Result<Self, ConfigError> {
        for (name, value) in [
            ("num_range", num_range),
            ("num_angle", num_angle),
            ("num_elevation", num_elevation),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidBinCount { name, value });
            }
        }
        if !(fov_upper > fov_lower) {
            return Err(ConfigError::InvalidFov {
                upper: fov_upper.to_f64().unwrap_or(f64::NAN),
                lower: fov_lower.to_f64().unwrap_or(f64::NAN),
            });
        }
        if !(max_range > T::zero()) {
            return Err(ConfigError::InvalidRange(format!(
                "max range must be positive, got {max_range:?}"
            )));
        }
        Ok(SolidEstimation {
            num_range,
            num_angle,
            num_elevation,
            fov_upper,
            fov_lower,
            max_range,
        })
    }

    pub fn from_config(config: &SolidConfig) -> Result<Self, ConfigError> {
        Self::new(
            config.num_range,
            config.num_angle,
            config.num_elevation,
            convert(config.fov_u),
            convert(config.fov_d),
            convert(config.max_distance),
        )
    }

    #[inline]
    pub fn num_range(&self) -> usize {
        self.num_range
    }

    #[inline]
    pub fn num_angle(&self) -> usize {
        self.num_angle
    }

    #[inline]
    pub fn num_elevation(&self) -> usize {
        self.num_elevation
    }

    /// Width of one azimuth bin, in degrees.
    #[inline]
    pub fn azimuth_gap(&self) -> T {
        convert::<_, T>(360.) / convert(self.num_angle as f64)
    }

    /// Returns the `[range, azimuth, elevation]` bin of a point, and whether
    /// one of its planar coordinates had to be moved off an axis.
    fn bin(&self, [mut x, mut y, z]: [T; 3], gaps: &[T; 3]) -> ([usize; 3], bool) {
        let epsilon = convert::<_, T>(AXIS_EPSILON);
        let substituted = x.is_zero() || y.is_zero();
        if x.is_zero() {
            x = epsilon;
        }
        if y.is_zero() {
            y = epsilon;
        }

        let degrees = convert::<_, T>(180.) / T::pi();
        let mut theta = y.atan2(x) * degrees;
        if theta < T::zero() {
            theta += convert(360.);
        }
        let faraway = (x * x + y * y).sqrt();
        let phi = z.atan2(faraway) * degrees - self.fov_lower;

        let [gap_range, gap_azimuth, gap_elevation] = *gaps;
        let ring = { (faraway / gap_range).floor().to_usize() }
            .map_or(self.num_range - 1, |ring| ring.min(self.num_range - 1));
        // A bearing a hair below zero can round up to exactly 360 degrees.
        let sector = (theta / gap_azimuth).floor().to_usize().unwrap_or(0) % self.num_angle;
        // Below the field of view the index counts back from the top bin, so
        // `-1` lands in the last one. Above it everything piles into the top.
        let elevations = self.num_elevation as isize;
        let height = match (phi / gap_elevation).floor().to_isize() {
            Some(height) if height < 0 => height.rem_euclid(elevations) as usize,
            Some(height) => (height as usize).min(self.num_elevation - 1),
            None if phi < T::zero() => 0,
            None => self.num_elevation - 1,
        };

        ([ring, sector, height], substituted)
    }
}

impl<T, P> Feature<PointCloud<P>, SolidDescriptor<T>> for SolidEstimation<T>
where
    T: RealField + Copy + ToPrimitive,
    P: Point<Data = T>,
{
    fn compute(&self, input: &PointCloud<P>) -> SolidDescriptor<T> {
        let gaps = [
            self.max_range / convert(self.num_range as f64),
            self.azimuth_gap(),
            (self.fov_upper - self.fov_lower) / convert(self.num_elevation as f64),
        ];

        let mut range_by_elevation = DMatrix::<T>::zeros(self.num_range, self.num_elevation);
        let mut azimuth_by_elevation = DMatrix::<T>::zeros(self.num_angle, self.num_elevation);
        let mut degeneracy = Degeneracy::default();
        let mut count = 0;

        for point in input.finite_iter() {
            let coords = point.coords();
            let ([ring, sector, height], substituted) =
                self.bin([coords.x, coords.y, coords.z], &gaps);
            range_by_elevation[(ring, height)] += T::one();
            azimuth_by_elevation[(sector, height)] += T::one();
            degeneracy.substituted += substituted as usize;
            count += 1;
        }

        if count == 0 {
            log::warn!("solid: empty scan, using an all-zero descriptor");
            let mut descriptor = SolidDescriptor::zeros(self.num_range, self.num_angle);
            descriptor.degeneracy.empty = true;
            descriptor.degeneracy.flat_elevation = true;
            return descriptor;
        }
        if degeneracy.substituted > 0 {
            log::warn!(
                "solid: {} points lay on a planar axis and were nudged by {AXIS_EPSILON}",
                degeneracy.substituted
            );
        }

        let mut elevation = range_by_elevation.row_sum().transpose();
        let (min, max) = (elevation.min(), elevation.max());
        if max > min {
            elevation.apply(|x| *x = (*x - min) / (max - min));
        } else {
            log::warn!("solid: flat elevation profile over {count} points");
            degeneracy.flat_elevation = true;
            elevation.fill(T::zero());
        }

        SolidDescriptor {
            range: &range_by_elevation * &elevation,
            azimuth: &azimuth_by_elevation * &elevation,
            degeneracy,
        }
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{Rotation3, Vector3};
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use solid_common::points::PointXyz;

    use super::*;

    fn random_cloud(seed: u64, len: usize) -> PointCloud<PointXyz<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len)
            .map(|_| {
                let bearing = rng.gen_range(0.0..std::f64::consts::TAU);
                let distance = rng.gen_range(3.0..79.0);
                let z = rng.gen_range(-2.5..8.0);
                PointXyz::new(distance * bearing.cos(), distance * bearing.sin(), z)
            })
            .collect()
    }

    #[test]
    fn test_binning() {
        let solid = SolidEstimation::new(4, 4, 2, 10., -10., 40.).unwrap();
        let cloud: PointCloud<_> = [
            PointXyz::new(5., 5., 0.),
            PointXyz::new(-15., 0., -7.),
            PointXyz::new(0., -25., 1.),
            PointXyz::new(100., 1., 0.),
        ]
        .into_iter()
        .collect();

        let descriptor = solid.compute(&cloud);
        assert_eq!(descriptor.range, DVector::from_vec(vec![1., 0., 1., 1.]));
        assert_eq!(descriptor.azimuth, DVector::from_vec(vec![2., 0., 0., 1.]));
        assert_eq!(descriptor.degeneracy.substituted, 2);
        assert!(!descriptor.degeneracy.flat_elevation);
    }

    #[test]
    fn test_below_fov() {
        // Three degrees per elevation bin, starting at -2.
        let solid = SolidEstimation::new(4, 4, 4, 10., -2., 40.).unwrap();
        let cloud: PointCloud<_> = [
            // About -6.8 degrees: wraps from index -2 into bin 2.
            PointXyz::new(3., 4., -0.6),
            PointXyz::new(4., 3., -0.6),
            // Level, so bin 0.
            PointXyz::new(9., 12., 0.),
        ]
        .into_iter()
        .collect();

        // Elevation weights are [0.5, 0, 1, 0].
        let descriptor = solid.compute(&cloud);
        assert_eq!(descriptor.range, DVector::from_vec(vec![2., 0.5, 0., 0.]));
        assert!(descriptor.degeneracy.is_clean());
    }

    #[test]
    fn test_deterministic() {
        let solid = SolidEstimation::new(40, 60, 64, 24.8, -2., 80.).unwrap();
        let cloud = random_cloud(7, 2000);
        let first = solid.compute(&cloud);
        assert_eq!(first, solid.compute(&cloud));
        assert!(first.degeneracy.is_clean());
        assert!(first.range.iter().chain(first.azimuth.iter()).all(|&x| x >= 0.));
    }

    #[test]
    fn test_rotation() {
        let solid = SolidEstimation::new(40, 60, 64, 24.8, -2., 80.).unwrap();
        let cloud = random_cloud(42, 3000);
        let descriptor = solid.compute(&cloud);

        // 18 degrees is exactly three azimuth bins.
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), 18f64.to_radians());
        let rotated = solid.compute(&cloud.transformed(&rotation));

        assert!((&descriptor.range - &rotated.range).norm() < 1e-9);
        for sector in 0..60 {
            let diff = descriptor.azimuth[sector] - rotated.azimuth[(sector + 3) % 60];
            assert!(diff.abs() < 1e-9, "sector {sector}: {diff}");
        }
    }

    #[test]
    fn test_empty() {
        let solid = SolidEstimation::new(40, 60, 64, 24.8f32, -2., 80.).unwrap();
        let descriptor = solid.compute(&PointCloud::<PointXyz<f32>>::new());
        assert!(descriptor.is_zero());
        assert_eq!(descriptor.range.len(), 40);
        assert_eq!(descriptor.azimuth.len(), 60);
        assert!(descriptor.degeneracy.empty);
    }

    #[test]
    fn test_flat_elevation() {
        let solid = SolidEstimation::new(4, 4, 2, 10., -10., 40.).unwrap();
        let cloud: PointCloud<_> = [PointXyz::new(5., 5., 0.), PointXyz::new(-15., 1., -7.)]
            .into_iter()
            .collect();
        let descriptor = solid.compute(&cloud);
        assert!(descriptor.degeneracy.flat_elevation);
        assert!(descriptor.is_zero());
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(
            SolidEstimation::new(0, 60, 64, 24.8, -2., 80.),
            Err(ConfigError::InvalidBinCount {
                name: "num_range",
                ..
            })
        ));
        assert!(matches!(
            SolidEstimation::new(40, 60, 64, -2., 24.8, 80.),
            Err(ConfigError::InvalidFov { .. })
        ));
        assert!(matches!(
            SolidEstimation::new(40, 60, 64, 24.8, -2., 0.),
            Err(ConfigError::InvalidRange(_))
        ));
        assert!(SolidEstimation::<f64>::from_config(&SolidConfig::default()).is_ok());
    }
}
