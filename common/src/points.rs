use nalgebra::{RealField, Scalar, Vector4};

use crate::point::Point;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Point3Infoed<T: Scalar, I> {
    pub coords: Vector4<T>,
    pub extra: I,
}

impl<T: RealField, I> Point3Infoed<T, I> {
    #[inline]
    pub fn with_extra(x: T, y: T, z: T, extra: I) -> Self {
        Point3Infoed {
            coords: Vector4::new(x, y, z, T::one()),
            extra,
        }
    }
}

impl<T: RealField, I: Default> Point3Infoed<T, I> {
    #[inline]
    pub fn new(x: T, y: T, z: T) -> Self {
        Self::with_extra(x, y, z, I::default())
    }
}

impl<T: RealField, I: Default> Default for Point3Infoed<T, I> {
    fn default() -> Self {
        Self::new(T::zero(), T::zero(), T::zero())
    }
}

impl<T, I> Point for Point3Infoed<T, I>
where
    T: Scalar,
    I: std::fmt::Debug + Clone + PartialEq,
{
    type Data = T;

    #[inline]
    fn coords(&self) -> &Vector4<T> {
        &self.coords
    }

    #[inline]
    fn coords_mut(&mut self) -> &mut Vector4<T> {
        &mut self.coords
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct PointInfoIntensity<T> {
    pub intensity: T,
}

pub type PointXyz<T> = Point3Infoed<T, ()>;

pub type PointXyzI<T> = Point3Infoed<T, PointInfoIntensity<T>>;

impl<T: RealField> PointXyzI<T> {
    #[inline]
    pub fn with_intensity(x: T, y: T, z: T, intensity: T) -> Self {
        Self::with_extra(x, y, z, PointInfoIntensity { intensity })
    }

    /// Drops the intensity channel, which the descriptor never looks at.
    #[inline]
    pub fn geometry(&self) -> PointXyz<T> {
        Point3Infoed {
            coords: self.coords.clone(),
            extra: (),
        }
    }
}
