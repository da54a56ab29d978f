use core::fmt::Debug;

use nalgebra::{ComplexField, Scalar, Vector3, Vector4};

/// A point with homogeneous coordinates. Only `x`, `y` and `z` carry geometry;
/// the fourth component is kept at one for affine transforms.
pub trait Point: Debug + Clone + PartialEq {
    type Data: Scalar;

    fn coords(&self) -> &Vector4<Self::Data>;

    fn coords_mut(&mut self) -> &mut Vector4<Self::Data>;

    #[inline]
    fn with_coords(mut self, coords: Vector4<Self::Data>) -> Self {
        *self.coords_mut() = coords;
        self
    }

    #[inline]
    fn xyz(&self) -> Vector3<Self::Data> {
        self.coords().xyz()
    }

    #[inline]
    fn is_finite(&self) -> bool
    where
        Self::Data: ComplexField,
    {
        self.coords().iter().take(3).all(|x| x.is_finite())
    }
}
