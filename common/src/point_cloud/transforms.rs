use nalgebra::{RealField, Rotation3, Scalar, Vector4};

/// Rigid motions applicable to homogeneous point coordinates.
pub trait Transform<T: Scalar> {
    /// The result is a point (`w == 1`).
    fn se3(&self, from: &Vector4<T>, to: &mut Vector4<T>);
}

impl<T: RealField> Transform<T> for Rotation3<T> {
    fn se3(&self, from: &Vector4<T>, to: &mut Vector4<T>) {
        *to = (self * from.xyz()).insert_row(3, T::one());
    }
}
