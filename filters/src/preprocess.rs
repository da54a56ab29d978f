use nalgebra::{convert, RealField};
use num::ToPrimitive;
use solid_common::{
    config::{ConfigError, SolidConfig},
    filter::ApproxFilter,
    point::Point,
    point_cloud::PointCloud,
};

use crate::{RangeFilter, VoxelGrid};

/// The cleanup applied to a raw scan before it is described: range cropping
/// followed by voxel downsampling.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Preprocess<T: RealField> {
    pub range: RangeFilter<T>,
    pub voxel: VoxelGrid<T>,
}

impl<T: RealField> Preprocess<T> {
    pub fn new(range: RangeFilter<T>, voxel: VoxelGrid<T>) -> Self {
        Preprocess { range, voxel }
    }

    pub fn from_config(config: &SolidConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Preprocess {
            range: RangeFilter::new(convert(config.min_distance), convert(config.max_distance)),
            voxel: VoxelGrid::new(convert(config.voxel_size)),
        })
    }
}

impl<T, P> ApproxFilter<PointCloud<P>> for Preprocess<T>
where
    T: RealField + ToPrimitive,
    P: Point<Data = T> + Default + Sync,
{
    fn filter(&mut self, input: &PointCloud<P>) -> PointCloud<P> {
        let cropped = self.range.filter(input);
        let downsampled = self.voxel.filter(&cropped);
        log::trace!(
            "preprocess: {} -> {} (cropped) -> {} (downsampled) points",
            input.len(),
            cropped.len(),
            downsampled.len()
        );
        downsampled
    }
}
