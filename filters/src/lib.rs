mod preprocess;
mod range;
mod voxel_grid;

pub use self::{preprocess::Preprocess, range::RangeFilter, voxel_grid::VoxelGrid};
