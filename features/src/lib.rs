mod heading;
mod solid;

pub use self::{
    heading::{Heading, HeadingEstimation},
    solid::{Degeneracy, SolidDescriptor, SolidEstimation},
};
