mod bounding_box;
mod density_classifier;
mod error;
mod format;
mod has_position;
mod misc;
mod pipeline;
mod point;
mod point_cloud;
mod radius_estimator;
mod report;
mod retain_mask;
mod spatial_index;

pub mod prelude {
    pub use crate::bounding_box::*;
    pub use crate::density_classifier::*;
    pub use crate::error::FilterError;
    pub use crate::format::*;
    pub use crate::has_position::*;
    pub use crate::pipeline::*;
    pub use crate::point::*;
    pub use crate::point_cloud::*;
    pub use crate::radius_estimator::*;
    pub use crate::report::*;
    pub use crate::retain_mask::*;
    pub use crate::spatial_index::*;
}
