use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    bounding_box::BoundingBox,
    pipeline::{DensityFilter, FilterOutcome},
    point_cloud::PointCloud,
    radius_estimator::RadiusEstimate,
};

/// Summary of a filtering run, written next to the output as json
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilterReport {
    version: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub total: usize,
    pub retained: usize,
    pub discarded: usize,
    pub bounds: BoundingBox<f64>,
    pub settings: DensityFilter,
    pub estimate: RadiusEstimate<f64>,
    pub expected_neighbors: f64,
    pub min_neighbors: usize,
}

impl FilterReport {
    pub fn new(
        input: &Path,
        output: &Path,
        cloud: &PointCloud,
        settings: &DensityFilter,
        outcome: &FilterOutcome,
    ) -> FilterReport {
        FilterReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            total: outcome.mask.len(),
            retained: outcome.mask.retained_count(),
            discarded: outcome.mask.discarded_count(),
            bounds: cloud.bounds(),
            settings: settings.clone(),
            estimate: outcome.estimate.clone(),
            expected_neighbors: outcome.expected_neighbors,
            min_neighbors: outcome.min_neighbors,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}
