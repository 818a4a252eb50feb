use serde::{Deserialize, Serialize};

use crate::{
    density_classifier::{DensityClassifier, DEFAULT_BATCH_SIZE, DEFAULT_DENSITY_THRESHOLD},
    error::{FilterError, Result},
    point_cloud::PointCloud,
    radius_estimator::{RadiusEstimate, RadiusEstimator, DEFAULT_SIGMA},
    retain_mask::RetainMask,
    spatial_index::{SpatialIndex, DEFAULT_LEAF_SIZE},
};

/// Tunables of a density filtering run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DensityFilter {
    pub threshold: f64,
    pub sigma: f64,
    pub batch_size: usize,
    pub leaf_size: usize,
}

impl Default for DensityFilter {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DENSITY_THRESHOLD,
            sigma: DEFAULT_SIGMA,
            batch_size: DEFAULT_BATCH_SIZE,
            leaf_size: DEFAULT_LEAF_SIZE,
        }
    }
}

/// Result of [`DensityFilter::run`]
#[derive(Clone, Debug)]
pub struct FilterOutcome {
    pub estimate: RadiusEstimate<f64>,
    pub expected_neighbors: f64,
    pub min_neighbors: usize,
    pub mask: RetainMask,
}

impl DensityFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size;
        self
    }

    /// Estimates the search radius, indexes the cloud and classifies every point.
    ///
    /// The radius estimate and the index only depend on the cloud, so they are
    /// computed side by side. An empty cloud fails before anything is built.
    pub fn run(&self, cloud: &PointCloud) -> Result<FilterOutcome> {
        if cloud.is_empty() {
            return Err(FilterError::InsufficientData(
                "cannot filter an empty point cloud",
            ));
        }

        let estimator = RadiusEstimator::new(self.sigma);
        let points = cloud.points();
        let (estimate, index) = rayon::join(
            || estimator.estimate(points),
            || SpatialIndex::with_leaf_size(points, self.leaf_size),
        );
        let estimate = estimate?;
        log::info!(
            "centroid: {:?}, median distance: {}, std: {}, radius: {}",
            estimate.centroid.coords.as_slice(),
            estimate.median_distance,
            estimate.std_distance,
            estimate.radius
        );
        log::debug!(
            "index over {} points (leaf size {}, depth {})",
            index.len(),
            index.leaf_size(),
            index.depth()
        );

        let classifier = DensityClassifier::new(&index, estimate.radius, self.threshold)
            .with_batch_size(self.batch_size);
        let expected_neighbors = classifier.expected_count();
        let min_neighbors = classifier.min_neighbors();
        log::info!(
            "expected neighbors: {:.3} (keeping points with at least {})",
            expected_neighbors,
            min_neighbors
        );

        log::debug!(
            "classifying with radius {} at density {} in batches of {}",
            classifier.radius(),
            classifier.threshold(),
            classifier.batch_size()
        );
        let mask = classifier.classify(points);
        log::info!(
            "retained {} of {} points",
            mask.retained_count(),
            mask.len()
        );

        Ok(FilterOutcome {
            estimate,
            expected_neighbors,
            min_neighbors,
            mask,
        })
    }
}
