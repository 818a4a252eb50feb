use nalgebra::{Point3, RealField, U3};
use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::{
    error::{FilterError, Result},
    has_position::HasPosition,
    misc::{median, std_dev},
};

/// Number of standard deviations added to the median distance by default.
pub const DEFAULT_SIGMA: f64 = 3.;

/// Adaptive search radius and the statistics it was derived from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RadiusEstimate<T: RealField + Copy> {
    /// coordinate-wise median of the cloud
    pub centroid: Point3<T>,
    pub median_distance: T,
    pub std_distance: T,
    pub sigma: T,
    pub radius: T,
}

/// Computes `median(d) + sigma * std(d)` where `d` are the distances of every
/// point to the coordinate-wise median of the cloud.
#[derive(Clone, Copy, Debug)]
pub struct RadiusEstimator<T> {
    sigma: T,
}

impl<T: RealField + Copy> Default for RadiusEstimator<T> {
    fn default() -> Self {
        Self {
            sigma: nalgebra::convert(DEFAULT_SIGMA),
        }
    }
}

impl<T: RealField + Copy + Send + Sync> RadiusEstimator<T> {
    pub fn new(sigma: T) -> Self {
        Self { sigma }
    }

    pub fn sigma(&self) -> T {
        self.sigma
    }

    pub fn estimate<P: HasPosition<T, U3> + Sync>(&self, inputs: &[P]) -> Result<RadiusEstimate<T>> {
        if inputs.is_empty() {
            return Err(FilterError::InsufficientData(
                "cannot estimate a radius from an empty point cloud",
            ));
        }

        let centroid = coordinate_median(inputs);
        let mut distances: Vec<T> = inputs
            .par_iter()
            .map(|p| nalgebra::distance(p.position(), &centroid))
            .collect();

        let std_distance = std_dev(&distances).unwrap_or_else(T::zero);
        let median_distance = median(&mut distances).unwrap_or_else(T::zero);
        let radius = median_distance + self.sigma * std_distance;

        if !radius.is_finite() {
            return Err(FilterError::malformed(format!(
                "search radius is not finite ({}), the cloud contains non-finite coordinates",
                radius
            )));
        }

        Ok(RadiusEstimate {
            centroid,
            median_distance,
            std_distance,
            sigma: self.sigma,
            radius,
        })
    }
}

fn coordinate_median<T: RealField + Copy, P: HasPosition<T, U3>>(inputs: &[P]) -> Point3<T> {
    let mut axis: Vec<T> = Vec::with_capacity(inputs.len());
    let mut centroid = Point3::origin();
    for i in 0..3 {
        axis.clear();
        axis.extend(inputs.iter().map(|p| p.position()[i]));
        centroid[i] = median(&mut axis).unwrap_or_else(T::zero);
    }
    centroid
}
