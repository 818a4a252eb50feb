use std::iter::FromIterator;

use nalgebra::Point3;

use crate::{bounding_box::BoundingBox, point::Point, retain_mask::RetainMask};

/// Ordered, immutable store of the points to be filtered.
/// The index of a point is its identity for the whole pipeline.
#[derive(Clone, Debug, Default)]
pub struct PointCloud {
    points: Vec<Point>,
}

impl PointCloud {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Point> {
        self.points.get(idx)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }

    pub fn positions(&self) -> impl ExactSizeIterator<Item = &Point3<f64>> + '_ {
        self.points.iter().map(|p| &p.position)
    }

    pub fn bounds(&self) -> BoundingBox<f64> {
        BoundingBox::from_iter(self.positions())
    }

    /// Returns the retained points, preserving their relative order.
    pub fn select(&self, mask: &RetainMask) -> Self {
        Self::new(mask.apply(&self.points))
    }
}

impl FromIterator<Point> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl FromIterator<Point3<f64>> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point3<f64>>>(iter: I) -> Self {
        iter.into_iter().map(Point::from).collect()
    }
}
