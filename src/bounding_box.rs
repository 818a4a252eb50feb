use std::iter::FromIterator;

use nalgebra::{Point3, RealField, Vector3};
use serde::{Deserialize, Serialize};

use crate::point::Point;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox<T: RealField + Copy> {
    pub min: Point3<T>,
    pub max: Point3<T>,
}

impl<T: RealField + Copy> BoundingBox<T> {
    pub fn new(min: Point3<T>, max: Point3<T>) -> BoundingBox<T> {
        BoundingBox { min, max }
    }

    /// Degenerate box holding a single position.
    pub fn at(p: &Point3<T>) -> BoundingBox<T> {
        BoundingBox { min: *p, max: *p }
    }

    pub fn max_size(&self) -> T {
        let size = self.size();
        size.x.max(size.y).max(size.z)
    }

    pub fn size(&self) -> Vector3<T> {
        self.max - self.min
    }

    pub fn min(&self) -> &Point3<T> {
        &self.min
    }

    pub fn max(&self) -> &Point3<T> {
        &self.max
    }

    /// Axis (0 = x, 1 = y, 2 = z) with the greatest extent; ties prefer the lower axis.
    pub fn longest_axis(&self) -> usize {
        let size = self.size();
        if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        }
    }

    pub fn extend(&mut self, p: &Point3<T>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }
}

/// Collects bounds over positions. An empty iterator yields a degenerate box at the origin.
fn collect<'a, T: RealField + Copy>(
    mut iter: impl Iterator<Item = &'a Point3<T>>,
) -> BoundingBox<T> {
    match iter.next() {
        Some(first) => iter.fold(BoundingBox::at(first), |mut b, p| {
            b.extend(p);
            b
        }),
        None => BoundingBox::at(&Point3::origin()),
    }
}

impl<T: RealField + Copy> FromIterator<Point3<T>> for BoundingBox<T> {
    fn from_iter<I: IntoIterator<Item = Point3<T>>>(iter: I) -> Self {
        let points: Vec<_> = iter.into_iter().collect();
        collect(points.iter())
    }
}

impl<'a, T: RealField + Copy> FromIterator<&'a Point3<T>> for BoundingBox<T> {
    fn from_iter<I: IntoIterator<Item = &'a Point3<T>>>(iter: I) -> Self {
        collect(iter.into_iter())
    }
}

impl<'a> FromIterator<&'a Point> for BoundingBox<f64> {
    fn from_iter<I: IntoIterator<Item = &'a Point>>(iter: I) -> Self {
        collect(iter.into_iter().map(|p| &p.position))
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Point3;

    use super::BoundingBox;

    #[test]
    fn bounds_and_longest_axis() {
        let bbox: BoundingBox<f64> = [
            Point3::new(0., 1., -1.),
            Point3::new(2., -3., 0.5),
            Point3::new(1., 0., 0.),
        ]
        .into_iter()
        .collect();
        assert_eq!(bbox.min, Point3::new(0., -3., -1.));
        assert_eq!(bbox.max, Point3::new(2., 1., 0.5));
        assert_eq!(bbox.longest_axis(), 1);
        assert_eq!(bbox.max_size(), 4.);
    }

    #[test]
    fn empty_is_degenerate() {
        let bbox: BoundingBox<f32> = std::iter::empty::<Point3<f32>>().collect();
        assert_eq!(bbox.max_size(), 0.);
    }
}
