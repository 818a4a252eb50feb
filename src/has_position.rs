use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint, RealField, U3};

use crate::point::Point;

/// Anything that can be placed in a spatial index.
pub trait HasPosition<T: RealField, D: DimName>
where
    DefaultAllocator: Allocator<D>,
{
    fn position(&self) -> &OPoint<T, D>;
}

impl HasPosition<f64, U3> for Point {
    fn position(&self) -> &OPoint<f64, U3> {
        &self.position
    }
}

impl<T: RealField, D: DimName> HasPosition<T, D> for OPoint<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    fn position(&self) -> &OPoint<T, D> {
        self
    }
}
