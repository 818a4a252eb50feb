use nalgebra::{RealField, U3};
use num_traits::ToPrimitive;
use rayon::prelude::{IndexedParallelIterator, ParallelIterator, ParallelSlice, ParallelSliceMut};

use crate::{
    has_position::HasPosition, misc::cast, retain_mask::RetainMask, spatial_index::SpatialIndex,
};

/// Points per unit volume a neighborhood must reach to be kept, unless overridden.
pub const DEFAULT_DENSITY_THRESHOLD: f64 = 0.1;

/// Number of queries handled by one unit of parallel work, unless overridden.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Marks points as dense or sparse by counting their neighbors within a fixed radius.
///
/// A point is kept when its neighbor count (itself included) reaches
/// `threshold * 4/3 * pi * radius^3`, the count expected from a uniform
/// density of `threshold` over the query ball.
pub struct DensityClassifier<'a, T: RealField + Copy> {
    index: &'a SpatialIndex<T>,
    radius: T,
    threshold: T,
    batch_size: usize,
}

impl<'a, T: RealField + Copy + ToPrimitive + Send + Sync> DensityClassifier<'a, T> {
    pub fn new(index: &'a SpatialIndex<T>, radius: T, threshold: T) -> Self {
        Self {
            index,
            radius,
            threshold,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn radius(&self) -> T {
        self.radius
    }

    pub fn threshold(&self) -> T {
        self.threshold
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Neighbor count expected inside the query ball at the threshold density.
    /// Zero for a zero radius.
    pub fn expected_count(&self) -> T {
        let volume = cast::<T>(4) / cast::<T>(3) * T::pi() * self.radius.powi(3);
        self.threshold * volume
    }

    /// Smallest neighbor count that keeps a point, `ceil(expected_count)`.
    pub fn min_neighbors(&self) -> usize {
        let expected = self.expected_count();
        if expected <= T::zero() {
            return 0;
        }
        expected.ceil().to_usize().unwrap_or(usize::MAX)
    }

    /// Number of indexed points within the radius of each query, in query order.
    pub fn neighbor_counts<P: HasPosition<T, U3> + Sync>(&self, queries: &[P]) -> Vec<usize> {
        let mut counts = vec![0; queries.len()];
        self.fill(queries, &mut counts, |count| count);
        counts
    }

    /// Keep/discard decision for each query, aligned with `queries`.
    pub fn classify<P: HasPosition<T, U3> + Sync>(&self, queries: &[P]) -> RetainMask {
        let min_neighbors = self.min_neighbors();
        let mut retained = vec![false; queries.len()];
        self.fill(queries, &mut retained, |count| count >= min_neighbors);
        RetainMask::new(retained)
    }

    /// Splits `queries` and `out` into aligned batches, each batch owning its slice of `out`.
    fn fill<P, V, F>(&self, queries: &[P], out: &mut [V], decide: F)
    where
        P: HasPosition<T, U3> + Sync,
        V: Send,
        F: Fn(usize) -> V + Sync,
    {
        let batches = out.len().div_ceil(self.batch_size);
        out.par_chunks_mut(self.batch_size)
            .zip(queries.par_chunks(self.batch_size))
            .enumerate()
            .for_each(|(batch, (slots, chunk))| {
                for (slot, query) in slots.iter_mut().zip(chunk) {
                    *slot = decide(self.index.count_within(query.position(), self.radius));
                }
                log::trace!("batch {}/{} done ({} points)", batch + 1, batches, chunk.len());
            });
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Point3;

    use super::DensityClassifier;
    use crate::spatial_index::SpatialIndex;

    fn cube(n: usize, spacing: f64) -> Vec<Point3<f64>> {
        let mut points = vec![];
        for x in 0..n {
            for y in 0..n {
                for z in 0..n {
                    points.push(Point3::new(x as f64, y as f64, z as f64) * spacing);
                }
            }
        }
        points
    }

    #[test]
    fn expected_count_is_volume_scaled() {
        let index = SpatialIndex::<f64>::new::<Point3<f64>>(&[]);
        let classifier = DensityClassifier::new(&index, 3., 0.1);
        let expected = 0.1 * 4. / 3. * std::f64::consts::PI * 27.;
        assert!((classifier.expected_count() - expected).abs() < 1e-9);
        assert_eq!(classifier.min_neighbors(), 12);
    }

    #[test]
    fn zero_radius_expects_nothing() {
        let points = [Point3::new(1., 1., 1.)];
        let index = SpatialIndex::new(&points);
        let classifier = DensityClassifier::new(&index, 0., 0.1);
        assert_eq!(classifier.expected_count(), 0.);
        assert_eq!(classifier.min_neighbors(), 0);
        assert_eq!(classifier.neighbor_counts(&points), vec![1]);
        assert_eq!(classifier.classify(&points).as_slice(), &[true]);
    }

    #[test]
    fn isolated_point_is_discarded() {
        let mut points = cube(10, 0.1);
        points.push(Point3::new(100., 100., 100.));
        let index = SpatialIndex::new(&points);
        // expects ~5.2 neighbors, the isolated point only has itself
        let classifier = DensityClassifier::new(&index, 0.5, 10.);
        assert_eq!(classifier.min_neighbors(), 6);
        let mask = classifier.classify(&points);
        assert_eq!(mask.len(), points.len());
        assert!(!mask.is_retained(points.len() - 1));
        assert_eq!(mask.retained_count(), points.len() - 1);
    }

    #[test]
    fn batch_size_does_not_change_the_result() {
        let mut points = cube(8, 0.5);
        points.extend((0..20).map(|i| Point3::new(50. + i as f64 * 7., -30., 12.)));
        let index = SpatialIndex::with_leaf_size(&points, 5);
        let reference = DensityClassifier::new(&index, 1.2, 0.5)
            .with_batch_size(usize::MAX)
            .classify(&points);
        for batch_size in [0, 1, 7, 64, 511, 512, 513] {
            let mask = DensityClassifier::new(&index, 1.2, 0.5)
                .with_batch_size(batch_size)
                .classify(&points);
            assert_eq!(mask, reference);
        }
        let counts = DensityClassifier::new(&index, 1.2, 0.5)
            .with_batch_size(3)
            .neighbor_counts(&points);
        assert_eq!(counts.len(), points.len());
        assert!(counts.iter().all(|c| *c >= 1));
    }
}
