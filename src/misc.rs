use std::cmp::Ordering;

use nalgebra::RealField;

fn cmp<T: RealField>(a: &T, b: &T) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

pub(crate) fn cast<T: RealField>(n: usize) -> T {
    nalgebra::convert(n as f64)
}

/// Median of `values`, reordering the slice in place.
/// An even count averages the two middle values.
pub fn median<T: RealField + Copy>(values: &mut [T]) -> Option<T> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    let half = n / 2;
    let (lower, upper, _) = values.select_nth_unstable_by(half, cmp);
    let upper = *upper;
    if n % 2 == 1 {
        return Some(upper);
    }
    let below = lower
        .iter()
        .copied()
        .max_by(cmp)
        .unwrap_or(upper);
    Some((below + upper) / (T::one() + T::one()))
}

pub fn mean<T: RealField + Copy>(values: &[T]) -> Option<T> {
    if values.is_empty() {
        return None;
    }
    let sum = values.iter().fold(T::zero(), |acc, v| acc + *v);
    Some(sum / cast::<T>(values.len()))
}

/// Population standard deviation (divides by `n`).
pub fn std_dev<T: RealField + Copy>(values: &[T]) -> Option<T> {
    let mu = mean(values)?;
    let var = values
        .iter()
        .fold(T::zero(), |acc, v| acc + (*v - mu) * (*v - mu))
        / cast::<T>(values.len());
    Some(var.sqrt())
}
