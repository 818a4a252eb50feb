use std::{cmp::Ordering, ops::Range};

use nalgebra::{Point3, RealField, U3};

use crate::{bounding_box::BoundingBox, has_position::HasPosition, misc::cast};

/// Largest number of points kept in a leaf unless overridden.
pub const DEFAULT_LEAF_SIZE: usize = 40;

/// A ball over a contiguous run of the reordered points.
#[derive(Clone, Debug)]
struct Node<T: RealField + Copy> {
    center: Point3<T>,
    radius: T,
    range: Range<usize>,
    children: Option<(u32, u32)>,
}

/// Ball tree answering radius queries over a fixed set of points.
///
/// Nodes live in an arena addressed by `u32` ids, the root is node `0`.
/// Points are stored reordered so that every node covers a contiguous slice,
/// `indices` maps a slot back to the position of the point in the input.
/// The tree is immutable once built and can be shared across threads.
#[derive(Clone, Debug)]
pub struct SpatialIndex<T: RealField + Copy> {
    nodes: Vec<Node<T>>,
    points: Vec<Point3<T>>,
    indices: Vec<usize>,
    leaf_size: usize,
}

impl<T: RealField + Copy> SpatialIndex<T> {
    pub fn new<P: HasPosition<T, U3>>(inputs: &[P]) -> Self {
        Self::with_leaf_size(inputs, DEFAULT_LEAF_SIZE)
    }

    pub fn with_leaf_size<P: HasPosition<T, U3>>(inputs: &[P], leaf_size: usize) -> Self {
        let leaf_size = leaf_size.max(1);
        let mut entries: Vec<(Point3<T>, usize)> = inputs
            .iter()
            .enumerate()
            .map(|(i, p)| (*p.position(), i))
            .collect();

        let mut nodes = vec![];
        if !entries.is_empty() {
            nodes.reserve(2 * entries.len() / leaf_size + 1);
            build(&mut nodes, &mut entries, 0, leaf_size);
        }

        let (points, indices) = entries.into_iter().unzip();
        Self {
            nodes,
            points,
            indices,
            leaf_size,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    /// Number of levels from the root to the deepest leaf, 0 for an empty index.
    pub fn depth(&self) -> usize {
        fn go<T: RealField + Copy>(nodes: &[Node<T>], id: u32) -> usize {
            match nodes[id as usize].children {
                Some((left, right)) => 1 + go(nodes, left).max(go(nodes, right)),
                None => 1,
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            go(&self.nodes, 0)
        }
    }

    /// Counts the stored points `p` with `|p - query| <= radius`.
    ///
    /// Duplicates count individually and a stored point counts itself.
    /// Negative or NaN radii match nothing.
    pub fn count_within(&self, query: &Point3<T>, radius: T) -> usize {
        let mut count = 0;
        self.visit(query, radius, |range| count += range.len());
        count
    }

    /// Input indices of the points within `radius` of `query`, ascending.
    pub fn indices_within(&self, query: &Point3<T>, radius: T) -> Vec<usize> {
        let mut found = vec![];
        self.visit(query, radius, |range| {
            found.extend_from_slice(&self.indices[range]);
        });
        found.sort_unstable();
        found
    }

    /// Walks the tree and hands every run of slots lying inside the query ball to `accept`.
    ///
    /// Whole-node pruning and acceptance are widened by a relative tolerance so
    /// that only the exact per-point comparison at the leaves decides boundary cases.
    fn visit(&self, query: &Point3<T>, radius: T, mut accept: impl FnMut(Range<usize>)) {
        let invalid = matches!(radius.partial_cmp(&T::zero()), None | Some(Ordering::Less));
        if self.nodes.is_empty() || invalid {
            return;
        }
        let radius_squared = radius * radius;
        let tolerance = T::default_epsilon() * cast::<T>(16);

        let mut stack = vec![0_u32];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id as usize];
            let d = nalgebra::distance(query, &node.center);
            let slack = (d + node.radius + radius) * tolerance;

            if d > radius + node.radius + slack {
                continue;
            }
            if d + node.radius + slack < radius {
                accept(node.range.clone());
                continue;
            }

            match node.children {
                Some((left, right)) => {
                    stack.push(right);
                    stack.push(left);
                }
                None => {
                    for slot in node.range.clone() {
                        if (self.points[slot] - query).norm_squared() <= radius_squared {
                            accept(slot..slot + 1);
                        }
                    }
                }
            }
        }
    }
}

/// Builds the subtree over `entries` (which start at slot `offset`) and returns its node id.
/// Ranges larger than `leaf_size` are split at the median of their widest axis.
fn build<T: RealField + Copy>(
    nodes: &mut Vec<Node<T>>,
    entries: &mut [(Point3<T>, usize)],
    offset: usize,
    leaf_size: usize,
) -> u32 {
    let n = entries.len();
    let sum = entries
        .iter()
        .fold(Point3::<T>::origin().coords, |acc, (p, _)| acc + p.coords);
    let center = Point3::from(sum / cast::<T>(n));
    let radius = entries
        .iter()
        .map(|(p, _)| nalgebra::distance(&center, p))
        .fold(T::zero(), |acc, d| acc.max(d));

    let id = nodes.len() as u32;
    nodes.push(Node {
        center,
        radius,
        range: offset..offset + n,
        children: None,
    });

    if n > leaf_size {
        let axis = entries
            .iter()
            .map(|(p, _)| p)
            .collect::<BoundingBox<T>>()
            .longest_axis();
        let mid = n / 2;
        entries.select_nth_unstable_by(mid, |(a, ia), (b, ib)| {
            a[axis]
                .partial_cmp(&b[axis])
                .unwrap_or(Ordering::Equal)
                .then(ia.cmp(ib))
        });
        let (lower, upper) = entries.split_at_mut(mid);
        let left = build(nodes, lower, offset, leaf_size);
        let right = build(nodes, upper, offset + mid, leaf_size);
        nodes[id as usize].children = Some((left, right));
    }

    id
}
