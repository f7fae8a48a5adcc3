//! Bounding Volume Hierarchy over arbitrary primitives.
//!
//! Uses Surface Area Heuristic (SAH) for construction. The hierarchy only
//! stores primitive indices and boxes; the caller supplies the exact
//! primitive test for each query, so the same tree serves triangle
//! raycasts, nearest-triangle queries and nearest-centroid lookups.

use mimic_math::{Aabb3, Point3, Ray};

/// A BVH node - either a leaf containing primitives or an internal node with children.
#[derive(Debug, Clone)]
pub enum BvhNode {
    /// Leaf node containing primitive indices.
    Leaf {
        /// Axis-aligned bounding box of this node.
        aabb: Aabb3,
        /// Primitive indices contained in this leaf.
        items: Vec<usize>,
    },
    /// Internal node with two children.
    Internal {
        /// Axis-aligned bounding box of this node.
        aabb: Aabb3,
        /// Left child node.
        left: Box<BvhNode>,
        /// Right child node.
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    fn aabb(&self) -> &Aabb3 {
        match self {
            BvhNode::Leaf { aabb, .. } => aabb,
            BvhNode::Internal { aabb, .. } => aabb,
        }
    }
}

type Item = (usize, Aabb3, Point3);

/// Bounding Volume Hierarchy keyed by primitive index.
#[derive(Debug, Clone)]
pub struct Bvh {
    root: Option<BvhNode>,
    len: usize,
}

impl Bvh {
    /// Build a BVH from per-primitive bounding boxes using SAH construction.
    ///
    /// Primitive `i` is the one whose box is `bounds[i]`.
    pub fn build(bounds: &[Aabb3]) -> Self {
        let mut items: Vec<Item> = bounds
            .iter()
            .enumerate()
            .map(|(i, aabb)| (i, *aabb, aabb.center()))
            .collect();

        let root = if items.is_empty() {
            None
        } else {
            Some(build_node(&mut items))
        };

        Self {
            root,
            len: bounds.len(),
        }
    }

    /// Build a BVH over points (zero-volume boxes).
    pub fn from_points(points: &[Point3]) -> Self {
        let bounds: Vec<Aabb3> = points.iter().map(|p| Aabb3::new(*p, *p)).collect();
        Self::build(&bounds)
    }

    /// Number of primitives indexed.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the hierarchy indexes nothing.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Get a reference to the root node, if any.
    pub fn root(&self) -> Option<&BvhNode> {
        self.root.as_ref()
    }

    /// Trace a ray and return only the closest hit.
    ///
    /// `test` intersects the ray with primitive `i` and returns the ray
    /// parameter of the hit together with any payload.
    pub fn trace_closest<H>(
        &self,
        ray: &Ray,
        mut test: impl FnMut(usize) -> Option<(f64, H)>,
    ) -> Option<(f64, H)> {
        let mut closest = None;
        let mut closest_t = f64::INFINITY;

        if let Some(ref root) = self.root {
            trace_node_closest(ray, root, &mut test, &mut closest, &mut closest_t);
        }

        closest
    }

    /// Find the primitive nearest to `p`.
    ///
    /// `test` returns the squared distance from `p` to primitive `i`
    /// together with any payload. Subtrees whose box is farther than the
    /// best candidate so far are skipped.
    pub fn nearest<H>(
        &self,
        p: &Point3,
        mut test: impl FnMut(usize) -> (f64, H),
    ) -> Option<(f64, H)> {
        let mut best = None;
        let mut best_d2 = f64::INFINITY;

        if let Some(ref root) = self.root {
            nearest_node(p, root, &mut test, &mut best, &mut best_d2);
        }

        best
    }
}

/// Trace a ray, keeping only the closest hit.
fn trace_node_closest<H>(
    ray: &Ray,
    node: &BvhNode,
    test: &mut impl FnMut(usize) -> Option<(f64, H)>,
    closest: &mut Option<(f64, H)>,
    closest_t: &mut f64,
) {
    match node {
        BvhNode::Leaf { aabb, items } => {
            if let Some((t_min, _)) = ray.intersect_aabb(aabb) {
                // Early out if AABB entry is beyond current closest
                if t_min >= *closest_t {
                    return;
                }

                for &i in items {
                    if let Some((t, payload)) = test(i) {
                        if t < *closest_t {
                            *closest_t = t;
                            *closest = Some((t, payload));
                        }
                    }
                }
            }
        }
        BvhNode::Internal { aabb, left, right } => {
            if let Some((t_min, _)) = ray.intersect_aabb(aabb) {
                if t_min >= *closest_t {
                    return;
                }

                // Test children in order of AABB distance
                let left_t = ray.intersect_aabb(left.aabb()).map(|(t, _)| t);
                let right_t = ray.intersect_aabb(right.aabb()).map(|(t, _)| t);

                match (left_t, right_t) {
                    (Some(lt), Some(rt)) => {
                        let (first, second) = if lt < rt { (left, right) } else { (right, left) };
                        trace_node_closest(ray, first, test, closest, closest_t);
                        trace_node_closest(ray, second, test, closest, closest_t);
                    }
                    (Some(_), None) => trace_node_closest(ray, left, test, closest, closest_t),
                    (None, Some(_)) => trace_node_closest(ray, right, test, closest, closest_t),
                    (None, None) => {}
                }
            }
        }
    }
}

/// Descend towards the nearest primitive, nearer child first.
fn nearest_node<H>(
    p: &Point3,
    node: &BvhNode,
    test: &mut impl FnMut(usize) -> (f64, H),
    best: &mut Option<(f64, H)>,
    best_d2: &mut f64,
) {
    if node.aabb().distance_squared(p) > *best_d2 {
        return;
    }
    match node {
        BvhNode::Leaf { items, .. } => {
            for &i in items {
                let (d2, payload) = test(i);
                if d2 < *best_d2 {
                    *best_d2 = d2;
                    *best = Some((d2, payload));
                }
            }
        }
        BvhNode::Internal { left, right, .. } => {
            let dl = left.aabb().distance_squared(p);
            let dr = right.aabb().distance_squared(p);
            let (first, second) = if dl <= dr { (left, right) } else { (right, left) };
            nearest_node(p, first, test, best, best_d2);
            nearest_node(p, second, test, best, best_d2);
        }
    }
}

/// Build a BVH node recursively using SAH.
fn build_node(items: &mut [Item]) -> BvhNode {
    // Compute bounds of all primitives
    let mut bounds = Aabb3::empty();
    for (_, aabb, _) in items.iter() {
        bounds.include_aabb(aabb);
    }

    // Base case: small number of primitives -> leaf
    if items.len() <= 4 {
        return BvhNode::Leaf {
            aabb: bounds,
            items: items.iter().map(|(id, _, _)| *id).collect(),
        };
    }

    let mid = match find_best_split(items, &bounds) {
        Some((axis, pos)) => partition_items(items, axis, pos),
        None => 0,
    };

    // Fallback if SAH finds nothing or the partition fails: median split
    // along the widest axis of the centroids.
    let mid = if mid == 0 || mid == items.len() {
        median_split(items)
    } else {
        mid
    };

    let (left_items, right_items) = items.split_at_mut(mid);

    BvhNode::Internal {
        aabb: bounds,
        left: Box::new(build_node(left_items)),
        right: Box::new(build_node(right_items)),
    }
}

/// Find the best split axis and position using SAH.
///
/// Returns `None` when the node's box has no area (coincident or
/// collinear primitives) or no split separates anything.
fn find_best_split(items: &[Item], bounds: &Aabb3) -> Option<(usize, f64)> {
    const NUM_BUCKETS: usize = 12;

    let total_area = bounds.surface_area();
    if total_area <= 0.0 {
        return None;
    }

    let extent = bounds.max - bounds.min;

    let mut best_cost = f64::INFINITY;
    let mut best = None;

    // Try each axis
    for axis in 0..3 {
        let axis_extent = extent[axis];
        if axis_extent < 1e-10 {
            continue;
        }
        let axis_min = bounds.min[axis];

        // Initialize buckets
        let mut bucket_counts = [0usize; NUM_BUCKETS];
        let mut bucket_bounds = [Aabb3::empty(); NUM_BUCKETS];

        // Assign primitives to buckets
        for (_, aabb, centroid) in items {
            let b = ((centroid[axis] - axis_min) / axis_extent * NUM_BUCKETS as f64) as usize;
            let b = b.min(NUM_BUCKETS - 1);

            bucket_counts[b] += 1;
            bucket_bounds[b].include_aabb(aabb);
        }

        // Sweep to find best split
        for split in 1..NUM_BUCKETS {
            let mut left_count = 0;
            let mut left_bounds = Aabb3::empty();
            for i in 0..split {
                left_count += bucket_counts[i];
                left_bounds.include_aabb(&bucket_bounds[i]);
            }

            let mut right_count = 0;
            let mut right_bounds = Aabb3::empty();
            for i in split..NUM_BUCKETS {
                right_count += bucket_counts[i];
                right_bounds.include_aabb(&bucket_bounds[i]);
            }

            if left_count == 0 || right_count == 0 {
                continue;
            }

            // SAH cost: traversal + P(left) * N_left + P(right) * N_right
            let cost = 0.125 // traversal cost
                + left_bounds.surface_area() / total_area * left_count as f64
                + right_bounds.surface_area() / total_area * right_count as f64;

            if cost < best_cost {
                best_cost = cost;
                best = Some((
                    axis,
                    axis_min + (split as f64 / NUM_BUCKETS as f64) * axis_extent,
                ));
            }
        }
    }

    best
}

/// Partition primitives by centroid along an axis.
fn partition_items(items: &mut [Item], axis: usize, pos: f64) -> usize {
    let mut left = 0;
    let mut right = items.len();

    while left < right {
        if items[left].2[axis] < pos {
            left += 1;
        } else {
            right -= 1;
            items.swap(left, right);
        }
    }

    left
}

/// Order primitives around the median centroid of the widest axis.
fn median_split(items: &mut [Item]) -> usize {
    let mut centroid_bounds = Aabb3::empty();
    for (_, _, c) in items.iter() {
        centroid_bounds.include_point(c);
    }
    let extent = centroid_bounds.max - centroid_bounds.min;
    let axis = extent.imax();

    let mid = items.len() / 2;
    items.select_nth_unstable_by(mid, |a, b| a.2[axis].total_cmp(&b.2[axis]));
    mid
}
