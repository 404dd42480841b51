use num_traits::Float;

use crate::bpq::BoundedPriorityQueue;
use crate::geom::{Axis, Point, Region};

/// A node of the tree.  Leaves hold exactly one point; internal nodes hold
/// the split value on their depth's axis, the bounding region of every point
/// beneath them, and handles to their two children in the arena.
#[derive(Clone, Debug)]
enum Node<T> {
    Leaf(Point<T>),
    Internal {
        split: T,
        region: Region<T>,
        left: usize,
        right: usize
    }
}

/// Mutable state threaded through a 1-NN search: the incumbent point, its
/// distance from the query (the pruning bound), and a visited-node count.
struct NnState<T> {
    best: Option<Point<T>>,
    best_dist: T,
    visited: usize
}

/// Mutable state threaded through a k-NN search.  The queue's worst kept
/// distance is the pruning bound, but only once the queue is full.
struct KnnState<T> {
    queue: BoundedPriorityQueue<T>,
    visited: usize
}

/// A kd-tree over a static set of 2D points, able to answer distance related
/// queries:
/// - What are all the points within an axis-aligned rectangle?  (Range search,
///   boundary inclusive)
/// - What are all the points within distance r of a given point, or with a
///   distance in a given closed interval?  (Disc and annulus radius search)
/// - What is the closest point to a given point, or the k closest points?
///   (Nearest neighbor searches, with branch-and-bound pruning)
/// The tree is built once and never mutated: leaves each hold one point,
/// internal nodes split the remaining set at the median coordinate of the
/// axis given by their depth's parity (x at even depths, y at odd).  All
/// nodes live in one contiguous arena and refer to their children by index,
/// so ownership is strictly tree-shaped without any pointer juggling.
/// Queries keep their state in per-call structs, so a built tree can be
/// shared freely between threads.
#[derive(Debug)]
pub struct KdTree<T = f32> {
    nodes: Vec<Node<T>>,
    root: usize,
    len: usize
}

impl<T: Float> KdTree<T> {
    /// Construct a kd-tree from a vector of points, moving the vector into
    /// the build (construction partitions and reorders it freely).
    /// The input must not be empty.
    pub fn build(mut points: Vec<Point<T>>) -> Self {
        assert!(!points.is_empty(), "cannot build a kd-tree from zero points");
        let len = points.len();
        // N leaves and N - 1 internal nodes
        let mut nodes = Vec::with_capacity(2*len - 1);
        let root = Self::build_r(&mut nodes, &mut points, 0);
        Self{nodes, root, len}
    }

    fn build_r(nodes: &mut Vec<Node<T>>, points: &mut [Point<T>], depth: usize) -> usize {
        if let [point] = points {
            nodes.push(Node::Leaf(*point));
            return nodes.len() - 1
        }
        let axis = Axis::at_depth(depth);
        let median = points.len() >> 1;
        points.select_nth_unstable_by(median, |p, q|axis.cmp_points(p, q));
        let split = axis.coord(&points[median]);
        // The root spans the whole plane so no query rectangle reaching past
        // the data's bounding box is ever pruned at the root.  Everywhere
        // else the region is the tight bounding box of the subtree's points.
        let region = if depth == 0 {
            Region::whole_plane()
        } else {
            Region::bounding(points).unwrap()
        };
        // The right half keeps the median element, so for odd sizes it holds
        // one more point than the left; this keeps every leaf at one point.
        let (lo, hi) = points.split_at_mut(median);
        let left = Self::build_r(nodes, lo, depth + 1);
        let right = Self::build_r(nodes, hi, depth + 1);
        nodes.push(Node::Internal{split, region, left, right});
        nodes.len() - 1
    }

    /// Get the number of points in the kdtree
    pub fn len(&self) -> usize {
        self.len
    }

    /// Iterate over references to all indexed points.
    /// The order is arbitrary, but every point is visited exactly once.
    pub fn iter_points(&self) -> impl Iterator<Item = &Point<T>> + '_ {
        self.nodes.iter().filter_map(|node|match node {
            Node::Leaf(point) => Some(point),
            Node::Internal{..} => None
        })
    }

    /// Return every indexed point lying within `query`, boundary inclusive.
    /// The order of the result is unspecified.
    pub fn range_search(&self, query: &Region<T>) -> Vec<Point<T>> {
        let mut found = Vec::new();
        self.range_r(self.root, query, &mut found);
        found
    }

    fn range_r(&self, id: usize, query: &Region<T>, found: &mut Vec<Point<T>>) {
        match &self.nodes[id] {
            Node::Leaf(point) => if query.contains(point) { found.push(*point) },
            Node::Internal{left, right, ..} => {
                // Each child is tested against its own region: a child fully
                // inside the query is reported wholesale, one merely
                // overlapping it is recursed into, and the rest are pruned.
                for child in [*left, *right] {
                    let region = self.node_region(child);
                    if query.encloses(&region) {
                        self.report_subtree(child, found)
                    } else if query.overlaps(&region) {
                        self.range_r(child, query, found)
                    }
                }
            }
        }
    }

    /// Append every point under `id` to `found`, left subtree first
    fn report_subtree(&self, id: usize, found: &mut Vec<Point<T>>) {
        match &self.nodes[id] {
            Node::Leaf(point) => found.push(*point),
            Node::Internal{left, right, ..} => {
                self.report_subtree(*left, found);
                self.report_subtree(*right, found)
            }
        }
    }

    fn node_region(&self, id: usize) -> Region<T> {
        match &self.nodes[id] {
            Node::Leaf(point) => Region::of_point(point),
            Node::Internal{region, ..} => *region
        }
    }

    /// Return all points within `radius` of `(x, y)`, boundary inclusive.
    /// `radius` must be positive.
    pub fn radius_search(&self, x: T, y: T, radius: T) -> Vec<Point<T>> {
        assert!(radius > T::zero(), "radius search requires radius > 0");
        let query = Region::new(x - radius, y - radius, x + radius, y + radius);
        let mut found = self.range_search(&query);
        found.retain(|point|point.distance(x, y) <= radius);
        found
    }

    /// Return all points whose distance d from `(x, y)` satisfies
    /// `min_dist <= d <= max_dist`, inclusive on both boundary circles.
    /// Requires `min_dist >= 0` and `max_dist > min_dist`.
    pub fn radius_search_annulus(&self, x: T, y: T, min_dist: T, max_dist: T) -> Vec<Point<T>> {
        assert!(min_dist >= T::zero(), "annulus search requires min_dist >= 0");
        assert!(max_dist > min_dist, "annulus search requires max_dist > min_dist");
        let query = Region::new(x - max_dist, y - max_dist, x + max_dist, y + max_dist);
        let mut found = self.range_search(&query);
        found.retain(|point|{
            let d = point.distance(x, y);
            d >= min_dist && d <= max_dist
        });
        found
    }

    /// Return the closest indexed point to `(x, y)` and its distance.
    /// Ties are broken arbitrarily.
    pub fn nn_search(&self, x: T, y: T) -> (Point<T>, T) {
        let state = self.nn_run(x, y);
        // the tree is never empty, so some leaf updated the incumbent
        (state.best.unwrap(), state.best_dist)
    }

    fn nn_run(&self, x: T, y: T) -> NnState<T> {
        let mut state = NnState{best: None, best_dist: T::infinity(), visited: 0};
        self.nn_r(self.root, x, y, 0, &mut state);
        state
    }

    fn nn_r(&self, id: usize, x: T, y: T, depth: usize, state: &mut NnState<T>) {
        state.visited += 1;
        match &self.nodes[id] {
            Node::Leaf(point) => {
                let dist = point.distance(x, y);
                if dist < state.best_dist {
                    state.best_dist = dist;
                    state.best = Some(*point)
                }
            }
            Node::Internal{split, left, right, ..} => {
                let q = Axis::at_depth(depth).of(x, y);
                // descend the near side first; the far side only matters if
                // the incumbent radius still reaches across the split line
                if q < *split {
                    self.nn_r(*left, x, y, depth + 1, state);
                    if q + state.best_dist > *split {
                        self.nn_r(*right, x, y, depth + 1, state)
                    }
                } else {
                    self.nn_r(*right, x, y, depth + 1, state);
                    if q - state.best_dist <= *split {
                        self.nn_r(*left, x, y, depth + 1, state)
                    }
                }
            }
        }
    }

    /// Return the k closest indexed points to `(x, y)` with their distances,
    /// closest first.  If the tree has fewer than k points, returns all of
    /// them.  Points tied for the kth distance are kept in the order the
    /// search encountered them.  Requires `k >= 1`.
    pub fn knn_search(&self, x: T, y: T, k: usize) -> Vec<(Point<T>, T)> {
        assert!(k >= 1, "knn search requires k >= 1");
        let mut state = self.knn_run(x, y, k);
        let mut found = Vec::with_capacity(state.queue.len());
        while let Some(cand) = state.queue.pop_best() {
            found.push((cand.point, cand.dist))
        }
        found
    }

    fn knn_run(&self, x: T, y: T, k: usize) -> KnnState<T> {
        let mut state = KnnState{queue: BoundedPriorityQueue::new(k), visited: 0};
        self.knn_r(self.root, x, y, 0, &mut state);
        state
    }

    fn knn_r(&self, id: usize, x: T, y: T, depth: usize, state: &mut KnnState<T>) {
        state.visited += 1;
        match &self.nodes[id] {
            // the queue keeps the point only if it has room or the point
            // beats the current worst candidate
            Node::Leaf(point) => state.queue.insert(*point, point.distance(x, y)),
            Node::Internal{split, left, right, ..} => {
                let q = Axis::at_depth(depth).of(x, y);
                // prune_dist is None until the queue holds k candidates, so
                // no subtree is skipped while the queue is still filling.
                // It is re-read after the near descent, which may have filled
                // the queue or tightened its worst distance.
                if q < *split {
                    self.knn_r(*left, x, y, depth + 1, state);
                    if state.queue.prune_dist().map_or(true, |w|q + w > *split) {
                        self.knn_r(*right, x, y, depth + 1, state)
                    }
                } else {
                    self.knn_r(*right, x, y, depth + 1, state);
                    if state.queue.prune_dist().map_or(true, |w|q - w <= *split) {
                        self.knn_r(*left, x, y, depth + 1, state)
                    }
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn nn_search_visited(&self, x: T, y: T) -> usize {
        self.nn_run(x, y).visited
    }

    #[cfg(test)]
    pub(crate) fn knn_search_visited(&self, x: T, y: T, k: usize) -> usize {
        self.knn_run(x, y, k).visited
    }

    #[cfg(test)]
    pub(crate) fn range_naive(&self, query: &Region<T>) -> Vec<Point<T>> {
        self.iter_points().filter(|p|query.contains(p)).copied().collect()
    }

    #[cfg(test)]
    pub(crate) fn dist_range_naive(&self, x: T, y: T, min_dist: T, max_dist: T) -> Vec<Point<T>> {
        self.iter_points().copied().filter(|p|{
            let d = p.distance(x, y);
            d >= min_dist && d <= max_dist
        }).collect()
    }

    #[cfg(test)]
    pub(crate) fn knn_naive(&self, x: T, y: T, k: usize) -> Vec<(Point<T>, T)> {
        use std::cmp::Ordering;

        let mut all: Vec<_> = self.iter_points().map(|p|(*p, p.distance(x, y))).collect();
        all.sort_by(|a, b|a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        all.truncate(k);
        all
    }

    #[cfg(test)]
    pub(crate) fn check_tree(&self) -> bool {
        let mut leaves = 0;
        self.check_node(self.root, 0, &mut leaves)
            && leaves == self.len
            && self.nodes.len() == 2*self.len - 1
    }

    #[cfg(test)]
    fn check_node(&self, id: usize, depth: usize, leaves: &mut usize) -> bool {
        match &self.nodes[id] {
            Node::Leaf(_) => {
                *leaves += 1;
                true
            }
            Node::Internal{split, region, left, right} => {
                let axis = Axis::at_depth(depth);
                let mut lpts = Vec::new();
                self.report_subtree(*left, &mut lpts);
                if lpts.iter().any(|p|axis.coord(p) > *split) {
                    return false
                }
                let mut rpts = Vec::new();
                self.report_subtree(*right, &mut rpts);
                if rpts.iter().any(|p|axis.coord(p) < *split) {
                    return false
                }
                if depth == 0 {
                    if *region != Region::whole_plane() {
                        return false
                    }
                } else {
                    lpts.extend_from_slice(&rpts);
                    if Region::bounding(&lpts) != Some(*region) {
                        return false
                    }
                }
                self.check_node(*left, depth + 1, leaves)
                    && self.check_node(*right, depth + 1, leaves)
            }
        }
    }
}

impl<T: Float> FromIterator<Point<T>> for KdTree<T> {
    fn from_iter<I: IntoIterator<Item = Point<T>>>(iter: I) -> Self {
        Self::build(iter.into_iter().collect())
    }
}
