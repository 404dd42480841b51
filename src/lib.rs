//! A 2D kd-tree for orthogonal range queries, radius/annulus queries, and
//! (k-)nearest-neighbor search over a static set of points, each carrying an
//! opaque integer identifier.  The tree is built once from a vector of points
//! and is read-only afterwards; every query keeps its own local state, so a
//! built tree can be queried from multiple threads without synchronization.
//!
//! Coordinates are generic over any [`num_traits::Float`], defaulting to
//! `f32`.  Preconditions (non-empty build input, positive radius, ordered
//! annulus bounds, k >= 1) are programmer errors and are enforced with
//! panicking assertions rather than recoverable results.

pub mod bpq;
pub mod geom;
pub mod kdtree;

pub use bpq::{BoundedPriorityQueue, Candidate};
pub use geom::{Axis, Point, Region};
pub use kdtree::KdTree;
