use std::cmp::Ordering;

use num_traits::Float;

/// A 2D point with an opaque caller-supplied identifier.
/// The identifier is not validated or deduplicated; coordinates are
/// whatever floating type the tree is instantiated with (`f32` by default).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<T = f32> {
    pub x: T,
    pub y: T,
    pub id: i32
}

impl<T: Float> Point<T> {
    pub fn new(x: T, y: T, id: i32) -> Self {
        Self{x, y, id}
    }

    /// Euclidean distance from this point to `(x, y)`.
    /// The true (square rooted) distance is needed so that search code can
    /// compare it against coordinate offsets from split values.
    pub fn distance(&self, x: T, y: T) -> T {
        let dx = self.x - x;
        let dy = self.y - y;
        (dx*dx + dy*dy).sqrt()
    }
}

/// The coordinate a given tree depth partitions on.
/// Even depths (the root is depth 0) split on x, odd depths on y.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y
}

impl Axis {
    pub fn at_depth(depth: usize) -> Self {
        if depth & 1 == 0 { Self::X } else { Self::Y }
    }

    /// The coordinate of `point` on this axis
    pub fn coord<T: Float>(self, point: &Point<T>) -> T {
        match self { Self::X => point.x, Self::Y => point.y }
    }

    /// The coordinate of a raw `(x, y)` query pair on this axis
    pub fn of<T: Float>(self, x: T, y: T) -> T {
        match self { Self::X => x, Self::Y => y }
    }

    /// Order two points by their coordinate on this axis.
    /// NaN coordinates compare equal to everything; indexing NaN is a caller
    /// error the tree does not attempt to detect.
    pub fn cmp_points<T: Float>(self, a: &Point<T>, b: &Point<T>) -> Ordering {
        self.coord(a).partial_cmp(&self.coord(b)).unwrap_or(Ordering::Equal)
    }
}

/// An axis-aligned rectangle, closed on all four edges.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region<T = f32> {
    pub min_x: T,
    pub min_y: T,
    pub max_x: T,
    pub max_y: T
}

impl<T: Float> Region<T> {
    pub fn new(min_x: T, min_y: T, max_x: T, max_y: T) -> Self {
        Self{min_x, min_y, max_x, max_y}
    }

    /// The region spanning the entire plane, unbounded on all sides.
    /// Used as the root node's region so that no query is ever pruned at the
    /// root merely because it extends past the data's bounding box.
    pub fn whole_plane() -> Self {
        Self{
            min_x: T::neg_infinity(), min_y: T::neg_infinity(),
            max_x: T::infinity(), max_y: T::infinity()
        }
    }

    /// The degenerate region covering exactly one point
    pub fn of_point(point: &Point<T>) -> Self {
        Self{min_x: point.x, min_y: point.y, max_x: point.x, max_y: point.y}
    }

    /// True if `point` lies within this region, boundary inclusive
    pub fn contains(&self, point: &Point<T>) -> bool {
        point.x >= self.min_x && point.x <= self.max_x &&
        point.y >= self.min_y && point.y <= self.max_y
    }

    /// True if this region fully encloses `other`
    pub fn encloses(&self, other: &Self) -> bool {
        other.min_x >= self.min_x && other.max_x <= self.max_x &&
        other.min_y >= self.min_y && other.max_y <= self.max_y
    }

    /// True if the closed intervals of this region and `other` intersect on
    /// both axes (touching edges count as overlap)
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min_x <= other.max_x && other.min_x <= self.max_x &&
        self.min_y <= other.max_y && other.min_y <= self.max_y
    }

    /// Grow this region the minimal amount needed to cover `point`
    pub fn extend(&mut self, point: &Point<T>) {
        self.min_x = self.min_x.min(point.x);
        self.min_y = self.min_y.min(point.y);
        self.max_x = self.max_x.max(point.x);
        self.max_y = self.max_y.max(point.y);
    }

    /// Compute the tight bounding box of a set of points,
    /// or None if the set is empty
    pub fn bounding(points: &[Point<T>]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut res = Self::of_point(first);
        rest.iter().for_each(|p|res.extend(p));
        Some(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_edge_inclusive() {
        let r = Region::new(0.0f32, 0.0, 10.0, 10.0);
        for (x, y) in [(0.0, 0.0), (10.0, 10.0), (0.0, 10.0), (10.0, 0.0), (5.0, 10.0), (0.0, 5.0)] {
            if !r.contains(&Point::new(x, y, 0)) {
                panic!("({}, {}) should be inside {:?}", x, y, r)
            }
        }
        for (x, y) in [(-0.001, 5.0), (5.0, 10.001), (11.0, 5.0), (5.0, -1.0)] {
            if r.contains(&Point::new(x, y, 0)) {
                panic!("({}, {}) should be outside {:?}", x, y, r)
            }
        }
    }

    #[test]
    fn overlap_counts_touching_edges() {
        let r = Region::new(0.0f32, 0.0, 10.0, 10.0);
        assert!(r.overlaps(&Region::new(10.0, 10.0, 20.0, 20.0)));
        assert!(r.overlaps(&Region::new(-5.0, -5.0, 0.0, 0.0)));
        assert!(r.overlaps(&Region::new(2.0, 2.0, 3.0, 3.0)));
        assert!(r.overlaps(&Region::new(-5.0, -5.0, 15.0, 15.0)));
        assert!(!r.overlaps(&Region::new(10.1, 0.0, 20.0, 10.0)));
        assert!(!r.overlaps(&Region::new(0.0, -20.0, 10.0, -0.1)));
    }

    #[test]
    fn encloses_requires_full_enclosure() {
        let r = Region::new(0.0f32, 0.0, 10.0, 10.0);
        assert!(r.encloses(&Region::new(0.0, 0.0, 10.0, 10.0)));
        assert!(r.encloses(&Region::new(2.0, 2.0, 8.0, 8.0)));
        assert!(!r.encloses(&Region::new(2.0, 2.0, 8.0, 10.5)));
        assert!(Region::whole_plane().encloses(&r));
        assert!(!r.encloses(&Region::<f32>::whole_plane()));
    }

    #[test]
    fn whole_plane_is_unbounded() {
        let r = Region::whole_plane();
        assert!(r.contains(&Point::new(f32::MAX, f32::MIN, 0)));
        assert!(r.contains(&Point::new(-1e30, 1e30, 1)));
        assert!(r.overlaps(&Region::new(1e20, 1e20, 1e21, 1e21)));
    }

    #[test]
    fn bounding_covers_all_points() {
        let points = [
            Point::new(3.0f32, -1.0, 0),
            Point::new(-2.0, 7.0, 1),
            Point::new(0.5, 0.5, 2)
        ];
        let r = Region::bounding(&points).unwrap();
        assert_eq!(r, Region::new(-2.0, -1.0, 3.0, 7.0));
        assert!(points.iter().all(|p|r.contains(p)));
        assert!(Region::<f32>::bounding(&[]).is_none());
    }

    #[test]
    fn axis_alternates_by_depth() {
        assert_eq!(Axis::at_depth(0), Axis::X);
        assert_eq!(Axis::at_depth(1), Axis::Y);
        assert_eq!(Axis::at_depth(2), Axis::X);
        assert_eq!(Axis::at_depth(7), Axis::Y);
        let p = Point::new(3.0f32, 4.0, 9);
        assert_eq!(Axis::X.coord(&p), 3.0);
        assert_eq!(Axis::Y.coord(&p), 4.0);
        assert_eq!(Axis::Y.of(1.0f32, 2.0), 2.0);
    }
}
