use std::cmp::{max, Ordering};

use num_traits::Float;

use crate::geom::Point;

/// A point kept by the queue together with its distance from the query.
/// `seq` records insertion order and breaks distance ties, so draining the
/// queue yields equidistant points in the order they were offered.
#[derive(Clone, Copy, Debug)]
pub struct Candidate<T = f32> {
    pub point: Point<T>,
    pub dist: T,
    seq: u64
}

impl<T: Float> Candidate<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist.partial_cmp(&other.dist).unwrap_or(Ordering::Equal)
            .then(self.seq.cmp(&other.seq))
    }
}

/// A fixed-capacity priority queue holding the k closest candidates seen so
/// far, backed by an implicit min-max heap so both ends are cheap:
/// - Peek worst: O(1)
/// - Pop best / insert: O(log(k))
/// Once at capacity, a new candidate is admitted only if it is strictly
/// closer than the current worst kept candidate, which it then evicts.
#[derive(Debug)]
pub struct BoundedPriorityQueue<T = f32> {
    buf: Vec<Candidate<T>>,
    cap: usize,
    next_seq: u64
}

impl<T: Float> BoundedPriorityQueue<T> {
    /// Create an empty queue that will retain at most `cap` candidates
    pub fn new(cap: usize) -> Self {
        assert!(cap >= 1, "bounded priority queue requires capacity >= 1");
        // one slot of headroom: insert pushes before evicting
        Self{buf: Vec::with_capacity(cap + 1), cap, next_seq: 0}
    }

    /// Get the number of candidates currently held
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// True once the queue holds its full complement of `cap` candidates
    pub fn is_full(&self) -> bool {
        self.buf.len() >= self.cap
    }

    /// The distance of the worst kept candidate, available only once the
    /// queue is at capacity.  Search code must not prune subtrees while this
    /// is None: a partial queue places no bound on what may still be found.
    pub fn prune_dist(&self) -> Option<T> {
        if self.is_full() { self.peek_worst().map(|c|c.dist) } else { None }
    }

    /// Get the worst (farthest) kept candidate without removing it
    pub fn peek_worst(&self) -> Option<&Candidate<T>> {
        match self.buf.get(1..3) {
            Some(pair) => pair.iter().max_by(|a, b|a.cmp(b)),
            None => self.buf.get(max(self.buf.len(), 1) - 1)
        }
    }

    /// Offer a candidate to the queue.  Below capacity it is always kept;
    /// at capacity it displaces the worst candidate only if strictly closer.
    /// A candidate tying the worst distance is discarded, keeping the
    /// earlier-inserted point.
    pub fn insert(&mut self, point: Point<T>, dist: T) {
        let cand = Candidate{point, dist, seq: self.next_seq};
        self.next_seq += 1;
        self.buf.push(cand);
        self.sift_up(self.buf.len() - 1);
        if self.buf.len() > self.cap {
            let _ = self.pop_worst();
        }
    }

    /// Remove and return the best (closest) candidate.
    /// Distance ties come out in insertion order.
    pub fn pop_best(&mut self) -> Option<Candidate<T>> {
        self.pop_idx(0)
    }

    fn pop_worst(&mut self) -> Option<Candidate<T>> {
        match self.buf.get(1..3) {
            Some(pair) => {
                let off = pair.iter().enumerate().max_by(|(_, a), (_, b)|a.cmp(b)).map(|(j, _)|j);
                self.pop_idx(1 + off.unwrap())
            }
            None => self.buf.pop()
        }
    }

    fn pop_idx(&mut self, i: usize) -> Option<Candidate<T>> {
        let l = self.buf.len();
        if i + 1 >= l
            { return self.buf.pop() }
        self.buf.swap(i, l - 1);
        let res = self.buf.pop();
        self.sift_down(i);
        res
    }

    fn sift_up(&mut self, mut i: usize) {
        if i == 0 || i >= self.buf.len()
            { return }
        // nodes with index i are in layer n where 2^n is the maximal power of 2 <= i + 1,
        // so the parity of n is the parity of the leading zero count of (i + 1).
        // In min layers nodes are <= their descendants, in max layers >=.
        let mut ord = match (i + 1).leading_zeros()&1
            { 1 => Ordering::Less, _ => Ordering::Greater };
        let mut i1 = (i - 1) >> 1;
        if self.buf[i1].cmp(&self.buf[i]) == ord {
            self.buf.swap(i, i1);
            i = i1;
            ord = ord.reverse()
        }
        while i > 2 {
            i1 = (i - 3) >> 2;
            if self.buf[i].cmp(&self.buf[i1]) == ord {
                self.buf.swap(i, i1);
                i = i1
            } else { break }
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let ord = match (i + 1).leading_zeros()&1
            { 1 => Ordering::Less, _ => Ordering::Greater };
        while 2*i + 1 < self.buf.len() {
            // Find m, the index of the extremal element among the children
            // and grandchildren of i: minimal in min layers, maximal in max layers
            let mut m = 2*i + 1;
            for j in [2*i + 2, 4*i + 3, 4*i + 4, 4*i + 5, 4*i + 6].into_iter().take_while(|&j|j < self.buf.len()) {
                if self.buf[j].cmp(&self.buf[m]) == ord
                    { m = j }
            }
            // If m is a grandchild of i (the common case)
            // we may have to keep sifting down after fixing up here
            if m > 2*i + 2 {
                if self.buf[m].cmp(&self.buf[i]) == ord {
                    self.buf.swap(m, i);
                    let p = (m - 1) >> 1;
                    if self.buf[p].cmp(&self.buf[m]) == ord
                        { self.buf.swap(m, p) }
                    i = m;
                } else { break }
            } else {// otherwise m is a direct child so it must be a leaf or its invariant would be wrong
                if self.buf[m].cmp(&self.buf[i]) == ord
                    { self.buf.swap(m, i) }
                break
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(id: i32) -> Point<f32> {
        Point::new(id as f32, 0.0, id)
    }

    fn drain_ids(mut q: BoundedPriorityQueue<f32>) -> Vec<i32> {
        let mut ids = Vec::new();
        while let Some(c) = q.pop_best() {
            ids.push(c.point.id)
        }
        ids
    }

    #[test]
    fn keeps_everything_below_capacity() {
        let mut q = BoundedPriorityQueue::new(10);
        for (id, d) in [(0, 5.0f32), (1, 1.0), (2, 9.0), (3, 3.0)] {
            q.insert(pt(id), d);
        }
        assert_eq!(q.len(), 4);
        assert!(!q.is_full());
        assert_eq!(q.prune_dist(), None);
        assert_eq!(drain_ids(q), vec![1, 3, 0, 2]);
    }

    #[test]
    fn evicts_worst_when_full() {
        let mut q = BoundedPriorityQueue::new(3);
        for (id, d) in [(0, 5.0f32), (1, 1.0), (2, 9.0)] {
            q.insert(pt(id), d);
        }
        assert!(q.is_full());
        assert_eq!(q.peek_worst().unwrap().point.id, 2);
        assert_eq!(q.prune_dist(), Some(9.0));
        q.insert(pt(3), 3.0);
        assert_eq!(q.len(), 3);
        assert_eq!(q.prune_dist(), Some(5.0));
        assert_eq!(drain_ids(q), vec![1, 3, 0]);
    }

    #[test]
    fn rejects_candidates_not_strictly_closer() {
        let mut q = BoundedPriorityQueue::new(2);
        q.insert(pt(0), 1.0);
        q.insert(pt(1), 2.0);
        // ties the current worst, so the earlier point must be kept
        q.insert(pt(2), 2.0);
        // farther than the current worst
        q.insert(pt(3), 7.0);
        assert_eq!(drain_ids(q), vec![0, 1]);
    }

    #[test]
    fn distance_ties_pop_in_insertion_order() {
        let mut q = BoundedPriorityQueue::new(8);
        for id in [4, 2, 7, 1] {
            q.insert(pt(id), 6.0);
        }
        assert_eq!(drain_ids(q), vec![4, 2, 7, 1]);
    }

    #[test]
    fn pop_order_matches_sorted_distances() {
        let mut q = BoundedPriorityQueue::new(32);
        let dists = [13.0f32, 0.5, 8.0, 8.0, 2.25, 100.0, 41.0, 0.75, 19.0, 3.5];
        for (id, &d) in dists.iter().enumerate() {
            q.insert(pt(id as i32), d);
        }
        let mut expected = dists.to_vec();
        expected.sort_by(|a, b|a.partial_cmp(b).unwrap());
        let mut got = Vec::new();
        let mut worst = *q.peek_worst().unwrap();
        assert_eq!(worst.dist, 100.0);
        while let Some(c) = q.pop_best() {
            worst = c;
            got.push(c.dist)
        }
        assert_eq!(got, expected);
        assert_eq!(worst.dist, 100.0);
    }

    #[test]
    #[should_panic(expected = "capacity >= 1")]
    fn zero_capacity_is_rejected() {
        let _ = BoundedPriorityQueue::<f32>::new(0);
    }
}
