//! Exact k-nearest-neighbor lookup over integer 3-D points.
//!
//! Points are bucketed into a dense grid with one cell per integer coordinate. A query
//! scans cubes of growing radius `r` around the query point. Every point outside the
//! cube is farther than `r`, so once at least `k` scanned points lie within distance `r`
//! (or the cube covers the whole grid) the `k` closest scanned points are the exact
//! answer.
//!
//! Distances are squared Euclidean; ties are broken by the lower point index, so
//! results are deterministic.

/// A 3-D integer point.
pub type Point = [i32; 3];

/// A query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub index: usize,
    pub distance_squared: i64,
}

/// Grid-bucketed point set.
#[derive(Debug, Clone)]
pub struct GridIndex {
    points: Vec<Point>,
    min: Point,
    max: Point,
    extent: [usize; 3],
    cells: Vec<Vec<usize>>,
}

impl GridIndex {
    /// Builds the index. Point `i` is reported as neighbor index `i`.
    #[expect(clippy::cast_sign_loss)]
    #[must_use]
    pub fn new(points: Vec<Point>) -> Self {
        let mut min = [i32::MAX; 3];
        let mut max = [i32::MIN; 3];
        for p in &points {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        if points.is_empty() {
            min = [0; 3];
            max = [0; 3];
        }
        let extent = [0, 1, 2].map(|axis| (max[axis] - min[axis]) as usize + 1);

        let mut index = Self {
            points,
            min,
            max,
            extent,
            cells: vec![vec![]; extent.iter().product()],
        };
        for i in 0..index.points.len() {
            let cell = index.cell_of(index.points[i]);
            index.cells[cell].push(i);
        }
        index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn point(&self, index: usize) -> Point {
        self.points[index]
    }

    #[expect(clippy::cast_sign_loss)]
    fn cell_of(&self, p: Point) -> usize {
        let [x, y, z] = [0, 1, 2].map(|axis| (p[axis] - self.min[axis]) as usize);
        (x * self.extent[1] + y) * self.extent[2] + z
    }

    /// Returns the `k` points closest to `query`, nearest first.
    ///
    /// Returns fewer than `k` neighbors only when the index holds fewer than `k` points.
    #[must_use]
    pub fn nearest(&self, query: Point, k: usize) -> Vec<Neighbor> {
        let k = k.min(self.points.len());
        if k == 0 {
            return vec![];
        }

        let mut radius: i32 = 0;
        loop {
            let lo = [0, 1, 2].map(|axis| (query[axis] - radius).max(self.min[axis]));
            let hi = [0, 1, 2].map(|axis| (query[axis] + radius).min(self.max[axis]));
            let covers_grid = (0..3).all(|axis| {
                query[axis] - radius <= self.min[axis] && query[axis] + radius >= self.max[axis]
            });

            let mut found = vec![];
            let mut settled = 0;
            let radius_squared = i64::from(radius).pow(2);
            if (0..3).all(|axis| lo[axis] <= hi[axis]) {
                for x in lo[0]..=hi[0] {
                    for y in lo[1]..=hi[1] {
                        for z in lo[2]..=hi[2] {
                            for &i in &self.cells[self.cell_of([x, y, z])] {
                                let distance_squared = distance_squared(query, self.points[i]);
                                if distance_squared <= radius_squared {
                                    settled += 1;
                                }
                                found.push(Neighbor {
                                    index: i,
                                    distance_squared,
                                });
                            }
                        }
                    }
                }
            }

            if settled >= k || covers_grid {
                found.sort_by_key(|n| (n.distance_squared, n.index));
                found.truncate(k);
                return found;
            }
            radius += 1;
        }
    }
}

fn distance_squared(a: Point, b: Point) -> i64 {
    (0..3)
        .map(|axis| (i64::from(a[axis]) - i64::from(b[axis])).pow(2))
        .sum()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn brute_force(points: &[Point], query: Point, k: usize) -> Vec<Neighbor> {
        let mut all: Vec<_> = points
            .iter()
            .enumerate()
            .map(|(index, &p)| Neighbor {
                index,
                distance_squared: distance_squared(query, p),
            })
            .collect();
        all.sort_by_key(|n| (n.distance_squared, n.index));
        all.truncate(k);
        all
    }

    #[test]
    fn test_self_is_nearest() {
        let points = vec![[1, 1, 1], [1, 1, 2], [2, 1, 1], [4, 25, 99]];
        let index = GridIndex::new(points);
        let result = index.nearest([1, 1, 1], 3);
        assert_eq!(result[0], Neighbor { index: 0, distance_squared: 0 });
        // two points tie at distance 1; lower index first
        assert_eq!(result[1].index, 1);
        assert_eq!(result[2].index, 2);
    }

    #[test]
    fn test_k_larger_than_point_count() {
        let index = GridIndex::new(vec![[0, 0, 0], [10, 10, 10]]);
        let result = index.nearest([0, 0, 0], 5);
        assert_eq!(result.len(), 2);
        assert_eq!(result[1].distance_squared, 300);
    }

    #[test]
    fn test_empty_index() {
        let index = GridIndex::new(vec![]);
        assert!(index.nearest([0, 0, 0], 3).is_empty());
    }

    #[test]
    fn test_query_outside_bounds() {
        let index = GridIndex::new(vec![[0, 0, 0], [1, 0, 0], [5, 5, 5]]);
        let result = index.nearest([-3, 0, 0], 2);
        assert_eq!(result.iter().map(|n| n.index).collect::<Vec<_>>(), vec![0, 1]);
    }

    proptest! {
        #[test]
        fn prop_matches_brute_force(
            points in prop::collection::vec((0..5i32, 0..8i32, 0..12i32), 1..60),
            query in (0..5i32, 0..8i32, 0..12i32),
            k in 1..12usize,
        ) {
            let points: Vec<Point> = points.into_iter().map(|(x, y, z)| [x, y, z]).collect();
            let query = [query.0, query.1, query.2];
            let index = GridIndex::new(points.clone());
            prop_assert_eq!(index.nearest(query, k), brute_force(&points, query, k));
        }
    }
}
