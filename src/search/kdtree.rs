//! KD-trees over document vectors.
//!
//! Both trees split on the median of one coordinate per level, cycling
//! through the dimensions. [`NaiveKdTree`] answers single nearest neighbour
//! queries with an explicit stack; [`KdTree`] returns the k nearest with
//! branch pruning.

use crate::error::{RetrievalError, RetrievalResult};
use crate::vector::{Vector, calculate_distance};

#[derive(Debug)]
struct Node {
    point: usize,
    axis: usize,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

/// Points plus the median-split node hierarchy shared by both trees.
#[derive(Debug, Default)]
struct Layout {
    points: Vec<Vector>,
    root: Option<Box<Node>>,
}

impl Layout {
    fn build(points: Vec<Vector>) -> RetrievalResult<Self> {
        let Some(first) = points.first() else {
            return Err(RetrievalError::invalid_argument(
                "cannot build a KD-tree from no vectors",
            ));
        };
        let dimension = first.len();
        if dimension == 0 || points.iter().any(|p| p.len() != dimension) {
            return Err(RetrievalError::invalid_argument(
                "KD-tree vectors must be non-empty and of equal length",
            ));
        }

        let mut order: Vec<usize> = (0..points.len()).collect();
        let root = split(&points, &mut order, 0, dimension);
        Ok(Self { points, root })
    }

    fn distance(&self, query: &[f64], point: usize) -> RetrievalResult<f64> {
        calculate_distance(query, &self.points[point]).ok_or_else(|| {
            RetrievalError::computation(
                "KD-tree search",
                "query and indexed vectors differ in length",
            )
        })
    }

    fn check_query(&self, query: &[f64]) -> RetrievalResult<()> {
        if query.is_empty() {
            return Err(RetrievalError::invalid_argument("query vector is empty"));
        }
        if self.root.is_none() {
            return Err(RetrievalError::computation(
                "KD-tree search",
                "tree has not been built",
            ));
        }
        Ok(())
    }
}

fn split(points: &[Vector], order: &mut [usize], depth: usize, dimension: usize) -> Option<Box<Node>> {
    if order.is_empty() {
        return None;
    }
    let axis = depth % dimension;
    order.sort_by(|a, b| points[*a][axis].total_cmp(&points[*b][axis]));
    let median = order.len() / 2;
    let point = order[median];
    let (left, rest) = order.split_at_mut(median);
    let right = &mut rest[1..];

    Some(Box::new(Node {
        point,
        axis,
        left: split(points, left, depth + 1, dimension),
        right: split(points, right, depth + 1, dimension),
    }))
}

/// KD-tree answering single nearest neighbour queries.
#[derive(Debug, Default)]
pub struct NaiveKdTree {
    layout: Layout,
}

impl NaiveKdTree {
    /// Build a tree over `points`; positions in `points` are the ids returned
    /// by [`NaiveKdTree::query`].
    pub fn build(points: Vec<Vector>) -> RetrievalResult<Self> {
        Ok(Self {
            layout: Layout::build(points)?,
        })
    }

    /// The closest indexed point as a single `(distance, position)` pair.
    pub fn query(&self, vector: &[f64]) -> RetrievalResult<Vec<(f64, usize)>> {
        self.layout.check_query(vector)?;

        let mut best: Option<(f64, usize)> = None;
        let mut stack: Vec<&Node> = self.layout.root.as_deref().into_iter().collect();
        while let Some(node) = stack.pop() {
            let distance = self.layout.distance(vector, node.point)?;
            if best.is_none_or(|(best_distance, _)| distance < best_distance) {
                best = Some((distance, node.point));
            }

            let offset = vector[node.axis] - self.layout.points[node.point][node.axis];
            let (near, far) = if offset < 0.0 {
                (&node.left, &node.right)
            } else {
                (&node.right, &node.left)
            };
            let radius = best.map_or(f64::INFINITY, |(d, _)| d);
            if offset.abs() < radius {
                if let Some(far) = far.as_deref() {
                    stack.push(far);
                }
            }
            if let Some(near) = near.as_deref() {
                stack.push(near);
            }
        }

        Ok(best.into_iter().collect())
    }
}

/// KD-tree answering k nearest neighbour queries.
#[derive(Debug, Default)]
pub struct KdTree {
    layout: Layout,
}

impl KdTree {
    /// Build a tree over `points`; positions in `points` are the ids returned
    /// by [`KdTree::query`].
    pub fn build(points: Vec<Vector>) -> RetrievalResult<Self> {
        Ok(Self {
            layout: Layout::build(points)?,
        })
    }

    /// Up to `k` closest points as `(distance, position)`, ascending.
    pub fn query(&self, vector: &[f64], k: usize) -> RetrievalResult<Vec<(f64, usize)>> {
        if k == 0 {
            return Err(RetrievalError::invalid_argument(
                "number of neighbours must be greater than zero",
            ));
        }
        self.layout.check_query(vector)?;

        let mut best = Vec::with_capacity(k + 1);
        self.search(self.layout.root.as_deref(), vector, k, &mut best)?;
        Ok(best)
    }

    fn search(
        &self,
        node: Option<&Node>,
        vector: &[f64],
        k: usize,
        best: &mut Vec<(f64, usize)>,
    ) -> RetrievalResult<()> {
        let Some(node) = node else {
            return Ok(());
        };

        let distance = self.layout.distance(vector, node.point)?;
        let position = best.partition_point(|(d, _)| *d <= distance);
        if position < k {
            best.insert(position, (distance, node.point));
            best.truncate(k);
        }

        let offset = vector[node.axis] - self.layout.points[node.point][node.axis];
        let (near, far) = if offset < 0.0 {
            (&node.left, &node.right)
        } else {
            (&node.right, &node.left)
        };
        self.search(near.as_deref(), vector, k, best)?;

        let worst = if best.len() < k {
            f64::INFINITY
        } else {
            best.last().map_or(f64::INFINITY, |(d, _)| *d)
        };
        if offset.abs() < worst {
            self.search(far.as_deref(), vector, k, best)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points() -> Vec<Vector> {
        vec![
            vec![2.0, 3.0],
            vec![5.0, 4.0],
            vec![9.0, 6.0],
            vec![4.0, 7.0],
            vec![8.0, 1.0],
            vec![7.0, 2.0],
        ]
    }

    fn brute_force(query: &[f64], k: usize) -> Vec<usize> {
        let mut all: Vec<(f64, usize)> = points()
            .iter()
            .enumerate()
            .map(|(i, p)| (calculate_distance(query, p).unwrap(), i))
            .collect();
        all.sort_by(|a, b| a.0.total_cmp(&b.0));
        all.into_iter().take(k).map(|(_, i)| i).collect()
    }

    #[test]
    fn test_naive_tree_finds_nearest() {
        let tree = NaiveKdTree::build(points()).unwrap();
        for query in [[9.0, 2.0], [3.0, 4.5], [0.0, 0.0], [6.0, 6.5]] {
            let result = tree.query(&query).unwrap();
            assert_eq!(result.len(), 1);
            assert_eq!(result[0].1, brute_force(&query, 1)[0]);
        }
    }

    #[test]
    fn test_kd_tree_matches_brute_force() {
        let tree = KdTree::build(points()).unwrap();
        for query in [[9.0, 2.0], [3.0, 4.5], [0.0, 0.0], [6.0, 6.5]] {
            let result = tree.query(&query, 3).unwrap();
            let ids: Vec<usize> = result.iter().map(|(_, i)| *i).collect();
            assert_eq!(ids, brute_force(&query, 3));
            assert!(result.windows(2).all(|pair| pair[0].0 <= pair[1].0));
        }
    }

    #[test]
    fn test_kd_tree_k_larger_than_points() {
        let tree = KdTree::build(points()).unwrap();
        assert_eq!(tree.query(&[1.0, 1.0], 50).unwrap().len(), 6);
        assert!(tree.query(&[1.0, 1.0], 0).is_err());
    }

    #[test]
    fn test_build_and_query_validation() {
        assert!(KdTree::build(Vec::new()).is_err());
        assert!(NaiveKdTree::build(vec![vec![1.0], vec![1.0, 2.0]]).is_err());

        let tree = KdTree::build(points()).unwrap();
        assert!(tree.query(&[], 1).is_err());
        assert!(matches!(
            tree.query(&[1.0, 2.0, 3.0], 1),
            Err(RetrievalError::ComputationFailure { .. })
        ));
        assert!(NaiveKdTree::default().query(&[1.0]).is_err());
    }
}
