//! Balanced, immutable k-d tree over 4-component points.
//!
//! Built once by median splits; nodes live in a flat vector so the whole
//! tree serializes as plain data. Nearest-neighbour ties resolve to the
//! lowest point index.

use crate::color::oklab::distance_squared;
use serde::{Deserialize, Serialize};

pub const DIMS: usize = 4;
pub type Point = [f32; DIMS];

const NONE: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Node {
    point: u32,
    axis: u8,
    left: u32,
    right: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KdTree {
    nodes: Vec<Node>,
    root: u32,
}

impl KdTree {
    pub fn build(points: &[Point]) -> Self {
        let mut indices: Vec<u32> = (0..points.len() as u32).collect();
        let mut nodes = Vec::with_capacity(points.len());
        let root = build_recursive(points, &mut indices, 0, &mut nodes);
        KdTree { nodes, root }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Index and squared distance of the closest point to `query`.
    pub fn nearest(&self, points: &[Point], query: &Point) -> Option<(usize, f32)> {
        if self.root == NONE {
            return None;
        }
        let mut best = (NONE, f32::INFINITY);
        self.search(points, self.root, query, &mut best);
        // NaN distances never compare smaller, so nothing may have matched
        if best.0 == NONE {
            return None;
        }
        Some((best.0 as usize, best.1))
    }

    fn search(&self, points: &[Point], node_id: u32, query: &Point, best: &mut (u32, f32)) {
        let node = self.nodes[node_id as usize];
        let point = &points[node.point as usize];

        let dist = distance_squared(point, query);
        if dist < best.1 || (dist == best.1 && node.point < best.0) {
            *best = (node.point, dist);
        }

        let axis = node.axis as usize;
        let diff = query[axis] - point[axis];
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if near != NONE {
            self.search(points, near, query, best);
        }
        // `<=` keeps equidistant points with a lower index reachable
        if far != NONE && diff * diff <= best.1 {
            self.search(points, far, query, best);
        }
    }

    /// Check that the tree references exactly the points `0..count` and that
    /// every node is reachable from the root exactly once.
    pub fn validate(&self, count: usize) -> Result<(), String> {
        if self.nodes.len() != count {
            return Err(format!(
                "tree has {} nodes but {} points were supplied",
                self.nodes.len(),
                count
            ));
        }
        if count == 0 {
            return if self.root == NONE {
                Ok(())
            } else {
                Err("empty tree with a root".to_string())
            };
        }
        if self.root as usize >= count {
            return Err(format!("root {} out of range", self.root));
        }

        let mut seen = vec![false; count];
        for node in &self.nodes {
            let point = node.point as usize;
            if point >= count || seen[point] {
                return Err(format!("point {} referenced twice or out of range", point));
            }
            seen[point] = true;
            if node.axis as usize >= DIMS {
                return Err(format!("invalid split axis {}", node.axis));
            }
            for child in [node.left, node.right] {
                if child != NONE && child as usize >= count {
                    return Err(format!("child {} out of range", child));
                }
            }
        }

        let mut visited = vec![false; count];
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if visited[id as usize] {
                return Err(format!("node {} is linked more than once", id));
            }
            visited[id as usize] = true;
            let node = &self.nodes[id as usize];
            stack.extend([node.left, node.right].into_iter().filter(|&c| c != NONE));
        }
        if let Some(orphan) = visited.iter().position(|&v| !v) {
            return Err(format!("node {} is unreachable from the root", orphan));
        }
        Ok(())
    }
}

fn build_recursive(
    points: &[Point],
    indices: &mut [u32],
    depth: usize,
    nodes: &mut Vec<Node>,
) -> u32 {
    if indices.is_empty() {
        return NONE;
    }

    let axis = depth % DIMS;
    // total order on (coordinate, index) keeps the layout reproducible
    indices.sort_unstable_by(|a, b| {
        points[*a as usize][axis]
            .total_cmp(&points[*b as usize][axis])
            .then(a.cmp(b))
    });

    let median = indices.len() / 2;
    let node_id = nodes.len() as u32;
    nodes.push(Node {
        point: indices[median],
        axis: axis as u8,
        left: NONE,
        right: NONE,
    });

    let (left, rest) = indices.split_at_mut(median);
    let right = &mut rest[1..];
    let left_id = build_recursive(points, left, depth + 1, nodes);
    let right_id = build_recursive(points, right, depth + 1, nodes);

    let node = &mut nodes[node_id as usize];
    node.left = left_id;
    node.right = right_id;
    node_id
}
