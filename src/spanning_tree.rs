use crate::{
    error::{GenerationError, Result},
    geometry::Point,
    graph::{edge_graph, Edge},
};

use petgraph::{graph::NodeIndex, visit::EdgeRef};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{
    cmp::Reverse,
    collections::{BTreeSet, BinaryHeap},
};

/// Min-heap of candidate edges keyed by exact squared length, then by the edge for ties.
type Frontier = BinaryHeap<Reverse<(i64, Edge, NodeIndex)>>;

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SpanningTree {
    /// In the order Prim's algorithm added them.
    pub edges: Vec<Edge>,
    /// Triangulation edges left out of the tree, sorted.
    pub removed: Vec<Edge>,
}

impl SpanningTree {
    pub fn total_length(&self) -> f64 {
        self.edges.iter().map(Edge::length).sum()
    }
}

/// Prim's minimum spanning tree over `edges`, starting from `points[0]`.
///
/// Candidates are ordered by exact squared length and then by the edge itself, so equal-weight
/// ties always break the same way. Fails with `DegenerateTriangulation` if `edges` does not
/// reach every point.
pub fn prim(points: &[Point], edges: &[Edge]) -> Result<SpanningTree> {
    let start = match points.first() {
        Some(p) => *p,
        None => return Ok(SpanningTree::default()),
    };

    let (graph, nodes) = edge_graph(points, edges);
    let mut in_tree = vec![false; graph.node_count()];
    let mut tree = Vec::with_capacity(points.len().saturating_sub(1));
    let mut frontier = Frontier::new();

    // Undirected edge references don't promise which end is `source`.
    let push_edges = |node: NodeIndex, in_tree: &[bool], frontier: &mut Frontier| {
        for e in graph.edges(node) {
            let other = if e.source() == node {
                e.target()
            } else {
                e.source()
            };
            if !in_tree[other.index()] {
                frontier.push(Reverse((e.weight().length_squared(), *e.weight(), other)));
            }
        }
    };

    let start_node = nodes[&start];
    in_tree[start_node.index()] = true;
    push_edges(start_node, &in_tree, &mut frontier);

    while let Some(Reverse((_, edge, node))) = frontier.pop() {
        if in_tree[node.index()] {
            continue;
        }
        in_tree[node.index()] = true;
        tree.push(edge);
        push_edges(node, &in_tree, &mut frontier);
    }

    let spanned = tree.len() + 1;
    if spanned < graph.node_count() {
        return Err(GenerationError::DegenerateTriangulation {
            spanned,
            expected: graph.node_count(),
        });
    }

    let tree_set: BTreeSet<Edge> = tree.iter().cloned().collect();
    let all_edges: BTreeSet<Edge> = edges.iter().cloned().collect();
    let removed: Vec<Edge> = all_edges.difference(&tree_set).cloned().collect();
    log::debug!(
        "Spanning tree has {} edges, {} removed",
        tree.len(),
        removed.len()
    );

    Ok(SpanningTree {
        edges: tree,
        removed,
    })
}

/// Which removed edges get added back to put loops in the dungeon.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum LoopPolicy {
    /// The dungeon is exactly the spanning tree.
    Never,
    /// Every triangulation edge becomes a hallway.
    All,
    /// Each removed edge is reinstated independently with this probability.
    Probability(f64),
}

impl Default for LoopPolicy {
    fn default() -> Self {
        LoopPolicy::Probability(0.15)
    }
}

impl LoopPolicy {
    pub fn validate(&self) -> Result<()> {
        match self {
            LoopPolicy::Probability(p) if !(0.0..=1.0).contains(p) => {
                Err(GenerationError::InvalidParameters(format!(
                    "loop probability must be in [0, 1] (got {})",
                    p
                )))
            }
            _ => Ok(()),
        }
    }

    /// Chooses from `removed` in order, so a seeded `rng` always picks the same edges.
    pub fn reinstate(&self, removed: &[Edge], rng: &mut impl Rng) -> Result<Vec<Edge>> {
        self.validate()?;

        let reinstated = match self {
            LoopPolicy::Never => Vec::new(),
            LoopPolicy::All => removed.to_vec(),
            LoopPolicy::Probability(p) => removed
                .iter()
                .filter(|_| rng.gen_bool(*p))
                .cloned()
                .collect(),
        };
        log::debug!(
            "Reinstated {} of {} removed edges",
            reinstated.len(),
            removed.len()
        );

        Ok(reinstated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::unique_edges,
        sampling::{sample_points, small_rng, SamplingSpec},
        triangulation::{triangulate, SuperTriangle},
    };

    use petgraph::{
        algo::{connected_components, is_cyclic_undirected},
        graph::UnGraph,
    };

    fn random_triangulation_edges(seed: u64, n: usize) -> (Vec<Point>, Vec<Edge>) {
        let points = sample_points(n, 900, 700, &SamplingSpec::default(), &mut small_rng(seed))
            .unwrap();
        let tri = triangulate(&points, &SuperTriangle::for_bounds(900, 700).unwrap()).unwrap();

        let edges = unique_edges(&tri.triangles);

        (points, edges)
    }

    fn assert_spanning_tree(points: &[Point], tree: &[Edge]) {
        assert_eq!(tree.len(), points.len() - 1);

        let (graph, _): (UnGraph<Point, Edge>, _) = edge_graph(points, tree);
        assert_eq!(connected_components(&graph), 1);
        assert!(!is_cyclic_undirected(&graph));
    }

    #[test]
    fn test_square_with_diagonal() {
        let a = Point::new(0, 0);
        let b = Point::new(10, 0);
        let c = Point::new(10, 10);
        let d = Point::new(0, 10);
        let edges = vec![
            Edge::new(a, b),
            Edge::new(b, c),
            Edge::new(c, d),
            Edge::new(d, a),
            Edge::new(a, c),
        ];
        let tree = prim(&[a, b, c, d], &edges).unwrap();

        assert_spanning_tree(&[a, b, c, d], &tree.edges);
        assert_eq!(tree.total_length(), 30.0);
        assert!(tree.removed.contains(&Edge::new(a, c)));
        assert_eq!(tree.removed.len(), 2);
    }

    #[test]
    fn test_three_points_give_two_edges() {
        let points = [Point::new(50, 60), Point::new(300, 80), Point::new(170, 320)];
        let tri = triangulate(&points, &SuperTriangle::for_bounds(400, 400).unwrap()).unwrap();
        let edges = unique_edges(&tri.triangles);
        let tree = prim(&points, &edges).unwrap();

        assert_eq!(tree.edges.len(), 2);
        assert_eq!(tree.removed.len(), 1);
        // The longest side is the one left out.
        let longest = edges.iter().max_by_key(|e| e.length_squared()).unwrap();
        assert_eq!(tree.removed[0], *longest);
    }

    #[test]
    fn test_random_trees_span_every_point() {
        for seed in 0..10 {
            let (points, edges) = random_triangulation_edges(seed, 20);
            let tree = prim(&points, &edges).unwrap();

            assert_spanning_tree(&points, &tree.edges);
            assert_eq!(tree.edges.len() + tree.removed.len(), edges.len());
        }
    }

    #[test]
    fn test_tree_is_minimal_against_kruskal() {
        let (points, edges) = random_triangulation_edges(3, 25);
        let tree = prim(&points, &edges).unwrap();

        let (graph, _) = edge_graph(&points, &edges);
        let lengths = graph.map(|_, p| *p, |_, e| e.length());
        let kruskal_length: f64 = petgraph::algo::min_spanning_tree(&lengths)
            .filter_map(|elem| match elem {
                petgraph::data::Element::Edge { weight, .. } => Some(weight),
                _ => None,
            })
            .sum();

        assert!((tree.total_length() - kruskal_length).abs() < 1e-6);
    }

    #[test]
    fn test_prim_is_deterministic_regardless_of_edge_order() {
        let (points, mut edges) = random_triangulation_edges(5, 20);
        let forward = prim(&points, &edges).unwrap();
        edges.reverse();
        let backward = prim(&points, &edges).unwrap();

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_unreachable_point_is_degenerate() {
        let points = [Point::new(0, 0), Point::new(10, 0), Point::new(20, 0)];
        let edges = [Edge::new(points[0], points[1])];

        assert!(matches!(
            prim(&points, &edges),
            Err(GenerationError::DegenerateTriangulation {
                spanned: 2,
                expected: 3
            })
        ));
    }

    #[test]
    fn test_loop_policies() {
        let (points, edges) = random_triangulation_edges(8, 20);
        let tree = prim(&points, &edges).unwrap();
        let mut rng = small_rng(0);

        assert!(LoopPolicy::Never
            .reinstate(&tree.removed, &mut rng)
            .unwrap()
            .is_empty());
        assert_eq!(
            LoopPolicy::All.reinstate(&tree.removed, &mut rng).unwrap(),
            tree.removed
        );

        let some = LoopPolicy::Probability(0.5)
            .reinstate(&tree.removed, &mut small_rng(11))
            .unwrap();
        let same = LoopPolicy::Probability(0.5)
            .reinstate(&tree.removed, &mut small_rng(11))
            .unwrap();
        assert_eq!(some, same);
        assert!(some.iter().all(|e| tree.removed.contains(e)));
    }

    #[test]
    fn test_bad_loop_probability() {
        assert!(matches!(
            LoopPolicy::Probability(1.5).reinstate(&[], &mut small_rng(0)),
            Err(GenerationError::InvalidParameters(_))
        ));
    }
}
