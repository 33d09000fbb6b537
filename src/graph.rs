use crate::{geometry::Point, triangulation::Triangle};

use fnv::FnvHashMap;
use petgraph::{
    graph::{NodeIndex, UnGraph},
    graphmap::UnGraphMap,
    visit::Bfs,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An undirected edge. The endpoints are stored in canonical (sorted) order, so `Edge::new(a, b)
/// == Edge::new(b, a)`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Edge {
    pub a: Point,
    pub b: Point,
}

impl Edge {
    pub fn new(p1: Point, p2: Point) -> Self {
        if p1 <= p2 {
            Edge { a: p1, b: p2 }
        } else {
            Edge { a: p2, b: p1 }
        }
    }

    /// Exact, so it can order edges without float ties.
    pub fn length_squared(&self) -> i64 {
        self.a.distance_squared(&self.b)
    }

    pub fn length(&self) -> f64 {
        self.a.distance(&self.b)
    }

    pub fn has_endpoint(&self, p: &Point) -> bool {
        self.a == *p || self.b == *p
    }

    /// The endpoint that isn't `p`, if `p` is an endpoint.
    pub fn other(&self, p: &Point) -> Option<Point> {
        if self.a == *p {
            Some(self.b)
        } else if self.b == *p {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Every triangle side exactly once, sorted by canonical order. The result doesn't depend on the
/// order of `triangles`.
pub fn unique_edges(triangles: &[Triangle]) -> Vec<Edge> {
    let edges: BTreeSet<Edge> = triangles.iter().flat_map(|t| t.edges().to_vec()).collect();

    edges.into_iter().collect()
}

/// Builds a petgraph graph over `points` with one graph edge per `edges` entry. Also returns the
/// node index of every point.
pub fn edge_graph(
    points: &[Point],
    edges: &[Edge],
) -> (UnGraph<Point, Edge>, FnvHashMap<Point, NodeIndex>) {
    let mut graph = UnGraph::with_capacity(points.len(), edges.len());
    let mut nodes = FnvHashMap::default();
    for p in points.iter() {
        nodes.entry(*p).or_insert_with(|| graph.add_node(*p));
    }
    for e in edges.iter() {
        let a = *nodes.entry(e.a).or_insert_with(|| graph.add_node(e.a));
        let b = *nodes.entry(e.b).or_insert_with(|| graph.add_node(e.b));
        graph.add_edge(a, b, *e);
    }

    (graph, nodes)
}

/// The final dungeon connectivity: each anchor point maps to the anchors it has a hallway to.
///
/// Iteration order follows insertion order, which keeps routing deterministic.
#[derive(Clone, Debug, Default)]
pub struct DungeonGraph {
    graph: UnGraphMap<Point, Edge>,
}

impl DungeonGraph {
    /// Exactly the union of `edges`; points with no edge are not included.
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a Edge>) -> Self {
        let mut graph = UnGraphMap::new();
        for e in edges.into_iter() {
            graph.add_edge(e.a, e.b, *e);
        }

        DungeonGraph { graph }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_node(&self, p: Point) -> bool {
        self.graph.contains_node(p)
    }

    pub fn contains_edge(&self, a: Point, b: Point) -> bool {
        self.graph.contains_edge(a, b)
    }

    pub fn nodes(&self) -> impl Iterator<Item = Point> + '_ {
        self.graph.nodes()
    }

    pub fn neighbors(&self, p: Point) -> impl Iterator<Item = Point> + '_ {
        self.graph.neighbors(p)
    }

    pub fn degree(&self, p: Point) -> usize {
        self.neighbors(p).count()
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.graph.all_edges().map(|(_, _, e)| *e)
    }

    pub fn is_connected(&self) -> bool {
        let start = match self.graph.nodes().next() {
            Some(p) => p,
            None => return true,
        };

        let mut bfs = Bfs::new(&self.graph, start);
        let mut reached = 0;
        while bfs.next(&self.graph).is_some() {
            reached += 1;
        }

        reached == self.graph.node_count()
    }
}
