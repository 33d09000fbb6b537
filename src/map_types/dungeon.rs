use crate::{
    error::{GenerationError, Result},
    extent::Extent,
    geometry::Point,
    graph::{unique_edges, DungeonGraph, Edge},
    hallway::{fill_map_with_doors, fill_map_with_hallways, route_hallways, Hallway},
    room::{fill_map_with_rooms, place_rooms, Room, RoomSpec},
    sampling::{sample_points, small_rng, SamplingSpec},
    spanning_tree::{prim, LoopPolicy, SpanningTree},
    summary::{LayoutStats, Summary},
    triangulation::{triangulate, SuperTriangle, Triangulation},
    TileEncoder,
};

use rand::Rng;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

pub const MAX_GENERATE_TRIES: usize = 20;

/// Everything needed to reproduce a dungeon.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct DungeonSpec {
    pub seed: u64,
    pub node_count: usize,
    pub width: i32,
    pub height: i32,
    /// Only used by `generate_with_retries`.
    pub max_generate_tries: usize,
    pub sampling: SamplingSpec,
    pub rooms: RoomSpec,
    pub loops: LoopPolicy,
}

impl Default for DungeonSpec {
    fn default() -> Self {
        DungeonSpec {
            seed: 0,
            node_count: 8,
            width: 800,
            height: 600,
            max_generate_tries: MAX_GENERATE_TRIES,
            sampling: SamplingSpec::default(),
            rooms: RoomSpec::default(),
            loops: LoopPolicy::default(),
        }
    }
}

/// A finished dungeon, with the output of every pipeline stage kept for drawing.
#[derive(Clone, Debug, Serialize)]
pub struct DungeonLayout {
    pub seed: u64,
    pub width: i32,
    pub height: i32,
    /// One per room, in room order.
    pub points: Vec<Point>,
    pub triangulation: Triangulation,
    /// Unique triangulation edges.
    pub edges: Vec<Edge>,
    pub spanning_tree: SpanningTree,
    /// The removed edges that were added back as loops.
    pub reinstated: Vec<Edge>,
    /// The spanning tree plus the reinstated edges.
    #[serde(skip)]
    pub graph: DungeonGraph,
    pub rooms: Vec<Room>,
    /// One per graph edge.
    pub hallways: Vec<Hallway>,
}

impl DungeonSpec {
    pub fn new(node_count: usize, width: i32, height: i32) -> Self {
        DungeonSpec {
            node_count,
            width,
            height,
            ..DungeonSpec::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Missing fields take their default values.
    pub fn from_ron(text: &str) -> Result<Self> {
        let spec: DungeonSpec =
            ron::de::from_str(text).map_err(|e| GenerationError::Config(e.to_string()))?;
        spec.validate()?;

        Ok(spec)
    }

    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, PrettyConfig::default())
            .map_err(|e| GenerationError::Config(e.to_string()))
    }

    pub fn bounds(&self) -> Extent {
        Extent::from_min_and_size(Point::new(0, 0), Point::new(self.width, self.height))
    }

    /// Checks the caller-side preconditions. Failures here are bugs, not bad luck, and are never
    /// retried.
    pub fn validate(&self) -> Result<()> {
        if self.node_count < 3 {
            return Err(GenerationError::InvalidParameters(format!(
                "need at least 3 rooms (got {})",
                self.node_count
            )));
        }
        if self.width <= 0 || self.height <= 0 {
            return Err(GenerationError::InvalidParameters(format!(
                "bounds must be positive (got {} x {})",
                self.width, self.height
            )));
        }
        self.sampling.validate()?;
        self.rooms.validate()?;
        self.loops.validate()?;

        Ok(())
    }

    /// Runs the whole pipeline once. Nothing is kept from a failed attempt.
    pub fn try_generate(&self, rng: &mut impl Rng) -> Result<DungeonLayout> {
        self.validate()?;
        let super_triangle = SuperTriangle::for_bounds(self.width, self.height)?;

        let points = sample_points(self.node_count, self.width, self.height, &self.sampling, rng)?;
        log::debug!("Sampled {} anchor points", points.len());

        let rooms = place_rooms(&points, &self.bounds(), &self.rooms, rng)?;

        let triangulation = triangulate(&points, &super_triangle)?;
        let edges = unique_edges(&triangulation.triangles);
        log::debug!(
            "{} triangles with {} unique edges",
            triangulation.len(),
            edges.len()
        );

        let spanning_tree = prim(&points, &edges)?;
        let reinstated = self.loops.reinstate(&spanning_tree.removed, rng)?;
        let graph = DungeonGraph::from_edges(spanning_tree.edges.iter().chain(reinstated.iter()));
        log::debug!(
            "Dungeon graph has {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        let hallways = route_hallways(&graph, &rooms)?;

        Ok(DungeonLayout {
            seed: self.seed,
            width: self.width,
            height: self.height,
            points,
            triangulation,
            edges,
            spanning_tree,
            reinstated,
            graph,
            rooms,
            hallways,
        })
    }

    /// One attempt with an RNG seeded from `self.seed`.
    pub fn generate(&self) -> Result<DungeonLayout> {
        log::info!(
            "Generating {} room dungeon in {} x {} with seed {}",
            self.node_count,
            self.width,
            self.height,
            self.seed
        );

        self.try_generate(&mut small_rng(self.seed))
    }

    /// Keeps drawing from the same seeded RNG until an attempt succeeds, so the result is still
    /// a function of `self.seed`. Only spatial failures are retried.
    pub fn generate_with_retries(&self) -> Result<DungeonLayout> {
        if self.max_generate_tries == 0 {
            return Err(GenerationError::InvalidParameters(
                "max_generate_tries must be at least 1".to_string(),
            ));
        }
        log::info!(
            "Generating {} room dungeon in {} x {} with seed {} ({} tries)",
            self.node_count,
            self.width,
            self.height,
            self.seed,
            self.max_generate_tries
        );

        let mut rng = small_rng(self.seed);
        let mut last_error = None;
        for attempt in 1..=self.max_generate_tries {
            match self.try_generate(&mut rng) {
                Ok(layout) => {
                    log::debug!("Generated dungeon on attempt {}", attempt);
                    return Ok(layout);
                }
                Err(e) if e.is_retryable() => {
                    log::warn!("Attempt {} failed: {}", attempt, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            GenerationError::InvalidParameters("no generation attempts were made".to_string())
        }))
    }
}

/// Generates a dungeon with default parameters, retrying spatial failures up to
/// `MAX_GENERATE_TRIES` times. Without a `seed` one is drawn at random; either way it's recorded
/// in the layout.
///
/// The default `LoopPolicy` adds back only a few removed edges, so most of the layout is a tree.
/// Build a `DungeonSpec` with `LoopPolicy::All` to turn every triangulation edge into a hallway.
pub fn generate(
    node_count: usize,
    width: i32,
    height: i32,
    seed: Option<u64>,
) -> Result<DungeonLayout> {
    let seed = seed.unwrap_or_else(|| rand::random());

    DungeonSpec::new(node_count, width, height)
        .with_seed(seed)
        .generate_with_retries()
}

impl DungeonLayout {
    pub fn room_at(&self, anchor: &Point) -> Option<&Room> {
        self.rooms.iter().find(|r| r.anchor == *anchor)
    }

    pub fn stats(&self) -> LayoutStats {
        let stats = LayoutStats {
            graph_edge_length: Summary::from_samples(self.graph.edges().map(|e| e.length())),
            room_area: Summary::from_samples(self.rooms.iter().map(|r| r.extent.area() as f64)),
            hallway_length: Summary::from_samples(
                self.hallways.iter().map(|h| h.length() as f64),
            ),
            loop_count: self.reinstated.len(),
        };
        log::debug!("Hallway lengths: {}", stats.hallway_length);

        stats
    }

    /// Hallways first, so room floors and walls win where a hallway cuts through a room; then a
    /// door where each hallway meets its own rooms.
    pub fn rasterize(&self, encoder: &mut impl TileEncoder) {
        fill_map_with_hallways(&self.hallways, encoder);
        fill_map_with_rooms(&self.rooms, encoder);
        fill_map_with_doors(&self.hallways, &self.rooms, encoder);
    }

    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string(self).map_err(|e| GenerationError::Config(e.to_string()))
    }
}
