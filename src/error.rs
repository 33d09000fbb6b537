use crate::geometry::Point;

use std::fmt;
use thiserror::Error;

/// Which rejection sampler ran out of budget.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlacementStage {
    Points,
    Rooms,
}

impl fmt::Display for PlacementStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementStage::Points => write!(f, "anchor points"),
            PlacementStage::Rooms => write!(f, "rooms"),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum GenerationError {
    /// The spatial constraints could not be met within the retry budget. Reduce the room count
    /// or enlarge the bounds.
    #[error("could only place {placed} of {requested} {stage}; reduce the room count or increase the bounds")]
    InsufficientSpace {
        stage: PlacementStage,
        requested: usize,
        placed: usize,
    },

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// A triangulation precondition was violated: duplicate points, or a point outside the
    /// super-triangle.
    #[error("triangulation precondition violated: {0}")]
    Triangulation(String),

    /// The triangulation reaches fewer points than were sampled. Only happens when every anchor
    /// is collinear.
    #[error("triangulation spans {spanned} of {expected} points")]
    DegenerateTriangulation { spanned: usize, expected: usize },

    #[error("no hallway route from the room at {from:?} to the room at {to:?} avoids other rooms")]
    Unroutable { from: Point, to: Point },

    /// A RON config failed to parse or serialize.
    #[error("invalid dungeon config: {0}")]
    Config(String),
}

impl GenerationError {
    /// Spatial failures that a fresh attempt (with new random draws) may get past. Everything
    /// else is a caller bug and retrying cannot help.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::InsufficientSpace { .. }
            | GenerationError::DegenerateTriangulation { .. }
            | GenerationError::Unroutable { .. } => true,
            GenerationError::InvalidParameters(_)
            | GenerationError::Triangulation(_)
            | GenerationError::Config(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;
