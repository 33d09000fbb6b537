use ::stats::{MinMax, OnlineStats};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Streaming summary of one measured quantity.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    pub fn from_samples(samples: impl IntoIterator<Item = f64>) -> Self {
        let mut online = OnlineStats::new();
        let mut extremes = MinMax::new();
        for s in samples.into_iter() {
            online.add(s);
            extremes.add(s);
        }

        if online.len() == 0 {
            return Summary::default();
        }

        Summary {
            count: online.len(),
            mean: online.mean(),
            std_dev: online.stddev(),
            min: extremes.min().copied().unwrap_or_default(),
            max: extremes.max().copied().unwrap_or_default(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n = {}, mean = {:.1} ± {:.1}, range = [{:.1}, {:.1}]",
            self.count, self.mean, self.std_dev, self.min, self.max
        )
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct LayoutStats {
    /// Lengths of the edges that became hallways.
    pub graph_edge_length: Summary,
    pub room_area: Summary,
    /// Manhattan length of each hallway path.
    pub hallway_length: Summary,
    /// Graph edges beyond the spanning tree.
    pub loop_count: usize,
}
