use serde::{Deserialize, Serialize};

/// Population substituted when there are no villages to summarize.
pub const SENTINEL_POPULATION: u64 = 1000;

/// Distribution summary used to scale choropleth colors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Element at index `n / 2` of the ascending list. For even `n` this is
    /// the upper-middle value, not the average of the two middle values.
    pub median: f64,
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
}

/// Summarize village populations.
///
/// An empty input is replaced by `[SENTINEL_POPULATION]`; the second element
/// of the result tells the caller the sentinel was used.
pub fn summarize(populations: &[u64]) -> (PopulationStats, bool) {
    let substituted = populations.is_empty();
    let mut sorted: Vec<f64> = if substituted {
        vec![SENTINEL_POPULATION as f64]
    } else {
        populations.iter().map(|&p| p as f64).collect()
    };
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let stats = PopulationStats {
        min: sorted[0],
        max: sorted[n - 1],
        mean: sorted.iter().sum::<f64>() / n as f64,
        median: median_floor(&sorted),
        q1: percentile(&sorted, 25.0),
        q2: percentile(&sorted, 50.0),
        q3: percentile(&sorted, 75.0),
    };
    (stats, substituted)
}

/// Legacy median: the element at index `floor(n / 2)` of an ascending slice.
pub fn median_floor(sorted: &[f64]) -> f64 {
    sorted.get(sorted.len() / 2).copied().unwrap_or(f64::NAN)
}

/// Percentile with linear interpolation between closest ranks, `p` in 0..=100.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
        }
    }
}
