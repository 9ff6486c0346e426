use serde::Deserialize;

/// Tunables for the segment splitter (component C).
#[derive(Debug, Deserialize, Clone)]
pub struct FragmentationConfig {
    /// Fixed first-fragment size used when `adaptive` is false.
    #[serde(default = "default_fragment_size")]
    pub fragment_size: usize,
    /// Fixed inter-segment delay (ms) used when `adaptive` is false.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: f64,
    /// Size-bucketed `(k, d)` selection (§4.C). Recommended; on by default.
    #[serde(default = "default_true")]
    pub adaptive: bool,
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: f64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: f64,
}

impl Default for FragmentationConfig {
    fn default() -> Self {
        FragmentationConfig {
            fragment_size: default_fragment_size(),
            delay_ms: default_delay_ms(),
            adaptive: true,
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl FragmentationConfig {
    pub fn clamp_delay(&self, delay_ms: f64) -> f64 {
        delay_ms.clamp(self.min_delay_ms, self.max_delay_ms)
    }
}

fn default_fragment_size() -> usize {
    1
}

fn default_delay_ms() -> f64 {
    10.0
}

fn default_min_delay_ms() -> f64 {
    0.0
}

fn default_max_delay_ms() -> f64 {
    100.0
}

fn default_true() -> bool {
    true
}
