use serde::{Deserialize, Serialize};

/// Merge-gate thresholds. Part of [`crate::config::AppConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Ceiling on distinct files a patch may touch (generated tests included).
    #[serde(default = "default_max_changed_files")]
    pub max_changed_files: usize,

    /// Budget ceiling for tokens consumed by the run so far.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u64,

    /// Budget ceiling for capability/host API calls made by the run so far.
    #[serde(default = "default_max_api_calls")]
    pub max_api_calls: u64,

    /// Fraction of a ceiling at which a passing soft signal counts as
    /// "near the ceiling" for risk grading.
    #[serde(default = "default_near_ratio")]
    pub near_ratio: f64,
}

fn default_max_changed_files() -> usize {
    25
}

fn default_max_tokens() -> u64 {
    200_000
}

fn default_max_api_calls() -> u64 {
    500
}

fn default_near_ratio() -> f64 {
    0.8
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_changed_files: default_max_changed_files(),
            max_tokens: default_max_tokens(),
            max_api_calls: default_max_api_calls(),
            near_ratio: default_near_ratio(),
        }
    }
}
