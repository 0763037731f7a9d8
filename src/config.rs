// config.rs — Pipeline tunables.
//
// The two threshold ratios have shipped with different values across
// variants of this pipeline (0.09/0.05 and 0.064/0.027), so they are a
// configuration surface rather than constants. The Gaussian sigma selects
// the 5×5 smoothing weights; 1.0 is the design default.

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Tunable parameters for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Sigma of the 5×5 Gaussian smoothing kernel.
    pub gaussian_sigma: f32,
    /// `high_threshold = global_max_magnitude * high_threshold_ratio`.
    pub high_threshold_ratio: f32,
    /// `low_threshold = high_threshold * low_threshold_ratio`.
    pub low_threshold_ratio: f32,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        EdgeConfig {
            gaussian_sigma: 1.0,
            high_threshold_ratio: 0.09,
            low_threshold_ratio: 0.05,
        }
    }
}

impl EdgeConfig {
    /// Load a config from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, String> {
        let data = fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {e}", path.display()))?;
        serde_json::from_str(&data)
            .map_err(|e| format!("failed to parse config {}: {e}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EdgeConfig::default();
        assert_eq!(cfg.gaussian_sigma, 1.0);
        assert_eq!(cfg.high_threshold_ratio, 0.09);
        assert_eq!(cfg.low_threshold_ratio, 0.05);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        // The 0.064/0.027 variant, sigma left at default.
        let cfg: EdgeConfig =
            serde_json::from_str(r#"{"high_threshold_ratio": 0.064, "low_threshold_ratio": 0.027}"#)
                .unwrap();
        assert_eq!(cfg.high_threshold_ratio, 0.064);
        assert_eq!(cfg.low_threshold_ratio, 0.027);
        assert_eq!(cfg.gaussian_sigma, 1.0);
    }

    #[test]
    fn test_empty_json_is_default() {
        let cfg: EdgeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, EdgeConfig::default());
    }
}
