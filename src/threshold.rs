// threshold.rs — Double thresholding against the global maximum response.
//
// Two derived scalars gate the classification:
//
//   high = global_max_magnitude * high_threshold_ratio
//   low  = high * low_threshold_ratio
//
// Classification is strict: Strong iff magnitude > high, Weak iff
// magnitude > low, Suppressed otherwise. A flat image (global max 0) makes
// both thresholds 0 and every pixel Suppressed — a normal code path, not
// an error.
//
// Classes are materialized as exact f32 codes; downstream stages compare
// against these codes with float equality, so the values are contractual.

use crate::buffer::PixelBuffer;
use crate::config::EdgeConfig;
use crate::exec::Executor;

/// Per-pixel classification after double thresholding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeClass {
    Suppressed,
    Weak,
    Strong,
}

impl EdgeClass {
    /// The exact buffer code for this class. Equality on these floats is
    /// part of the pipeline contract.
    #[inline]
    pub fn code(self) -> f32 {
        match self {
            EdgeClass::Suppressed => 0.0,
            EdgeClass::Weak => 0.33,
            EdgeClass::Strong => 1.0,
        }
    }

    /// Recover the class from a buffer code.
    ///
    /// Returns `None` for any float that is not one of the three admissible
    /// codes.
    #[inline]
    pub fn from_code(code: f32) -> Option<EdgeClass> {
        if code == 0.0 {
            Some(EdgeClass::Suppressed)
        } else if code == 0.33 {
            Some(EdgeClass::Weak)
        } else if code == 1.0 {
            Some(EdgeClass::Strong)
        } else {
            None
        }
    }
}

/// The two thresholds derived once per image. Lives only for the duration
/// of one threshold-stage invocation (and one GPU uniform upload).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPair {
    pub low: f32,
    pub high: f32,
}

impl ThresholdPair {
    /// Derive the pair from the image's global maximum magnitude and the
    /// configured ratios.
    pub fn derive(global_max: f32, config: &EdgeConfig) -> Self {
        let high = global_max * config.high_threshold_ratio;
        let low = high * config.low_threshold_ratio;
        ThresholdPair { low, high }
    }

    /// Classify one magnitude.
    #[inline]
    pub fn classify(&self, magnitude: f32) -> EdgeClass {
        if magnitude > self.high {
            EdgeClass::Strong
        } else if magnitude > self.low {
            EdgeClass::Weak
        } else {
            EdgeClass::Suppressed
        }
    }
}

/// Classify a thinned magnitude plane into Strong / Weak / Suppressed
/// codes.
///
/// The global max is computed with the executor's reduction primitive —
/// associative and order-independent, so every backend derives the same
/// thresholds.
///
/// # Panics
/// Panics if `input` is not 1-channel.
pub fn double_threshold<E: Executor>(
    exec: &E,
    input: PixelBuffer,
    config: &EdgeConfig,
) -> PixelBuffer {
    assert_eq!(input.channels(), 1, "double_threshold expects a magnitude plane");
    let (w, h) = (input.width(), input.height());
    let magnitude = input.as_slice();

    let global_max = exec.reduce_max(magnitude);
    let thresholds = ThresholdPair::derive(global_max, config);
    log::debug!(
        "double_threshold: global_max={global_max}, high={}, low={}",
        thresholds.high,
        thresholds.low
    );

    let classes = exec.map_grid(w, h, |x, y| {
        thresholds.classify(magnitude[y * w + x]).code()
    });

    PixelBuffer::from_vec(w, h, 1, classes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::SerialExecutor;

    fn config(high: f32, low: f32) -> EdgeConfig {
        EdgeConfig {
            high_threshold_ratio: high,
            low_threshold_ratio: low,
            ..EdgeConfig::default()
        }
    }

    #[test]
    fn test_codes_are_contractual() {
        assert_eq!(EdgeClass::Suppressed.code(), 0.0);
        assert_eq!(EdgeClass::Weak.code(), 0.33);
        assert_eq!(EdgeClass::Strong.code(), 1.0);
        assert_eq!(EdgeClass::from_code(0.33), Some(EdgeClass::Weak));
        assert_eq!(EdgeClass::from_code(0.5), None);
    }

    #[test]
    fn test_three_way_classification() {
        // max = 1.0 → high = 0.09, low = 0.0045.
        let mag = vec![1.0, 0.05, 0.001, 0.0];
        let out = double_threshold(
            &SerialExecutor,
            PixelBuffer::from_vec(4, 1, 1, mag),
            &config(0.09, 0.05),
        );
        assert_eq!(out.as_slice(), &[1.0, 0.33, 0.0, 0.0]);
    }

    #[test]
    fn test_strict_comparison_at_threshold() {
        // A magnitude exactly equal to a threshold does not pass it.
        let pair = ThresholdPair { low: 0.2, high: 0.6 };
        assert_eq!(pair.classify(0.6), EdgeClass::Weak);
        assert_eq!(pair.classify(0.2), EdgeClass::Suppressed);
        assert_eq!(pair.classify(0.61), EdgeClass::Strong);
    }

    #[test]
    fn test_degenerate_flat_image_all_suppressed() {
        // global max 0 → both thresholds 0 → nothing is > 0 → Suppressed.
        let out = double_threshold(
            &SerialExecutor,
            PixelBuffer::from_vec(3, 3, 1, vec![0.0; 9]),
            &config(0.09, 0.05),
        );
        assert!(out.as_slice().iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_monotonic_in_high_ratio() {
        // Raising the high ratio can only demote pixels, never promote.
        let mag: Vec<f32> = (0..64).map(|i| i as f32 / 63.0).collect();
        let rank = |code: f32| match EdgeClass::from_code(code).unwrap() {
            EdgeClass::Suppressed => 0,
            EdgeClass::Weak => 1,
            EdgeClass::Strong => 2,
        };

        let lo = double_threshold(
            &SerialExecutor,
            PixelBuffer::from_vec(8, 8, 1, mag.clone()),
            &config(0.09, 0.05),
        );
        let hi = double_threshold(
            &SerialExecutor,
            PixelBuffer::from_vec(8, 8, 1, mag),
            &config(0.4, 0.05),
        );

        for (a, b) in lo.as_slice().iter().zip(hi.as_slice()) {
            assert!(
                rank(*b) <= rank(*a),
                "raising HIGH_THRESHOLD_RATIO promoted a pixel: {a} → {b}"
            );
        }
    }

    #[test]
    fn test_round_trip_bytes_are_admissible() {
        // byte → float → byte of a classification buffer touches exactly
        // the three admissible output bytes {0, 84, 255}.
        let mag = vec![1.0, 0.05, 0.001, 0.9];
        let out = double_threshold(
            &SerialExecutor,
            PixelBuffer::from_vec(4, 1, 1, mag),
            &config(0.09, 0.05),
        );
        let bytes = crate::convert::floats_to_bytes(out.as_slice());
        for b in bytes {
            assert!(
                b == 0 || b == 84 || b == 255,
                "inadmissible output byte {b}"
            );
        }
    }
}
