// tests/test_pipeline.rs — End-to-end pipeline tests on the CPU backends.

use edgepipe::buffer::PixelBuffer;
use edgepipe::config::EdgeConfig;
use edgepipe::convert::floats_to_bytes;
use edgepipe::exec::{SerialExecutor, ThreadedExecutor};
use edgepipe::gaussian::{gaussian_blur, GaussianKernel};
use edgepipe::gradient::sobel_gradient;
use edgepipe::grayscale::grayscale;
use edgepipe::pipeline::{detect_edges, run_stages, Backend};
use edgepipe::threshold::{double_threshold, EdgeClass};
use edgepipe::thinning::thin_edges;

/// 3-channel buffer from a grayscale intensity grid.
fn rgb_from_luma(w: usize, h: usize, luma: &[f32]) -> PixelBuffer {
    let mut data = Vec::with_capacity(w * h * 3);
    for &v in luma {
        data.extend_from_slice(&[v, v, v]);
    }
    PixelBuffer::from_vec(w, h, 3, data)
}

// ===== Regression fixture: bright diagonal on a 4×4 torus =====
//
// A one-pixel white diagonal on black. On the torus the image is invariant
// under (x+1, y+1) translation, so every value depends only on the
// anti-diagonal coordinate d = (x − y) mod 4. The line sits at d = 0; the
// blurred line sheds symmetric gradients onto its two flanking wrapped
// diagonals d = 1 and d = 3 (gradient quantizes to the 135° bucket, whose
// comparison neighbors share the pixel's own diagonal, so thinning keeps
// both flanks). The line pixels themselves blur symmetrically and carry
// only rounding-noise gradient. The resolved map is therefore Strong
// exactly where x − y is odd and Suppressed elsewhere.

#[test]
fn fixture_diagonal_line_4x4() {
    // Literal pixel values, white diagonal on black:
    #[rustfmt::skip]
    let luma = [
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ];
    let cfg = EdgeConfig {
        gaussian_sigma: 1.0,
        high_threshold_ratio: 0.09,
        low_threshold_ratio: 0.05,
    };

    let out = run_stages(&SerialExecutor, rgb_from_luma(4, 4, &luma), &cfg);

    for y in 0..4 {
        for x in 0..4 {
            let expected = if (x + y) % 2 == 1 {
                EdgeClass::Strong.code()
            } else {
                EdgeClass::Suppressed.code()
            };
            assert_eq!(
                out.sample(x, y, 0),
                expected,
                "wrong classification at ({x},{y})"
            );
        }
    }
}

#[test]
fn fixture_is_backend_independent() {
    #[rustfmt::skip]
    let luma = [
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ];
    let cfg = EdgeConfig::default();
    let serial = run_stages(&SerialExecutor, rgb_from_luma(4, 4, &luma), &cfg);
    let threaded = run_stages(&ThreadedExecutor, rgb_from_luma(4, 4, &luma), &cfg);
    assert_eq!(serial.as_slice(), threaded.as_slice());
}

// ===== Degenerate input =====

#[test]
fn flat_image_resolves_to_all_suppressed() {
    // Uniform input: global max magnitude is 0, both thresholds are 0, and
    // the strict > comparisons classify everything Suppressed. Normal code
    // path, not an error.
    for backend in [Backend::Serial, Backend::Threaded] {
        let input = rgb_from_luma(16, 16, &[0.73f32; 256]);
        let out = detect_edges(input, &EdgeConfig::default(), backend).unwrap();
        assert!(out.as_slice().iter().all(|&c| c == 0.0));
    }
}

// ===== Step edge =====

#[test]
fn vertical_step_edge_yields_column_aligned_edges() {
    // Left half dark, right half bright. Everything about this scene is a
    // function of x alone, so the resolved classes must be constant down
    // each column — and some column must carry a Strong edge.
    let w = 16;
    let h = 8;
    let mut luma = vec![0.0f32; w * h];
    for y in 0..h {
        for x in w / 2..w {
            luma[y * w + x] = 1.0;
        }
    }
    let out = run_stages(&SerialExecutor, rgb_from_luma(w, h, &luma), &EdgeConfig::default());

    for x in 0..w {
        let top = out.sample(x, 0, 0);
        for y in 1..h {
            assert_eq!(out.sample(x, y, 0), top, "column {x} is not uniform");
        }
    }
    let strong = out
        .as_slice()
        .iter()
        .filter(|&&c| c == EdgeClass::Strong.code())
        .count();
    assert!(strong > 0, "step edge produced no Strong pixels");
    // Strong pixels arrive in whole columns of height h.
    assert_eq!(strong % h, 0);
}

// ===== Stage chaining and output codes =====

#[test]
fn threshold_output_bytes_are_admissible() {
    // Run the front of the pipeline to a classified (pre-hysteresis)
    // buffer; its byte rendering may only contain {0, 84, 255}.
    let mut luma = vec![0.0f32; 12 * 12];
    for y in 0..12 {
        for x in 0..12 {
            luma[y * 12 + x] = ((x as f32 / 11.0) * (y as f32 / 11.0)).sqrt();
        }
    }
    let exec = SerialExecutor;
    let cfg = EdgeConfig::default();

    let gray = grayscale(&exec, rgb_from_luma(12, 12, &luma));
    let blurred = gaussian_blur(&exec, gray, &GaussianKernel::with_sigma(cfg.gaussian_sigma));
    let grad = sobel_gradient(&exec, blurred);
    let thinned = thin_edges(&exec, grad);
    let classified = double_threshold(&exec, thinned, &cfg);

    for b in floats_to_bytes(classified.as_slice()) {
        assert!(
            b == 0 || b == 84 || b == 255,
            "classification buffer produced inadmissible byte {b}"
        );
    }
}

#[test]
fn final_map_is_binary() {
    // After hysteresis no Weak code can remain: 0 and 255 only.
    let mut luma = vec![0.2f32; 10 * 10];
    for i in 0..10 {
        luma[i * 10 + 4] = 0.9;
    }
    let out = run_stages(&SerialExecutor, rgb_from_luma(10, 10, &luma), &EdgeConfig::default());
    for b in floats_to_bytes(out.as_slice()) {
        assert!(b == 0 || b == 255, "final edge map contains byte {b}");
    }
}

#[test]
fn variant_threshold_ratios_accepted() {
    // The 0.064/0.027 ratio variant runs through the same pipeline.
    let cfg = EdgeConfig {
        gaussian_sigma: 1.0,
        high_threshold_ratio: 0.064,
        low_threshold_ratio: 0.027,
    };
    let mut luma = vec![0.0f32; 8 * 8];
    for i in 0..8 {
        luma[i * 8 + i] = 1.0;
    }
    let out = run_stages(&SerialExecutor, rgb_from_luma(8, 8, &luma), &cfg);
    assert!(out
        .as_slice()
        .iter()
        .any(|&c| c == EdgeClass::Strong.code()));
}
