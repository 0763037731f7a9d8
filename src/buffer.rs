// buffer.rs — Float pixel buffer and the toroidal indexing rule.
//
// Every stage of the pipeline reads a `PixelBuffer` and materializes a new
// one; buffers are never mutated in place. The buffer is a flat `Vec<f32>`
// whose interpretation depends on the channel count:
//
//   1 channel  — a single scalar plane (luma, magnitude, edge classes).
//   2 channels — two consecutive planes: magnitude plane, then orientation
//                plane. NOT interleaved.
//   3 channels — interleaved RGB triplets, as delivered by the codec.
//
// Intensity samples are normalized to [0, 1]; the orientation plane holds
// degrees in [0, 180).
//
// BORDER HANDLING: toroidal wrap-around. A neighbor offset that falls off
// one side of the image re-enters on the opposite side, as if the image
// tiled infinitely. All stages use `wrap_index` for neighbor reads so that
// every backend sees exactly the same values at the borders.

use std::fmt;

/// A 2D image with runtime dimensions, owning `width * height * channels`
/// `f32` samples.
pub struct PixelBuffer {
    /// Samples, laid out per the channel-count convention above.
    data: Vec<f32>,
    /// Image width in pixels.
    width: usize,
    /// Image height in pixels.
    height: usize,
    /// 1 (scalar plane), 2 (magnitude + orientation planes) or 3 (RGB).
    channels: usize,
}

impl PixelBuffer {
    /// Create a zero-filled buffer.
    ///
    /// # Panics
    /// Panics if `width` or `height` is zero, or `channels` is not 1, 2 or 3.
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        assert!(width > 0 && height > 0, "image must be non-empty ({width}×{height})");
        assert!(
            (1..=3).contains(&channels),
            "channel count must be 1, 2 or 3 (got {channels})"
        );
        PixelBuffer {
            data: vec![0.0; width * height * channels],
            width,
            height,
            channels,
        }
    }

    /// Wrap an existing sample vector.
    ///
    /// # Panics
    /// Panics if `data.len() != width * height * channels`, or the
    /// dimensions are invalid.
    pub fn from_vec(width: usize, height: usize, channels: usize, data: Vec<f32>) -> Self {
        assert!(width > 0 && height > 0, "image must be non-empty ({width}×{height})");
        assert!(
            (1..=3).contains(&channels),
            "channel count must be 1, 2 or 3 (got {channels})"
        );
        assert_eq!(
            data.len(),
            width * height * channels,
            "sample count ({}) must equal width * height * channels ({})",
            data.len(),
            width * height * channels,
        );
        PixelBuffer { data, width, height, channels }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of pixels (`width * height`), independent of channel count.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// All samples as a flat slice.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Consume the buffer, returning the sample vector.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// One plane of a planar (1- or 2-channel) buffer.
    ///
    /// # Panics
    /// Panics on a 3-channel buffer (interleaved, has no planes) or if
    /// `plane >= channels`.
    pub fn plane(&self, plane: usize) -> &[f32] {
        assert!(
            self.channels != 3,
            "plane() is only valid for planar buffers, not interleaved RGB"
        );
        assert!(plane < self.channels, "plane {plane} out of {} channels", self.channels);
        let n = self.pixel_count();
        &self.data[plane * n..(plane + 1) * n]
    }

    /// The sample at `(x, y)` in channel `c`, resolving the layout
    /// convention (interleaved for 3 channels, planar otherwise).
    ///
    /// # Panics
    /// Panics if `(x, y)` or `c` is out of bounds.
    pub fn sample(&self, x: usize, y: usize, c: usize) -> f32 {
        assert!(
            x < self.width && y < self.height && c < self.channels,
            "sample ({x},{y},{c}) out of bounds for {}×{}×{}",
            self.width,
            self.height,
            self.channels,
        );
        let p = y * self.width + x;
        if self.channels == 3 {
            self.data[p * 3 + c]
        } else {
            self.data[c * self.pixel_count() + p]
        }
    }
}

impl Clone for PixelBuffer {
    fn clone(&self) -> Self {
        PixelBuffer {
            data: self.data.clone(),
            width: self.width,
            height: self.height,
            channels: self.channels,
        }
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PixelBuffer {{ {}×{}, channels={} }}",
            self.width, self.height, self.channels
        )
    }
}

/// Map a possibly out-of-range `(x, y)` offset to a linear index into a
/// `width * height` plane using toroidal wrap-around: negative `x` maps to
/// `width + x`, `x >= width` maps to `x - width`, and likewise for `y`.
///
/// Valid for coordinates out of range by at most one image dimension —
/// i.e. any in-bounds position displaced by up to one kernel radius, which
/// is all the pipeline ever produces.
#[inline]
pub fn wrap_index(x: isize, y: isize, width: usize, height: usize) -> usize {
    let w = width as isize;
    let h = height as isize;
    let mut x = x;
    let mut y = y;
    if x < 0 {
        x += w;
    }
    if y < 0 {
        y += h;
    }
    if x >= w {
        x -= w;
    }
    if y >= h {
        y -= h;
    }
    (y * w + x) as usize
}
