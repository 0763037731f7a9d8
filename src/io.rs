// io.rs — Raster codec boundary.
//
// Decode: any raster the `image` crate understands → RGB8 → normalized
// 3-channel PixelBuffer (alpha, if present, is dropped by the RGB8
// conversion). Encode: 1-channel PixelBuffer → 8-bit grey image, format
// chosen from the output path's extension.
//
// Failures here are the only fatal conditions around the CPU pipeline: a
// decode error means the pipeline never starts, an encode error discards
// the computed result.

use std::path::Path;

use crate::buffer::PixelBuffer;
use crate::convert::{bytes_to_floats, floats_to_bytes};
use crate::error::Error;

/// Decode a raster file into a normalized 3-channel RGB buffer.
pub fn load_rgb(path: &Path) -> Result<PixelBuffer, Error> {
    let decoded = image::open(path).map_err(Error::Decode)?.to_rgb8();
    let (w, h) = (decoded.width() as usize, decoded.height() as usize);
    log::info!("decoded {} ({w}×{h})", path.display());
    Ok(PixelBuffer::from_vec(w, h, 3, bytes_to_floats(decoded.as_raw())))
}

/// Encode a 1-channel buffer as an 8-bit grey raster.
///
/// # Panics
/// Panics if `buf` is not 1-channel.
pub fn save_gray(path: &Path, buf: &PixelBuffer) -> Result<(), Error> {
    assert_eq!(buf.channels(), 1, "save_gray expects a single-channel buffer");
    let bytes = floats_to_bytes(buf.as_slice());
    let img = image::GrayImage::from_raw(buf.width() as u32, buf.height() as u32, bytes)
        .expect("byte count matches buffer dimensions");
    img.save(path).map_err(Error::Encode)?;
    log::info!("encoded {} ({}×{})", path.display(), buf.width(), buf.height());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(format!("edgepipe-io-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_round_trip_gray_png() {
        let path = temp_path("roundtrip.png");
        let buf = PixelBuffer::from_vec(2, 2, 1, vec![0.0, 0.33, 1.0, 0.5]);
        save_gray(&path, &buf).expect("encode failed");

        let reloaded = load_rgb(&path).expect("decode failed");
        assert_eq!(reloaded.width(), 2);
        assert_eq!(reloaded.height(), 2);
        assert_eq!(reloaded.channels(), 3);
        // Grey input decodes with identical RGB channels; 0.33 survived the
        // byte quantization as 84/255.
        assert!((reloaded.sample(1, 0, 0) - 84.0 / 255.0).abs() < 1e-6);
        assert_eq!(reloaded.sample(1, 0, 0), reloaded.sample(1, 0, 1));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_decode_failure_is_reported() {
        let err = load_rgb(Path::new("/nonexistent/edgepipe-missing.png"));
        assert!(matches!(err, Err(Error::Decode(_))));
    }

    #[test]
    fn test_encode_failure_is_reported() {
        let buf = PixelBuffer::new(2, 2, 1);
        let err = save_gray(Path::new("/nonexistent-dir/out.png"), &buf);
        assert!(matches!(err, Err(Error::Encode(_))));
    }
}
