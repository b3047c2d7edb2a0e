//! World file sidecars for georeferencing plain images
//!
//! A world file carries six affine coefficients, one per line, in the
//! on-disk order `(xscale, yskew, xskew, yscale, xoffset, yoffset)`; note
//! this differs from the internal coefficient order, so reading is a
//! permutation, not a reinterpretation. The offset pair references the
//! **center** of the top-left pixel; internally the origin is that pixel's
//! corner, so reading and writing shift by half a cell.

use crate::error::{Error, Result};
use crate::raster::GeoTransform;
use std::fs;
use std::path::{Path, PathBuf};

/// World-file extensions tried per image extension, most specific first
fn sidecar_extensions(image_ext: &str) -> &'static [&'static str] {
    match image_ext.to_ascii_lowercase().as_str() {
        "tif" | "tiff" => &["tfw", "wld"],
        "jpg" | "jpeg" => &["jgw", "wld"],
        "png" => &["pgw", "wld"],
        "bmp" => &["bpw", "wld"],
        "gif" => &["gfw", "wld"],
        _ => &["wld"],
    }
}

/// Find an existing world file next to an image path
pub fn sidecar_for(image_path: &Path) -> Option<PathBuf> {
    let ext = image_path.extension()?.to_str()?;
    for candidate in sidecar_extensions(ext) {
        let path = image_path.with_extension(candidate);
        if path.is_file() {
            return Some(path);
        }
    }
    None
}

/// The conventional world-file path for an image path
pub fn sidecar_path(image_path: &Path) -> PathBuf {
    let ext = image_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    image_path.with_extension(sidecar_extensions(ext)[0])
}

/// Parse six world-file coefficients into a transform
pub fn parse_world_file(contents: &str) -> Result<GeoTransform> {
    let values: Vec<f64> = contents
        .split_whitespace()
        .take(6)
        .map(|line| {
            line.trim()
                .parse::<f64>()
                .map_err(|e| Error::UnsupportedFormat(format!("bad world file value: {}", e)))
        })
        .collect::<Result<_>>()?;

    if values.len() != 6 {
        return Err(Error::UnsupportedFormat(
            "world file must contain six coefficients".to_string(),
        ));
    }

    // Disk order: xscale, yskew, xskew, yscale, xoffset, yoffset
    let [xscale, yskew, xskew, yscale, cx, cy] = values[..] else {
        unreachable!()
    };

    // Shift the center-of-pixel anchor to the cell corner
    let xoffset = cx - 0.5 * xscale - 0.5 * xskew;
    let yoffset = cy - 0.5 * yskew - 0.5 * yscale;

    GeoTransform::new(xscale, xskew, xoffset, yskew, yscale, yoffset)
}

/// Read a world file from disk
pub fn read_world_file(path: &Path) -> Result<GeoTransform> {
    let contents = fs::read_to_string(path)?;
    parse_world_file(&contents)
}

/// Serialize a transform to world-file contents
pub fn format_world_file(transform: &GeoTransform) -> String {
    let [xscale, xskew, xoffset, yskew, yscale, yoffset] = transform.coefficients();
    let cx = xoffset + 0.5 * xscale + 0.5 * xskew;
    let cy = yoffset + 0.5 * yskew + 0.5 * yscale;
    format!(
        "{}\n{}\n{}\n{}\n{}\n{}\n",
        xscale, yskew, xskew, yscale, cx, cy
    )
}

/// Write a world file next to an image
pub fn write_world_file(path: &Path, transform: &GeoTransform) -> Result<()> {
    fs::write(path, format_world_file(transform))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_permutes_coefficients() {
        // 10m cells, north-up, centered on (100005, 499995)
        let gt = parse_world_file("10.0\n0.0\n0.0\n-10.0\n100005.0\n499995.0\n").unwrap();
        assert_relative_eq!(gt.xscale(), 10.0);
        assert_relative_eq!(gt.yscale(), -10.0);
        assert_relative_eq!(gt.xskew(), 0.0);
        assert_relative_eq!(gt.yskew(), 0.0);
        // Corner origin is half a cell out from the center coordinate
        assert_relative_eq!(gt.xoffset(), 100000.0);
        assert_relative_eq!(gt.yoffset(), 500000.0);
    }

    #[test]
    fn test_parse_rotation_terms_land_in_skews() {
        let gt = parse_world_file("2.0\n0.5\n0.25\n-3.0\n0.0\n0.0\n").unwrap();
        assert_relative_eq!(gt.yskew(), 0.5);
        assert_relative_eq!(gt.xskew(), 0.25);
    }

    #[test]
    fn test_roundtrip() {
        let gt = GeoTransform::new(10.0, 0.5, 1000.0, -0.25, -10.0, 2000.0).unwrap();
        let back = parse_world_file(&format_world_file(&gt)).unwrap();
        for (a, b) in gt.coefficients().iter().zip(back.coefficients()) {
            assert_relative_eq!(a, &b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rejects_short_file() {
        assert!(parse_world_file("1.0\n0.0\n0.0\n").is_err());
        assert!(parse_world_file("1.0\nx\n0.0\n-1.0\n0.0\n0.0\n").is_err());
    }

    #[test]
    fn test_sidecar_extension_mapping() {
        assert_eq!(sidecar_extensions("png")[0], "pgw");
        assert_eq!(sidecar_extensions("JPG")[0], "jgw");
        assert_eq!(sidecar_extensions("gif")[0], "gfw");
        assert_eq!(sidecar_extensions("xyz")[0], "wld");
    }
}
