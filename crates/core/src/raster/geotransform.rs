//! Affine georeferencing transform for rasters

use crate::error::{Error, Result};
use crate::raster::Bounds;
use serde::{Deserialize, Serialize};

/// Determinants below this are treated as degenerate.
const DET_EPSILON: f64 = 1e-10;

/// Affine transformation between cell (pixel) space and geographic space.
///
/// The six coefficients map `(col, row)` to `(x, y)`:
/// ```text
/// x = col * xscale + row * xskew + xoffset
/// y = col * yskew  + row * yscale + yoffset
/// ```
///
/// For north-up rasters `xskew` and `yskew` are 0 and `yscale` is negative.
/// The origin `(xoffset, yoffset)` is the top-left corner of cell `(0, 0)`.
///
/// The inverse mapping is derived once at construction and cached.
/// Construction fails with [`Error::DegenerateTransform`] when the
/// determinant `xscale * yscale - xskew * yskew` vanishes: the raster would
/// collapse to a line or point, which signals corrupt georeferencing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 6]", into = "[f64; 6]")]
pub struct GeoTransform {
    xscale: f64,
    xskew: f64,
    xoffset: f64,
    yskew: f64,
    yscale: f64,
    yoffset: f64,
    /// Cached inverse coefficients, same layout as the forward ones
    inv: [f64; 6],
}

/// Inverse of the 2x2 linear system plus translation. `det` must be nonzero.
fn invert(c: [f64; 6], det: f64) -> [f64; 6] {
    let [xscale, xskew, xoffset, yskew, yscale, yoffset] = c;
    [
        yscale / det,
        -xskew / det,
        (xskew * yoffset - yscale * xoffset) / det,
        -yskew / det,
        xscale / det,
        (yskew * xoffset - xscale * yoffset) / det,
    ]
}

impl GeoTransform {
    /// Create a transform from the six internal-order coefficients
    /// `(xscale, xskew, xoffset, yskew, yscale, yoffset)`.
    pub fn new(
        xscale: f64,
        xskew: f64,
        xoffset: f64,
        yskew: f64,
        yscale: f64,
        yoffset: f64,
    ) -> Result<Self> {
        let coeffs = [xscale, xskew, xoffset, yskew, yscale, yoffset];
        let det = xscale * yscale - xskew * yskew;
        if det.abs() < DET_EPSILON || !det.is_finite() {
            return Err(Error::DegenerateTransform { det, coeffs });
        }
        Ok(Self {
            xscale,
            xskew,
            xoffset,
            yskew,
            yscale,
            yoffset,
            inv: invert(coeffs, det),
        })
    }

    /// Create a rotation-free transform from an origin and cell sizes.
    ///
    /// `cellheight` is typically negative for north-up rasters (row index
    /// grows downward while y grows upward).
    pub fn north_up(origin_x: f64, origin_y: f64, cellwidth: f64, cellheight: f64) -> Result<Self> {
        Self::new(cellwidth, 0.0, origin_x, 0.0, cellheight, origin_y)
    }

    /// The six coefficients in internal order
    pub fn coefficients(&self) -> [f64; 6] {
        [
            self.xscale,
            self.xskew,
            self.xoffset,
            self.yskew,
            self.yscale,
            self.yoffset,
        ]
    }

    pub fn xscale(&self) -> f64 {
        self.xscale
    }

    pub fn xskew(&self) -> f64 {
        self.xskew
    }

    pub fn xoffset(&self) -> f64 {
        self.xoffset
    }

    pub fn yskew(&self) -> f64 {
        self.yskew
    }

    pub fn yscale(&self) -> f64 {
        self.yscale
    }

    pub fn yoffset(&self) -> f64 {
        self.yoffset
    }

    /// Cell width in geographic units (signed)
    pub fn cell_width(&self) -> f64 {
        self.xscale
    }

    /// Cell height in geographic units (signed, usually negative)
    pub fn cell_height(&self) -> f64 {
        self.yscale
    }

    /// Check if this is a north-up transform (no rotation terms)
    pub fn is_north_up(&self) -> bool {
        self.xskew.abs() < DET_EPSILON && self.yskew.abs() < DET_EPSILON && self.yscale < 0.0
    }

    /// Map fractional cell coordinates to geographic coordinates
    pub fn cell_to_geo(&self, col: f64, row: f64) -> (f64, f64) {
        let x = col * self.xscale + row * self.xskew + self.xoffset;
        let y = col * self.yskew + row * self.yscale + self.yoffset;
        (x, y)
    }

    /// Map geographic coordinates to fractional cell coordinates
    pub fn geo_to_cell(&self, x: f64, y: f64) -> (f64, f64) {
        let col = x * self.inv[0] + y * self.inv[1] + self.inv[2];
        let row = x * self.inv[3] + y * self.inv[4] + self.inv[5];
        (col, row)
    }

    /// Map geographic coordinates to the nearest integer cell.
    ///
    /// Rounds half away from zero (`f64::round` semantics). The result may
    /// lie outside a raster's extent; callers bounds-check.
    pub fn geo_to_cell_rounded(&self, x: f64, y: f64) -> (i64, i64) {
        let (col, row) = self.geo_to_cell(x, y);
        (col.round() as i64, row.round() as i64)
    }

    /// Bounding box of a raster of the given dimensions.
    ///
    /// Computed from the four transformed pixel corners, so it is correct
    /// for any axis direction or rotation.
    pub fn bounds(&self, width: usize, height: usize) -> Bounds {
        let (w, h) = (width as f64, height as f64);
        let corners = [
            self.cell_to_geo(0.0, 0.0),
            self.cell_to_geo(w, 0.0),
            self.cell_to_geo(0.0, h),
            self.cell_to_geo(w, h),
        ];
        let mut xmin = f64::INFINITY;
        let mut ymin = f64::INFINITY;
        let mut xmax = f64::NEG_INFINITY;
        let mut ymax = f64::NEG_INFINITY;
        for (x, y) in corners {
            xmin = xmin.min(x);
            ymin = ymin.min(y);
            xmax = xmax.max(x);
            ymax = ymax.max(y);
        }
        Bounds::new(xmin, ymin, xmax, ymax)
    }
}

impl Default for GeoTransform {
    /// Unit cells anchored at the origin, north-up
    fn default() -> Self {
        let coeffs = [1.0, 0.0, 0.0, 0.0, -1.0, 0.0];
        Self {
            xscale: 1.0,
            xskew: 0.0,
            xoffset: 0.0,
            yskew: 0.0,
            yscale: -1.0,
            yoffset: 0.0,
            inv: invert(coeffs, -1.0),
        }
    }
}

impl TryFrom<[f64; 6]> for GeoTransform {
    type Error = Error;

    fn try_from(c: [f64; 6]) -> Result<Self> {
        Self::new(c[0], c[1], c[2], c[3], c[4], c[5])
    }
}

impl From<GeoTransform> for [f64; 6] {
    fn from(t: GeoTransform) -> Self {
        t.coefficients()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cell_to_geo_roundtrip() {
        let gt = GeoTransform::north_up(100.0, 200.0, 10.0, -10.0).unwrap();

        let (x, y) = gt.cell_to_geo(5.0, 10.0);
        let (col, row) = gt.geo_to_cell(x, y);

        assert_relative_eq!(col, 5.0, epsilon = 1e-10);
        assert_relative_eq!(row, 10.0, epsilon = 1e-10);
    }

    #[test]
    fn test_roundtrip_with_rotation() {
        let gt = GeoTransform::new(2.0, 0.5, -30.0, 0.25, -3.0, 80.0).unwrap();

        for (col, row) in [(0.0, 0.0), (13.0, 7.0), (99.5, 0.25)] {
            let (x, y) = gt.cell_to_geo(col, row);
            let (c, r) = gt.geo_to_cell(x, y);
            assert_relative_eq!(c, col, epsilon = 1e-9);
            assert_relative_eq!(r, row, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_degenerate_rejected() {
        // xscale*yscale - xskew*yskew == 0
        let result = GeoTransform::new(1.0, 1.0, 0.0, 1.0, 1.0, 0.0);
        assert!(matches!(
            result,
            Err(Error::DegenerateTransform { .. })
        ));
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        let gt = GeoTransform::north_up(0.0, 0.0, 1.0, -1.0).unwrap();
        // geo (2.5, -3.5) -> fractional cell (2.5, 3.5) -> rounds to (3, 4)
        assert_eq!(gt.geo_to_cell_rounded(2.5, -3.5), (3, 4));
        assert_eq!(gt.geo_to_cell_rounded(-0.5, 0.5), (-1, -1));
    }

    #[test]
    fn test_bounds_y_flip() {
        let gt = GeoTransform::north_up(0.0, 100.0, 1.0, -1.0).unwrap();
        let b = gt.bounds(100, 100);

        assert_relative_eq!(b.xmin, 0.0, epsilon = 1e-10);
        assert_relative_eq!(b.ymin, 0.0, epsilon = 1e-10);
        assert_relative_eq!(b.xmax, 100.0, epsilon = 1e-10);
        assert_relative_eq!(b.ymax, 100.0, epsilon = 1e-10);
    }

    #[test]
    fn test_serde_revalidates() {
        let gt = GeoTransform::north_up(5.0, 10.0, 2.0, -2.0).unwrap();
        let json = serde_json::to_string(&gt).unwrap();
        let back: GeoTransform = serde_json::from_str(&json).unwrap();
        assert_eq!(gt, back);

        let bad: std::result::Result<GeoTransform, _> =
            serde_json::from_str("[1.0, 1.0, 0.0, 1.0, 1.0, 0.0]");
        assert!(bad.is_err());
    }
}
