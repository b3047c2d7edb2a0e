//! Resolution changes that preserve geographic extent

use terrakit_core::raster::{Raster, RasterElement};
use terrakit_core::{Error, Result};

/// Target of a resample: either explicit grid dimensions or explicit cell
/// sizes. The complementary attribute is recomputed so the geographic
/// extent stays fixed; only resolution changes, never coverage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResampleTo {
    /// Resize to a cell grid of `width` x `height`
    Dimensions { width: usize, height: usize },
    /// Resize so cells are `cellwidth` x `cellheight` geographic units
    CellSize { cellwidth: f64, cellheight: f64 },
}

/// Resample a raster to a new resolution with nearest-neighbor sampling.
///
/// The output covers the same bounds as the input. Cell sizes given with a
/// sign flip (inverted axes) are corrected by absolute value, as are any
/// negative computed dimensions. The nodata mask is carried through the
/// repositioning rather than recomputed from cell values.
pub fn resample<T: RasterElement>(raster: &Raster<T>, to: ResampleTo) -> Result<Raster<T>> {
    let bounds = raster.bounds().normalized();

    let (width, height) = match to {
        ResampleTo::Dimensions { width, height } => {
            if width == 0 || height == 0 {
                return Err(Error::InvalidArguments {
                    name: "dimensions",
                    reason: format!("{}x{} must be positive", width, height),
                });
            }
            (width, height)
        }
        ResampleTo::CellSize {
            cellwidth,
            cellheight,
        } => {
            let (cw, ch) = (cellwidth.abs(), cellheight.abs());
            if cw == 0.0 || ch == 0.0 || !cw.is_finite() || !ch.is_finite() {
                return Err(Error::InvalidArguments {
                    name: "cell size",
                    reason: format!("{}x{} must be nonzero and finite", cellwidth, cellheight),
                });
            }
            let width = (bounds.width() / cw).round().abs() as usize;
            let height = (bounds.height() / ch).round().abs() as usize;
            (width.max(1), height.max(1))
        }
    };

    let (out, _mask) = raster.positioned(width, height, bounds)?;
    Ok(out)
}
