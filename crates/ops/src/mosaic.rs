//! Compositing overlapping rasters

use crate::align::align_rasters;
use terrakit_core::raster::{Raster, RasterElement};
use terrakit_core::Result;

/// Merge rasters into one by aligning them onto a shared grid and pasting
/// band 0 of each onto the first, in listed order.
///
/// Each raster's destination mask acts as a paste stencil, so on overlap
/// the **last listed** raster wins. This is a fixed precedence rule, not spatial
/// or quality based. Only band 0 is merged; merging further bands has no
/// defined semantics here and callers must composite them separately.
pub fn mosaic<T: RasterElement>(rasters: &[&Raster<T>]) -> Result<Raster<T>> {
    let mut aligned = align_rasters(rasters)?.into_iter();

    // align_rasters rejects empty input, so the base always exists
    let (mut base, mut coverage) = match aligned.next() {
        Some(pair) => pair,
        None => unreachable!("align_rasters yields one output per input"),
    };
    let (rows, cols) = base.shape();

    for (overlay, stencil) in aligned {
        let src = overlay.band(0)?;
        let band = base.band_mut(0)?;
        for row in 0..rows {
            for col in 0..cols {
                if stencil.is_valid(row, col) {
                    let v = unsafe { src.get_unchecked(row, col) };
                    unsafe { band.set_unchecked(row, col, v) };
                }
            }
        }
        coverage = coverage.union(&stencil);
    }

    base.set_mask(coverage);
    Ok(base)
}
