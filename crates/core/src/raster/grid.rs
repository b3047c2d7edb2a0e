//! Multi-band georeferenced rasters

use crate::crs::Crs;
use crate::error::{Error, Result};
use crate::raster::{Band, Bounds, GeoTransform, NodataMask, RasterElement};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// Which point of a cell its coordinate refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellAnchor {
    /// Coordinates address cell centers (GeoTIFF "pixel is area")
    #[default]
    Center,
    /// Coordinates address the cell's north-west corner ("pixel is point")
    NorthWest,
}

/// A georeferenced raster: an ordered sequence of equally-sized bands plus
/// an affine transform, an optional CRS, an optional nodata sentinel and a
/// cell-anchor convention.
///
/// The nodata mask is derived lazily from the bands and memoized. Every
/// mutator that can change band contents or the sentinel resets the cached
/// mask, so a stale mask is unrepresentable through this API. `clone()`
/// deep-copies bands but shares the cached mask `Arc` until either copy is
/// mutated.
///
/// A `Raster` must not be mutated from two threads at once (enforced by
/// `&mut`); concurrent read-only access is safe, including the first lazy
/// mask computation.
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    bands: Vec<Band<T>>,
    transform: GeoTransform,
    crs: Option<Crs>,
    nodata: Option<T>,
    anchor: CellAnchor,
    mask: OnceLock<Arc<NodataMask>>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a single-band raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::blank(rows, cols, 1, None)
    }

    /// Create a raster with `band_count` bands, filled with the nodata
    /// sentinel (or zeros when none is given)
    pub fn blank(rows: usize, cols: usize, band_count: usize, nodata: Option<T>) -> Self {
        let fill = nodata.unwrap_or_else(T::zero);
        let bands = (0..band_count.max(1))
            .map(|_| Band::filled(rows, cols, fill))
            .collect();
        Self {
            bands,
            transform: GeoTransform::default(),
            crs: None,
            nodata,
            anchor: CellAnchor::default(),
            mask: OnceLock::new(),
        }
    }

    /// Create a single-band raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            bands: vec![Band::filled(rows, cols, value)],
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
            anchor: CellAnchor::default(),
            mask: OnceLock::new(),
        }
    }

    /// Create a single-band raster from a row-major vector
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        Ok(Self::from_band(Band::from_vec(data, rows, cols)?))
    }

    /// Wrap a single band
    pub fn from_band(band: Band<T>) -> Self {
        Self {
            bands: vec![band],
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
            anchor: CellAnchor::default(),
            mask: OnceLock::new(),
        }
    }

    /// Wrap a sequence of bands, all of which must share dimensions
    pub fn from_bands(bands: Vec<Band<T>>) -> Result<Self> {
        let Some(first) = bands.first() else {
            return Err(Error::InvalidDimensions {
                width: 0,
                height: 0,
            });
        };
        let (rows, cols) = first.shape();
        for band in &bands[1..] {
            if band.shape() != (rows, cols) {
                return Err(Error::SizeMismatch {
                    er: rows,
                    ec: cols,
                    ar: band.rows(),
                    ac: band.cols(),
                });
            }
        }
        Ok(Self {
            bands,
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
            anchor: CellAnchor::default(),
            mask: OnceLock::new(),
        })
    }

    /// A raster of a different element type sharing this raster's
    /// georeferencing, with one zeroed band of the given dimensions
    pub fn with_same_meta<U: RasterElement>(&self, rows: usize, cols: usize) -> Raster<U> {
        Raster {
            bands: vec![Band::new(rows, cols)],
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: None,
            anchor: self.anchor,
            mask: OnceLock::new(),
        }
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.bands[0].rows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.bands[0].cols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.bands[0].shape()
    }

    /// Number of bands
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Total number of cells per band
    pub fn len(&self) -> usize {
        self.rows() * self.cols()
    }

    /// Whether the raster has no cells
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Band access

    /// All bands in order
    pub fn bands(&self) -> &[Band<T>] {
        &self.bands
    }

    /// Get a band by index
    pub fn band(&self, band: usize) -> Result<&Band<T>> {
        self.bands.get(band).ok_or(Error::BandIndex {
            band,
            count: self.bands.len(),
        })
    }

    /// Get a band mutably. Invalidates the cached mask.
    pub fn band_mut(&mut self, band: usize) -> Result<&mut Band<T>> {
        self.invalidate_mask();
        let count = self.bands.len();
        self.bands
            .get_mut(band)
            .ok_or(Error::BandIndex { band, count })
    }

    /// Replace a band's buffer. Invalidates the cached mask.
    pub fn replace_band(&mut self, band: usize, buffer: Band<T>) -> Result<()> {
        if buffer.shape() != self.shape() {
            return Err(Error::SizeMismatch {
                er: self.rows(),
                ec: self.cols(),
                ar: buffer.rows(),
                ac: buffer.cols(),
            });
        }
        self.invalidate_mask();
        let count = self.bands.len();
        let slot = self
            .bands
            .get_mut(band)
            .ok_or(Error::BandIndex { band, count })?;
        *slot = buffer;
        Ok(())
    }

    /// Get value at (band, row, col)
    pub fn get(&self, band: usize, row: usize, col: usize) -> Result<T> {
        self.band(band)?.get(row, col)
    }

    /// Set value at (band, row, col). Invalidates the cached mask.
    pub fn set(&mut self, band: usize, row: usize, col: usize, value: T) -> Result<()> {
        self.band_mut(band)?.set(row, col, value)
    }

    // Metadata

    /// Get the geotransform
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Set the geotransform
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// Get the CRS
    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    /// Set the CRS
    pub fn set_crs(&mut self, crs: Option<Crs>) {
        self.crs = crs;
    }

    /// Get the nodata sentinel
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Set the nodata sentinel. Invalidates the cached mask.
    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.invalidate_mask();
        self.nodata = nodata;
    }

    /// Get the cell anchor convention
    pub fn anchor(&self) -> CellAnchor {
        self.anchor
    }

    /// Set the cell anchor convention
    pub fn set_anchor(&mut self, anchor: CellAnchor) {
        self.anchor = anchor;
    }

    /// Cell width in geographic units (signed)
    pub fn cell_width(&self) -> f64 {
        self.transform.cell_width()
    }

    /// Cell height in geographic units (signed)
    pub fn cell_height(&self) -> f64 {
        self.transform.cell_height()
    }

    /// Geographic bounds, derived from the transformed pixel corners
    pub fn bounds(&self) -> Bounds {
        self.transform.bounds(self.cols(), self.rows())
    }

    // Coordinate conversion

    /// Map fractional cell coordinates to geographic coordinates
    pub fn cell_to_geo(&self, col: f64, row: f64) -> (f64, f64) {
        self.transform.cell_to_geo(col, row)
    }

    /// Map geographic coordinates to fractional cell coordinates
    pub fn geo_to_cell(&self, x: f64, y: f64) -> (f64, f64) {
        self.transform.geo_to_cell(x, y)
    }

    /// Map geographic coordinates to the nearest integer cell
    pub fn geo_to_cell_rounded(&self, x: f64, y: f64) -> (i64, i64) {
        self.transform.geo_to_cell_rounded(x, y)
    }

    // Nodata mask

    /// Check if a value equals the nodata sentinel
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// The nodata mask for this raster, computed on first use and memoized.
    ///
    /// A cell is invalid only when every band holds the sentinel. Without
    /// a declared sentinel the mask is all-valid.
    pub fn mask(&self) -> &NodataMask {
        self.mask
            .get_or_init(|| Arc::new(NodataMask::compute(&self.bands, self.nodata)))
    }

    /// Shared handle to the memoized mask
    pub fn mask_arc(&self) -> Arc<NodataMask> {
        self.mask();
        match self.mask.get() {
            Some(m) => Arc::clone(m),
            None => Arc::new(NodataMask::all_valid(self.rows(), self.cols())),
        }
    }

    /// Install a precomputed mask, replacing any cached one.
    ///
    /// Used by geometric operations that transform a source mask alongside
    /// the band buffers instead of re-deriving it from cell values.
    pub fn set_mask(&mut self, mask: NodataMask) {
        let cell = OnceLock::new();
        let _ = cell.set(Arc::new(mask));
        self.mask = cell;
    }

    fn invalidate_mask(&mut self) {
        self.mask = OnceLock::new();
    }

    // Geometric operations

    /// Reproject this raster's cells onto a destination grid of
    /// `width` x `height` cells covering `bounds`.
    ///
    /// The destination transform is anchored at the (normalized) bounds'
    /// top-left, north-up, with cell sizes scaled to fit the target
    /// dimensions. Each destination cell samples the source band at the
    /// source cell containing the destination cell's center, i.e. nearest
    /// neighbor, no interpolation.
    ///
    /// The source mask is transformed through the identical mapping and
    /// returned; it is also primed into the result's mask cache. Cells with
    /// no valid source are left at **zero**, not the sentinel; consumers
    /// must go through the mask rather than compare against the sentinel.
    pub fn positioned(
        &self,
        width: usize,
        height: usize,
        bounds: Bounds,
    ) -> Result<(Raster<T>, NodataMask)> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidArguments {
                name: "target dimensions",
                reason: format!("{}x{} must be positive", width, height),
            });
        }
        let b = bounds.normalized();
        if !b.has_area() {
            return Err(Error::InvalidArguments {
                name: "bounds",
                reason: "zero-area bounding box".to_string(),
            });
        }

        let dest_tf = GeoTransform::north_up(
            b.xmin,
            b.ymax,
            b.width() / width as f64,
            -(b.height() / height as f64),
        )?;

        let src_mask = self.mask();
        let (src_rows, src_cols) = self.shape();

        let mut dest_bands: Vec<Band<T>> = (0..self.bands.len())
            .map(|_| Band::new(height, width))
            .collect();
        let mut dest_valid = Array2::from_elem((height, width), false);

        for row in 0..height {
            for col in 0..width {
                let (x, y) = dest_tf.cell_to_geo(col as f64 + 0.5, row as f64 + 0.5);
                let (fc, fr) = self.transform.geo_to_cell(x, y);
                let (sc, sr) = (fc.floor(), fr.floor());
                if sc < 0.0 || sr < 0.0 {
                    continue;
                }
                let (sc, sr) = (sc as usize, sr as usize);
                if sc >= src_cols || sr >= src_rows || !src_mask.is_valid(sr, sc) {
                    continue;
                }
                for (bi, dest) in dest_bands.iter_mut().enumerate() {
                    let v = unsafe { self.bands[bi].get_unchecked(sr, sc) };
                    unsafe { dest.set_unchecked(row, col, v) };
                }
                dest_valid[(row, col)] = true;
            }
        }

        let dest_mask = NodataMask::from_array(dest_valid);
        let mut out = Raster {
            bands: dest_bands,
            transform: dest_tf,
            crs: self.crs.clone(),
            nodata: self.nodata,
            anchor: self.anchor,
            mask: OnceLock::new(),
        };
        out.set_mask(dest_mask.clone());
        Ok((out, dest_mask))
    }
}
