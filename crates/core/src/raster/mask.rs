//! Nodata masks derived from band contents

use crate::raster::{Band, RasterElement};
use ndarray::{Array2, Zip};

/// How a mask gets computed for a given element type.
///
/// Both strategies implement the same contract: a cell is invalid only when
/// **all** bands equal the declared sentinel, compared with exact equality.
/// They differ in traversal: `FastEquality` builds a per-band equality map
/// and OR-combines validity (vectorizes well for byte/narrow grids), while
/// `ScanningEquality` does a single pass that short-circuits across bands
/// per cell (cheaper for float/wide grids with many bands).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskStrategy {
    FastEquality,
    ScanningEquality,
}

impl MaskStrategy {
    /// Select a strategy from the element type
    pub fn for_element<T: RasterElement>() -> Self {
        if T::is_float() || T::byte_width() > 2 {
            MaskStrategy::ScanningEquality
        } else {
            MaskStrategy::FastEquality
        }
    }
}

/// Per-raster boolean validity grid, `true` = valid data.
///
/// A mask is a derived attribute: it is computed from band contents and the
/// declared nodata sentinel, never constructed independently by callers.
/// A raster without a sentinel still materializes an all-valid mask, since
/// the mask anchors the transform domain during repositioning (without it,
/// geometric operations would grow phantom borders).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodataMask {
    valid: Array2<bool>,
}

impl NodataMask {
    /// A mask marking every cell valid
    pub fn all_valid(rows: usize, cols: usize) -> Self {
        Self {
            valid: Array2::from_elem((rows, cols), true),
        }
    }

    /// A mask marking every cell invalid
    pub fn all_invalid(rows: usize, cols: usize) -> Self {
        Self {
            valid: Array2::from_elem((rows, cols), false),
        }
    }

    /// Wrap an existing validity grid
    pub fn from_array(valid: Array2<bool>) -> Self {
        Self { valid }
    }

    /// Compute the mask for a set of bands and a declared sentinel.
    ///
    /// With no sentinel (or no bands) the mask is all-valid.
    pub fn compute<T: RasterElement>(bands: &[Band<T>], nodata: Option<T>) -> Self {
        let (Some(nd), Some(first)) = (nodata, bands.first()) else {
            let (rows, cols) = bands
                .first()
                .map(|b| b.shape())
                .unwrap_or((0, 0));
            return Self::all_valid(rows, cols);
        };
        let (rows, cols) = first.shape();
        match MaskStrategy::for_element::<T>() {
            MaskStrategy::FastEquality => Self::fast_equality(bands, nd, rows, cols),
            MaskStrategy::ScanningEquality => Self::scanning_equality(bands, nd, rows, cols),
        }
    }

    /// OR-combine per-band "differs from sentinel" maps
    fn fast_equality<T: RasterElement>(bands: &[Band<T>], nd: T, rows: usize, cols: usize) -> Self {
        let mut valid = Array2::from_elem((rows, cols), false);
        for band in bands {
            Zip::from(&mut valid).and(band.data()).for_each(|v, &cell| {
                *v = *v || cell != nd;
            });
        }
        Self { valid }
    }

    /// Single pass, short-circuiting across bands per cell
    fn scanning_equality<T: RasterElement>(
        bands: &[Band<T>],
        nd: T,
        rows: usize,
        cols: usize,
    ) -> Self {
        let mut valid = Array2::from_elem((rows, cols), false);
        for row in 0..rows {
            for col in 0..cols {
                let any_data = bands
                    .iter()
                    .any(|b| unsafe { b.get_unchecked(row, col) } != nd);
                valid[(row, col)] = any_data;
            }
        }
        Self { valid }
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.valid.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.valid.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.valid.dim()
    }

    /// Whether the cell holds valid data. Out-of-range cells are invalid.
    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        self.valid.get((row, col)).copied().unwrap_or(false)
    }

    /// Mark a cell valid or invalid. Out-of-range writes are ignored.
    pub fn set(&mut self, row: usize, col: usize, valid: bool) {
        if let Some(v) = self.valid.get_mut((row, col)) {
            *v = valid;
        }
    }

    /// Count of valid cells
    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|&&v| v).count()
    }

    /// Whether every cell is valid
    pub fn is_all_valid(&self) -> bool {
        self.valid.iter().all(|&v| v)
    }

    /// Cells valid in both masks
    pub fn intersect(&self, other: &NodataMask) -> NodataMask {
        let mut valid = self.valid.clone();
        Zip::from(&mut valid).and(&other.valid).for_each(|a, &b| {
            *a = *a && b;
        });
        NodataMask { valid }
    }

    /// Cells valid in either mask
    pub fn union(&self, other: &NodataMask) -> NodataMask {
        let mut valid = self.valid.clone();
        Zip::from(&mut valid).and(&other.valid).for_each(|a, &b| {
            *a = *a || b;
        });
        NodataMask { valid }
    }

    /// The underlying validity grid
    pub fn data(&self) -> &Array2<bool> {
        &self.valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_selection() {
        assert_eq!(MaskStrategy::for_element::<u8>(), MaskStrategy::FastEquality);
        assert_eq!(
            MaskStrategy::for_element::<i16>(),
            MaskStrategy::FastEquality
        );
        assert_eq!(
            MaskStrategy::for_element::<f32>(),
            MaskStrategy::ScanningEquality
        );
        assert_eq!(
            MaskStrategy::for_element::<i64>(),
            MaskStrategy::ScanningEquality
        );
    }

    #[test]
    fn test_invalid_requires_all_bands() {
        let mut b0: Band<f64> = Band::filled(2, 2, -9999.0);
        let b1: Band<f64> = Band::filled(2, 2, -9999.0);
        b0.set(0, 1, 5.0).unwrap();

        let mask = NodataMask::compute(&[b0, b1], Some(-9999.0));
        // (0,0): both bands sentinel -> invalid
        assert!(!mask.is_valid(0, 0));
        // (0,1): one band differs -> valid
        assert!(mask.is_valid(0, 1));
    }

    #[test]
    fn test_no_sentinel_all_valid() {
        let bands = [Band::<f32>::filled(3, 4, -9999.0)];
        let mask = NodataMask::compute(&bands, None);
        assert_eq!(mask.shape(), (3, 4));
        assert!(mask.is_all_valid());
    }

    #[test]
    fn test_strategies_agree() {
        let mut band: Band<u8> = Band::filled(3, 3, 255);
        band.set(1, 1, 9).unwrap();
        let bands = [band];

        let fast = NodataMask::fast_equality(&bands, 255, 3, 3);
        let scan = NodataMask::scanning_equality(&bands, 255, 3, 3);
        assert_eq!(fast, scan);
        assert_eq!(fast.valid_count(), 1);
    }

    #[test]
    fn test_intersect_union() {
        let mut a = NodataMask::all_valid(2, 2);
        a.set(0, 0, false);
        let mut b = NodataMask::all_valid(2, 2);
        b.set(1, 1, false);

        let and = a.intersect(&b);
        assert!(!and.is_valid(0, 0));
        assert!(!and.is_valid(1, 1));
        assert!(and.is_valid(0, 1));

        let or = a.union(&b);
        assert!(or.is_all_valid());
    }

    #[test]
    fn test_out_of_range_is_invalid() {
        let mask = NodataMask::all_valid(2, 2);
        assert!(!mask.is_valid(2, 0));
        assert!(!mask.is_valid(0, 5));
    }
}
