//! Clipping rasters against vector features

use terrakit_core::raster::{NodataMask, Raster, RasterElement};
use terrakit_core::vector::FeatureCollection;
use terrakit_core::{Error, Result};

use crate::rasterize::paint_features;

/// Clip a raster to the footprint of a feature collection.
///
/// The features are burned onto the raster's own grid as a stencil. Cells
/// outside the stencil are overwritten with the nodata sentinel in every
/// band (zero when no sentinel is declared), and the output mask is the
/// intersection of the input mask with the stencil. The grid itself is
/// unchanged, so the result stays pixel-aligned with the input.
pub fn clip<T: RasterElement>(
    raster: &Raster<T>,
    features: &FeatureCollection,
) -> Result<Raster<T>> {
    if features.is_empty() {
        return Err(Error::InvalidArguments {
            name: "features",
            reason: "nothing to clip against".to_string(),
        });
    }

    let (rows, cols) = raster.shape();
    let stencil = paint_features(features, raster.transform(), rows, cols);
    let fill = raster.nodata().unwrap_or_else(T::zero);

    let mut out = raster.clone();
    for b in 0..out.band_count() {
        let band = out.band_mut(b)?;
        for row in 0..rows {
            for col in 0..cols {
                if unsafe { stencil.get_unchecked(row, col) } == 0 {
                    unsafe { band.set_unchecked(row, col, fill) };
                }
            }
        }
    }

    let coverage = NodataMask::from_array(stencil.data().mapv(|v| v != 0));
    let clipped = raster.mask().intersect(&coverage);
    out.set_mask(clipped);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;
    use terrakit_core::raster::GeoTransform;
    use terrakit_core::vector::Feature;

    fn grid() -> Raster<i32> {
        let mut raster = Raster::from_vec((1..=16).collect::<Vec<i32>>(), 4, 4).unwrap();
        raster.set_transform(GeoTransform::north_up(0.0, 4.0, 1.0, -1.0).unwrap());
        raster.set_nodata(Some(-1));
        raster
    }

    fn square(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> FeatureCollection {
        std::iter::once(Feature::new(polygon![
            (x: xmin, y: ymin),
            (x: xmax, y: ymin),
            (x: xmax, y: ymax),
            (x: xmin, y: ymax),
        ]))
        .collect()
    }

    #[test]
    fn test_clip_fills_outside_with_nodata() {
        let raster = grid();
        let clipped = clip(&raster, &square(1.0, 1.0, 3.0, 3.0)).unwrap();

        // Inside keeps its values
        assert_eq!(clipped.get(0, 1, 1).unwrap(), raster.get(0, 1, 1).unwrap());
        assert_eq!(clipped.get(0, 2, 2).unwrap(), raster.get(0, 2, 2).unwrap());
        // Outside becomes the sentinel
        assert_eq!(clipped.get(0, 0, 0).unwrap(), -1);
        assert_eq!(clipped.get(0, 3, 3).unwrap(), -1);
        // Mask mirrors the footprint
        assert!(clipped.mask().is_valid(1, 2));
        assert!(!clipped.mask().is_valid(0, 0));
        assert_eq!(clipped.mask().valid_count(), 4);
    }

    #[test]
    fn test_clip_without_sentinel_fills_zero() {
        let mut raster = grid();
        raster.set_nodata(None);
        let clipped = clip(&raster, &square(1.0, 1.0, 3.0, 3.0)).unwrap();

        assert_eq!(clipped.get(0, 0, 0).unwrap(), 0);
        assert_eq!(clipped.get(0, 1, 1).unwrap(), raster.get(0, 1, 1).unwrap());
        // The primed mask still records the footprint
        assert!(!clipped.mask().is_valid(0, 0));
    }

    #[test]
    fn test_clip_intersects_existing_mask() {
        let mut raster = grid();
        let band = raster.band_mut(0).unwrap();
        band.set(1, 1, -1).unwrap();

        let clipped = clip(&raster, &square(1.0, 1.0, 3.0, 3.0)).unwrap();
        // Inside the footprint but already nodata before the clip
        assert!(!clipped.mask().is_valid(1, 1));
        assert!(clipped.mask().is_valid(1, 2));
    }

    #[test]
    fn test_clip_grid_unchanged() {
        let raster = grid();
        let clipped = clip(&raster, &square(1.0, 1.0, 3.0, 3.0)).unwrap();
        assert_eq!(clipped.shape(), raster.shape());
        assert_eq!(clipped.transform(), raster.transform());
    }

    #[test]
    fn test_clip_empty_features_rejected() {
        let raster = grid();
        assert!(matches!(
            clip(&raster, &FeatureCollection::new()),
            Err(Error::InvalidArguments { .. })
        ));
    }
}
