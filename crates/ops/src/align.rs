//! Reprojecting rasters onto a shared grid

use terrakit_core::raster::{NodataMask, Raster, RasterElement};
use terrakit_core::{Error, Result};

/// Reposition every input raster onto one shared pixel grid.
///
/// The shared grid covers the union of all (normalized) bounding boxes.
/// The common cell size is taken from the first raster, an arbitrary but
/// fixed tie-break, so callers control the reference resolution by
/// ordering. Each returned pair carries the repositioned raster and the
/// destination mask saying which of its cells are authoritative.
pub fn align_rasters<T: RasterElement>(
    rasters: &[&Raster<T>],
) -> Result<Vec<(Raster<T>, NodataMask)>> {
    let Some(first) = rasters.first() else {
        return Err(Error::InvalidArguments {
            name: "rasters",
            reason: "at least one raster required".to_string(),
        });
    };

    let mut union = first.bounds().normalized();
    for raster in &rasters[1..] {
        union = union.union(&raster.bounds());
    }

    let cellwidth = first.cell_width().abs();
    let cellheight = first.cell_height().abs();
    if cellwidth == 0.0 || cellheight == 0.0 {
        return Err(Error::InvalidArguments {
            name: "rasters",
            reason: "reference raster has zero cell size".to_string(),
        });
    }

    let width = ((union.width() / cellwidth).round() as usize).max(1);
    let height = ((union.height() / cellheight).round() as usize).max(1);

    rasters
        .iter()
        .map(|raster| raster.positioned(width, height, union))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use terrakit_core::raster::GeoTransform;

    fn square(origin_x: f64, origin_y: f64, size: usize, value: u8) -> Raster<u8> {
        let mut raster: Raster<u8> = Raster::filled(size, size, value);
        raster.set_transform(GeoTransform::north_up(origin_x, origin_y, 1.0, -1.0).unwrap());
        raster
    }

    #[test]
    fn test_union_grid_covers_all_inputs() {
        let a = square(0.0, 4.0, 4, 1);
        let b = square(2.0, 6.0, 4, 2);

        let aligned = align_rasters(&[&a, &b]).unwrap();
        assert_eq!(aligned.len(), 2);

        // Union bounds is [0,0]..[6,6] at the first raster's 1-unit cells
        for (raster, _) in &aligned {
            assert_eq!(raster.shape(), (6, 6));
            let bounds = raster.bounds().normalized();
            assert_relative_eq!(bounds.xmin, 0.0, epsilon = 1e-9);
            assert_relative_eq!(bounds.ymax, 6.0, epsilon = 1e-9);
        }

        // Masks mark each input's coverage within the union
        let (_, mask_a) = &aligned[0];
        assert!(mask_a.is_valid(5, 0)); // bottom-left belongs to a
        assert!(!mask_a.is_valid(0, 5)); // top-right belongs to b
        let (_, mask_b) = &aligned[1];
        assert!(mask_b.is_valid(0, 5));
        assert!(!mask_b.is_valid(5, 0));
    }

    #[test]
    fn test_first_raster_sets_resolution() {
        let a = square(0.0, 4.0, 4, 1); // 1-unit cells
        let mut b: Raster<u8> = Raster::filled(2, 2, 2); // 2-unit cells
        b.set_transform(GeoTransform::north_up(0.0, 4.0, 2.0, -2.0).unwrap());

        let aligned = align_rasters(&[&a, &b]).unwrap();
        assert_eq!(aligned[0].0.shape(), (4, 4));

        let flipped = align_rasters(&[&b, &a]).unwrap();
        assert_eq!(flipped[0].0.shape(), (2, 2));
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(
            align_rasters::<u8>(&[]),
            Err(Error::InvalidArguments { .. })
        ));
    }
}
