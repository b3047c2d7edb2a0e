//! Burning vector features into raster grids

use geo_types::{Geometry, LineString, Polygon};
use terrakit_core::raster::{Band, Bounds, GeoTransform, Raster};
use terrakit_core::vector::FeatureCollection;
use terrakit_core::{Error, Result};

/// Burn vector features into a binary raster.
///
/// Cells touched by a feature carry 1, everything else 0 with 0 declared
/// as nodata, so the mask marks exactly the burned cells. Polygons fill
/// their exterior minus holes (even-odd rule over all rings), lines paint
/// one-cell-wide paths, points single cells. The output grid is anchored
/// at the top-left of `bounds`, which defaults to the features' own
/// bounding box.
pub fn rasterize(
    features: &FeatureCollection,
    cellwidth: f64,
    cellheight: f64,
    bounds: Option<Bounds>,
) -> Result<Raster<u8>> {
    let (cw, ch) = (cellwidth.abs(), cellheight.abs());
    if cw == 0.0 || ch == 0.0 || !cw.is_finite() || !ch.is_finite() {
        return Err(Error::InvalidArguments {
            name: "cell size",
            reason: format!("{}x{} must be nonzero and finite", cellwidth, cellheight),
        });
    }

    let mut b = match bounds.or_else(|| features.bounds()) {
        Some(b) => b.normalized(),
        None => {
            return Err(Error::InvalidArguments {
                name: "features",
                reason: "no geometry to derive bounds from".to_string(),
            })
        }
    };
    // Degenerate boxes (single points, straight lines) get one cell of room
    if b.width() == 0.0 {
        b.xmax = b.xmin + cw;
    }
    if b.height() == 0.0 {
        b.ymax = b.ymin + ch;
    }

    let width = ((b.width() / cw).ceil() as usize).max(1);
    let height = ((b.height() / ch).ceil() as usize).max(1);
    let transform = GeoTransform::north_up(b.xmin, b.ymax, cw, -ch)?;

    let band = paint_features(features, &transform, height, width);

    let mut raster = Raster::from_band(band);
    raster.set_transform(transform);
    raster.set_nodata(Some(0));
    Ok(raster)
}

/// Paint all features onto a zeroed band of the given grid
pub(crate) fn paint_features(
    features: &FeatureCollection,
    transform: &GeoTransform,
    rows: usize,
    cols: usize,
) -> Band<u8> {
    let mut band = Band::new(rows, cols);
    for feature in features.iter() {
        paint_geometry(&mut band, transform, &feature.geometry);
    }
    band
}

fn paint_geometry(band: &mut Band<u8>, transform: &GeoTransform, geometry: &Geometry<f64>) {
    match geometry {
        Geometry::Point(p) => paint_point(band, transform, p.x(), p.y()),
        Geometry::MultiPoint(mp) => {
            for p in mp {
                paint_point(band, transform, p.x(), p.y());
            }
        }
        Geometry::Line(l) => {
            paint_segment(band, transform, (l.start.x, l.start.y), (l.end.x, l.end.y));
        }
        Geometry::LineString(ls) => paint_linestring(band, transform, ls),
        Geometry::MultiLineString(mls) => {
            for ls in mls {
                paint_linestring(band, transform, ls);
            }
        }
        Geometry::Polygon(poly) => paint_polygon(band, transform, poly),
        Geometry::MultiPolygon(mp) => {
            for poly in mp {
                paint_polygon(band, transform, poly);
            }
        }
        Geometry::Rect(r) => paint_polygon(band, transform, &r.to_polygon()),
        Geometry::Triangle(t) => paint_polygon(band, transform, &t.to_polygon()),
        Geometry::GeometryCollection(gc) => {
            for g in gc {
                paint_geometry(band, transform, g);
            }
        }
    }
}

fn mark(band: &mut Band<u8>, row: i64, col: i64) {
    if row >= 0 && col >= 0 && (row as usize) < band.rows() && (col as usize) < band.cols() {
        unsafe { band.set_unchecked(row as usize, col as usize, 1) };
    }
}

fn cell_of(transform: &GeoTransform, x: f64, y: f64) -> (i64, i64) {
    let (col, row) = transform.geo_to_cell(x, y);
    (col.floor() as i64, row.floor() as i64)
}

fn paint_point(band: &mut Band<u8>, transform: &GeoTransform, x: f64, y: f64) {
    let (col, row) = cell_of(transform, x, y);
    mark(band, row, col);
}

fn paint_linestring(band: &mut Band<u8>, transform: &GeoTransform, line: &LineString<f64>) {
    let coords: Vec<_> = line.coords().collect();
    for pair in coords.windows(2) {
        paint_segment(
            band,
            transform,
            (pair[0].x, pair[0].y),
            (pair[1].x, pair[1].y),
        );
    }
    if coords.len() == 1 {
        paint_point(band, transform, coords[0].x, coords[0].y);
    }
}

/// Bresenham walk between the cells containing the segment endpoints
fn paint_segment(band: &mut Band<u8>, transform: &GeoTransform, a: (f64, f64), b: (f64, f64)) {
    let (mut col, mut row) = cell_of(transform, a.0, a.1);
    let (end_col, end_row) = cell_of(transform, b.0, b.1);

    let dc = (end_col - col).abs();
    let dr = -(end_row - row).abs();
    let step_c = if col < end_col { 1 } else { -1 };
    let step_r = if row < end_row { 1 } else { -1 };
    let mut err = dc + dr;

    loop {
        mark(band, row, col);
        if col == end_col && row == end_row {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dr {
            err += dr;
            col += step_c;
        }
        if e2 <= dc {
            err += dc;
            row += step_r;
        }
    }
}

/// Even-odd scanline fill across the exterior and all interior rings
fn paint_polygon(band: &mut Band<u8>, transform: &GeoTransform, poly: &Polygon<f64>) {
    let rings: Vec<&LineString<f64>> =
        std::iter::once(poly.exterior()).chain(poly.interiors()).collect();

    let mut crossings: Vec<f64> = Vec::new();
    for row in 0..band.rows() {
        // Sample at the row of cell centers
        let (_, y) = transform.cell_to_geo(0.5, row as f64 + 0.5);

        crossings.clear();
        for ring in &rings {
            let coords: Vec<_> = ring.coords().collect();
            for pair in coords.windows(2) {
                let (y1, y2) = (pair[0].y, pair[1].y);
                if (y1 > y) != (y2 > y) {
                    let t = (y - y1) / (y2 - y1);
                    crossings.push(pair[0].x + t * (pair[1].x - pair[0].x));
                }
            }
        }
        crossings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        for span in crossings.chunks_exact(2) {
            let (col_a, _) = transform.geo_to_cell(span[0], y);
            let (col_b, _) = transform.geo_to_cell(span[1], y);
            // Cells whose center falls inside the span
            let start = (col_a - 0.5).ceil() as i64;
            let end = (col_b - 0.5).floor() as i64;
            for col in start..=end {
                mark(band, row as i64, col);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{polygon, LineString, Point};
    use terrakit_core::vector::Feature;

    fn collect(geoms: Vec<Geometry<f64>>) -> FeatureCollection {
        geoms.into_iter().map(Feature::new).collect()
    }

    #[test]
    fn test_polygon_fill() {
        let fc = collect(vec![polygon![
            (x: 1.0, y: 1.0),
            (x: 4.0, y: 1.0),
            (x: 4.0, y: 4.0),
            (x: 1.0, y: 4.0),
        ]
        .into()]);

        let raster = rasterize(&fc, 1.0, 1.0, Some(Bounds::new(0.0, 0.0, 5.0, 5.0))).unwrap();
        assert_eq!(raster.shape(), (5, 5));

        // Interior burned, outside untouched
        assert_eq!(raster.get(0, 2, 2).unwrap(), 1);
        assert_eq!(raster.get(0, 0, 0).unwrap(), 0);
        assert_eq!(raster.get(0, 4, 4).unwrap(), 0);
        // Mask mirrors the burn
        assert!(raster.mask().is_valid(2, 2));
        assert!(!raster.mask().is_valid(0, 0));
    }

    #[test]
    fn test_polygon_hole_left_empty() {
        let poly = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (6.0, 0.0), (6.0, 6.0), (0.0, 6.0), (0.0, 0.0)]),
            vec![LineString::from(vec![
                (2.0, 2.0),
                (4.0, 2.0),
                (4.0, 4.0),
                (2.0, 4.0),
                (2.0, 2.0),
            ])],
        );
        let fc = collect(vec![poly.into()]);

        let raster = rasterize(&fc, 1.0, 1.0, None).unwrap();
        assert_eq!(raster.shape(), (6, 6));
        // Ring interior filled, hole empty
        assert_eq!(raster.get(0, 0, 0).unwrap(), 1);
        assert_eq!(raster.get(0, 3, 3).unwrap(), 0);
    }

    #[test]
    fn test_line_path() {
        let fc = collect(vec![LineString::from(vec![(0.5, 0.5), (3.5, 0.5)]).into()]);
        let raster = rasterize(&fc, 1.0, 1.0, Some(Bounds::new(0.0, 0.0, 4.0, 4.0))).unwrap();

        // Horizontal path along the bottom row
        for col in 0..4 {
            assert_eq!(raster.get(0, 3, col).unwrap(), 1);
        }
        assert_eq!(raster.get(0, 0, 0).unwrap(), 0);
    }

    #[test]
    fn test_point_mark() {
        let fc = collect(vec![Point::new(2.5, 2.5).into()]);
        let raster = rasterize(&fc, 1.0, 1.0, Some(Bounds::new(0.0, 0.0, 4.0, 4.0))).unwrap();

        assert_eq!(raster.get(0, 1, 2).unwrap(), 1);
        assert_eq!(raster.mask().valid_count(), 1);
    }

    #[test]
    fn test_single_point_default_bounds() {
        // Degenerate bbox padded out to one cell
        let fc = collect(vec![Point::new(10.0, 10.0).into()]);
        let raster = rasterize(&fc, 1.0, 1.0, None).unwrap();
        assert_eq!(raster.shape(), (1, 1));
    }

    #[test]
    fn test_empty_collection_rejected() {
        let fc = FeatureCollection::new();
        assert!(matches!(
            rasterize(&fc, 1.0, 1.0, None),
            Err(Error::InvalidArguments { .. })
        ));
    }

    #[test]
    fn test_zero_cell_size_rejected() {
        let fc = collect(vec![Point::new(0.0, 0.0).into()]);
        assert!(rasterize(&fc, 0.0, 1.0, None).is_err());
    }
}
