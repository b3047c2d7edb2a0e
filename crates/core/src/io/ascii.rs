//! ESRI ASCII grid reading and writing
//!
//! Header keywords are case-insensitive. The lower-left anchor may address
//! a cell corner (`XLLCORNER`/`YLLCORNER`) or a cell center
//! (`XLLCENTER`/`YLLCENTER`); the center variant shifts the origin by half
//! a cell. Data rows are whitespace-separated and stored top row first.

use crate::error::{Error, Result};
use crate::raster::{CellAnchor, GeoTransform, Raster, RasterElement};
use std::fs;
use std::path::Path;

const DEFAULT_NODATA: f64 = -9999.0;

#[derive(Debug, Default)]
struct AsciiHeader {
    ncols: Option<usize>,
    nrows: Option<usize>,
    xll: Option<f64>,
    yll: Option<f64>,
    xll_is_center: bool,
    yll_is_center: bool,
    cellsize: Option<f64>,
    nodata: Option<f64>,
}

fn bad(msg: impl Into<String>) -> Error {
    Error::UnsupportedFormat(format!("ASCII grid: {}", msg.into()))
}

/// Parse ASCII grid contents into a raster
pub fn parse_ascii_grid<T: RasterElement>(contents: &str) -> Result<Raster<T>> {
    let mut header = AsciiHeader::default();
    let mut tokens = contents.split_whitespace().peekable();

    // Header is keyword/value pairs until the first bare number
    while let Some(&word) = tokens.peek() {
        if word.parse::<f64>().is_ok() {
            break;
        }
        let keyword = tokens
            .next()
            .ok_or_else(|| bad("truncated header"))?
            .to_ascii_uppercase();
        let value = tokens.next().ok_or_else(|| bad("header key without value"))?;
        let number = value
            .parse::<f64>()
            .map_err(|_| bad(format!("bad value for {}: {}", keyword, value)))?;
        match keyword.as_str() {
            "NCOLS" => header.ncols = Some(number as usize),
            "NROWS" => header.nrows = Some(number as usize),
            "XLLCORNER" => header.xll = Some(number),
            "YLLCORNER" => header.yll = Some(number),
            "XLLCENTER" => {
                header.xll = Some(number);
                header.xll_is_center = true;
            }
            "YLLCENTER" => {
                header.yll = Some(number);
                header.yll_is_center = true;
            }
            "CELLSIZE" => header.cellsize = Some(number),
            "NODATA_VALUE" => header.nodata = Some(number),
            other => return Err(bad(format!("unknown header field {}", other))),
        }
    }

    let ncols = header.ncols.ok_or_else(|| bad("missing NCOLS"))?;
    let nrows = header.nrows.ok_or_else(|| bad("missing NROWS"))?;
    let cellsize = header.cellsize.ok_or_else(|| bad("missing CELLSIZE"))?;
    let mut xll = header.xll.ok_or_else(|| bad("missing XLLCORNER/XLLCENTER"))?;
    let mut yll = header.yll.ok_or_else(|| bad("missing YLLCORNER/YLLCENTER"))?;
    let nodata = header.nodata.unwrap_or(DEFAULT_NODATA);

    if header.xll_is_center {
        xll -= cellsize / 2.0;
    }
    if header.yll_is_center {
        yll -= cellsize / 2.0;
    }

    let mut data = Vec::with_capacity(nrows * ncols);
    for token in tokens {
        let v = token
            .parse::<f64>()
            .map_err(|_| bad(format!("bad cell value: {}", token)))?;
        data.push(T::from_f64(v).unwrap_or_else(T::cast_fallback));
    }
    if data.len() != nrows * ncols {
        return Err(bad(format!(
            "expected {} cells, found {}",
            nrows * ncols,
            data.len()
        )));
    }

    let mut raster = Raster::from_vec(data, nrows, ncols)?;
    // Origin is the top-left corner: one grid height above the lower-left
    let origin_y = yll + nrows as f64 * cellsize;
    raster.set_transform(GeoTransform::north_up(xll, origin_y, cellsize, -cellsize)?);
    raster.set_nodata(T::from_f64(nodata));
    raster.set_anchor(if header.xll_is_center || header.yll_is_center {
        CellAnchor::Center
    } else {
        CellAnchor::NorthWest
    });
    Ok(raster)
}

/// Read an ASCII grid file into a single-band raster
pub fn read_ascii_grid<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let contents = fs::read_to_string(path.as_ref())?;
    parse_ascii_grid(&contents)
}

/// Serialize a raster's first band as ASCII grid contents
pub fn format_ascii_grid<T: RasterElement>(raster: &Raster<T>) -> Result<String> {
    let gt = raster.transform();
    if !gt.is_north_up() {
        return Err(Error::UnsupportedFormat(
            "ASCII grid cannot represent rotated transforms".to_string(),
        ));
    }
    if (gt.cell_width() - gt.cell_height().abs()).abs() > 1e-9 {
        return Err(Error::UnsupportedFormat(
            "ASCII grid requires square cells".to_string(),
        ));
    }

    let (rows, cols) = raster.shape();
    let cellsize = gt.cell_width();
    let xll = gt.xoffset();
    let yll = gt.yoffset() - rows as f64 * cellsize;
    let nodata = raster
        .nodata()
        .and_then(|v| v.to_f64())
        .unwrap_or(DEFAULT_NODATA);

    let mut out = String::new();
    out.push_str(&format!("NCOLS {}\n", cols));
    out.push_str(&format!("NROWS {}\n", rows));
    // Center-anchored rasters keep the anchor variant they were read with
    if raster.anchor() == CellAnchor::Center {
        out.push_str(&format!("XLLCENTER {}\n", xll + cellsize / 2.0));
        out.push_str(&format!("YLLCENTER {}\n", yll + cellsize / 2.0));
    } else {
        out.push_str(&format!("XLLCORNER {}\n", xll));
        out.push_str(&format!("YLLCORNER {}\n", yll));
    }
    out.push_str(&format!("CELLSIZE {}\n", cellsize));
    out.push_str(&format!("NODATA_VALUE {}\n", nodata));

    let band = raster.band(0)?;
    for row in 0..rows {
        let mut line = String::new();
        for col in 0..cols {
            if col > 0 {
                line.push(' ');
            }
            let v = band.get(row, col)?.to_f64().unwrap_or(nodata);
            line.push_str(&v.to_string());
        }
        line.push('\n');
        out.push_str(&line);
    }
    Ok(out)
}

/// Write a raster's first band as an ASCII grid file
pub fn write_ascii_grid<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    fs::write(path.as_ref(), format_ascii_grid(raster)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const GRID: &str = "\
NCOLS 3
NROWS 2
XLLCORNER 10.0
YLLCORNER 20.0
CELLSIZE 5.0
NODATA_VALUE -1
1 2 3
4 -1 6
";

    #[test]
    fn test_parse_corner_anchored() {
        let raster: Raster<f64> = parse_ascii_grid(GRID).unwrap();
        assert_eq!(raster.shape(), (2, 3));
        assert_eq!(raster.nodata(), Some(-1.0));
        assert_eq!(raster.anchor(), CellAnchor::NorthWest);

        // Top row comes first in the file
        assert_eq!(raster.get(0, 0, 0).unwrap(), 1.0);
        assert_eq!(raster.get(0, 1, 2).unwrap(), 6.0);

        let b = raster.bounds();
        assert_relative_eq!(b.xmin, 10.0);
        assert_relative_eq!(b.ymin, 20.0);
        assert_relative_eq!(b.xmax, 25.0);
        assert_relative_eq!(b.ymax, 30.0);

        // Sentinel cell is masked out
        assert!(!raster.mask().is_valid(1, 1));
        assert!(raster.mask().is_valid(0, 0));
    }

    #[test]
    fn test_parse_center_anchored_shifts_origin() {
        let grid = "ncols 2\nnrows 2\nxllcenter 1.0\nyllcenter 1.0\ncellsize 2.0\n1 2 3 4\n";
        let raster: Raster<f32> = parse_ascii_grid(grid).unwrap();
        assert_eq!(raster.anchor(), CellAnchor::Center);

        let b = raster.bounds();
        assert_relative_eq!(b.xmin, 0.0);
        assert_relative_eq!(b.ymin, 0.0);
    }

    #[test]
    fn test_center_anchored_roundtrip_keeps_anchor() {
        let grid = "ncols 2\nnrows 2\nxllcenter 1.0\nyllcenter 1.0\ncellsize 2.0\n1 2 3 4\n";
        let raster: Raster<f64> = parse_ascii_grid(grid).unwrap();

        let text = format_ascii_grid(&raster).unwrap();
        assert!(text.contains("XLLCENTER 1"));
        assert!(text.contains("YLLCENTER 1"));

        let back: Raster<f64> = parse_ascii_grid(&text).unwrap();
        assert_eq!(back.anchor(), CellAnchor::Center);
        for (a, b) in raster
            .transform()
            .coefficients()
            .iter()
            .zip(back.transform().coefficients())
        {
            assert_relative_eq!(a, &b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_default_nodata() {
        let grid = "NCOLS 1\nNROWS 1\nXLLCORNER 0\nYLLCORNER 0\nCELLSIZE 1\n7\n";
        let raster: Raster<f64> = parse_ascii_grid(grid).unwrap();
        assert_eq!(raster.nodata(), Some(-9999.0));
    }

    #[test]
    fn test_cell_count_mismatch() {
        let grid = "NCOLS 2\nNROWS 2\nXLLCORNER 0\nYLLCORNER 0\nCELLSIZE 1\n1 2 3\n";
        assert!(parse_ascii_grid::<f64>(grid).is_err());
    }

    #[test]
    fn test_roundtrip() {
        let raster: Raster<f64> = parse_ascii_grid(GRID).unwrap();
        let text = format_ascii_grid(&raster).unwrap();
        let back: Raster<f64> = parse_ascii_grid(&text).unwrap();

        assert_eq!(back.shape(), raster.shape());
        assert_eq!(back.get(0, 1, 0).unwrap(), 4.0);
        assert_eq!(back.nodata(), Some(-1.0));
        for (a, b) in raster
            .transform()
            .coefficients()
            .iter()
            .zip(back.transform().coefficients())
        {
            assert_relative_eq!(a, &b, epsilon = 1e-9);
        }
    }
}
