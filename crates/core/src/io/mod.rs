//! Reading and writing raster files
//!
//! The format is chosen by file extension. Loads either produce a fully
//! georeferenced raster or fail; no partial population.

pub mod ascii;
pub mod geotiff;
pub mod image;
pub mod worldfile;

pub use ascii::{read_ascii_grid, write_ascii_grid};
pub use geotiff::{read_geotiff, write_geotiff};
pub use image::{read_image, write_image};
pub use worldfile::{read_world_file, write_world_file};

use crate::error::{Error, Result};
use crate::raster::{Raster, RasterElement};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    GeoTiff,
    Ascii,
    Image,
}

fn sniff(path: &Path) -> Result<Format> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "tif" | "tiff" | "geotiff" => Ok(Format::GeoTiff),
        "asc" | "ascii" => Ok(Format::Ascii),
        "png" | "jpg" | "jpeg" | "bmp" | "gif" => Ok(Format::Image),
        _ => Err(Error::UnsupportedFormat(format!(
            "unrecognized raster extension: {}",
            path.display()
        ))),
    }
}

/// Read a raster file, sniffing the format by extension
pub fn read<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    match sniff(path)? {
        Format::GeoTiff => read_geotiff(path),
        Format::Ascii => read_ascii_grid(path),
        Format::Image => read_image(path),
    }
}

/// Write a raster file, sniffing the format by extension
pub fn write<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    match sniff(path)? {
        Format::GeoTiff => write_geotiff(raster, path),
        Format::Ascii => write_ascii_grid(raster, path),
        Format::Image => write_image(raster, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_known_extensions() {
        assert_eq!(sniff(Path::new("a/b.tif")).unwrap(), Format::GeoTiff);
        assert_eq!(sniff(Path::new("b.ASC")).unwrap(), Format::Ascii);
        assert_eq!(sniff(Path::new("c.jpeg")).unwrap(), Format::Image);
    }

    #[test]
    fn test_sniff_unknown_extension() {
        assert!(matches!(
            sniff(Path::new("grid.shp")),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(sniff(Path::new("noext")).is_err());
    }
}
