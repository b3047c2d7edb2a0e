//! # terrakit core
//!
//! Core types and I/O for the terrakit raster engine.
//!
//! This crate provides:
//! - `Raster<T>`: multi-band georeferenced raster grids
//! - `GeoTransform`: invertible affine georeferencing
//! - `NodataMask`: sentinel-derived validity masks
//! - `Crs`: coordinate reference system identifiers
//! - I/O for GeoTIFF, ASCII grids, world files and plain images

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use crs::Crs;
pub use error::{Error, Result};
pub use raster::{
    Band, Bounds, CellAnchor, GeoTransform, NodataMask, Raster, RasterElement,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::Crs;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{
        Band, Bounds, CellAnchor, GeoTransform, NodataMask, Raster, RasterElement,
    };
    pub use crate::vector::{Feature, FeatureCollection};
}
