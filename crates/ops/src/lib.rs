//! # Terrakit Ops
//!
//! Spatial operations over terrakit rasters.
//!
//! ## Available Operations
//!
//! - **resample**: Regrid a raster to new dimensions or a new cell size
//! - **align**: Bring several rasters onto one common grid
//! - **mosaic**: Merge aligned rasters into a single coverage
//! - **rasterize**: Burn vector features into a binary raster
//! - **clip**: Cut a raster down to a vector footprint
//! - **statistics**: Zonal summaries over an integer zone raster
//! - **algebra**: Expression-driven raster math (`raster1 + raster2 * 2`)
//!
//! Row-level parallelism runs through rayon when the default `parallel`
//! feature is enabled and falls back to sequential iteration otherwise.

pub mod algebra;
pub mod align;
pub mod clip;
pub mod mosaic;
pub mod rasterize;
pub mod resample;
pub mod statistics;

mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::algebra::evaluate;
    pub use crate::align::align_rasters;
    pub use crate::clip::clip;
    pub use crate::mosaic::mosaic;
    pub use crate::rasterize::rasterize;
    pub use crate::resample::{resample, ResampleTo};
    pub use crate::statistics::{zonal_statistics, ZonalStatistic, ZoneStats};
    pub use terrakit_core::prelude::*;
}
