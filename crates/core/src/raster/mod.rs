//! Raster data structures and geometric operations

mod band;
mod bounds;
mod element;
mod geotransform;
mod grid;
mod mask;

pub use band::Band;
pub use bounds::Bounds;
pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::{CellAnchor, Raster};
pub use mask::{MaskStrategy, NodataMask};
