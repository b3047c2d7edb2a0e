//! Statistical summaries over rasters

pub mod zonal;

pub use zonal::{zonal_statistics, ZonalStatistic, ZoneStats};
