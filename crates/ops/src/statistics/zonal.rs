//! Zonal statistics
//!
//! Summarizes a value raster over the zones of an integer zone raster.
//! The value raster is repositioned onto the zone grid first, so the two
//! inputs do not need to share dimensions or cell size.

use std::collections::BTreeMap;

use terrakit_core::raster::Raster;
use terrakit_core::Result;

/// Statistic painted back into the per-zone raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZonalStatistic {
    Count,
    Sum,
    Min,
    Max,
    Mean,
    Median,
    Variance,
    StdDev,
}

/// Summary of the valid value cells falling inside one zone.
///
/// A zone that appears in the zone raster but covers no valid value cells
/// has `count == 0` and `None` for every statistic.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZoneStats {
    pub count: usize,
    pub sum: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub variance: Option<f64>,
    pub std_dev: Option<f64>,
}

impl ZoneStats {
    fn from_values(mut vals: Vec<f64>) -> Self {
        if vals.is_empty() {
            return Self::default();
        }

        let count = vals.len();
        let sum: f64 = vals.iter().sum();
        let mean = sum / count as f64;
        let variance =
            vals.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / count as f64;

        vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let median = if count % 2 == 0 {
            (vals[count / 2 - 1] + vals[count / 2]) / 2.0
        } else {
            vals[count / 2]
        };

        Self {
            count,
            sum: Some(sum),
            min: Some(vals[0]),
            max: Some(vals[count - 1]),
            mean: Some(mean),
            median: Some(median),
            variance: Some(variance),
            std_dev: Some(variance.sqrt()),
        }
    }

    fn pick(&self, statistic: ZonalStatistic) -> Option<f64> {
        match statistic {
            ZonalStatistic::Count => Some(self.count as f64),
            ZonalStatistic::Sum => self.sum,
            ZonalStatistic::Min => self.min,
            ZonalStatistic::Max => self.max,
            ZonalStatistic::Mean => self.mean,
            ZonalStatistic::Median => self.median,
            ZonalStatistic::Variance => self.variance,
            ZonalStatistic::StdDev => self.std_dev,
        }
    }
}

/// Compute per-zone statistics and paint the chosen one back onto the grid.
///
/// Every zone identifier present in the zone band is registered, with the
/// zone raster's own nodata sentinel excluded. Value cells counted toward
/// a zone are those valid after repositioning onto the zone grid. The
/// returned raster shares the zone grid's georeferencing; cells whose zone
/// has no statistic carry the value raster's sentinel (NaN when none).
pub fn zonal_statistics(
    zones: &Raster<i32>,
    values: &Raster<f64>,
    zone_band: usize,
    value_band: usize,
    statistic: ZonalStatistic,
) -> Result<(BTreeMap<i32, ZoneStats>, Raster<f64>)> {
    let (rows, cols) = zones.shape();
    let (fitted, value_mask) = values.positioned(cols, rows, zones.bounds())?;

    let zone_cells = zones.band(zone_band)?;
    let value_cells = fitted.band(value_band)?;
    let zone_mask = zones.mask();

    let mut per_zone: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for row in 0..rows {
        for col in 0..cols {
            if !zone_mask.is_valid(row, col) {
                continue;
            }
            let zone = unsafe { zone_cells.get_unchecked(row, col) };
            let bucket = per_zone.entry(zone).or_default();
            if value_mask.is_valid(row, col) {
                let v = unsafe { value_cells.get_unchecked(row, col) };
                if !v.is_nan() {
                    bucket.push(v);
                }
            }
        }
    }

    let stats: BTreeMap<i32, ZoneStats> = per_zone
        .into_iter()
        .map(|(zone, vals)| (zone, ZoneStats::from_values(vals)))
        .collect();

    let blank = values.nodata().unwrap_or(f64::NAN);
    let mut painted = zones.with_same_meta::<f64>(rows, cols);
    painted.set_nodata(values.nodata());
    {
        let band = painted.band_mut(0)?;
        for row in 0..rows {
            for col in 0..cols {
                let value = if zone_mask.is_valid(row, col) {
                    let zone = unsafe { zone_cells.get_unchecked(row, col) };
                    stats
                        .get(&zone)
                        .and_then(|zs| zs.pick(statistic))
                        .unwrap_or(blank)
                } else {
                    blank
                };
                unsafe { band.set_unchecked(row, col, value) };
            }
        }
    }

    Ok((stats, painted))
}
