//! Coordinate reference system identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// A coordinate reference system identifier.
///
/// terrakit does not reproject between reference systems; the CRS travels
/// with a raster as metadata and is compared for equivalence when two
/// rasters are combined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crs {
    /// An EPSG code, e.g. 4326
    Epsg(u32),
    /// A WKT definition string
    Wkt(String),
    /// A PROJ definition string
    Proj(String),
}

impl Crs {
    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Crs::Epsg(4326)
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Crs::Epsg(3857)
    }

    /// Get the EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        match self {
            Crs::Epsg(code) => Some(*code),
            _ => None,
        }
    }

    /// Check if two CRS are equivalent.
    ///
    /// String comparisons are textual; distinct but equivalent WKT or PROJ
    /// definitions compare unequal.
    pub fn is_equivalent(&self, other: &Crs) -> bool {
        self == other
    }

    /// A short string identifier
    pub fn identifier(&self) -> String {
        match self {
            Crs::Epsg(code) => format!("EPSG:{}", code),
            Crs::Proj(p) => p.clone(),
            Crs::Wkt(wkt) => format!("WKT:{}", &wkt[..wkt.len().min(50)]),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}
