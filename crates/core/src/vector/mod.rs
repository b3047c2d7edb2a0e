//! Vector feature types consumed by rasterization

use crate::raster::Bounds;
use geo_types::{Geometry, LineString, Polygon};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// A geographic feature: a geometry plus attributes.
#[derive(Debug, Clone)]
pub struct Feature {
    pub geometry: Geometry<f64>,
    pub properties: HashMap<String, AttributeValue>,
    pub id: Option<String>,
}

impl Feature {
    /// Create a feature from a geometry
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: geometry.into(),
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }

    /// Bounding box of the feature's geometry, or `None` for an empty one
    pub fn bounds(&self) -> Option<Bounds> {
        geometry_bounds(&self.geometry)
    }
}

/// Collection of features
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Bounding box over every feature, or `None` when empty
    pub fn bounds(&self) -> Option<Bounds> {
        let mut acc: Option<Bounds> = None;
        for feature in &self.features {
            if let Some(b) = feature.bounds() {
                acc = Some(match acc {
                    Some(a) => a.union(&b),
                    None => b,
                });
            }
        }
        acc
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

fn fold_coords(acc: Option<Bounds>, x: f64, y: f64) -> Option<Bounds> {
    Some(match acc {
        Some(b) => Bounds::new(b.xmin.min(x), b.ymin.min(y), b.xmax.max(x), b.ymax.max(y)),
        None => Bounds::new(x, y, x, y),
    })
}

fn line_bounds(acc: Option<Bounds>, line: &LineString<f64>) -> Option<Bounds> {
    line.coords()
        .fold(acc, |acc, c| fold_coords(acc, c.x, c.y))
}

fn polygon_bounds(acc: Option<Bounds>, poly: &Polygon<f64>) -> Option<Bounds> {
    // Interior rings cannot extend past the exterior
    line_bounds(acc, poly.exterior())
}

/// Bounding box of any geometry, walking its coordinates
pub fn geometry_bounds(geometry: &Geometry<f64>) -> Option<Bounds> {
    match geometry {
        Geometry::Point(p) => fold_coords(None, p.x(), p.y()),
        Geometry::MultiPoint(mp) => mp
            .iter()
            .fold(None, |acc, p| fold_coords(acc, p.x(), p.y())),
        Geometry::Line(l) => {
            let acc = fold_coords(None, l.start.x, l.start.y);
            fold_coords(acc, l.end.x, l.end.y)
        }
        Geometry::LineString(ls) => line_bounds(None, ls),
        Geometry::MultiLineString(mls) => mls.iter().fold(None, line_bounds),
        Geometry::Polygon(p) => polygon_bounds(None, p),
        Geometry::MultiPolygon(mp) => mp.iter().fold(None, polygon_bounds),
        Geometry::Rect(r) => Some(Bounds::new(r.min().x, r.min().y, r.max().x, r.max().y)),
        Geometry::Triangle(t) => t
            .to_array()
            .iter()
            .fold(None, |acc, c| fold_coords(acc, c.x, c.y)),
        Geometry::GeometryCollection(gc) => gc.iter().fold(None, |acc, g| {
            match (acc, geometry_bounds(g)) {
                (Some(a), Some(b)) => Some(a.union(&b)),
                (a, b) => a.or(b),
            }
        }),
    }
}
