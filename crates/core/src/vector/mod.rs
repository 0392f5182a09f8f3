//! Vector feature model
//!
//! - Feature: geometry + attributes
//! - FeatureCollection: ordered features sharing one CRS
//! - Geometry helpers for extracting polygonal areas and linework

mod geometry;

pub use geometry::{geometry_kind, linework, polygonal};

use crate::crs::CRS;
use crate::error::{Error, Result};
use geo_types::{Geometry, LineString, MultiPolygon};
use geojson::feature::Id;
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

impl AttributeValue {
    /// Numeric view of the value. `Null` and strings yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            AttributeValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            AttributeValue::Null | AttributeValue::String(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes
    pub properties: HashMap<String, AttributeValue>,
    /// Optional feature ID, kept as string or number as read
    pub id: Option<Id>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: Some(geometry.into()),
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Create a feature with no geometry
    pub fn empty() -> Self {
        Self {
            geometry: None,
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Builder-style attribute setter
    pub fn with_property(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.set_property(key, value);
        self
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }

    /// Linework of the geometry: lines as they are, every ring of areal
    /// geometries. Empty for points and features without geometry.
    pub fn linework(&self) -> Vec<LineString<f64>> {
        let mut out = Vec::new();
        if let Some(geometry) = &self.geometry {
            linework(geometry, &mut out);
        }
        out
    }

    /// Polygonal part of the geometry.
    ///
    /// `layer` and `index` only label the error returned for features that
    /// carry no geometry or a non-areal one.
    pub fn polygons(&self, layer: &'static str, index: usize) -> Result<MultiPolygon<f64>> {
        let geometry = self.geometry.as_ref().ok_or(Error::UnsupportedGeometry {
            layer,
            index,
            expected: "Polygon or MultiPolygon",
            found: "no geometry",
        })?;

        polygonal(geometry).ok_or_else(|| Error::UnsupportedGeometry {
            layer,
            index,
            expected: "Polygon or MultiPolygon",
            found: geometry_kind(geometry),
        })
    }
}

/// Collection of features in one coordinate reference system
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    crs: Option<CRS>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self {
            features: Vec::new(),
            crs: None,
        }
    }

    pub fn with_crs(crs: CRS) -> Self {
        Self {
            features: Vec::new(),
            crs: Some(crs),
        }
    }

    /// One feature per geometry, without attributes
    pub fn from_geometries<G, I>(geometries: I, crs: Option<CRS>) -> Self
    where
        G: Into<Geometry<f64>>,
        I: IntoIterator<Item = G>,
    {
        Self {
            features: geometries.into_iter().map(Feature::new).collect(),
            crs,
        }
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
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

    /// Numeric values of one attribute, one entry per feature
    pub fn column_f64(&self, name: &str) -> Vec<Option<f64>> {
        self.features
            .iter()
            .map(|f| f.get_property(name).and_then(AttributeValue::as_f64))
            .collect()
    }

    /// Set the same attribute on every feature
    pub fn fill_column(&mut self, name: &str, value: AttributeValue) {
        for feature in &mut self.features {
            feature.set_property(name, value.clone());
        }
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{line_string, polygon, Point};

    #[test]
    fn test_properties() {
        let mut f = Feature::new(Point::new(1.0, 2.0))
            .with_property("name", AttributeValue::String("cell".into()));
        f.set_property("n", AttributeValue::Int(3));

        assert_eq!(f.get_property("n"), Some(&AttributeValue::Int(3)));
        assert!(f.get_property("missing").is_none());
    }

    #[test]
    fn test_polygons_from_polygon() {
        let f = Feature::new(polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)]);
        let mp = f.polygons("mask", 0).unwrap();
        assert_eq!(mp.0.len(), 1);
    }

    #[test]
    fn test_polygons_rejects_lines() {
        let f = Feature::new(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)]);
        let err = f.polygons("mask", 7).unwrap_err();
        match err {
            Error::UnsupportedGeometry { index, found, .. } => {
                assert_eq!(index, 7);
                assert_eq!(found, "LineString");
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(Feature::empty().polygons("mask", 0).is_err());
    }

    #[test]
    fn test_linework() {
        let f = Feature::new(polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)]);
        assert_eq!(f.linework().len(), 1);
        assert!(Feature::new(Point::new(1.0, 1.0)).linework().is_empty());
        assert!(Feature::empty().linework().is_empty());
    }

    #[test]
    fn test_column_f64() {
        let mut fc = FeatureCollection::from_geometries(
            vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(2.0, 2.0)],
            Some(CRS::from_epsg(3035)),
        );
        fc.fill_column("meff", AttributeValue::Null);
        fc.features[0].set_property("meff", AttributeValue::Float(2.5));
        fc.features[2].set_property("meff", AttributeValue::Int(4));

        assert_eq!(fc.column_f64("meff"), vec![Some(2.5), None, Some(4.0)]);
        assert_eq!(fc.crs().and_then(CRS::epsg), Some(3035));
    }
}
