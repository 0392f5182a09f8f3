//! GeoJSON reading and writing

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FeatureCollection};
use geojson::{GeoJson, JsonObject, JsonValue};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Read a GeoJSON file into a FeatureCollection
///
/// The CRS is taken from the file's `crs` member when present, otherwise
/// `fallback_crs` is used.
pub fn read_geojson<P: AsRef<Path>>(path: P, fallback_crs: Option<&CRS>) -> Result<FeatureCollection> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let json: JsonValue = serde_json::from_reader(reader)?;
    let gj = GeoJson::from_json_value(json)?;
    from_geojson(gj, fallback_crs)
}

/// Parse GeoJSON text into a FeatureCollection
pub fn features_from_geojson_str(s: &str, fallback_crs: Option<&CRS>) -> Result<FeatureCollection> {
    let gj: GeoJson = s.parse()?;
    from_geojson(gj, fallback_crs)
}

/// Write a FeatureCollection as a GeoJSON file
pub fn write_geojson<P: AsRef<Path>>(fc: &FeatureCollection, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer(&mut writer, &to_geojson(fc))?;
    writer.flush()?;
    Ok(())
}

/// Serialize a FeatureCollection to GeoJSON text
pub fn features_to_geojson_string(fc: &FeatureCollection) -> Result<String> {
    Ok(serde_json::to_string(&to_geojson(fc))?)
}

fn from_geojson(gj: GeoJson, fallback_crs: Option<&CRS>) -> Result<FeatureCollection> {
    let (features, foreign) = match gj {
        GeoJson::FeatureCollection(fc) => (fc.features, fc.foreign_members),
        GeoJson::Feature(f) => (vec![f], None),
        GeoJson::Geometry(g) => (vec![geojson::Feature::from(g)], None),
    };

    let crs = match foreign.as_ref().and_then(|m| m.get("crs")) {
        Some(member) => Some(parse_crs_member(member)?),
        None => fallback_crs.cloned(),
    };

    let mut out = match crs {
        Some(crs) => FeatureCollection::with_crs(crs),
        None => FeatureCollection::new(),
    };

    for feature in features {
        out.push(convert_feature(feature)?);
    }

    Ok(out)
}

fn convert_feature(feature: geojson::Feature) -> Result<Feature> {
    let mut out = match feature.geometry {
        Some(g) => Feature::new(geo_types::Geometry::<f64>::try_from(g.value)?),
        None => Feature::empty(),
    };

    out.id = feature.id;

    for (key, value) in feature.properties.unwrap_or_default() {
        out.set_property(key, attribute_from_json(value));
    }

    Ok(out)
}

/// Parse a legacy named-CRS member: `{"type": "name", "properties": {"name": ...}}`
fn parse_crs_member(member: &JsonValue) -> Result<CRS> {
    let name = member
        .get("properties")
        .and_then(|p| p.get("name"))
        .and_then(JsonValue::as_str)
        .ok_or_else(|| Error::GeoJson(format!("unsupported crs member: {}", member)))?;
    CRS::parse(name)
}

fn attribute_from_json(value: JsonValue) -> AttributeValue {
    match value {
        JsonValue::Null => AttributeValue::Null,
        JsonValue::Bool(b) => AttributeValue::Bool(b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => n.as_f64().map_or(AttributeValue::Null, AttributeValue::Float),
        },
        JsonValue::String(s) => AttributeValue::String(s),
        other => AttributeValue::String(other.to_string()),
    }
}

fn attribute_to_json(value: &AttributeValue) -> JsonValue {
    match value {
        AttributeValue::Null => JsonValue::Null,
        AttributeValue::Bool(b) => JsonValue::Bool(*b),
        AttributeValue::Int(i) => JsonValue::from(*i),
        // NaN and infinities become null
        AttributeValue::Float(f) => JsonValue::from(*f),
        AttributeValue::String(s) => JsonValue::String(s.clone()),
    }
}

fn to_geojson(fc: &FeatureCollection) -> geojson::FeatureCollection {
    let features = fc
        .iter()
        .map(|f| {
            let properties: JsonObject = f
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), attribute_to_json(v)))
                .collect();

            geojson::Feature {
                bbox: None,
                geometry: f
                    .geometry
                    .as_ref()
                    .map(|g| geojson::Geometry::new(geojson::Value::from(g))),
                id: f.id.clone(),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let foreign_members = fc.crs().and_then(CRS::urn).map(|urn| {
        let mut members = JsonObject::new();
        members.insert(
            "crs".to_string(),
            serde_json::json!({ "type": "name", "properties": { "name": urn } }),
        );
        members
    });

    geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members,
    }
}
