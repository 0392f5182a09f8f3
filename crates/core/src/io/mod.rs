//! I/O for exchanging feature collections
//!
//! GeoJSON is the interchange format of the command-line tool. A legacy
//! `crs` member (as written by GDAL and GeoPandas) is honoured on read and
//! written whenever the collection has an EPSG code.

mod geojson_io;

pub use geojson_io::{
    features_from_geojson_str, features_to_geojson_string, read_geojson, write_geojson,
};
