//! Coordinate Reference System handling
//!
//! fragmesh never reprojects. A [`CRS`] is carried alongside every feature
//! collection so that inputs can be checked for agreement before any area is
//! measured.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// EPSG codes of common geographic (degree-based) systems.
const GEOGRAPHIC_EPSG: &[u32] = &[4326, 4258, 4269, 4167, 4283, 4612, 4674, 4019];

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// WKT representation
    wkt: Option<String>,
    /// EPSG code if known
    epsg: Option<u32>,
    /// PROJ string if available
    proj: Option<String>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
            proj: None,
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: Some(wkt.into()),
            epsg: None,
            proj: None,
        }
    }

    /// Create a CRS from a PROJ string
    pub fn from_proj(proj: impl Into<String>) -> Self {
        Self {
            wkt: None,
            epsg: None,
            proj: Some(proj.into()),
        }
    }

    /// ETRS89 / LAEA Europe (EPSG:3035), the equal-area grid used for
    /// European fragmentation monitoring
    pub fn etrs89_laea() -> Self {
        Self::from_epsg(3035)
    }

    /// Parse a CRS name.
    ///
    /// Accepts `EPSG:3035`, `3035`, OGC URNs (`urn:ogc:def:crs:EPSG::3035`),
    /// OGC HTTP URIs (`http://www.opengis.net/def/crs/EPSG/0/3035`), PROJ
    /// strings (`+proj=...`) and WKT.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidParameter {
                name: "crs",
                value: String::new(),
                reason: "empty CRS name".into(),
            });
        }

        if s.starts_with('+') {
            return Ok(Self::from_proj(s));
        }

        let upper = s.to_ascii_uppercase();
        if upper.starts_with("PROJCS[")
            || upper.starts_with("GEOGCS[")
            || upper.starts_with("PROJCRS[")
            || upper.starts_with("GEOGCRS[")
        {
            return Ok(Self::from_wkt(s));
        }

        // OGC:CRS84 is WGS84 with lon/lat axis order
        if upper.ends_with("CRS84") {
            return Ok(Self::from_epsg(4326));
        }

        let code = if let Some(rest) = upper.strip_prefix("EPSG:") {
            rest
        } else if upper.starts_with("URN:OGC:DEF:CRS:EPSG:") {
            upper.rsplit(':').next().unwrap_or_default()
        } else if upper.contains("/DEF/CRS/EPSG/") {
            upper.rsplit('/').next().unwrap_or_default()
        } else {
            upper.as_str()
        };

        code.trim()
            .parse::<u32>()
            .map(Self::from_epsg)
            .map_err(|_| Error::InvalidParameter {
                name: "crs",
                value: s.to_string(),
                reason: "expected an EPSG code, URN, PROJ string or WKT".into(),
            })
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Get PROJ string
    pub fn proj(&self) -> Option<&str> {
        self.proj.as_deref()
    }

    /// Whether coordinates are angular (degrees) rather than linear.
    ///
    /// Only recognises well-known EPSG codes, `+proj=longlat` and geographic
    /// WKT; anything else is treated as projected.
    pub fn is_geographic(&self) -> bool {
        if let Some(code) = self.epsg {
            return GEOGRAPHIC_EPSG.contains(&code);
        }
        if let Some(proj) = &self.proj {
            return proj.contains("+proj=longlat") || proj.contains("+proj=latlong");
        }
        if let Some(wkt) = &self.wkt {
            let upper = wkt.trim_start().to_ascii_uppercase();
            return upper.starts_with("GEOGCS[") || upper.starts_with("GEOGCRS[");
        }
        false
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }

        // Textual comparison, imperfect for WKT
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a == b;
        }

        if let (Some(a), Some(b)) = (&self.proj, &other.proj) {
            return a == b;
        }

        false
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(proj) = &self.proj {
            return proj.clone();
        }
        if let Some(wkt) = &self.wkt {
            let end = wkt
                .char_indices()
                .nth(50)
                .map(|(i, _)| i)
                .unwrap_or(wkt.len());
            return format!("WKT:{}", &wkt[..end]);
        }
        "Unknown".to_string()
    }

    /// OGC URN for this CRS, as written into GeoJSON `crs` members
    pub fn urn(&self) -> Option<String> {
        self.epsg.map(|code| format!("urn:ogc:def:crs:EPSG::{}", code))
    }
}

impl FromStr for CRS {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CRS::parse(s)
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}
