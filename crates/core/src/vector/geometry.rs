//! Geometry classification helpers

use geo_types::{Geometry, LineString, MultiPolygon, Polygon};

/// Name of the geometry variant, as used in error messages and reports
pub fn geometry_kind(geom: &Geometry<f64>) -> &'static str {
    match geom {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// Polygonal content of a geometry.
///
/// Returns `None` for geometries with no areal meaning (points, lines) and for
/// collections that mix areal and non-areal members.
pub fn polygonal(geom: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geom {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        Geometry::Rect(r) => Some(MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Some(MultiPolygon::new(vec![t.to_polygon()])),
        Geometry::GeometryCollection(gc) => {
            let mut polys: Vec<Polygon<f64>> = Vec::new();
            for member in gc.iter() {
                polys.extend(polygonal(member)?.0);
            }
            Some(MultiPolygon::new(polys))
        }
        _ => None,
    }
}

/// Append the linework of a geometry to `out`.
///
/// Lines are taken as they are; areal geometries contribute every ring,
/// exterior and interior. Points contribute nothing.
pub fn linework(geom: &Geometry<f64>, out: &mut Vec<LineString<f64>>) {
    match geom {
        Geometry::Point(_) | Geometry::MultiPoint(_) => {}
        Geometry::Line(l) => out.push(LineString::from(vec![l.start, l.end])),
        Geometry::LineString(ls) => out.push(ls.clone()),
        Geometry::MultiLineString(mls) => out.extend(mls.0.iter().cloned()),
        Geometry::Polygon(p) => push_rings(p, out),
        Geometry::MultiPolygon(mp) => mp.0.iter().for_each(|p| push_rings(p, out)),
        Geometry::Rect(r) => push_rings(&r.to_polygon(), out),
        Geometry::Triangle(t) => push_rings(&t.to_polygon(), out),
        Geometry::GeometryCollection(gc) => gc.iter().for_each(|g| linework(g, out)),
    }
}

fn push_rings(p: &Polygon<f64>, out: &mut Vec<LineString<f64>>) {
    out.push(p.exterior().clone());
    out.extend(p.interiors().iter().cloned());
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{line_string, point, polygon, GeometryCollection, Rect};

    #[test]
    fn test_polygonal_rect() {
        let rect = Rect::new((0.0, 0.0), (2.0, 3.0));
        let mp = polygonal(&Geometry::Rect(rect)).unwrap();
        assert_eq!(mp.0.len(), 1);
        assert_eq!(mp.0[0].exterior().0.len(), 5);
    }

    #[test]
    fn test_polygonal_mixed_collection() {
        let gc = GeometryCollection(vec![
            Geometry::Polygon(polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)]),
            Geometry::Point(point!(x: 5.0, y: 5.0)),
        ]);
        assert!(polygonal(&Geometry::GeometryCollection(gc)).is_none());
    }

    #[test]
    fn test_linework_polygon_with_hole() {
        let poly = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [[(x: 2.0, y: 2.0), (x: 4.0, y: 2.0), (x: 4.0, y: 4.0), (x: 2.0, y: 4.0)]],
        );
        let mut out = Vec::new();
        linework(&Geometry::Polygon(poly), &mut out);
        linework(&Geometry::LineString(line_string![(x: 0.0, y: 5.0), (x: 10.0, y: 5.0)]), &mut out);
        linework(&Geometry::Point(point!(x: 1.0, y: 1.0)), &mut out);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_geometry_kind() {
        assert_eq!(geometry_kind(&Geometry::Point(point!(x: 0.0, y: 0.0))), "Point");
    }
}
