//! Area and length of features

use fragmesh_core::FeatureCollection;
use geo::{Area, Euclidean, Geometry, Length};

/// Unsigned area in CRS units squared (m² for EPSG:3035).
///
/// Points and lines contribute nothing.
pub fn area(geom: &Geometry<f64>) -> f64 {
    geom.unsigned_area()
}

/// Euclidean length of the linear parts, in CRS units.
///
/// Polygon outlines are not counted.
pub fn length(geom: &Geometry<f64>) -> f64 {
    match geom {
        Geometry::Line(l) => l.length::<Euclidean>(),
        Geometry::LineString(ls) => ls.length::<Euclidean>(),
        Geometry::MultiLineString(mls) => mls.length::<Euclidean>(),
        Geometry::GeometryCollection(gc) => gc.iter().map(length).sum(),
        _ => 0.0,
    }
}

/// Sum of feature areas
pub fn total_area(fc: &FeatureCollection) -> f64 {
    fc.iter().filter_map(|f| f.geometry.as_ref()).map(area).sum()
}

/// Sum of feature lengths
pub fn total_length(fc: &FeatureCollection) -> f64 {
    fc.iter().filter_map(|f| f.geometry.as_ref()).map(length).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fragmesh_core::CRS;
    use geo::{line_string, polygon, Coord, GeometryCollection, Line, MultiLineString, Point};

    #[test]
    fn test_area_ignores_orientation_and_subtracts_holes() {
        let cw = polygon![(x: 0.0, y: 0.0), (x: 0.0, y: 10.0), (x: 10.0, y: 10.0), (x: 10.0, y: 0.0)];
        assert_relative_eq!(area(&cw.into()), 100.0);

        let holed = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [[(x: 2.0, y: 2.0), (x: 8.0, y: 2.0), (x: 8.0, y: 8.0), (x: 2.0, y: 8.0)]],
        );
        assert_relative_eq!(area(&holed.into()), 64.0);
    }

    #[test]
    fn test_area_of_lines_is_zero() {
        let road = line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 100.0)];
        assert_eq!(area(&road.into()), 0.0);
    }

    #[test]
    fn test_length_kinds() {
        let segment = Line::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 6.0, y: 8.0 });
        assert_relative_eq!(length(&segment.into()), 10.0);

        let mls = MultiLineString::new(vec![
            line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)],
            line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 5.0)],
        ]);
        assert_relative_eq!(length(&mls.into()), 15.0);

        let mixed = GeometryCollection::from(vec![
            Geometry::from(line_string![(x: 0.0, y: 0.0), (x: 3.0, y: 4.0)]),
            Geometry::from(Point::new(1.0, 1.0)),
        ]);
        assert_relative_eq!(length(&Geometry::GeometryCollection(mixed)), 5.0);
    }

    #[test]
    fn test_totals() {
        let fc = FeatureCollection::from_geometries(
            vec![
                Geometry::from(polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)]),
                Geometry::from(line_string![(x: 0.0, y: 0.0), (x: 3.0, y: 4.0)]),
            ],
            Some(CRS::from_epsg(3035)),
        );
        assert_relative_eq!(total_area(&fc), 100.0);
        assert_relative_eq!(total_length(&fc), 5.0);
    }
}
