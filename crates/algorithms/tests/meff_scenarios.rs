//! End-to-end meff scenarios on synthetic road networks.
//!
//! All geometry is axis-aligned, so expected values can be computed from
//! rectangle overlaps without any polygon clipping.

use approx::assert_relative_eq;
use fragmesh_algorithms::landscape::{build_overlay, meff, meff_with_progress, MeffParams, Progress};
use fragmesh_core::io::features_from_geojson_str;
use fragmesh_core::{FeatureCollection, CRS};
use fragmesh_parallel::ProcessingMode;
use geo::{LineString, Polygon};
use std::sync::atomic::{AtomicUsize, Ordering};

type Rect = (f64, f64, f64, f64);

fn crs() -> CRS {
    CRS::from_epsg(3035)
}

fn rect_polygon((x0, y0, x1, y1): Rect) -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
        vec![],
    )
}

fn rect_area((x0, y0, x1, y1): Rect) -> f64 {
    (x1 - x0) * (y1 - y0)
}

fn overlap(a: Rect, b: Rect) -> f64 {
    let w = (a.2.min(b.2) - a.0.max(b.0)).max(0.0);
    let h = (a.3.min(b.3) - a.1.max(b.1)).max(0.0);
    w * h
}

/// 10 km square cut by roads at x = 2 km, x = 6 km and y = 3 km, with a
/// dead-end spur that must not create a fragment.
struct RoadGrid {
    lines: FeatureCollection,
    boundary: FeatureCollection,
    fragments: Vec<Rect>,
}

fn road_grid() -> RoadGrid {
    let roads = vec![
        LineString::from(vec![(2000.0, -500.0), (2000.0, 10500.0)]),
        LineString::from(vec![(6000.0, 0.0), (6000.0, 10000.0)]),
        LineString::from(vec![(0.0, 3000.0), (10000.0, 3000.0)]),
        LineString::from(vec![(6000.0, 8000.0), (8000.0, 8000.0), (8000.0, 9000.0)]),
    ];

    let xs = [0.0, 2000.0, 6000.0, 10000.0];
    let ys = [0.0, 3000.0, 10000.0];
    let mut fragments = Vec::new();
    for i in 0..3 {
        for j in 0..2 {
            fragments.push((xs[i], ys[j], xs[i + 1], ys[j + 1]));
        }
    }

    RoadGrid {
        lines: FeatureCollection::from_geometries(roads, Some(crs())),
        boundary: FeatureCollection::from_geometries(
            vec![rect_polygon((0.0, 0.0, 10000.0, 10000.0))],
            Some(crs()),
        ),
        fragments,
    }
}

fn mask_cells(size: f64, n: usize) -> Vec<Rect> {
    let mut cells = Vec::new();
    for row in 0..n {
        for col in 0..n {
            let x0 = col as f64 * size;
            let y0 = row as f64 * size;
            cells.push((x0, y0, x0 + size, y0 + size));
        }
    }
    cells
}

fn mask_of(cells: &[Rect]) -> FeatureCollection {
    FeatureCollection::from_geometries(cells.iter().map(|c| rect_polygon(*c)), Some(crs()))
}

fn expected_meff(cell: Rect, fragments: &[Rect]) -> f64 {
    let sum: f64 = fragments
        .iter()
        .map(|f| overlap(*f, cell) * rect_area(*f))
        .sum();
    sum / rect_area(cell) / 1e6
}

fn meff_values(fc: &FeatureCollection) -> Vec<f64> {
    fc.column_f64("meff")
        .into_iter()
        .map(|v| v.expect("meff set on every region"))
        .collect()
}

#[test]
fn road_grid_fragments() {
    let grid = road_grid();
    let overlay = build_overlay(&grid.lines, &grid.boundary).unwrap();

    assert_eq!(overlay.fragments.len(), 6);
    // Spur edges plus the two road ends sticking out of the boundary
    assert_eq!(overlay.dangles.len(), 4);

    let mut areas: Vec<f64> = overlay
        .fragment_features()
        .column_f64("area_km2")
        .into_iter()
        .flatten()
        .collect();
    areas.sort_by(f64::total_cmp);
    let mut expected: Vec<f64> = grid.fragments.iter().map(|f| rect_area(*f) / 1e6).collect();
    expected.sort_by(f64::total_cmp);
    for (a, e) in areas.iter().zip(&expected) {
        assert_relative_eq!(*a, *e, epsilon = 1e-9);
    }
}

#[test]
fn road_grid_matches_rectangle_overlaps() {
    let grid = road_grid();
    let cells = mask_cells(2500.0, 4);
    let out = meff(&grid.lines, &grid.boundary, &mask_of(&cells), &MeffParams::default()).unwrap();

    let values = meff_values(&out);
    assert_eq!(values.len(), cells.len());
    for (cell, value) in cells.iter().zip(&values) {
        assert!(*value >= 0.0);
        assert_relative_eq!(*value, expected_meff(*cell, &grid.fragments), epsilon = 1e-9);
    }
}

#[test]
fn region_outside_network_is_zero() {
    let grid = road_grid();
    let cells = vec![(20000.0, 20000.0, 21000.0, 21000.0), (0.0, 0.0, 1000.0, 1000.0)];
    let out = meff(&grid.lines, &grid.boundary, &mask_of(&cells), &MeffParams::default()).unwrap();

    let values = meff_values(&out);
    assert_eq!(values[0], 0.0);
    assert_relative_eq!(values[1], 6.0, epsilon = 1e-9);
}

#[test]
fn permuting_regions_permutes_values() {
    let grid = road_grid();
    let cells = mask_cells(2500.0, 4);
    let mut reversed = cells.clone();
    reversed.reverse();

    let params = MeffParams::default();
    let forward = meff_values(&meff(&grid.lines, &grid.boundary, &mask_of(&cells), &params).unwrap());
    let mut backward =
        meff_values(&meff(&grid.lines, &grid.boundary, &mask_of(&reversed), &params).unwrap());
    backward.reverse();

    assert_eq!(forward, backward);
}

#[test]
fn reruns_and_modes_agree_exactly() {
    let grid = road_grid();
    let mask = mask_of(&mask_cells(1000.0, 10));

    let mut runs = Vec::new();
    for mode in [
        ProcessingMode::Sequential,
        ProcessingMode::Parallel,
        ProcessingMode::ParallelWith(3),
        ProcessingMode::Parallel,
    ] {
        let params = MeffParams { mode, ..Default::default() };
        runs.push(meff_values(&meff(&grid.lines, &grid.boundary, &mask, &params).unwrap()));
    }

    for run in &runs[1..] {
        assert_eq!(run, &runs[0]);
    }
}

#[derive(Default)]
struct CountingProgress {
    total: AtomicUsize,
    done: AtomicUsize,
    finished: AtomicUsize,
}

impl Progress for CountingProgress {
    fn start(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
    }

    fn advance(&self, n: usize) {
        self.done.fetch_add(n, Ordering::SeqCst);
    }

    fn finish(&self) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn progress_sees_every_region() {
    let grid = road_grid();
    let mask = mask_of(&mask_cells(2000.0, 5));
    let progress = CountingProgress::default();

    meff_with_progress(&grid.lines, &grid.boundary, &mask, &MeffParams::default(), &progress).unwrap();

    assert_eq!(progress.total.load(Ordering::SeqCst), 25);
    assert_eq!(progress.done.load(Ordering::SeqCst), 25);
    assert_eq!(progress.finished.load(Ordering::SeqCst), 1);
}

#[test]
fn geojson_layers_with_named_crs() {
    let named = r#""crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::3035"}}"#;
    let boundary = format!(
        r#"{{"type": "FeatureCollection", {named}, "features": [
            {{"type": "Feature", "properties": {{}}, "geometry": {{"type": "Polygon",
              "coordinates": [[[0, 0], [4000, 0], [4000, 1000], [0, 1000], [0, 0]]]}}}}
        ]}}"#
    );
    let lines = format!(
        r#"{{"type": "FeatureCollection", {named}, "features": [
            {{"type": "Feature", "properties": {{"kind": "motorway"}}, "geometry": {{"type": "LineString",
              "coordinates": [[1000, 0], [1000, 1000]]}}}}
        ]}}"#
    );
    let mask = format!(
        r#"{{"type": "FeatureCollection", {named}, "features": [
            {{"type": "Feature", "id": "west", "properties": {{"name": "west"}}, "geometry": {{"type": "Polygon",
              "coordinates": [[[0, 0], [2000, 0], [2000, 1000], [0, 1000], [0, 0]]]}}}}
        ]}}"#
    );

    let boundary = features_from_geojson_str(&boundary, None).unwrap();
    let lines = features_from_geojson_str(&lines, None).unwrap();
    let mask = features_from_geojson_str(&mask, None).unwrap();

    let out = meff(&lines, &boundary, &mask, &MeffParams::default()).unwrap();
    // Fragments of 1 km² and 3 km²; region covers 1 km² of each
    // (1e6 * 1e6 + 1e6 * 3e6) / 2e6 / 1e6 = 2 km²
    assert_relative_eq!(meff_values(&out)[0], 2.0, epsilon = 1e-9);
    assert_eq!(out.crs().and_then(|c| c.epsg()), Some(3035));
}
