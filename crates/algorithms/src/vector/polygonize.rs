//! Polygonization of noded linework
//!
//! Builds a planar graph from noded segments and extracts the faces it
//! encloses, following the GEOS polygonizer:
//!
//! 1. endpoints closer than a snapping tolerance become one node
//! 2. dangles (edges with a free end) are removed repeatedly
//! 3. cut edges (same ring on both sides) are removed
//! 4. the remaining half-edges are traced into rings; rings that revisit a
//!    node are split there into simple rings
//! 5. counter-clockwise rings become shells, clockwise rings become holes of
//!    the smallest shell that strictly contains them
//!
//! Input must be noded (see [`super::noding::node_segments`]): segments
//! may only meet at endpoints.

use std::collections::{HashMap, HashSet};

use geo::algorithm::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{BoundingRect, Coord, Line, LineString, Polygon};
use tracing::debug;

use super::spatial::BoundingBox;

/// Snapping tolerance relative to the extent of the input
const SNAP_FACTOR: f64 = 1e-9;

const NO_RING: usize = usize::MAX;

/// Output of [`polygonize`]
#[derive(Debug, Clone, Default)]
pub struct PolygonizeResult {
    /// Faces of the planar graph
    pub polygons: Vec<Polygon<f64>>,
    /// Edges with at least one free end
    pub dangles: Vec<LineString<f64>>,
    /// Edges bounded by the same face on both sides
    pub cut_edges: Vec<LineString<f64>>,
    /// Closed rings without usable area
    pub invalid_rings: Vec<LineString<f64>>,
}

/// Merges coordinates that fall within `tol` of an existing node
struct NodeSnapper {
    tol: f64,
    cells: HashMap<(i64, i64), Vec<usize>>,
    coords: Vec<Coord<f64>>,
}

impl NodeSnapper {
    fn new(tol: f64) -> Self {
        Self {
            tol,
            cells: HashMap::new(),
            coords: Vec::new(),
        }
    }

    fn cell(&self, c: Coord<f64>) -> (i64, i64) {
        ((c.x / self.tol).floor() as i64, (c.y / self.tol).floor() as i64)
    }

    fn node(&mut self, c: Coord<f64>) -> usize {
        let (cx, cy) = self.cell(c);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(ids) = self.cells.get(&(cx + dx, cy + dy)) {
                    for &id in ids {
                        let o = self.coords[id];
                        if (o.x - c.x).abs() <= self.tol && (o.y - c.y).abs() <= self.tol {
                            return id;
                        }
                    }
                }
            }
        }

        let id = self.coords.len();
        self.coords.push(c);
        self.cells.entry((cx, cy)).or_default().push(id);
        id
    }
}

/// Undirected planar graph stored as half-edges.
///
/// Half-edge `h` belongs to edge `h / 2`; `h ^ 1` is its twin. Even
/// half-edges run from `edges[e][0]` to `edges[e][1]`.
struct PlanarGraph {
    nodes: Vec<Coord<f64>>,
    edges: Vec<[usize; 2]>,
    live: Vec<bool>,
    /// Outgoing half-edges of each node, counter-clockwise by angle
    outgoing: Vec<Vec<usize>>,
}

impl PlanarGraph {
    fn build(segments: &[Line<f64>], tol: f64) -> Self {
        let mut snapper = NodeSnapper::new(tol);
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut edges = Vec::new();

        for seg in segments {
            let a = snapper.node(seg.start);
            let b = snapper.node(seg.end);
            if a == b {
                continue;
            }
            if seen.insert((a.min(b), a.max(b))) {
                edges.push([a, b]);
            }
        }

        let nodes = snapper.coords;
        let mut outgoing = vec![Vec::new(); nodes.len()];
        for (e, [a, b]) in edges.iter().enumerate() {
            outgoing[*a].push(2 * e);
            outgoing[*b].push(2 * e + 1);
        }

        let mut graph = Self {
            live: vec![true; edges.len()],
            nodes,
            edges,
            outgoing: Vec::new(),
        };

        for list in &mut outgoing {
            list.sort_by(|&h1, &h2| graph.angle(h1).total_cmp(&graph.angle(h2)).then(h1.cmp(&h2)));
        }
        graph.outgoing = outgoing;
        graph
    }

    fn origin(&self, h: usize) -> usize {
        self.edges[h / 2][h % 2]
    }

    fn dest(&self, h: usize) -> usize {
        self.edges[h / 2][1 - h % 2]
    }

    fn angle(&self, h: usize) -> f64 {
        let o = self.nodes[self.origin(h)];
        let d = self.nodes[self.dest(h)];
        (d.y - o.y).atan2(d.x - o.x)
    }

    fn segment(&self, e: usize) -> LineString<f64> {
        let [a, b] = self.edges[e];
        LineString::from(vec![self.nodes[a], self.nodes[b]])
    }

    /// Remove edges with a degree-1 endpoint until none is left.
    /// Returns the removed edge ids.
    fn remove_dangles(&mut self) -> Vec<usize> {
        let mut degree = vec![0usize; self.nodes.len()];
        for (e, [a, b]) in self.edges.iter().enumerate() {
            if self.live[e] {
                degree[*a] += 1;
                degree[*b] += 1;
            }
        }

        let mut stack: Vec<usize> = (0..self.nodes.len()).filter(|&n| degree[n] == 1).collect();
        let mut removed = Vec::new();

        while let Some(n) = stack.pop() {
            if degree[n] != 1 {
                continue;
            }
            let Some(&h) = self.outgoing[n].iter().find(|&&h| self.live[h / 2]) else {
                continue;
            };
            self.live[h / 2] = false;
            removed.push(h / 2);
            degree[n] -= 1;

            let m = self.dest(h);
            degree[m] -= 1;
            if degree[m] == 1 {
                stack.push(m);
            }
        }

        removed
    }

    /// Next half-edge along the face to the left of `h`: at the destination,
    /// turn to the live outgoing edge immediately clockwise of the twin.
    fn next(&self, h: usize) -> usize {
        let twin = h ^ 1;
        let list = &self.outgoing[self.dest(h)];
        let len = list.len();
        let pos = list.iter().position(|&x| x == twin).unwrap_or(0);

        (1..=len)
            .map(|k| list[(pos + len - k) % len])
            .find(|&cand| self.live[cand / 2])
            .unwrap_or(twin)
    }

    /// Trace every live half-edge into rings. Returns the rings and, for each
    /// half-edge, the ring it belongs to.
    fn trace_rings(&self) -> (Vec<Vec<usize>>, Vec<usize>) {
        let mut ring_of = vec![NO_RING; self.edges.len() * 2];
        let mut rings = Vec::new();

        for start in 0..ring_of.len() {
            if !self.live[start / 2] || ring_of[start] != NO_RING {
                continue;
            }

            let id = rings.len();
            let mut ring = Vec::new();
            let mut h = start;
            while ring_of[h] == NO_RING {
                ring_of[h] = id;
                ring.push(h);
                h = self.next(h);
            }
            rings.push(ring);
        }

        (rings, ring_of)
    }
}

/// Split a closed node sequence (first node not repeated at the end) into
/// simple rings at every repeated node.
fn split_at_repeated_nodes(ring: &[usize]) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut stack: Vec<usize> = Vec::with_capacity(ring.len());
    let mut position: HashMap<usize, usize> = HashMap::new();

    for &n in ring {
        if let Some(&at) = position.get(&n) {
            out.push(stack[at..].to_vec());
            for dropped in stack.drain(at + 1..) {
                position.remove(&dropped);
            }
        } else {
            position.insert(n, stack.len());
            stack.push(n);
        }
    }

    if !stack.is_empty() {
        out.push(stack);
    }
    out
}

/// Twice the signed area (shoelace); positive for counter-clockwise rings.
///
/// Coordinates are taken relative to the first vertex so small rings far
/// from the origin keep their precision.
fn doubled_signed_area(coords: &[Coord<f64>]) -> f64 {
    let Some(&origin) = coords.first() else {
        return 0.0;
    };
    let n = coords.len();
    (0..n)
        .map(|i| {
            let a = coords[i] - origin;
            let b = coords[(i + 1) % n] - origin;
            a.x * b.y - b.x * a.y
        })
        .sum()
}

fn perimeter(coords: &[Coord<f64>]) -> f64 {
    let n = coords.len();
    (0..n)
        .map(|i| {
            let d = coords[(i + 1) % n] - coords[i];
            d.x.hypot(d.y)
        })
        .sum()
}

fn closed(coords: &[Coord<f64>]) -> LineString<f64> {
    let mut pts = coords.to_vec();
    if let Some(&first) = pts.first() {
        pts.push(first);
    }
    LineString::from(pts)
}

struct Shell {
    ring: Polygon<f64>,
    bbox: BoundingBox,
    area: f64,
    holes: Vec<LineString<f64>>,
}

/// Whether the ring lies inside `shell`, judged by its first vertex that is
/// not on the shell boundary
fn ring_inside(shell: &Polygon<f64>, ring: &LineString<f64>) -> bool {
    for c in ring.coords() {
        match shell.coordinate_position(c) {
            CoordPos::Inside => return true,
            CoordPos::Outside => return false,
            CoordPos::OnBoundary => {}
        }
    }
    false
}

/// Polygonize noded segments.
///
/// Every returned polygon is a face of the planar graph formed by the
/// segments: faces do not overlap and together cover the area enclosed by
/// the linework.
pub fn polygonize(edges: &[Line<f64>]) -> PolygonizeResult {
    let Some(extent) = edges
        .iter()
        .map(|l| BoundingBox::from_rect(l.bounding_rect()))
        .reduce(|a, b| a.union(&b))
    else {
        return PolygonizeResult::default();
    };

    let tol = SNAP_FACTOR * extent.width().max(extent.height()).max(1.0);
    let mut graph = PlanarGraph::build(edges, tol);
    let mut result = PolygonizeResult::default();

    let mut dangle_ids = Vec::new();
    let mut cut_ids = Vec::new();
    let rings = loop {
        dangle_ids.extend(graph.remove_dangles());
        let (rings, ring_of) = graph.trace_rings();

        let cuts: Vec<usize> = (0..graph.edges.len())
            .filter(|&e| graph.live[e] && ring_of[2 * e] == ring_of[2 * e + 1])
            .collect();
        if cuts.is_empty() {
            break rings;
        }
        for e in cuts {
            graph.live[e] = false;
            cut_ids.push(e);
        }
    };

    result.dangles = dangle_ids.into_iter().map(|e| graph.segment(e)).collect();
    result.cut_edges = cut_ids.into_iter().map(|e| graph.segment(e)).collect();

    let mut shells: Vec<Shell> = Vec::new();
    let mut holes: Vec<LineString<f64>> = Vec::new();

    for ring in &rings {
        let node_ring: Vec<usize> = ring.iter().map(|&h| graph.origin(h)).collect();
        for simple in split_at_repeated_nodes(&node_ring) {
            let coords: Vec<Coord<f64>> = simple.iter().map(|&n| graph.nodes[n]).collect();
            let area2 = doubled_signed_area(&coords);

            // A ring thinner than the snapping tolerance encloses no face
            if coords.len() < 3 || area2.abs() / 2.0 <= tol * perimeter(&coords) {
                result.invalid_rings.push(closed(&coords));
            } else if area2 > 0.0 {
                let ring = Polygon::new(closed(&coords), vec![]);
                let bbox = BoundingBox::of(&ring).unwrap_or(extent);
                shells.push(Shell {
                    ring,
                    bbox,
                    area: area2 / 2.0,
                    holes: Vec::new(),
                });
            } else {
                holes.push(closed(&coords));
            }
        }
    }

    for hole in holes {
        let Some(hole_box) = BoundingBox::of(&hole) else {
            continue;
        };
        let owner = shells
            .iter()
            .enumerate()
            .filter(|(_, s)| s.bbox.contains(&hole_box) && ring_inside(&s.ring, &hole))
            .min_by(|(_, a), (_, b)| a.area.total_cmp(&b.area))
            .map(|(i, _)| i);

        // Unowned holes are the outer boundaries of connected components
        if let Some(i) = owner {
            shells[i].holes.push(hole);
        }
    }

    result.polygons = shells
        .into_iter()
        .map(|s| {
            let (exterior, _) = s.ring.into_inner();
            Polygon::new(exterior, s.holes)
        })
        .collect();

    debug!(
        "Polygonized {} edges into {} polygons ({} dangles, {} cut edges, {} invalid rings)",
        graph.edges.len(),
        result.polygons.len(),
        result.dangles.len(),
        result.cut_edges.len(),
        result.invalid_rings.len()
    );

    result
}
