//! Noding: split segments at their mutual intersections
//!
//! Candidate pairs come from an R-tree over segment envelopes, so only
//! segments whose boxes overlap are tested exactly.

use std::collections::HashSet;

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Line, LineString};
use rstar::{RTree, RTreeObject, AABB};

use crate::maybe_rayon::*;

#[derive(Debug, Clone)]
struct IndexedSegment {
    idx: usize,
    env: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedSegment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.env
    }
}

fn envelope(seg: &Line<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([seg.start.x, seg.start.y], [seg.end.x, seg.end.y])
}

/// Split line strings into their segments, dropping zero-length and
/// non-finite ones
pub fn segments_of(lines: &[LineString<f64>]) -> Vec<Line<f64>> {
    lines
        .iter()
        .flat_map(|ls| ls.lines())
        .filter(|l| l.start != l.end && is_finite(l.start) && is_finite(l.end))
        .collect()
}

/// Split every segment at each point where it meets another segment.
///
/// Proper crossings, T-junctions and collinear overlaps all create split
/// points. The result contains no zero-length pieces and no duplicates
/// (regardless of direction), so two overlapping input segments yield their
/// shared piece once.
pub fn node_segments(segments: &[Line<f64>]) -> Vec<Line<f64>> {
    let segs: Vec<Line<f64>> = segments
        .iter()
        .copied()
        .filter(|l| l.start != l.end && is_finite(l.start) && is_finite(l.end))
        .collect();

    let tree = RTree::bulk_load(
        segs.iter()
            .enumerate()
            .map(|(idx, s)| IndexedSegment { idx, env: envelope(s) })
            .collect(),
    );

    let hits: Vec<(usize, Coord<f64>)> = (0..segs.len())
        .into_par_iter()
        .flat_map(|i| {
            let mut found = Vec::new();
            for other in tree.locate_in_envelope_intersecting(&envelope(&segs[i])) {
                let j = other.idx;
                if j <= i {
                    continue;
                }
                match line_intersection(segs[i], segs[j]) {
                    Some(LineIntersection::SinglePoint { intersection, .. }) => {
                        found.push((i, intersection));
                        found.push((j, intersection));
                    }
                    Some(LineIntersection::Collinear { intersection }) => {
                        for p in [intersection.start, intersection.end] {
                            found.push((i, p));
                            found.push((j, p));
                        }
                    }
                    None => {}
                }
            }
            found
        })
        .collect();

    let mut splits: Vec<Vec<Coord<f64>>> = vec![Vec::new(); segs.len()];
    for (i, p) in hits {
        splits[i].push(p);
    }

    let mut seen: HashSet<[u64; 4]> = HashSet::new();
    let mut out = Vec::with_capacity(segs.len());

    for (seg, mut points) in segs.iter().zip(splits) {
        points.push(seg.start);
        points.push(seg.end);

        let d = seg.delta();
        let len2 = d.x * d.x + d.y * d.y;
        points.sort_by(|a, b| {
            let ta = ((a.x - seg.start.x) * d.x + (a.y - seg.start.y) * d.y) / len2;
            let tb = ((b.x - seg.start.x) * d.x + (b.y - seg.start.y) * d.y) / len2;
            ta.total_cmp(&tb)
        });
        points.dedup();

        for pair in points.windows(2) {
            let piece = Line::new(pair[0], pair[1]);
            if piece.start != piece.end && seen.insert(undirected_key(&piece)) {
                out.push(piece);
            }
        }
    }

    out
}

fn is_finite(c: Coord<f64>) -> bool {
    c.x.is_finite() && c.y.is_finite()
}

/// Direction-independent identity of a segment. `+ 0.0` folds -0.0 into 0.0.
fn undirected_key(l: &Line<f64>) -> [u64; 4] {
    let (a, b) = if (l.start.x, l.start.y) <= (l.end.x, l.end.y) {
        (l.start, l.end)
    } else {
        (l.end, l.start)
    };
    [
        (a.x + 0.0).to_bits(),
        (a.y + 0.0).to_bits(),
        (b.x + 0.0).to_bits(),
        (b.y + 0.0).to_bits(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> Line<f64> {
        Line::new(Coord { x: x0, y: y0 }, Coord { x: x1, y: y1 })
    }

    #[test]
    fn test_crossing_segments_split_in_four() {
        let noded = node_segments(&[line(0.0, 5.0, 10.0, 5.0), line(5.0, 0.0, 5.0, 10.0)]);
        assert_eq!(noded.len(), 4);
        let center = Coord { x: 5.0, y: 5.0 };
        assert!(noded.iter().all(|l| l.start == center || l.end == center));
    }

    #[test]
    fn test_t_junction() {
        let noded = node_segments(&[line(0.0, 0.0, 10.0, 0.0), line(4.0, 0.0, 4.0, 6.0)]);
        assert_eq!(noded.len(), 3);
    }

    #[test]
    fn test_collinear_overlap_deduplicated() {
        let noded = node_segments(&[line(0.0, 0.0, 10.0, 0.0), line(5.0, 0.0, 15.0, 0.0)]);
        // [0,5], [5,10] (shared), [10,15]
        assert_eq!(noded.len(), 3);
    }

    #[test]
    fn test_reversed_duplicate_removed() {
        let noded = node_segments(&[line(0.0, 0.0, 10.0, 0.0), line(10.0, 0.0, 0.0, 0.0)]);
        assert_eq!(noded.len(), 1);
    }

    #[test]
    fn test_disjoint_untouched() {
        let noded = node_segments(&[line(0.0, 0.0, 1.0, 0.0), line(0.0, 1.0, 1.0, 1.0)]);
        assert_eq!(noded.len(), 2);
    }

    #[test]
    fn test_segments_of_drops_degenerate() {
        let ls = line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 0.0), (x: 3.0, y: 0.0), (x: 3.0, y: 4.0)];
        assert_eq!(segments_of(&[ls]).len(), 2);
    }
}
