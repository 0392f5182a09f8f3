//! R-tree over polygon envelopes
//!
//! Built once, then queried read-only. Queries return a conservative
//! superset: every polygon whose bounding box touches the query box.

use geo::Polygon;
use rstar::{RTree, RTreeObject, AABB};

use super::spatial::BoundingBox;

/// Envelope of one indexed polygon
#[derive(Debug, Clone)]
struct IndexedEnvelope {
    idx: usize,
    env: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.env
    }
}

fn to_aabb(bb: &BoundingBox) -> AABB<[f64; 2]> {
    AABB::from_corners([bb.min_x, bb.min_y], [bb.max_x, bb.max_y])
}

/// Bounding-box index over a fixed set of polygons
pub struct FragmentIndex {
    tree: RTree<IndexedEnvelope>,
    len: usize,
}

impl FragmentIndex {
    /// Bulk-load the envelopes of `polygons`. Empty polygons are skipped but
    /// keep their position in the numbering.
    pub fn new(polygons: &[Polygon<f64>]) -> Self {
        let entries: Vec<IndexedEnvelope> = polygons
            .iter()
            .enumerate()
            .filter_map(|(idx, p)| {
                BoundingBox::of(p).map(|bb| IndexedEnvelope { idx, env: to_aabb(&bb) })
            })
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
            len: polygons.len(),
        }
    }

    /// Indices of polygons whose bounding box intersects `query`, ascending
    pub fn candidates(&self, query: &BoundingBox) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&to_aabb(query))
            .map(|e| e.idx)
            .collect();
        out.sort_unstable();
        out
    }

    /// Number of polygons the index was built over
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
