//! Vector geometry used by the fragmentation analysis
//!
//! - Area / Length: geometric measurements
//! - Bounding box: axis-aligned envelope
//! - Noding: split linework at intersections
//! - Polygonize: faces of a noded line network
//! - Fragment index: R-tree over polygon envelopes

mod index;
pub mod measurements;
pub mod noding;
pub mod polygonize;
mod spatial;

pub use index::FragmentIndex;
pub use measurements::{area, length, total_area, total_length};
pub use noding::{node_segments, segments_of};
pub use polygonize::{polygonize, PolygonizeResult};
pub use spatial::{bounding_box, total_bounds, BoundingBox};
