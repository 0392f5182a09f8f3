//! # fragmesh Algorithms
//!
//! Landscape fragmentation analysis on vector data.
//!
//! ## Available Algorithm Categories
//!
//! - **vector**: Measurements, bounding boxes, noding, polygonize, fragment index
//! - **landscape**: Effective mesh size (meff) with the cross-boundary connection method

pub mod landscape;
mod maybe_rayon;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::landscape::{
        build_overlay, meff, meff_with_progress, Diagnostics, Meff, MeffInput,
        MeffParams, NoProgress, Overlay, Progress, ZeroAreaPolicy,
        SQ_METERS_PER_SQ_KM,
    };
    pub use crate::vector::{
        node_segments, polygonize, BoundingBox, FragmentIndex, PolygonizeResult,
    };
    pub use fragmesh_core::prelude::*;
    pub use fragmesh_parallel::ProcessingMode;
}
