//! Landscape fragmentation metrics
//!
//! - **Effective mesh size (meff)**: probability that two random points of a
//!   region are connected, expressed as an area, using the cross-boundary
//!   connection method

mod meff;
mod progress;

pub use meff::{
    build_overlay, meff, meff_with_progress, region_area, region_meff,
    Diagnostics, Meff, MeffInput, MeffParams, Overlay, ZeroAreaPolicy,
    SQ_METERS_PER_SQ_KM,
};
pub use progress::{NoProgress, Progress};
