//! Progress reporting for long-running region loops

/// Observer of per-region progress.
///
/// Calls may arrive from several worker threads at once. Implementations
/// only observe; they cannot influence the computation.
pub trait Progress: Send + Sync {
    /// Called once before the first region, with the number of regions
    fn start(&self, total: usize);

    /// `n` more regions are done
    fn advance(&self, n: usize);

    /// Called once after the last region
    fn finish(&self);
}

/// Progress observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn start(&self, _total: usize) {}
    fn advance(&self, _n: usize) {}
    fn finish(&self) {}
}
