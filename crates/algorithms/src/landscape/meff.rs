//! Effective mesh size (meff), cross-boundary connection (CBC) method
//!
//! The line network and the boundary rings are noded and polygonized into
//! fragments. For every region `R` of the mask:
//!
//! ```text
//! meff(R) = Σ area(f ∩ R) · area(f) / area(R)
//! ```
//!
//! summed over the fragments `f` intersecting `R`. A fragment crossing the
//! region border contributes its whole area weighted by the part inside the
//! region. Results are converted from m² to km².

use fragmesh_core::{Algorithm, AttributeValue, Error, Feature, FeatureCollection, Result, CRS};
use fragmesh_parallel::{ParallelStrategy, ProcessingMode};
use geo::{Area, BooleanOps, Intersects, LineString, MultiPolygon, Polygon};
use tracing::{debug, info, warn};

use super::progress::{NoProgress, Progress};
use crate::vector::{node_segments, polygonize, segments_of, BoundingBox, FragmentIndex};

/// Square meters in one square kilometer
pub const SQ_METERS_PER_SQ_KM: f64 = 1_000_000.0;

/// What to do with a mask region whose area is zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroAreaPolicy {
    /// Fail with [`Error::DegenerateRegion`]
    #[default]
    Reject,
    /// Write NaN
    Nan,
    /// Write 0
    Zero,
}

/// Diagnostic logging switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostics {
    /// Warn about dangles, cut edges and invalid rings found while building
    /// the overlay
    pub log_overlay: bool,
    /// Log every region's value at DEBUG level
    pub log_regions: bool,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            log_overlay: true,
            log_regions: false,
        }
    }
}

impl Diagnostics {
    /// Nothing beyond the summary line
    pub fn quiet() -> Self {
        Self {
            log_overlay: false,
            log_regions: false,
        }
    }
}

/// Parameters for meff calculation
#[derive(Debug, Clone)]
pub struct MeffParams {
    /// How regions are distributed over threads
    pub mode: ProcessingMode,
    /// Handling of zero-area regions
    pub zero_area: ZeroAreaPolicy,
    pub diagnostics: Diagnostics,
    /// Name of the output attribute (default: "meff")
    pub attribute: String,
}

impl Default for MeffParams {
    fn default() -> Self {
        Self {
            mode: ProcessingMode::Parallel,
            zero_area: ZeroAreaPolicy::Reject,
            diagnostics: Diagnostics::default(),
            attribute: "meff".to_string(),
        }
    }
}

/// Fragments produced from the line network and the boundary
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    pub fragments: Vec<Polygon<f64>>,
    pub dangles: Vec<LineString<f64>>,
    pub cut_edges: Vec<LineString<f64>>,
    pub invalid_rings: Vec<LineString<f64>>,
    pub crs: Option<CRS>,
}

impl Overlay {
    /// Fragments as features carrying an `area_km2` attribute
    pub fn fragment_features(&self) -> FeatureCollection {
        let mut fc = FeatureCollection::new();
        fc.set_crs(self.crs.clone());
        for (i, fragment) in self.fragments.iter().enumerate() {
            let area_km2 = fragment.unsigned_area() / SQ_METERS_PER_SQ_KM;
            fc.push(
                Feature::new(fragment.clone())
                    .with_property("fragment", AttributeValue::Int(i as i64))
                    .with_property("area_km2", AttributeValue::Float(area_km2)),
            );
        }
        fc
    }

    /// Dangles, cut edges and invalid rings, tagged by a `kind` attribute
    pub fn diagnostic_features(&self) -> FeatureCollection {
        let mut fc = FeatureCollection::new();
        fc.set_crs(self.crs.clone());
        let groups = [
            ("dangle", &self.dangles),
            ("cut_edge", &self.cut_edges),
            ("invalid_ring", &self.invalid_rings),
        ];
        for (kind, lines) in groups {
            for line in lines {
                fc.push(
                    Feature::new(line.clone())
                        .with_property("kind", AttributeValue::String(kind.to_string())),
                );
            }
        }
        fc
    }
}

/// Require a CRS on `fc` equivalent to `reference`
fn check_crs(fc: &FeatureCollection, layer: &'static str, reference: &CRS) -> Result<()> {
    let crs = fc.crs().ok_or(Error::MissingCrs(layer))?;
    if !crs.is_equivalent(reference) {
        return Err(Error::CrsMismatch(crs.identifier(), reference.identifier()));
    }
    Ok(())
}

/// Node and polygonize the line network together with the boundary rings.
///
/// `lines` may hold any geometry; lines are used as they are and polygons
/// contribute their rings. `boundary` must be polygonal. Both layers must
/// share a CRS.
pub fn build_overlay(lines: &FeatureCollection, boundary: &FeatureCollection) -> Result<Overlay> {
    let crs = lines.crs().ok_or(Error::MissingCrs("lines"))?;
    check_crs(boundary, "boundary", crs)?;

    let mut linestrings: Vec<LineString<f64>> = Vec::new();
    for feature in lines.iter() {
        linestrings.extend(feature.linework());
    }
    for (i, feature) in boundary.iter().enumerate() {
        let polygons = feature.polygons("boundary", i)?;
        for polygon in &polygons {
            linestrings.push(polygon.exterior().clone());
            linestrings.extend(polygon.interiors().iter().cloned());
        }
    }

    let segments = segments_of(&linestrings);
    let noded = node_segments(&segments);
    let result = polygonize(&noded);

    info!(
        "Overlay: {} segments noded into {} edges, {} fragments",
        segments.len(),
        noded.len(),
        result.polygons.len()
    );

    Ok(Overlay {
        fragments: result.polygons,
        dangles: result.dangles,
        cut_edges: result.cut_edges,
        invalid_rings: result.invalid_rings,
        crs: Some(crs.clone()),
    })
}

fn log_overlay_diagnostics(overlay: &Overlay) {
    if !overlay.dangles.is_empty() {
        warn!("{} dangling edges did not close into fragments", overlay.dangles.len());
    }
    if !overlay.cut_edges.is_empty() {
        warn!("{} cut edges removed from the overlay", overlay.cut_edges.len());
    }
    if !overlay.invalid_rings.is_empty() {
        warn!("{} invalid rings discarded", overlay.invalid_rings.len());
    }
}

/// Area of a mask region in CRS units squared
pub fn region_area(region: &MultiPolygon<f64>) -> f64 {
    region.unsigned_area()
}

/// Effective mesh size of one region in CRS units squared (m² for a metric
/// CRS), before conversion to km².
///
/// `region` must have a positive area. Fragments are visited in index order,
/// so the result is the same whichever thread computes it.
pub fn region_meff(index: &FragmentIndex, fragments: &[Polygon<f64>], region: &MultiPolygon<f64>) -> f64 {
    let Some(bbox) = BoundingBox::of(region) else {
        return 0.0;
    };

    let sum: f64 = index
        .candidates(&bbox)
        .into_iter()
        .map(|i| &fragments[i])
        .filter(|fragment| region.intersects(*fragment))
        .map(|fragment| {
            let clipped = MultiPolygon::new(vec![fragment.clone()])
                .intersection(region)
                .unsigned_area();
            clipped * fragment.unsigned_area()
        })
        .sum();

    sum / region_area(region)
}

/// Validate the three layers and return the shared CRS
fn check_inputs(
    lines: &FeatureCollection,
    boundary: &FeatureCollection,
    mask: &FeatureCollection,
) -> Result<CRS> {
    let crs = mask.crs().ok_or(Error::MissingCrs("mask"))?;
    if crs.is_geographic() {
        return Err(Error::GeographicCrs(crs.identifier()));
    }
    if mask.is_empty() {
        return Err(Error::EmptyInput("mask"));
    }
    check_crs(lines, "lines", crs)?;
    check_crs(boundary, "boundary", crs)?;
    Ok(crs.clone())
}

/// Effective mesh size of every mask region.
///
/// Returns a copy of `mask` with the value (km²) in `params.attribute`;
/// other attributes are untouched.
pub fn meff(
    lines: &FeatureCollection,
    boundary: &FeatureCollection,
    mask: &FeatureCollection,
    params: &MeffParams,
) -> Result<FeatureCollection> {
    meff_with_progress(lines, boundary, mask, params, &NoProgress)
}

/// [`meff`] reporting one step per finished region to `progress`
pub fn meff_with_progress(
    lines: &FeatureCollection,
    boundary: &FeatureCollection,
    mask: &FeatureCollection,
    params: &MeffParams,
    progress: &dyn Progress,
) -> Result<FeatureCollection> {
    if params.attribute.is_empty() {
        return Err(Error::InvalidParameter {
            name: "attribute",
            value: String::new(),
            reason: "attribute name must not be empty".into(),
        });
    }

    let crs = check_inputs(lines, boundary, mask)?;
    let regions: Vec<MultiPolygon<f64>> = mask
        .iter()
        .enumerate()
        .map(|(i, f)| f.polygons("mask", i))
        .collect::<Result<_>>()?;

    let overlay = build_overlay(lines, boundary)?;
    if params.diagnostics.log_overlay {
        log_overlay_diagnostics(&overlay);
    }

    let index = FragmentIndex::new(&overlay.fragments);
    let fragments = &overlay.fragments;
    let log_regions = params.diagnostics.log_regions;

    progress.start(regions.len());
    let values: Vec<Result<f64>> = params.mode.par_map(0..regions.len(), |i| {
        let region = &regions[i];
        let area = region_area(region);

        let value = if area > 0.0 {
            region_meff(&index, fragments, region) / SQ_METERS_PER_SQ_KM
        } else {
            match params.zero_area {
                ZeroAreaPolicy::Reject => return Err(Error::DegenerateRegion { index: i }),
                ZeroAreaPolicy::Nan => f64::NAN,
                ZeroAreaPolicy::Zero => 0.0,
            }
        };

        if log_regions {
            debug!("Region {}: area {:.1} m², meff {:.6} km²", i, area, value);
        }
        progress.advance(1);
        Ok(value)
    });
    progress.finish();

    let values: Vec<f64> = values.into_iter().collect::<Result<_>>()?;

    let mut output = mask.clone();
    output.set_crs(Some(crs));
    output.fill_column(&params.attribute, AttributeValue::Null);
    for (feature, value) in output.features.iter_mut().zip(&values) {
        feature.set_property(params.attribute.as_str(), AttributeValue::Float(*value));
    }

    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if !finite.is_empty() {
        let mean = finite.iter().sum::<f64>() / finite.len() as f64;
        info!(
            "meff computed for {} regions from {} fragments (mean {:.4} km²)",
            values.len(),
            fragments.len(),
            mean
        );
    }

    Ok(output)
}

/// Input layers for [`Meff`]
#[derive(Debug, Clone)]
pub struct MeffInput {
    pub lines: FeatureCollection,
    pub boundary: FeatureCollection,
    pub mask: FeatureCollection,
}

/// Effective mesh size algorithm
#[derive(Debug, Clone, Default)]
pub struct Meff;

impl Algorithm for Meff {
    type Input = MeffInput;
    type Output = FeatureCollection;
    type Params = MeffParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Meff"
    }

    fn description(&self) -> &'static str {
        "Effective mesh size of mask regions using the cross-boundary connection method"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        meff(&input.lines, &input.boundary, &input.mask, &params)
    }
}
