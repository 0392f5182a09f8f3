//! fragmesh CLI - landscape fragmentation analysis

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use fragmesh_algorithms::landscape::{
    build_overlay, meff_with_progress, Diagnostics, MeffParams, Progress, ZeroAreaPolicy,
};
use fragmesh_algorithms::vector::{total_area, total_bounds, total_length};
use fragmesh_core::io::{read_geojson, write_geojson};
use fragmesh_core::vector::geometry_kind;
use fragmesh_core::{FeatureCollection, CRS};
use fragmesh_parallel::ProcessingMode;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "fragmesh")]
#[command(author, version, about = "Landscape fragmentation analysis (effective mesh size)", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a GeoJSON file
    Info {
        /// Input GeoJSON file
        input: PathBuf,
    },
    /// Build fragments from a line network and a boundary
    Polygonize {
        /// Line network (roads, railways, rivers...)
        #[arg(short, long)]
        lines: PathBuf,
        /// Boundary polygons of the study area
        #[arg(short, long)]
        boundary: PathBuf,
        /// Output GeoJSON with one polygon per fragment
        #[arg(short, long)]
        output: PathBuf,
        /// Also write dangles, cut edges and invalid rings here
        #[arg(long)]
        dangles: Option<PathBuf>,
        /// CRS for inputs without a `crs` member (e.g. EPSG:3035)
        #[arg(long)]
        crs: Option<String>,
    },
    /// Compute the effective mesh size of every mask region
    Meff {
        /// Line network (roads, railways, rivers...)
        #[arg(short, long)]
        lines: PathBuf,
        /// Boundary polygons of the study area
        #[arg(short, long)]
        boundary: PathBuf,
        /// Reporting regions
        #[arg(short, long)]
        mask: PathBuf,
        /// Output GeoJSON: the mask with the meff attribute added
        #[arg(short, long)]
        output: PathBuf,
        /// CRS for inputs without a `crs` member (e.g. EPSG:3035)
        #[arg(long)]
        crs: Option<String>,
        /// Handling of regions with zero area
        #[arg(long, value_enum, default_value_t = ZeroArea::Reject)]
        zero_area: ZeroArea,
        /// Number of worker threads (default: all cores)
        #[arg(short, long, conflicts_with = "sequential")]
        threads: Option<usize>,
        /// Process regions on a single thread
        #[arg(long)]
        sequential: bool,
        /// Name of the output attribute
        #[arg(short, long, default_value = "meff")]
        attribute: String,
        /// Do not warn about dangles, cut edges and invalid rings
        #[arg(long)]
        quiet_diagnostics: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ZeroArea {
    /// Abort with an error naming the region
    Reject,
    /// Write NaN (null in GeoJSON)
    Nan,
    /// Write 0
    Zero,
}

impl From<ZeroArea> for ZeroAreaPolicy {
    fn from(z: ZeroArea) -> Self {
        match z {
            ZeroArea::Reject => ZeroAreaPolicy::Reject,
            ZeroArea::Nan => ZeroAreaPolicy::Nan,
            ZeroArea::Zero => ZeroAreaPolicy::Zero,
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Region progress shown as an indicatif bar
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} regions ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }
}

impl Progress for BarProgress {
    fn start(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn advance(&self, n: usize) {
        self.bar.inc(n as u64);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

fn parse_crs(crs: Option<&str>) -> Result<Option<CRS>> {
    crs.map(|s| CRS::parse(s).with_context(|| format!("Invalid --crs value: {}", s)))
        .transpose()
}

fn read_layer(path: &Path, fallback: Option<&CRS>, layer: &str) -> Result<FeatureCollection> {
    let pb = spinner(&format!("Reading {}...", layer));
    let fc = read_geojson(path, fallback)
        .with_context(|| format!("Failed to read {} from {}", layer, path.display()))?;
    pb.finish_and_clear();
    info!(
        "{}: {} features, CRS {}",
        layer,
        fc.len(),
        fc.crs().map(|c| c.identifier()).unwrap_or_else(|| "unknown".into())
    );
    Ok(fc)
}

fn write_layer(fc: &FeatureCollection, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geojson(fc, path).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

/// Minimum, mean and maximum of the finite values
fn summarize(values: &[Option<f64>]) -> Option<(f64, f64, f64)> {
    let finite: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = finite.iter().sum::<f64>() / finite.len() as f64;
    Some((min, mean, max))
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let fc = read_layer(&input, None, "input")?;

            println!("File: {}", input.display());
            println!("Features: {}", fc.len());
            match fc.crs() {
                Some(crs) => println!("CRS: {}", crs),
                None => println!("CRS: none"),
            }
            if let Some(bb) = total_bounds(fc.iter().filter_map(|f| f.geometry.as_ref())) {
                println!(
                    "Bounds: ({:.3}, {:.3}) - ({:.3}, {:.3})",
                    bb.min_x, bb.min_y, bb.max_x, bb.max_y
                );
            }

            let mut kinds: BTreeMap<&'static str, usize> = BTreeMap::new();
            for feature in fc.iter() {
                let kind = feature.geometry.as_ref().map(geometry_kind).unwrap_or("None");
                *kinds.entry(kind).or_default() += 1;
            }
            println!("\nGeometry types:");
            for (kind, count) in &kinds {
                println!("  {}: {}", kind, count);
            }

            println!("\nTotals:");
            println!("  Area: {:.3} km²", total_area(&fc) / 1e6);
            println!("  Length: {:.3} km", total_length(&fc) / 1e3);
        }

        // ── Polygonize ───────────────────────────────────────────────
        Commands::Polygonize {
            lines,
            boundary,
            output,
            dangles,
            crs,
        } => {
            let fallback = parse_crs(crs.as_deref())?;
            let lines = read_layer(&lines, fallback.as_ref(), "lines")?;
            let boundary = read_layer(&boundary, fallback.as_ref(), "boundary")?;

            let start = Instant::now();
            let pb = spinner("Building overlay...");
            let overlay = build_overlay(&lines, &boundary).context("Failed to build overlay")?;
            pb.finish_and_clear();
            let elapsed = start.elapsed();

            println!("Fragments: {}", overlay.fragments.len());
            println!("  Dangles: {}", overlay.dangles.len());
            println!("  Cut edges: {}", overlay.cut_edges.len());
            println!("  Invalid rings: {}", overlay.invalid_rings.len());

            write_layer(&overlay.fragment_features(), &output)?;
            if let Some(path) = dangles {
                write_layer(&overlay.diagnostic_features(), &path)?;
                println!("Diagnostics saved to: {}", path.display());
            }
            done("Fragments", &output, elapsed);
        }

        // ── Meff ─────────────────────────────────────────────────────
        Commands::Meff {
            lines,
            boundary,
            mask,
            output,
            crs,
            zero_area,
            threads,
            sequential,
            attribute,
            quiet_diagnostics,
        } => {
            let fallback = parse_crs(crs.as_deref())?;
            let lines = read_layer(&lines, fallback.as_ref(), "lines")?;
            let boundary = read_layer(&boundary, fallback.as_ref(), "boundary")?;
            let mask = read_layer(&mask, fallback.as_ref(), "mask")?;

            let mode = if sequential {
                ProcessingMode::Sequential
            } else {
                ProcessingMode::from_threads(threads)
            };
            let params = MeffParams {
                mode,
                zero_area: zero_area.into(),
                diagnostics: Diagnostics {
                    log_overlay: !quiet_diagnostics,
                    log_regions: cli.verbose,
                },
                attribute,
            };

            let start = Instant::now();
            let progress = BarProgress::new();
            let result = meff_with_progress(&lines, &boundary, &mask, &params, &progress)
                .context("Failed to calculate meff")?;
            let elapsed = start.elapsed();

            let values = result.column_f64(&params.attribute);
            println!("Regions: {}", values.len());
            println!("  Threads: {}", params.mode.threads());
            if let Some((min, mean, max)) = summarize(&values) {
                println!("  Min meff: {:.4} km²", min);
                println!("  Mean meff: {:.4} km²", mean);
                println!("  Max meff: {:.4} km²", max);
            }

            write_layer(&result, &output)?;
            done("Meff", &output, elapsed);
        }
    }

    Ok(())
}
