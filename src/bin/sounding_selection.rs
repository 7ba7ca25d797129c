//! Command-line front end.
//!
//! ```text
//! sounding-selection -i survey.txt -s 20000 -o out/run1
//! sounding-selection -i survey.txt -s 20000 --radius 15 60 -v surface -m coverage.wkt
//! ```
//!
//! Set `RUST_LOG` to change verbosity (default `info`).

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use sounding_selection::core::algorithms::validation::{DepthArea, SafetyMethod};
use sounding_selection::config::{GeneralizationMethod, SelectionConfig, SelectionConfigBuilder};
use sounding_selection::core::diagnostics::TracingSink;
use sounding_selection::core::point_set::VertexStore;
use sounding_selection::core::triangulation::{Boundary, SpadeTriangulator};
use sounding_selection::io;
use sounding_selection::selection::{SelectionInput, select_soundings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Safety validation method.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Validation {
    /// Shallowest point inside each triangle against its corners.
    Direct,
    /// Interpolated against measured depth, within accuracy tolerance.
    Surface,
}

impl From<Validation> for SafetyMethod {
    fn from(v: Validation) -> Self {
        match v {
            Validation::Direct => Self::Direct,
            Validation::Surface => Self::Surface,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "sounding-selection", version, about)]
struct Args {
    /// Sounding file: `x,y,depth[,category[,feature[,condition]]]` per line
    #[arg(short, long)]
    input: PathBuf,

    /// Chart scale denominator, e.g. 20000 for 1:20000
    #[arg(short, long)]
    scale: u32,

    /// Coverage boundary as WKT polygons
    #[arg(short = 'm', long)]
    boundary: Option<PathBuf>,

    /// Depth areas as WKT polygons, paired in order with --minimum-depths
    #[arg(short = 'd', long, requires = "minimum_depths")]
    depth_areas: Option<PathBuf>,

    /// Minimum depth of each depth area, one per line
    #[arg(long)]
    minimum_depths: Option<PathBuf>,

    /// Horizontal label spacing in millimetres
    #[arg(short = 'x', long, default_value_t = 0.75)]
    horizontal_spacing: f64,

    /// Vertical label spacing in millimetres
    #[arg(short = 'y', long, default_value_t = 0.75)]
    vertical_spacing: f64,

    /// Safety validation method
    #[arg(short = 'v', long, value_enum, default_value_t = Validation::Direct)]
    validation: Validation,

    /// Generalize by radius instead of label overlap: radius of the
    /// shallowest and of the deepest point, in ground units
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    radius: Option<Vec<f64>>,

    /// Quadtree leaf capacity (derived from the input size when omitted)
    #[arg(long)]
    capacity: Option<usize>,

    /// Bound on safety validation passes
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Output path prefix
    #[arg(short, long = "output-prefix", default_value = "selection")]
    output: PathBuf,
}

impl Args {
    fn config(&self) -> Result<SelectionConfig> {
        let mut builder = SelectionConfigBuilder::default();
        builder
            .scale(self.scale)
            .horizontal_spacing_mm(self.horizontal_spacing)
            .vertical_spacing_mm(self.vertical_spacing)
            .safety_method(self.validation.into());
        if let Some(radius) = &self.radius {
            let &[start, end] = radius.as_slice() else {
                bail!("--radius takes exactly two values");
            };
            builder.generalization(GeneralizationMethod::Radius { start, end });
        }
        if let Some(capacity) = self.capacity {
            builder.leaf_capacity(capacity);
        }
        if let Some(max) = self.max_iterations {
            builder.max_repair_iterations(max);
        }
        let config = builder.build().context("building configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn depth_areas(&self) -> Result<Vec<DepthArea>> {
        let (Some(polygons), Some(depths)) = (&self.depth_areas, &self.minimum_depths) else {
            return Ok(Vec::new());
        };
        let polygons = io::read_wkt_polygons(polygons)?;
        let text = std::fs::read_to_string(depths)
            .with_context(|| format!("reading {}", depths.display()))?;
        let minimums = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| l.parse::<f64>().with_context(|| format!("invalid minimum depth {l:?}")))
            .collect::<Result<Vec<_>>>()?;
        if minimums.len() != polygons.len() {
            bail!(
                "{} depth areas but {} minimum depths",
                polygons.len(),
                minimums.len()
            );
        }
        Ok(polygons
            .into_iter()
            .zip(minimums)
            .map(|(polygon, min_depth)| DepthArea { polygon, min_depth })
            .collect())
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = args.config()?;

    let source = io::read_soundings(&args.input)
        .with_context(|| format!("reading soundings from {}", args.input.display()))?;
    tracing::info!(points = source.len(), path = %args.input.display(), "soundings loaded");

    let boundary = args
        .boundary
        .as_ref()
        .map(|path| io::read_wkt_polygons(path).map(|p| Boundary::from_polygons(&p)))
        .transpose()?;
    let areas = args.depth_areas()?;

    let mut input = SelectionInput::new(&source).with_depth_areas(&areas);
    if let Some(boundary) = &boundary {
        input = input.with_boundary(boundary);
    }

    let report = select_soundings(&config, &input, &SpadeTriangulator, &mut TracingSink)?;
    for path in io::save_report(&args.output, &report, &source)? {
        tracing::info!(path = %path.display(), "written");
    }

    println!(
        "{} of {} soundings selected; {} safety and {} legibility violations; {} critical points",
        report.soundings.len(),
        source.len(),
        report.safety_violations.len(),
        report.legibility_conflicts.len(),
        report.critical.total(),
    );
    Ok(())
}
