//! kzmatch: dense stereo matching by graph cuts with occlusion handling.

use anyhow::{bail, Context};
use clap::Parser;
use kz_core::StereoPair;
use kz_stereo::{DataCost, Matcher, Parameters};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, clap::Parser)]
#[command(name = "kzmatch")]
#[command(about = "Compute a dense disparity map from a rectified stereo pair")]
#[command(version)]
struct Args {
    /// Left image (PNG/PPM, gray or RGB).
    left: PathBuf,
    /// Right image.
    right: PathBuf,
    /// Smallest disparity to consider.
    #[arg(allow_negative_numbers = true)]
    disp_min: i32,
    /// Largest disparity to consider.
    #[arg(allow_negative_numbers = true)]
    disp_max: i32,
    /// Float disparity map output (PFM, occlusions as NaN).
    disp_map: Option<PathBuf>,

    /// Maximum number of sweeps over the disparity labels.
    #[arg(short = 'i', long = "max_iter", default_value_t = 4)]
    max_iter: u32,

    /// Scaled 8-bit visualization output (PNG/PPM).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Map larger disparities to darker grays in the visualization.
    #[arg(long)]
    reverse: bool,

    /// Reshuffle the label order before every sweep.
    #[arg(short, long)]
    random: bool,

    /// Seed for the label order; omit for a fresh one per run.
    #[arg(long)]
    seed: Option<u64>,

    /// Norm of the data term, L1 or L2.
    #[arg(short = 'c', long = "data_cost", default_value = "L2")]
    data_cost: String,

    /// Occlusion cost; negative means estimate from image statistics.
    #[arg(short = 'k', default_value_t = -1.0, allow_negative_numbers = true)]
    k: f32,

    /// Global smoothness magnitude; negative means k / 5.
    #[arg(short = 'l', long, default_value_t = -1.0, allow_negative_numbers = true)]
    lambda: f32,

    /// Smoothness inside smooth areas; negative means 3 * lambda.
    #[arg(long, default_value_t = -1.0, allow_negative_numbers = true)]
    lambda1: f32,

    /// Smoothness across intensity edges; negative means lambda.
    #[arg(long, default_value_t = -1.0, allow_negative_numbers = true)]
    lambda2: f32,

    /// Intensity step treated as an edge by the smoothness term.
    #[arg(short = 't', long = "threshold", default_value_t = 8)]
    threshold: i32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let data_cost = match args.data_cost.as_str() {
        "L1" => DataCost::L1,
        "L2" => DataCost::L2,
        other => bail!("data cost must be L1 or L2, got {other:?}"),
    };

    let left = image::open(&args.left)
        .with_context(|| format!("reading {}", args.left.display()))?
        .to_rgb8();
    let right = image::open(&args.right)
        .with_context(|| format!("reading {}", args.right.display()))?
        .to_rgb8();
    let pair = StereoPair::from_images(&left, &right)?;

    let mut matcher = Matcher::new(pair, args.disp_min, args.disp_max)?;
    let mut params = Parameters::default();
    params.data_cost = data_cost;
    params.edge_thresh = args.threshold;
    params.max_iter = args.max_iter;
    params.randomize_every_iteration = args.random;
    params.seed = args.seed;
    matcher.set_parameters(params)?;
    matcher.fix_parameters(args.k, args.lambda, args.lambda1, args.lambda2)?;

    let stats = matcher.run()?;
    info!(
        sweeps = stats.sweeps,
        accepted = stats.accepted_moves,
        energy = stats.energy,
        occluded = matcher.disparity().occluded_count(),
        "matching finished"
    );

    if let Some(path) = &args.disp_map {
        kz_io::write_disparity(path, matcher.disparity())
            .with_context(|| format!("writing {}", path.display()))?;
    }
    if let Some(path) = &args.output {
        kz_io::write_scaled(path, matcher.disparity(), args.reverse)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(())
}
