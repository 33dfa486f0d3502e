mod frame_source;
mod render;
mod schedule;

use anyhow::{Context, Result};
use clap::Parser;
use frame_source::SequenceSource;
use particle_tracker::{TickOutcome, TrackerConfig, TrackingLoop};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use schedule::{Action, Schedule};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const READ_AHEAD: usize = 8;
const FPS_REPORT_INTERVAL: usize = 10;

/// Track a colored region through a numbered image sequence with a particle filter.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Directory holding the frames, named 000.jpg, 001.jpg, ...
    sequence: PathBuf,
    /// Directory the rendered frames are written to.
    output: PathBuf,
    /// File extension of the input frames.
    #[arg(long, default_value = "jpg")]
    extension: String,
    /// JSON file with a tracker configuration. Flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    particles: Option<usize>,
    #[arg(long)]
    std_xy: Option<f64>,
    #[arg(long)]
    std_size: Option<f64>,
    #[arg(long)]
    lambda: Option<f64>,
    /// Side of the square learned at the frame center.
    #[arg(long)]
    seed_size: Option<f64>,
    /// Evaluate particle likelihoods in parallel.
    #[arg(long)]
    parallel: bool,
    /// Seed of the random number generator.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Frame after which the target is learned at the frame center.
    /// If that frame is dropped, the next decodable frame is used.
    #[arg(long, default_value_t = 0)]
    learn_at: usize,
    /// Frames after which tracking is toggled: stopped if running, relearned otherwise.
    /// A toggle on a dropped frame fires on the next decodable frame.
    #[arg(long, value_delimiter = ',')]
    toggle_at: Vec<usize>,
    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,
    /// Draw only every n-th particle.
    #[arg(long, default_value_t = 1)]
    draw_every: usize,
    /// Also write a 200x200 crop of the estimated region for every tracked frame.
    #[arg(long)]
    crops: bool,
}

/// Builds the tracker configuration from an optional JSON file and command-line overrides.
fn load_config(args: &Args) -> Result<TrackerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => TrackerConfig::default(),
    };

    if let Some(n) = args.particles {
        config.num_particles = n;
    }
    if let Some(std_xy) = args.std_xy {
        config.std_xy = std_xy;
    }
    if let Some(std_size) = args.std_size {
        config.std_size = std_size;
    }
    if let Some(lambda) = args.lambda {
        config.lambda = lambda;
    }
    if let Some(seed_size) = args.seed_size {
        config.seed_size = seed_size;
    }
    config.parallel_likelihood |= args.parallel;
    Ok(config)
}

fn output_path(dir: &Path, index: usize, suffix: &str) -> PathBuf {
    dir.join(format!("{index:03}{suffix}.png"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // --- 1. Argument Parsing & Setup ---
    let args = Args::parse();
    let config = load_config(&args)?;
    let mut tracker: TrackingLoop = TrackingLoop::new(config).context("invalid tracker configuration")?;
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    std::fs::create_dir_all(&args.output).with_context(|| format!("creating {}", args.output.display()))?;

    // --- 2. Frame Source Initialization ---
    let mut source = SequenceSource::spawn(args.sequence.clone(), args.extension.clone(), args.max_frames, READ_AHEAD);
    let mut schedule = Schedule::new(args.learn_at, args.toggle_at.clone());

    // --- 3. Main Processing Loop ---
    let mut processed = 0usize;
    let mut tracked = 0usize;
    let mut collapses = 0usize;
    let mut dropped = 0usize;
    let mut ticks = Instant::now();

    while let Some(loaded) = source.next().await {
        let outcome = tracker.tick(loaded.frame.as_ref(), &mut rng)?;

        processed += 1;
        if processed % FPS_REPORT_INTERVAL == 0 {
            let elapsed = ticks.elapsed().as_secs_f64();
            ticks = Instant::now();
            info!(fps = FPS_REPORT_INTERVAL as f64 / elapsed, "throughput");
        }

        let decoded = loaded.frame.as_ref().is_some_and(|f| !f.is_empty());
        let action = schedule.after_frame(loaded.index, decoded, tracker.is_tracking());
        let Some(frame) = loaded.frame else {
            dropped += 1;
            warn!(frame = loaded.index, "no frame this tick");
            continue;
        };

        // --- 4. Visualization ---
        let mut canvas = frame.image().clone();
        match &outcome {
            TickOutcome::Tracked(result) => {
                tracked += 1;
                if result.collapsed {
                    collapses += 1;
                }
                if let Some(population) = tracker.population() {
                    for particle in population.iter().step_by(args.draw_every.max(1)) {
                        render::draw_square(&mut canvas, particle, render::PARTICLE_COLOR);
                    }
                }
                render::draw_square(&mut canvas, &result.estimate, render::ESTIMATE_COLOR);
                if args.crops {
                    if let Some(crop) = render::estimate_crop(&frame, &result.estimate) {
                        render::save_png(&output_path(&args.output, loaded.index, "_estimate"), &crop)?;
                    }
                }
                info!(
                    frame = loaded.index,
                    x = result.estimate.x,
                    y = result.estimate.y,
                    size = result.estimate.size,
                    ess = result.effective_sample_size,
                    "estimate"
                );
            }
            TickOutcome::NotTracking => {
                let region = tracker.center_region(&frame);
                render::draw_square(&mut canvas, &region, render::LEARN_REGION_COLOR);
            }
            TickOutcome::NoFrame => {}
        }
        render::save_png(&output_path(&args.output, loaded.index, ""), &canvas)
            .with_context(|| format!("writing frame {}", loaded.index))?;

        // --- 5. Learn / Toggle ---
        match action {
            Action::Learn => {
                if let Err(e) = tracker.learn_center(&frame) {
                    warn!(frame = loaded.index, error = %e, "could not learn the target");
                }
            }
            Action::Stop => tracker.stop(),
            Action::Nothing => {}
        }
    }

    info!(
        frames = processed,
        tracked,
        collapses,
        dropped,
        output = %args.output.display(),
        "processing complete"
    );
    Ok(())
}
