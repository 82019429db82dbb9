use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use rand::Rng;
use slither_app::{
    ConfigOverrides, HeadlessRenderer, PngRenderer, TerminalRenderer,
    renderer::{Renderer, RendererContext},
    resolve_config,
};
use slither_core::Simulation;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Interactive ratatui view.
    Terminal,
    /// Run frames without drawing and log a summary.
    Headless,
    /// Run frames and write the last one as a PNG image.
    Png,
}

#[derive(Parser, Debug)]
#[command(
    name = "slither-app",
    version,
    about = "Lateral-undulation chain animation driver"
)]
struct Cli {
    /// Output surface to drive.
    #[arg(long, env = "SLITHER_MODE", value_enum, default_value_t = Mode::Terminal)]
    mode: Mode,

    /// JSON configuration file; missing keys keep their defaults.
    #[arg(long, env = "SLITHER_CONFIG")]
    config: Option<PathBuf>,

    /// Number of chain segments (2..=400).
    #[arg(long, env = "SLITHER_SEGMENTS")]
    segments: Option<usize>,

    /// Animation speed; 0.5 steps the chain every other frame.
    #[arg(long, env = "SLITHER_SPEED")]
    speed: Option<f64>,

    /// Seed for entry selection; random when omitted.
    #[arg(long, env = "SLITHER_SEED")]
    seed: Option<u64>,

    /// Viewport width in drawing units.
    #[arg(long, env = "SLITHER_WIDTH")]
    width: Option<f64>,

    /// Viewport height in drawing units.
    #[arg(long, env = "SLITHER_HEIGHT")]
    height: Option<f64>,

    /// Distance past the viewport edge before the chain is replaced.
    #[arg(long, env = "SLITHER_PADDING")]
    padding: Option<f64>,

    /// Frames to simulate in headless and png modes.
    #[arg(long, env = "SLITHER_FRAMES", default_value_t = 600)]
    frames: u64,

    /// PNG destination in png mode.
    #[arg(short, long, env = "SLITHER_OUTPUT", default_value = "slither.png")]
    output: PathBuf,

    /// Optional JSON report written by headless mode.
    #[arg(long, env = "SLITHER_REPORT")]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        width: cli.width,
        height: cli.height,
        segments: cli.segments,
        speed: cli.speed,
        seed: cli.seed,
        padding: cli.padding,
    };
    let mut config = resolve_config(cli.config.as_deref(), &overrides)?;
    let seed = *config.rng_seed.get_or_insert_with(|| rand::rng().random());

    let viewport = config.viewport();
    let simulation = Simulation::new(config)?;
    let renderer: Box<dyn Renderer> = match cli.mode {
        Mode::Terminal => Box::new(TerminalRenderer::default()),
        Mode::Headless => Box::new(HeadlessRenderer {
            frames: cli.frames,
            report: cli.report,
        }),
        Mode::Png => Box::new(PngRenderer {
            frames: cli.frames,
            output: cli.output,
            width: viewport.width.round().max(1.0) as u32,
            height: viewport.height.round().max(1.0) as u32,
        }),
    };

    info!(renderer = renderer.name(), seed, "Starting slither animation");
    renderer.run(RendererContext { simulation })
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
