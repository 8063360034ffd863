use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use sierpinski::pace::{Pace, PaceCfg};
use sierpinski::{ChaosGame, EngineCfg, Polygon};
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;

mod config;
mod export;
mod provenance;

use config::{FileCfg, ModeArg, TrimArg};
use provenance::Payload;

#[derive(Parser)]
#[command(name = "cli")]
#[command(about = "Headless chaos-game runner: drive the engine tick by tick and export snapshots")]
struct Cmd {
    /// Also show engine debug events (fallback projections, cap, resets)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Run a fixed number of ticks with a fixed number of points per tick
    Run {
        #[command(flatten)]
        common: RunArgs,
        #[arg(long, default_value_t = 100)]
        ticks: usize,
        #[arg(long, default_value_t = 1000)]
        per_tick: usize,
    },
    /// Run like an animation loop: points per frame come from the speed controller
    Paced {
        #[command(flatten)]
        common: RunArgs,
        #[arg(long, default_value_t = 60.0)]
        fps: f64,
        #[arg(long, default_value_t = 10.0)]
        seconds: f64,
        /// Points per second; defaults to the configured initial speed
        #[arg(long)]
        speed: Option<f64>,
    },
    /// Print a small provenance JSON block
    Report,
    /// Print shape and first rows of an exported CSV/Parquet artifact
    Inspect {
        input: PathBuf,
        #[arg(long, default_value_t = 5)]
        head: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Shape {
    /// Equilateral triangle, apex first
    Triangle,
    /// Triangle (0,0), (1,0), (0.5, 0.866)
    Unit,
    /// Regular tetrahedron
    Pyramid,
}

#[derive(Args, Clone, Debug)]
struct RunArgs {
    #[arg(long, value_enum, default_value_t = Shape::Triangle)]
    shape: Shape,
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// RNG seed; drawn at random (and recorded) when omitted
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    max_history: Option<usize>,
    #[arg(long, value_enum)]
    trim: Option<TrimArg>,
    /// JSON file with engine tunables; flags override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// History output (.csv or .parquet)
    #[arg(long)]
    out: PathBuf,
    /// Twin distance series or probe progress (.csv or .parquet)
    #[arg(long)]
    series_out: Option<PathBuf>,
    /// Non-empty coverage cells (.csv or .parquet)
    #[arg(long)]
    grid_out: Option<PathBuf>,
}

impl RunArgs {
    fn engine_cfg(&self) -> Result<EngineCfg> {
        let mut cfg = match &self.config {
            Some(path) => FileCfg::load(path)?.apply(EngineCfg::default()),
            None => EngineCfg::default(),
        };
        if let Some(m) = self.mode {
            cfg.mode = m.into();
        }
        if let Some(t) = self.trim {
            cfg.trim = t.into();
        }
        if let Some(m) = self.max_history {
            cfg.max_history = m;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

/// How many points each tick asks for.
#[derive(Clone, Copy, Debug)]
enum Schedule {
    Fixed {
        ticks: usize,
        per_tick: usize,
    },
    Paced {
        fps: f64,
        frames: usize,
        speed: Option<f64>,
    },
}

impl Schedule {
    fn paced(fps: f64, seconds: f64, speed: Option<f64>) -> Result<Self> {
        if !(fps.is_finite() && fps > 0.0) {
            bail!("--fps must be finite and > 0, got {fps}");
        }
        if !(seconds.is_finite() && seconds >= 0.0) {
            bail!("--seconds must be finite and >= 0, got {seconds}");
        }
        Ok(Self::Paced {
            fps,
            frames: (fps * seconds).round() as usize,
            speed,
        })
    }

    /// Lazy per-tick point counts; nothing is allocated up front.
    fn counts(self, pace: PaceCfg) -> Box<dyn Iterator<Item = usize>> {
        match self {
            Self::Fixed { ticks, per_tick } => Box::new(std::iter::repeat(per_tick).take(ticks)),
            Self::Paced { fps, frames, speed } => {
                let mut pace = Pace::new(pace);
                if let Some(s) = speed {
                    pace.set_speed(s);
                }
                Box::new((0..frames).map(move |_| pace.tick(fps)))
            }
        }
    }

    fn to_json(self) -> Value {
        match self {
            Self::Fixed { ticks, per_tick } => json!({"ticks": ticks, "per_tick": per_tick}),
            Self::Paced { fps, frames, speed } => {
                json!({"fps": fps, "frames": frames, "speed": speed})
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct RunSummary {
    ticks: usize,
    points_added: u64,
    limit_reached: bool,
}

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    let level = if cmd.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .init();
    match cmd.action {
        Action::Run {
            common,
            ticks,
            per_tick,
        } => run(&common, Schedule::Fixed { ticks, per_tick }, "run"),
        Action::Paced {
            common,
            fps,
            seconds,
            speed,
        } => run(&common, Schedule::paced(fps, seconds, speed)?, "paced"),
        Action::Report => report(),
        Action::Inspect { input, head } => inspect(&input, head),
    }
}

fn run(args: &RunArgs, schedule: Schedule, command: &'static str) -> Result<()> {
    let cfg = args.engine_cfg()?;
    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!(
        shape = ?args.shape,
        mode = ?cfg.mode,
        seed,
        max_history = cfg.max_history,
        schedule = ?schedule,
        "run"
    );
    match args.shape {
        Shape::Triangle => execute(Polygon::sierpinski_triangle(), cfg, seed, args, schedule, command),
        Shape::Unit => execute(Polygon::unit_triangle(), cfg, seed, args, schedule, command),
        Shape::Pyramid => execute(Polygon::sierpinski_pyramid(), cfg, seed, args, schedule, command),
    }
}

fn execute<const D: usize>(
    polygon: Polygon<D>,
    cfg: EngineCfg,
    seed: u64,
    args: &RunArgs,
    schedule: Schedule,
    command: &'static str,
) -> Result<()> {
    let mut game = ChaosGame::new(polygon, cfg, Some(seed))?;
    let summary = drive(&mut game, schedule.counts(cfg.pace))?;
    let stats = game.stats();
    tracing::info!(
        ticks = summary.ticks,
        points_added = summary.points_added,
        limit_reached = summary.limit_reached,
        projections = stats.projections,
        last_distance = ?stats.last_distance,
        found = stats.found,
        "done"
    );

    let params = json!({
        "shape": format!("{:?}", args.shape).to_lowercase(),
        "seed": seed,
        "schedule": schedule.to_json(),
        "cfg": config::to_json(game.cfg()),
    });
    let summary_json = json!({
        "ticks": summary.ticks,
        "points_added": summary.points_added,
        "limit_reached": summary.limit_reached,
        "total_generated": stats.total_generated,
        "projections": stats.projections,
        "history_len": game.history().len(),
    });
    let publish = |df: &mut polars::prelude::DataFrame, path: &Path| -> Result<()> {
        export::write_frame(df, path)?;
        let payload =
            Payload::new(command, params.clone()).with_summary(summary_json.clone());
        provenance::write_sidecar(path, payload)?;
        Ok(())
    };

    publish(&mut export::history_frame(&game)?, &args.out)?;
    if let Some(path) = &args.series_out {
        match export::series_frame(&game)? {
            Some(mut df) => publish(&mut df, path)?,
            None => tracing::warn!(path = %path.display(), "no series in plain mode, skipped"),
        }
    }
    if let Some(path) = &args.grid_out {
        match export::grid_frame(&game)? {
            Some(mut df) => publish(&mut df, path)?,
            None => tracing::warn!(path = %path.display(), "no grid outside coverage mode, skipped"),
        }
    }
    Ok(())
}

/// Advance once per entry of `counts`, stopping early once the history cap is hit.
fn drive<const D: usize>(
    game: &mut ChaosGame<D>,
    counts: impl IntoIterator<Item = usize>,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    for n in counts {
        let report = game
            .advance(n)
            .with_context(|| format!("advancing tick {}", summary.ticks))?;
        summary.ticks += 1;
        summary.points_added += report.points_added as u64;
        if report.limit_reached {
            summary.limit_reached = true;
            tracing::info!(ticks = summary.ticks, "history cap reached, stopping early");
            break;
        }
    }
    Ok(summary)
}

fn report() -> Result<()> {
    let mut obj = provenance::header();
    obj["cfg_defaults"] = config::to_json(&EngineCfg::default());
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}

fn inspect(input: &Path, head: usize) -> Result<()> {
    let df = export::scan(input)?.collect()?;
    tracing::info!(
        input = %input.display(),
        rows = df.height(),
        cols = df.width(),
        "inspect"
    );
    println!("{}", df.head(Some(head)));
    Ok(())
}
