//! Snapshot to DataFrame conversion and artifact I/O.
//!
//! Frames
//! - history: `step, x, y[, z]`; `step` is the generation index of each retained point.
//! - twin series: `k, distance, rolling, theory`; `rolling` is null until a full
//!   window exists.
//! - probe series (coverage mode): `tick, found`.
//! - grid: `row, col, count` for visited cells only.
//!
//! The file format follows the extension: `.parquet` or `.csv`.

use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use polars::prelude::*;
use sierpinski::ChaosGame;

const AXES: [&str; 3] = ["x", "y", "z"];

pub fn history_frame<const D: usize>(game: &ChaosGame<D>) -> PolarsResult<DataFrame> {
    let snap = game.snapshot();
    let len = snap.history.len() as u64;
    let pushed = snap.stats.total_generated + u64::from(game.cfg().record_start);
    let first = pushed.saturating_sub(len);
    let axis = |i: usize| -> Vec<f64> { snap.history.iter().map(|p| p[i]).collect() };
    let step: Vec<u64> = (first..first + len).collect();
    let mut df = df!("step" => step, AXES[0] => axis(0), AXES[1] => axis(1))?;
    for (i, name) in AXES.iter().enumerate().take(D).skip(2) {
        df.with_column(Series::new((*name).into(), axis(i)))?;
    }
    Ok(df)
}

/// Twin distances or probe progress, depending on the mode; `None` in plain mode.
pub fn series_frame<const D: usize>(game: &ChaosGame<D>) -> PolarsResult<Option<DataFrame>> {
    let snap = game.snapshot();
    if let Some(twin) = snap.twin {
        let distance: Vec<f64> = twin.distances.iter().copied().collect();
        let n = distance.len();
        let window = game.cfg().rolling_window;
        let rolled = game.rolling_distance().unwrap_or_default();
        let rolling: Vec<Option<f64>> = (0..n)
            .map(|k| (k + 1).checked_sub(window).and_then(|j| rolled.get(j).copied()))
            .collect();
        let theory = game.theoretical_distance().unwrap_or_default();
        let k: Vec<u64> = (0..n as u64).collect();
        return df!(
            "k" => k,
            "distance" => distance,
            "rolling" => rolling,
            "theory" => theory
        )
        .map(Some);
    }
    if let Some(cov) = snap.coverage {
        let found: Vec<u64> = cov.probe.progress().iter().copied().collect();
        let tick: Vec<u64> = (0..found.len() as u64).collect();
        return df!("tick" => tick, "found" => found).map(Some);
    }
    Ok(None)
}

/// Visited coverage cells; `None` outside coverage mode.
pub fn grid_frame<const D: usize>(game: &ChaosGame<D>) -> PolarsResult<Option<DataFrame>> {
    let Some(cov) = game.snapshot().coverage else {
        return Ok(None);
    };
    let (mut row, mut col, mut count) = (Vec::new(), Vec::new(), Vec::new());
    for (r, c, n) in cov.grid.nonzero_cells() {
        row.push(r as u32);
        col.push(c as u32);
        count.push(n);
    }
    df!("row" => row, "col" => col, "count" => count).map(Some)
}

pub fn write_frame(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating output dir {}", parent.display()))?;
        }
    }
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "csv" | "parquet" => {}
        other => bail!(
            "unsupported output extension {other:?} for {} (use .csv or .parquet)",
            path.display()
        ),
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    if ext == "parquet" {
        ParquetWriter::new(file)
            .finish(df)
            .with_context(|| format!("writing {}", path.display()))?;
    } else {
        let mut file = file;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(df)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    tracing::info!(path = %path.display(), rows = df.height(), cols = df.width(), "wrote artifact");
    Ok(())
}

/// Lazy scan of an exported artifact.
pub fn scan(path: &Path) -> Result<LazyFrame> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("parquet") => LazyFrame::scan_parquet(path, ScanArgsParquet::default())
            .with_context(|| format!("scanning {}", path.display())),
        Some("csv") => LazyCsvReader::new(path)
            .with_infer_schema_length(Some(100))
            .finish()
            .with_context(|| format!("scanning {}", path.display())),
        _ => bail!("cannot inspect {} (expected .csv or .parquet)", path.display()),
    }
}
