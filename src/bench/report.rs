use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::{
    bench::{
        config::{BenchConfiguration, transform_label},
        stats::FpsStats,
    },
    foundation::core::{BackendKind, FilterKind, Resolution, build_label},
    foundation::error::{VidfxError, VidfxResult},
};

pub const CSV_HEADER: &str =
    "mode,filter,transform,resolution,build,avg_fps,min_fps,max_fps,std_fps,samples";

pub const FRAME_LOG_HEADER: &str = "time,mode,filter,resolution,transform,build,fps";

/// One row of the summary report. Immutable once built.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BenchResult {
    pub mode: BackendKind,
    pub filter: FilterKind,
    pub transform: bool,
    pub resolution: Resolution,
    pub build: String,
    pub avg_fps: f64,
    pub min_fps: f64,
    pub max_fps: f64,
    pub std_fps: f64,
    pub samples: usize,
}

impl BenchResult {
    pub fn new(config: &BenchConfiguration, stats: FpsStats) -> Self {
        Self {
            mode: config.backend,
            filter: config.filter,
            transform: config.transform,
            resolution: config.resolution,
            build: build_label().to_string(),
            avg_fps: stats.avg,
            min_fps: stats.min,
            max_fps: stats.max,
            std_fps: stats.std,
            samples: stats.samples,
        }
    }

    pub fn csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{:.3},{:.3},{:.3},{:.3},{}",
            self.mode,
            self.filter,
            transform_label(self.transform),
            self.resolution,
            self.build,
            self.avg_fps,
            self.min_fps,
            self.max_fps,
            self.std_fps,
            self.samples
        )
    }

    /// `CPU | Pixelate | On | 640x480 | Release => 123.4 FPS (n=600)`
    pub fn summary_line(&self) -> String {
        format!(
            "{} | {} | {} | {} | {} => {:.1} FPS (n={})",
            self.mode,
            self.filter,
            transform_label(self.transform),
            self.resolution,
            self.build,
            self.avg_fps,
            self.samples
        )
    }
}

/// `perf_summary_<build>.csv`
pub fn default_report_path(build: &str) -> PathBuf {
    PathBuf::from(format!("perf_summary_{build}.csv"))
}

pub fn write_csv<W: Write>(mut out: W, results: &[BenchResult]) -> VidfxResult<()> {
    writeln!(out, "{CSV_HEADER}")?;
    for r in results {
        writeln!(out, "{}", r.csv_row())?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_csv_file(path: &Path, results: &[BenchResult]) -> VidfxResult<()> {
    let file = File::create(path)?;
    write_csv(BufWriter::new(file), results)
}

pub fn write_json_file(path: &Path, results: &[BenchResult]) -> VidfxResult<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, results)
        .map_err(|e| VidfxError::report(format!("serialize results: {e}")))?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

pub fn read_json_file(path: &Path) -> VidfxResult<Vec<BenchResult>> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| VidfxError::report(format!("parse results: {e}")))
}

/// Per-frame fps log, one line per sampled frame.
pub struct FrameLog {
    out: Box<dyn Write + Send>,
}

impl FrameLog {
    pub fn new(mut out: Box<dyn Write + Send>) -> VidfxResult<Self> {
        writeln!(out, "{FRAME_LOG_HEADER}")?;
        Ok(Self { out })
    }

    pub fn create(path: &Path) -> VidfxResult<Self> {
        Self::new(Box::new(BufWriter::new(File::create(path)?)))
    }

    pub fn log(&mut self, time_secs: f64, config: &BenchConfiguration, fps: f64) -> VidfxResult<()> {
        writeln!(
            self.out,
            "{time_secs:.6},{},{},{},{},{},{fps:.3}",
            config.backend,
            config.filter,
            config.resolution,
            transform_label(config.transform),
            build_label()
        )?;
        Ok(())
    }

    pub fn flush(&mut self) -> VidfxResult<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/bench/report.rs"]
mod tests;
