//! Core and step dumpers plus the export driver
//!
//! Artifact layout, per exported step:
//!
//! ```text
//! <out_folder>/<slide_id>/<step_label>/
//!     c_<core_id>.json    point list, JSON array of [x, y] pairs
//!     cores.csv           one summary row per exported core
//! ```

use roiview_common::db::{queries, Core, ReviewStep};
use roiview_common::roi::{BoundingBox, Roi, SlideBounds};
use roiview_common::{Error, Result};
use sqlx::SqlitePool;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::bounds::BoundsSource;

/// Export settings taken from the command line.
///
/// Bounds-limiting is not a field here: it is expressed by wiring a
/// `FixedBounds` source instead of the remote client.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub out_folder: PathBuf,
    pub exclude_empty: bool,
    pub exclude_rejected: bool,
}

/// Totals reported at the end of a run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportStats {
    pub steps_loaded: usize,
    pub steps_exported: usize,
    pub steps_skipped: usize,
    pub cores_written: usize,
}

/// What happened to a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Bounds resolved and artifacts written
    Exported { cores: usize },
    /// Nothing left to write after filtering; no directory created
    Empty,
    /// Bounds could not be resolved; no artifacts, run continues
    Unresolved,
}

/// Summary row for one exported core
#[derive(Debug, Clone)]
pub struct CoreRecord {
    pub slide_id: String,
    pub slice_id: i64,
    pub core_id: i64,
    pub author: String,
    pub core_label: String,
    pub focus_regions_count: i64,
    pub bbox: BoundingBox,
    pub file_name: String,
}

/// Translate one core's ROI, write its point list and return the summary
/// row. An existing `c_<core_id>.json` is overwritten.
pub fn dump_core(
    core: &Core,
    slide_id: &str,
    bounds: &SlideBounds,
    out_dir: &Path,
) -> Result<CoreRecord> {
    let roi = Roi::parse(&core.roi_json).map_err(|e| match e {
        Error::InvalidRoi(msg) => Error::InvalidRoi(format!("core {}: {}", core.id, msg)),
        other => other,
    })?;

    let points = roi.translate(bounds);
    let bbox = BoundingBox::of(&points)
        .ok_or_else(|| Error::InvalidRoi(format!("core {}: ROI has no points", core.id)))?;

    let file_name = format!("c_{}.json", core.id);
    let file = fs::File::create(out_dir.join(&file_name))?;
    serde_json::to_writer(file, &points)?;

    Ok(CoreRecord {
        slide_id: slide_id.to_string(),
        slice_id: core.slice_id,
        core_id: core.id,
        author: core.author.clone(),
        core_label: core.label.clone(),
        focus_regions_count: core.focus_regions_count,
        bbox,
        file_name,
    })
}

/// Quote a CSV cell when it contains a delimiter, quote or newline.
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write the per-step summary, one row per exported core, columns in a
/// fixed order.
fn write_summary_csv(records: &[CoreRecord], out_dir: &Path) -> Result<()> {
    let mut rows = vec![
        "slide_id,slice_id,core_id,author,core_label,focus_regions_count,bbox,file_name"
            .to_string(),
    ];
    for r in records {
        rows.push(format!(
            "{},{},{},{},{},{},{},{}",
            csv_escape(&r.slide_id),
            r.slice_id,
            r.core_id,
            csv_escape(&r.author),
            csv_escape(&r.core_label),
            r.focus_regions_count,
            csv_escape(&r.bbox.to_string()),
            csv_escape(&r.file_name),
        ));
    }
    fs::write(out_dir.join("cores.csv"), rows.join("\n") + "\n")?;
    Ok(())
}

/// Export one review step.
///
/// Cores are loaded and filtered before the bounds lookup. A step whose
/// bounds cannot be resolved produces no files and no directories; the
/// failure is logged and the run moves on.
pub async fn dump_step(
    db: &SqlitePool,
    source: &dyn BoundsSource,
    step: &ReviewStep,
    opts: &ExportOptions,
) -> Result<StepOutcome> {
    let mut cores = queries::load_cores_for_step(db, step.id).await?;
    if opts.exclude_empty {
        cores.retain(|c| c.focus_regions_count > 0);
    }

    let slide = queries::load_slide(db, &step.slide_id).await?;
    info!("Loading info for slide {}", slide.id);

    let bounds = match source.resolve(&slide).await {
        Ok(Some(bounds)) => bounds,
        Ok(None) => return Ok(StepOutcome::Unresolved),
        Err(e) => {
            error!("Bounds lookup failed for slide {}: {}", slide.id, e);
            return Ok(StepOutcome::Unresolved);
        }
    };

    info!("Dumping {} cores for step {}", cores.len(), step.label);
    if cores.is_empty() {
        return Ok(StepOutcome::Empty);
    }

    let out_dir = opts.out_folder.join(&step.slide_id).join(&step.label);
    fs::create_dir_all(&out_dir)?;

    let mut records = Vec::with_capacity(cores.len());
    for core in &cores {
        records.push(dump_core(core, &step.slide_id, &bounds, &out_dir)?);
    }
    write_summary_csv(&records, &out_dir)?;

    Ok(StepOutcome::Exported {
        cores: records.len(),
    })
}

/// Run the export over every completed review step.
pub async fn run_export(
    db: &SqlitePool,
    source: &dyn BoundsSource,
    opts: &ExportOptions,
) -> Result<ExportStats> {
    let steps = queries::load_completed_steps(db, opts.exclude_rejected).await?;
    info!("Loaded {} review steps", steps.len());

    let mut stats = ExportStats {
        steps_loaded: steps.len(),
        ..Default::default()
    };
    for step in &steps {
        match dump_step(db, source, step, opts).await? {
            StepOutcome::Exported { cores } => {
                stats.steps_exported += 1;
                stats.cores_written += cores;
            }
            StepOutcome::Empty => {}
            StepOutcome::Unresolved => stats.steps_skipped += 1,
        }
    }
    Ok(stats)
}
