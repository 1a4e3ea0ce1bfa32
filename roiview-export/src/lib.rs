//! roiview-export library - core ROI export pipeline
//!
//! Exports the cores of every completed review step as per-core JSON point
//! lists plus a per-step CSV summary, translating tile-local ROI
//! coordinates into whole-slide coordinates via the deep-zoom image
//! service.

pub mod bounds;
pub mod dump;

pub use bounds::{BoundsSource, DeepZoomBoundsClient, FixedBounds};
pub use dump::{run_export, ExportOptions, ExportStats, StepOutcome};
