//! Database models
//!
//! Read-only views of the rows the export job touches. The schema is owned
//! by the surrounding review application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One review pass over a slide's ROI annotations.
///
/// A step is complete when `completion_date` is set; only completed steps
/// are ever exported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewStep {
    pub id: i64,
    pub label: String,
    pub slide_id: String,
    pub completion_date: Option<DateTime<Utc>>,
}

/// Whole-slide image record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slide {
    pub id: String,
    /// Image-format tag, one of a small closed set (`OMERO_IMG`, `MIRAX`)
    pub image_type: String,
    /// Numeric id under which the OMERO server knows this slide
    pub omero_id: Option<i64>,
}

impl Slide {
    /// Interpret the image-format tag; unknown tags yield `None`.
    pub fn image_format(&self) -> Option<ImageType> {
        ImageType::from_tag(&self.image_type)
    }
}

/// Supported whole-slide image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    OmeroImg,
    Mirax,
}

impl ImageType {
    pub fn from_tag(tag: &str) -> Option<ImageType> {
        match tag {
            "OMERO_IMG" => Some(ImageType::OmeroImg),
            "MIRAX" => Some(ImageType::Mirax),
            _ => None,
        }
    }
}

/// A core ROI annotated within a slice of a slide.
///
/// `roi_json` holds the serialized polygon in tile-local coordinates;
/// `focus_regions_count` is the number of focus regions annotated inside
/// this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Core {
    pub id: i64,
    pub label: String,
    pub slice_id: i64,
    pub author: String,
    pub roi_json: String,
    pub focus_regions_count: i64,
}
