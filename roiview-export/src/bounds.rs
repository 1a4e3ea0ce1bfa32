//! Slide-bounds resolution
//!
//! The deep-zoom image service reports, per slide, the pixel offset of the
//! non-empty content region. The endpoint differs by image format, so the
//! remote client dispatches on the slide's format tag. An unknown tag or a
//! non-200 response resolves to `None` (the step is skippable); only
//! transport failures surface as errors.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use roiview_common::db::{ImageType, Slide};
use roiview_common::roi::SlideBounds;
use roiview_common::{Error, Result};
use std::time::Duration;
use tracing::{debug, error};

/// Timeout for bounds requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// User-Agent header sent to the image service
const USER_AGENT: &str = concat!("roiview-export/", env!("CARGO_PKG_VERSION"));

/// Capability: resolve the content-region offset for a slide.
///
/// `Ok(None)` means the slide is unresolvable (unknown format, or an
/// unsuccessful service response) and its step should be skipped; `Err` is
/// reserved for transport-level failures.
#[async_trait]
pub trait BoundsSource: Send + Sync {
    async fn resolve(&self, slide: &Slide) -> Result<Option<SlideBounds>>;
}

/// Remote resolver backed by the deep-zoom image service.
pub struct DeepZoomBoundsClient {
    http_client: Client,
    base_url: String,
}

impl DeepZoomBoundsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(USER_AGENT),
        );

        let base_url: String = base_url.into();
        Self {
            http_client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .default_headers(headers)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Bounds endpoint for a slide, keyed on its image format.
    ///
    /// OMERO slides are addressed by their numeric OMERO id, MIRAX slides
    /// by the slide identifier itself. Slides this service cannot answer
    /// for have no endpoint.
    fn bounds_url(&self, slide: &Slide) -> Option<String> {
        match slide.image_format() {
            Some(ImageType::OmeroImg) => {
                let Some(omero_id) = slide.omero_id else {
                    error!("Slide {} is tagged OMERO_IMG but has no OMERO id", slide.id);
                    return None;
                };
                Some(format!(
                    "{}/deepzoom/slide_bounds/{}.dzi",
                    self.base_url, omero_id
                ))
            }
            Some(ImageType::Mirax) => Some(format!(
                "{}/mirax/deepzoom/slide_bounds/{}.dzi",
                self.base_url, slide.id
            )),
            None => {
                error!(
                    "Unknown image type {} for slide {}",
                    slide.image_type, slide.id
                );
                None
            }
        }
    }
}

#[async_trait]
impl BoundsSource for DeepZoomBoundsClient {
    async fn resolve(&self, slide: &Slide) -> Result<Option<SlideBounds>> {
        let Some(url) = self.bounds_url(slide) else {
            return Ok(None);
        };

        debug!(slide_id = %slide.id, url = %url, "Requesting slide bounds");
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Remote(format!("bounds request failed for {}: {}", slide.id, e)))?;

        if response.status() != StatusCode::OK {
            error!(
                "Error while loading slide bounds for {} (HTTP {})",
                slide.id,
                response.status()
            );
            return Ok(None);
        }

        let bounds: SlideBounds = response.json().await.map_err(|e| {
            Error::Remote(format!("unusable bounds response for {}: {}", slide.id, e))
        })?;

        debug!(
            slide_id = %slide.id,
            bounds_x = bounds.bounds_x,
            bounds_y = bounds.bounds_y,
            "Slide bounds resolved"
        );
        Ok(Some(bounds))
    }
}

/// Fixed-offset resolver used when bounds-limiting is requested: ROIs stay
/// in tile-local coordinates and no network request is ever made.
pub struct FixedBounds(SlideBounds);

impl FixedBounds {
    pub fn zero() -> FixedBounds {
        FixedBounds(SlideBounds::ZERO)
    }
}

#[async_trait]
impl BoundsSource for FixedBounds {
    async fn resolve(&self, _slide: &Slide) -> Result<Option<SlideBounds>> {
        Ok(Some(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(id: &str, image_type: &str, omero_id: Option<i64>) -> Slide {
        Slide {
            id: id.to_string(),
            image_type: image_type.to_string(),
            omero_id,
        }
    }

    #[test]
    fn omero_url_embeds_the_numeric_id() {
        let client = DeepZoomBoundsClient::new("http://images.local:4080");
        let url = client.bounds_url(&slide("SLIDE-1", "OMERO_IMG", Some(42)));
        assert_eq!(
            url.as_deref(),
            Some("http://images.local:4080/deepzoom/slide_bounds/42.dzi")
        );
    }

    #[test]
    fn mirax_url_embeds_the_slide_id() {
        let client = DeepZoomBoundsClient::new("http://images.local:4080/");
        let url = client.bounds_url(&slide("SLIDE-2", "MIRAX", None));
        assert_eq!(
            url.as_deref(),
            Some("http://images.local:4080/mirax/deepzoom/slide_bounds/SLIDE-2.dzi")
        );
    }

    #[test]
    fn unknown_format_has_no_endpoint() {
        let client = DeepZoomBoundsClient::new("http://images.local:4080");
        assert_eq!(client.bounds_url(&slide("SLIDE-3", "NDPI", None)), None);
    }

    #[test]
    fn omero_slide_without_id_has_no_endpoint() {
        let client = DeepZoomBoundsClient::new("http://images.local:4080");
        assert_eq!(client.bounds_url(&slide("SLIDE-4", "OMERO_IMG", None)), None);
    }

    #[tokio::test]
    async fn fixed_bounds_never_touch_the_network() {
        let source = FixedBounds::zero();
        let bounds = source
            .resolve(&slide("SLIDE-5", "OMERO_IMG", Some(1)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bounds, SlideBounds::ZERO);
    }
}
