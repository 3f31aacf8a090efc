//! Base image layer and its load lifecycle.
//!
//! Loading is split in two so the fetch/decode can run on any executor:
//! [`BaseRenderer::begin_load`] hands out a [`LoadTicket`] and forgets the
//! previous image, [`BaseRenderer::complete`] accepts the decoded image only
//! if the ticket is still the latest one. A ticket is consumed on completion,
//! so each load reports its transform at most once.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::geometry::Size;
use crate::surface::{ImageDimensions, Surface};
use crate::transform::Transform;

/// Claim on an in-flight image load.
#[derive(Debug, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    url: String,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug)]
pub struct BaseRenderer<H> {
    generation: u64,
    url: Option<String>,
    image: Option<H>,
}

impl<H> Default for BaseRenderer<H> {
    fn default() -> Self {
        Self {
            generation: 0,
            url: None,
            image: None,
        }
    }
}

impl<H: ImageDimensions> BaseRenderer<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start loading `url`. Drops the current image and invalidates every
    /// ticket handed out before.
    pub fn begin_load(&mut self, url: impl Into<String>) -> LoadTicket {
        let url = url.into();
        self.generation += 1;
        self.image = None;
        self.url = Some(url.clone());
        debug!("Loading image {} (generation {})", url, self.generation);

        LoadTicket {
            generation: self.generation,
            url,
        }
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Finish the load identified by `ticket`.
    ///
    /// Returns `Ok(None)` for a stale ticket; the late result is dropped.
    /// On success the image is kept and the initial fit for `viewport` is
    /// returned. On failure the renderer stays in the "not loaded" state.
    pub fn complete(&mut self, ticket: LoadTicket, result: Result<H>, viewport: Size) -> Result<Option<Transform>> {
        if !self.is_current(&ticket) {
            debug!(
                "Discarding stale load of {} (generation {}, current {})",
                ticket.url, ticket.generation, self.generation
            );
            return Ok(None);
        }

        let image = match result {
            Ok(image) => image,
            Err(e) => {
                warn!("Image {} failed to load: {}", ticket.url, e);
                return Err(e);
            }
        };

        let dimensions = image.dimensions();
        let transform = Transform::fit(dimensions, viewport)?;
        info!(
            "Loaded {} ({}x{}), fit scale {:.3}",
            ticket.url,
            dimensions.width,
            dimensions.height,
            transform.fit_scale()
        );

        self.image = Some(image);
        Ok(Some(transform))
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn image(&self) -> Option<&H> {
        self.image.as_ref()
    }

    pub fn image_size(&self) -> Option<Size> {
        self.image.as_ref().map(ImageDimensions::dimensions)
    }

    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }

    /// Clear `surface` and draw the image where `transform` puts it.
    pub fn paint<S>(&self, surface: &mut S, transform: &Transform) -> Result<()>
    where
        S: Surface<Image = H>,
    {
        surface.clear();
        if let Some(image) = &self.image {
            surface.draw_image(image, transform.image_rect(image.dimensions()))?;
        }
        Ok(())
    }
}
