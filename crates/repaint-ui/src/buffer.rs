//! The shared offscreen (double) buffer.
//!
//! One image is reused for every double-buffered paint. It only grows: a
//! request that does not fit replaces it with an image as large as the old one
//! *and* the request in each axis, so alternating wide and tall requests
//! converge instead of thrashing. Every request is capped by the maximum
//! buffer size, so the buffer handed out can be smaller than asked for;
//! callers tile in that case.

use repaint_core::{Image, Size};

#[derive(Debug, Default)]
pub struct OffscreenBuffer {
    image: Option<Image>,
    /// Size of the most recently allocated image; survives discards so the
    /// next allocation after a reset keeps the high-water mark.
    size: Size,
    needs_reset: bool,
    allocations: u64,
}

impl OffscreenBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an image of at least `proposed` (clamped to `[1, max]`).
    pub fn get(&mut self, proposed: Size, max: Size) -> &mut Image {
        let mut width = proposed.width.clamp(1, max.width.max(1));
        let mut height = proposed.height.clamp(1, max.height.max(1));

        let too_small = self
            .image
            .as_ref()
            .is_some_and(|img| img.width() < width || img.height() < height);

        if self.needs_reset || too_small {
            self.needs_reset = false;
            self.image = None;
            width = width.max(self.size.width.min(max.width));
            height = height.max(self.size.height.min(max.height));
        }

        let size = &mut self.size;
        let allocations = &mut self.allocations;
        self.image.get_or_insert_with(|| {
            log::debug!("allocating {width}x{height} offscreen buffer");
            *size = Size::new(width, height);
            *allocations += 1;
            Image::new(width, height)
        })
    }

    /// Forces a fresh image on the next [`get`](Self::get).
    pub fn reset(&mut self) {
        self.needs_reset = true;
    }

    /// Drops the image if it exceeds the new ceiling in either axis.
    pub fn enforce_max(&mut self, max: Size) {
        if self
            .image
            .as_ref()
            .is_some_and(|img| img.width() > max.width || img.height() > max.height)
        {
            log::debug!(
                "offscreen buffer exceeds {}x{}, discarding",
                max.width,
                max.height
            );
            self.image = None;
        }
    }

    pub fn current_size(&self) -> Option<Size> {
        self.image.as_ref().map(|img| img.size())
    }

    /// Number of images allocated so far.
    pub fn allocations(&self) -> u64 {
        self.allocations
    }
}
