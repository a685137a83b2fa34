//! Software pixel images and a clipped, translated drawing context.
//!
//! `Image` is the storage behind offscreen buffers, viewport backing stores and
//! window surfaces. `Graphics` borrows an image and carries an origin and a
//! clip, the same way a widget sees its own local coordinate space while it is
//! being painted into an ancestor's buffer.

use crate::{Color, Point, Rect, Size};

#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    width: i32,
    height: i32,
    pixels: Vec<Color>,
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Image {
    /// New transparent image. Non-positive dimensions are clamped to 1.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            pixels: vec![Color::TRANSPARENT; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[self.index(x, y)])
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    pub fn graphics(&mut self) -> Graphics<'_> {
        Graphics::new(self)
    }

    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn row_span(&self, y: i32, x: i32, w: i32) -> std::ops::Range<usize> {
        let start = self.index(x, y);
        start..start + w as usize
    }
}

/// Drawing context over a borrowed [`Image`].
///
/// `origin` is where local (0,0) lands in the image; `clip` is kept in image
/// coordinates and is always inside the image bounds.
pub struct Graphics<'a> {
    image: &'a mut Image,
    origin: Point,
    clip: Rect,
}

impl<'a> Graphics<'a> {
    pub fn new(image: &'a mut Image) -> Self {
        let clip = image.bounds();
        Self {
            image,
            origin: Point::ORIGIN,
            clip,
        }
    }

    /// Current clip in local coordinates.
    pub fn clip_bounds(&self) -> Rect {
        self.clip.translate(-self.origin.x, -self.origin.y)
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn translate(&mut self, dx: i32, dy: i32) {
        self.origin = self.origin.offset(dx, dy);
    }

    /// Intersects the clip with `r` (local coordinates).
    pub fn clip_rect(&mut self, r: Rect) {
        let r = r.translate(self.origin.x, self.origin.y);
        self.clip = self.clip.intersection(&r);
    }

    /// Replaces the clip with `r` (local coordinates), bounded by the image.
    pub fn set_clip(&mut self, r: Rect) {
        let r = r.translate(self.origin.x, self.origin.y);
        self.clip = r.intersection(&self.image.bounds());
    }

    /// Child context whose local origin is `bounds.origin()` and whose clip is
    /// the current clip restricted to `bounds`.
    pub fn sub(&mut self, bounds: Rect) -> Graphics<'_> {
        let abs = bounds.translate(self.origin.x, self.origin.y);
        Graphics {
            origin: abs.origin(),
            clip: self.clip.intersection(&abs),
            image: &mut *self.image,
        }
    }

    pub fn fill_rect(&mut self, r: Rect, color: Color) {
        let r = r
            .translate(self.origin.x, self.origin.y)
            .intersection(&self.clip);
        if r.is_empty() {
            return;
        }
        for y in r.y..r.y + r.h {
            let span = self.image.row_span(y, r.x, r.w);
            let row = &mut self.image.pixels[span];
            if color.is_opaque() {
                row.fill(color);
            } else {
                for px in row {
                    *px = color.over(*px);
                }
            }
        }
    }

    /// Sets the pixels of `r` (clipped) to transparent, without blending.
    pub fn clear_rect(&mut self, r: Rect) {
        let r = r
            .translate(self.origin.x, self.origin.y)
            .intersection(&self.clip);
        if r.is_empty() {
            return;
        }
        for y in r.y..r.y + r.h {
            let span = self.image.row_span(y, r.x, r.w);
            self.image.pixels[span].fill(Color::TRANSPARENT);
        }
    }

    /// Block copy of the `(x, y, w, h)` area (local coordinates) by `(dx, dy)`.
    ///
    /// Source pixels outside the image are skipped; the destination honours
    /// the clip. Overlapping source and destination are handled.
    pub fn copy_area(&mut self, x: i32, y: i32, w: i32, h: i32, dx: i32, dy: i32) {
        let src = Rect::new(x, y, w, h)
            .translate(self.origin.x, self.origin.y)
            .intersection(&self.image.bounds());
        if src.is_empty() {
            return;
        }
        let dst = src.translate(dx, dy).intersection(&self.clip);
        if dst.is_empty() {
            return;
        }
        let src = dst.translate(-dx, -dy);
        let mut scratch: Vec<Color> = Vec::with_capacity(src.w as usize * src.h as usize);
        for row in src.y..src.y + src.h {
            scratch.extend_from_slice(&self.image.pixels[self.image.row_span(row, src.x, src.w)]);
        }
        for (i, row) in (dst.y..dst.y + dst.h).enumerate() {
            let span = self.image.row_span(row, dst.x, dst.w);
            let from = i * dst.w as usize;
            self.image.pixels[span].copy_from_slice(&scratch[from..from + dst.w as usize]);
        }
    }

    /// Copies all of `src` with its top-left at `(x, y)` (local coordinates).
    pub fn draw_image(&mut self, src: &Image, x: i32, y: i32) {
        self.draw_image_region(src, src.bounds(), Point::new(x, y));
    }

    /// Copies `region` of `src` so that its top-left lands at `at`.
    pub fn draw_image_region(&mut self, src: &Image, region: Rect, at: Point) {
        let region = region.intersection(&src.bounds());
        if region.is_empty() {
            return;
        }
        let dst = Rect::from_origin_size(at, region.size())
            .translate(self.origin.x, self.origin.y)
            .intersection(&self.clip);
        if dst.is_empty() {
            return;
        }
        let sx = region.x + (dst.x - (at.x + self.origin.x));
        let sy = region.y + (dst.y - (at.y + self.origin.y));
        for i in 0..dst.h {
            let d = self.image.row_span(dst.y + i, dst.x, dst.w);
            let s = src.row_span(sy + i, sx, dst.w);
            self.image.pixels[d].copy_from_slice(&src.pixels[s]);
        }
    }
}
