//! [`Canvas`], a [`Surface`] that rasterizes into an RGBA image.
//!
//! All drawing operations *overwrite* the target pixel with the shape color. They do not perform
//! blending. Geometry is rasterized with `embedded-graphics`; anything outside of the canvas is
//! clipped.

use std::convert::Infallible;

use embedded_graphics::{
    draw_target::DrawTarget,
    mono_font::{ascii, MonoTextStyle},
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Rectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};
use image::{imageops, RgbaImage};
use nalgebra::Point2;

use crate::image::{Color, Rect, Resolution};
use crate::surface::{Path, Stroke, Surface, Transform};

/// An RGBA drawing surface.
///
/// A new canvas is fully transparent.
#[derive(Clone)]
pub struct Canvas {
    buf: RgbaImage,
}

impl Canvas {
    /// Creates a transparent canvas of the given size.
    pub fn new(res: Resolution) -> Self {
        Self {
            buf: RgbaImage::new(res.width(), res.height()),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.buf.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.buf.height()
    }

    /// Returns the color of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside of the canvas.
    pub fn get(&self, x: u32, y: u32) -> Color {
        Color(self.buf.get_pixel(x, y).0)
    }

    /// Returns the rendered image.
    pub fn image(&self) -> &RgbaImage {
        &self.buf
    }

    pub fn into_image(self) -> RgbaImage {
        self.buf
    }
}

impl Surface for Canvas {
    fn resolution(&self) -> Resolution {
        Resolution::of(&self.buf)
    }

    fn clear(&mut self, region: Rect) {
        let region = region.clamp_to(self.resolution());
        let blank = RgbaImage::new(region.width(), region.height());
        imageops::replace(&mut self.buf, &blank, region.x().into(), region.y().into());
    }

    fn draw_frame(&mut self, frame: &RgbaImage) {
        if frame.dimensions() != self.buf.dimensions() {
            log::trace!(
                "frame size {}x{} differs from canvas size {}x{}, clipping",
                frame.width(),
                frame.height(),
                self.buf.width(),
                self.buf.height(),
            );
        }
        imageops::replace(&mut self.buf, frame, 0, 0);
    }

    fn fill_circle(&mut self, center: Point2<f32>, radius: f32, color: Color) {
        let (width, height) = (self.width() as f32, self.height() as f32);
        if !radius.is_finite()
            || center.x < -radius
            || center.y < -radius
            || center.x > width + radius
            || center.y > height + radius
        {
            return;
        }
        let diameter = (radius * 2.0).round().max(1.0) as u32;
        match Circle::with_center(to_point(center), diameter)
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(&mut Target(&mut self.buf))
        {
            Ok(_) => {}
            Err(infallible) => match infallible {},
        }
    }

    fn stroke_path(&mut self, path: &Path, stroke: Stroke) {
        // e-g's thick line math overflows for very long lines, so only the visible part is drawn.
        let margin = stroke.width as f32;
        let min = Point2::new(-margin, -margin);
        let max = Point2::new(self.width() as f32 + margin, self.height() as f32 + margin);
        for (start, end) in path.segments() {
            let Some((start, end)) = clip_segment(start, end, min, max) else {
                continue;
            };
            match Line::new(to_point(start), to_point(end))
                .into_styled(PrimitiveStyle::with_stroke(stroke.color, stroke.width))
                .draw(&mut Target(&mut self.buf))
            {
                Ok(_) => {}
                Err(infallible) => match infallible {},
            }
        }
    }

    fn fill_text(&mut self, text: &str, transform: &Transform, color: Color) {
        // FIXME: e-g's mono fonts lack non-ASCII glyphs, those are drawn as `?`
        let character_style = MonoTextStyle::new(&ascii::FONT_6X10, color);
        let text_style = TextStyleBuilder::new()
            .alignment(Alignment::Left)
            .baseline(Baseline::Alphabetic)
            .build();
        match Text::with_text_style(text, Point::zero(), character_style, text_style).draw(
            &mut Transformed {
                target: Target(&mut self.buf),
                transform,
            },
        ) {
            Ok(_) => {}
            Err(infallible) => match infallible {},
        }
    }
}

/// Clips the segment `a`-`b` to the axis-aligned box `min`-`max` (Liang-Barsky).
///
/// Returns `None` if no part of the segment lies inside the box. The returned points always lie
/// inside the box, even when float precision is lost for far-away endpoints.
pub(super) fn clip_segment(
    a: Point2<f32>,
    b: Point2<f32>,
    min: Point2<f32>,
    max: Point2<f32>,
) -> Option<(Point2<f32>, Point2<f32>)> {
    let d = b - a;
    if !d.x.is_finite() || !d.y.is_finite() {
        return None;
    }
    let (mut t0, mut t1) = (0.0f32, 1.0f32);
    for (p, q) in [
        (-d.x, a.x - min.x),
        (d.x, max.x - a.x),
        (-d.y, a.y - min.y),
        (d.y, max.y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
    }
    let clamp = |p: Point2<f32>| Point2::new(p.x.clamp(min.x, max.x), p.y.clamp(min.y, max.y));
    Some((clamp(a + d * t0), clamp(a + d * t1)))
}

fn to_point(p: Point2<f32>) -> Point {
    Point::new(p.x.round() as i32, p.y.round() as i32)
}

struct Target<'a>(&'a mut RgbaImage);

impl Dimensions for Target<'_> {
    fn bounding_box(&self) -> Rectangle {
        let (width, height) = self.0.dimensions();

        Rectangle {
            top_left: Point { x: 0, y: 0 },
            size: Size { width, height },
        }
    }
}

impl DrawTarget for Target<'_> {
    type Color = Color;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = embedded_graphics::Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0
                && (point.x as u32) < self.0.width()
                && point.y >= 0
                && (point.y as u32) < self.0.height()
            {
                self.0.put_pixel(point.x as u32, point.y as u32, color.into());
            }
        }

        Ok(())
    }
}

/// Maps every pixel drawn through it by an affine [`Transform`] before writing it to the canvas.
///
/// Pixels are mapped individually, which is exact for the transforms used for labels (mirrors
/// and translations) and good enough for anything else.
struct Transformed<'a> {
    target: Target<'a>,
    transform: &'a Transform,
}

impl Dimensions for Transformed<'_> {
    fn bounding_box(&self) -> Rectangle {
        // Any pixel may land on the canvas after transformation; clipping happens in `Target`.
        const HALF_EXTENT: i32 = 1 << 20;
        Rectangle {
            top_left: Point {
                x: -HALF_EXTENT,
                y: -HALF_EXTENT,
            },
            size: Size {
                width: 2 * HALF_EXTENT as u32,
                height: 2 * HALF_EXTENT as u32,
            },
        }
    }
}

impl DrawTarget for Transformed<'_> {
    type Color = Color;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = embedded_graphics::Pixel<Self::Color>>,
    {
        let transform = self.transform;
        self.target
            .draw_iter(pixels.into_iter().map(|Pixel(point, color)| {
                let mapped = transform.apply(Point2::new(point.x as f32, point.y as f32));
                Pixel(to_point(mapped), color)
            }))
    }
}
