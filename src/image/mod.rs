//! Image types shared by the video, detection and drawing code.
//!
//! This module provides:
//!
//! - The [`Frame`] type, a shared, immutable RGBA video frame.
//! - [`Resolution`] and [`Rect`], integer sizes and regions in frame pixel coordinates.
//! - [`Color`], an 8-bit RGBA color.
//! - [`Canvas`], an RGBA drawing surface (see the [`draw`] module).

pub mod draw;


use std::{fmt, path::Path, sync::Arc};

use embedded_graphics::{pixelcolor::raw::RawU32, prelude::PixelColor};
use image::RgbaImage;

pub use draw::Canvas;

/// A single video frame.
///
/// Frames are reference-counted so that the detector worker can read a frame while the scheduler
/// blits the same frame onto the drawing surface, without copying pixel data.
pub type Frame = Arc<RgbaImage>;

#[derive(Debug, Clone, Copy)]
pub(crate) enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Determines the image format from a file extension.
    ///
    /// Returns `None` for paths without a supported extension (`jpeg`, `jpg` or `png`).
    pub(crate) fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("jpg" | "jpeg") => Some(Self::Jpeg),
            Some("png") => Some(Self::Png),
            _ => None,
        }
    }

    fn as_image_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Png => image::ImageFormat::Png,
        }
    }
}

/// Loads an image file as a [`Frame`].
///
/// The path must have a supported file extension (`jpeg`, `jpg` or `png`).
pub fn load_frame<A: AsRef<Path>>(path: A) -> anyhow::Result<Frame> {
    let path = path.as_ref();
    let Some(format) = ImageFormat::from_path(path) else {
        anyhow::bail!(
            "invalid image path '{}' (must have one of the supported extensions)",
            path.display()
        );
    };
    let data = std::fs::read(path)?;
    let buf = image::load_from_memory_with_format(&data, format.as_image_format())?.to_rgba8();
    Ok(Arc::new(buf))
}

/// Resolution (`width x height`) of a frame or drawing surface.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    width: u32,
    height: u32,
}

impl Resolution {
    /// Creates a new [`Resolution`] of `width x height`.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the resolution of an image.
    pub fn of(image: &RgbaImage) -> Self {
        Self::new(image.width(), image.height())
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// An axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl Rect {
    pub fn from_top_left(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns a rectangle at the origin that covers `res`.
    pub fn covering(res: Resolution) -> Self {
        Self::from_top_left(0, 0, res.width(), res.height())
    }

    #[inline]
    pub fn x(&self) -> u32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> u32 {
        self.y
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Clamps `self` to lie within an area of size `res`.
    pub fn clamp_to(&self, res: Resolution) -> Self {
        let x = self.x.min(res.width());
        let y = self.y.min(res.height());
        let width = self.width.min(res.width() - x);
        let height = self.height.min(res.height() - y);
        Self::from_top_left(x, y, width, height)
    }
}

/// An 8-bit RGBA color.
///
/// Colors are always in the sRGB color space and use non-premultiplied alpha.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Color(pub(crate) [u8; 4]);

impl Color {
    /// Fully transparent black (all components are 0).
    pub const NULL: Self = Self([0, 0, 0, 0]);
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    pub const WHITE: Self = Self([255, 255, 255, 255]);
    pub const RED: Self = Self([255, 0, 0, 255]);
    pub const GREEN: Self = Self([0, 255, 0, 255]);
    pub const BLUE: Self = Self([0, 0, 255, 255]);

    #[inline]
    pub fn r(&self) -> u8 {
        self.0[0]
    }

    #[inline]
    pub fn g(&self) -> u8 {
        self.0[1]
    }

    #[inline]
    pub fn b(&self) -> u8 {
        self.0[2]
    }

    #[inline]
    pub fn a(&self) -> u8 {
        self.0[3]
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.r(),
            self.g(),
            self.b(),
            self.a(),
        )
    }
}

impl From<Color> for image::Rgba<u8> {
    fn from(color: Color) -> Self {
        image::Rgba(color.0)
    }
}

impl PixelColor for Color {
    type Raw = RawU32;
}
