//! The 2D drawing surface the pipeline paints onto.
//!
//! [`Surface`] is the seam between the rendering logic and whatever presents the result. The crate
//! ships one implementation, [`Canvas`][crate::image::Canvas], which rasterizes into an RGBA image.
//!
//! All coordinates are in frame pixel space, the same space the detector reports keypoints in.

use std::f32::consts::PI;

use image::RgbaImage;
use itertools::Itertools;
use nalgebra::{Matrix3, Point2, Rotation2, Vector2};

use crate::image::{Color, Rect, Resolution};

/// A 2D drawing surface.
pub trait Surface {
    /// Returns the size of the surface, which matches the size of the frames drawn onto it.
    fn resolution(&self) -> Resolution;

    /// Resets every pixel in `region` to fully transparent.
    fn clear(&mut self, region: Rect);

    /// Copies a video frame onto the surface, with its top left corner at the origin.
    fn draw_frame(&mut self, frame: &RgbaImage);

    /// Draws a filled circle.
    fn fill_circle(&mut self, center: Point2<f32>, radius: f32, color: Color);

    /// Strokes every segment of an open path.
    fn stroke_path(&mut self, path: &Path, stroke: Stroke);

    /// Draws `text` with its baseline origin at `(0, 0)` in the coordinate space given by
    /// `transform`.
    fn fill_text(&mut self, text: &str, transform: &Transform, color: Color);
}

/// Stroke style of a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: u32,
}

/// A poly-line path made of one or more subpaths.
///
/// The builder methods take optional points: a missing or non-finite point is a no-op, so a path
/// built over partially detected landmarks connects the points that *are* present. `line_to`
/// without a current point starts a new subpath, just like `move_to`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    subpaths: Vec<Vec<Point2<f32>>>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new subpath at `point`.
    pub fn move_to(&mut self, point: Option<Point2<f32>>) -> &mut Self {
        if let Some(point) = point.filter(is_finite) {
            self.subpaths.push(vec![point]);
        }
        self
    }

    /// Extends the current subpath to `point`.
    pub fn line_to(&mut self, point: Option<Point2<f32>>) -> &mut Self {
        if let Some(point) = point.filter(is_finite) {
            match self.subpaths.last_mut() {
                Some(subpath) => subpath.push(point),
                None => self.subpaths.push(vec![point]),
            }
        }
        self
    }

    /// Builds an open path visiting `points` in order.
    pub fn polyline(points: impl IntoIterator<Item = Option<Point2<f32>>>) -> Self {
        let mut path = Self::new();
        let mut points = points.into_iter();
        path.move_to(points.next().flatten());
        for point in points {
            path.line_to(point);
        }
        path
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.is_empty()
    }

    pub fn subpaths(&self) -> &[Vec<Point2<f32>>] {
        &self.subpaths
    }

    /// Returns all points of the path, in the order they were added.
    pub fn points(&self) -> impl Iterator<Item = Point2<f32>> + '_ {
        self.subpaths.iter().flatten().copied()
    }

    /// Returns the line segments that make up the path.
    pub fn segments(&self) -> impl Iterator<Item = (Point2<f32>, Point2<f32>)> + '_ {
        self.subpaths
            .iter()
            .flat_map(|subpath| subpath.iter().copied().tuple_windows())
    }
}

fn is_finite(point: &Point2<f32>) -> bool {
    point.x.is_finite() && point.y.is_finite()
}

/// A 2D affine transform, composed the same way as a canvas transformation stack.
///
/// Each builder method applies its operation *before* the transform built so far, so
/// `Transform::identity().translate(..).rotate(..)` first rotates a point, then translates it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: Matrix3<f32>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    pub fn translate(self, x: f32, y: f32) -> Self {
        self.then(Matrix3::new_translation(&Vector2::new(x, y)))
    }

    /// Rotates clockwise (in image coordinates, where Y points down) by `radians`.
    pub fn rotate(self, radians: f32) -> Self {
        self.then(Rotation2::new(radians).to_homogeneous())
    }

    pub fn scale(self, x: f32, y: f32) -> Self {
        self.then(Matrix3::new_nonuniform_scaling(&Vector2::new(x, y)))
    }

    fn then(self, op: Matrix3<f32>) -> Self {
        Self {
            matrix: self.matrix * op,
        }
    }

    /// Transform for a text label anchored at `anchor`, starting 10 pixels to its right.
    pub fn label(anchor: Point2<f32>) -> Self {
        Self::identity().translate(anchor.x + 10.0, anchor.y)
    }

    /// Transform for a text label anchored at `anchor` on a surface that is presented with a
    /// horizontal mirror.
    ///
    /// Rotating by half a turn and then flipping vertically leaves a pure horizontal mirror, which
    /// the presentation mirror undoes, so the label reads normally on screen. The label is shifted
    /// left by 10 pixels so that it starts next to the landmark once mirrored.
    pub fn mirrored_label(anchor: Point2<f32>) -> Self {
        Self::identity()
            .translate(anchor.x - 10.0, anchor.y)
            .rotate(-PI)
            .scale(1.0, -1.0)
    }

    pub fn apply(&self, point: Point2<f32>) -> Point2<f32> {
        self.matrix.transform_point(&point)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
