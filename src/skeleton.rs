//! Hand skeleton rendering.

use crate::hand::schema::{FingerChain, FINGER_CHAINS};
use crate::hand::{DetectedHand, Handedness, Keypoint};
use crate::image::Color;
use crate::surface::{Path, Stroke, Surface, Transform};

/// Colors and sizes used to draw hand skeletons.
#[derive(Debug, Clone, Copy)]
pub struct SkeletonStyle {
    /// Keypoint fill color for left hands.
    pub left_fill: Color,
    /// Keypoint fill color for right hands.
    pub right_fill: Color,
    /// Stroke used for the finger chains of all hands.
    pub stroke: Stroke,
    /// Radius of the circle drawn at each keypoint.
    pub keypoint_radius: f32,
}

impl SkeletonStyle {
    pub fn fill(&self, handedness: Handedness) -> Color {
        match handedness {
            Handedness::Left => self.left_fill,
            Handedness::Right => self.right_fill,
        }
    }
}

impl Default for SkeletonStyle {
    fn default() -> Self {
        Self {
            left_fill: Color::BLACK,
            right_fill: Color::BLUE,
            stroke: Stroke {
                color: Color::WHITE,
                width: 2,
            },
            keypoint_radius: 4.0,
        }
    }
}

/// Draws detected hands onto a [`Surface`].
///
/// Each hand is drawn as a filled circle per keypoint plus one open poly-line per
/// [`FINGER_CHAINS`] entry. Missing keypoints are skipped, so partially detected hands are drawn
/// with whatever is available.
#[derive(Debug, Clone)]
pub struct SkeletalRenderer {
    style: SkeletonStyle,
    show_names: bool,
    mirrored: bool,
}

impl Default for SkeletalRenderer {
    fn default() -> Self {
        Self::new(SkeletonStyle::default())
    }
}

impl SkeletalRenderer {
    pub fn new(style: SkeletonStyle) -> Self {
        Self {
            style,
            show_names: false,
            mirrored: true,
        }
    }

    /// Enables or disables drawing each keypoint's name next to it.
    pub fn set_show_names(&mut self, show_names: bool) {
        self.show_names = show_names;
    }

    pub fn show_names(&self) -> bool {
        self.show_names
    }

    /// Sets whether the surface is presented with a horizontal mirror (the default).
    ///
    /// Labels on a mirrored surface are drawn with [`Transform::mirrored_label`] so that they read
    /// correctly once presented. Otherwise [`Transform::label`] is used.
    pub fn set_mirrored(&mut self, mirrored: bool) {
        self.mirrored = mirrored;
    }

    pub fn mirrored(&self) -> bool {
        self.mirrored
    }

    pub fn style(&self) -> &SkeletonStyle {
        &self.style
    }

    /// Draws `hands` in list order, so later hands paint over earlier ones.
    pub fn draw<S: Surface + ?Sized>(&self, hands: &[DetectedHand], surface: &mut S) {
        for hand in hands {
            self.draw_hand(hand, surface);
        }
    }

    fn draw_hand<S: Surface + ?Sized>(&self, hand: &DetectedHand, surface: &mut S) {
        let fill = self.style.fill(hand.handedness());

        for keypoint in hand.keypoints().flatten() {
            surface.fill_circle(keypoint.position(), self.style.keypoint_radius, fill);

            if self.show_names {
                let transform = if self.mirrored {
                    Transform::mirrored_label(keypoint.position())
                } else {
                    Transform::label(keypoint.position())
                };
                surface.fill_text(keypoint.name(), &transform, fill);
            }
        }

        for chain in FINGER_CHAINS {
            surface.stroke_path(&finger_path(hand, chain), self.style.stroke);
        }
    }
}

/// Builds the open path through a finger's keypoints, starting at the wrist.
pub fn finger_path(hand: &DetectedHand, chain: &FingerChain) -> Path {
    Path::polyline(
        chain
            .landmarks
            .iter()
            .map(|lm| hand.landmark(*lm).map(Keypoint::position)),
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use nalgebra::Point2;

    use super::*;
    use crate::hand::schema::LandmarkIdx;
    use crate::hand::tests::hand_at;
    use crate::image::{Rect, Resolution};

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum DrawCall {
        Clear(Rect),
        Frame(Resolution),
        Circle(Point2<f32>, f32, Color),
        Path(Path, Stroke),
        Text(String, Color),
    }

    /// A surface that records the calls made to it.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSurface {
        pub(crate) calls: Vec<DrawCall>,
    }

    impl Surface for RecordingSurface {
        fn resolution(&self) -> Resolution {
            Resolution::new(640, 480)
        }

        fn clear(&mut self, region: Rect) {
            self.calls.push(DrawCall::Clear(region));
        }

        fn draw_frame(&mut self, frame: &image::RgbaImage) {
            self.calls.push(DrawCall::Frame(Resolution::of(frame)));
        }

        fn fill_circle(&mut self, center: Point2<f32>, radius: f32, color: Color) {
            self.calls.push(DrawCall::Circle(center, radius, color));
        }

        fn stroke_path(&mut self, path: &Path, stroke: Stroke) {
            self.calls.push(DrawCall::Path(path.clone(), stroke));
        }

        fn fill_text(&mut self, text: &str, _transform: &Transform, color: Color) {
            self.calls.push(DrawCall::Text(text.to_string(), color));
        }
    }

    fn paths(surface: &RecordingSurface) -> Vec<&Path> {
        surface
            .calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Path(path, _) => Some(path),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn no_hands_no_calls() {
        let mut surface = RecordingSurface::default();
        SkeletalRenderer::default().draw(&[], &mut surface);
        assert!(surface.calls.is_empty());
    }

    #[test]
    fn full_hand() {
        let hand = hand_at(Handedness::Right, (100.0, 50.0));
        let mut surface = RecordingSurface::default();
        SkeletalRenderer::default().draw(std::slice::from_ref(&hand), &mut surface);

        let circles: Vec<_> = surface
            .calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Circle(center, radius, color) => Some((*center, *radius, *color)),
                _ => None,
            })
            .collect();
        assert_eq!(circles.len(), LandmarkIdx::COUNT);
        for (i, (center, radius, color)) in circles.into_iter().enumerate() {
            assert_eq!(center, Point2::new(100.0 + i as f32, 50.0 + i as f32));
            assert_eq!(radius, 4.0);
            assert_eq!(color, Color::BLUE);
        }

        let wrist = hand.landmark(LandmarkIdx::Wrist).unwrap().position();
        let paths = paths(&surface);
        assert_eq!(paths.len(), FINGER_CHAINS.len());
        for (path, chain) in paths.iter().zip(FINGER_CHAINS) {
            let points: Vec<_> = path.points().collect();
            assert_eq!(points.len(), 5);
            assert_eq!(points[0], wrist);
            for (point, lm) in points.iter().zip(chain.landmarks) {
                assert_eq!(*point, hand.landmark(*lm).unwrap().position());
            }
            assert_eq!(path.subpaths().len(), 1);
        }

        assert!(!surface
            .calls
            .iter()
            .any(|call| matches!(call, DrawCall::Text(..))));
    }

    #[test]
    fn fill_color_by_handedness() {
        let hands = [
            hand_at(Handedness::Right, (0.0, 0.0)),
            hand_at(Handedness::Left, (0.0, 0.0)),
        ];
        let mut surface = RecordingSurface::default();
        SkeletalRenderer::default().draw(&hands, &mut surface);

        let colors: Vec<_> = surface
            .calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Circle(_, _, color) => Some(*color),
                _ => None,
            })
            .collect();
        assert_eq!(colors.len(), 2 * LandmarkIdx::COUNT);
        assert!(colors[..LandmarkIdx::COUNT].iter().all(|c| *c == Color::BLUE));
        assert!(colors[LandmarkIdx::COUNT..].iter().all(|c| *c == Color::BLACK));

        let stroke = SkeletonStyle::default().stroke;
        assert!(surface.calls.iter().all(|call| match call {
            DrawCall::Path(_, s) => *s == stroke,
            _ => true,
        }));
    }

    #[test]
    fn partial_hand_never_panics() {
        // Only the first 6 slots, with the thumb tip missing.
        let hand = DetectedHand::from_slots(
            Handedness::Left,
            LandmarkIdx::ALL[..6].iter().map(|lm| {
                (*lm != LandmarkIdx::ThumbTip).then(|| {
                    let i = lm.index() as f32;
                    Keypoint::new(i, i, lm.name())
                })
            }),
        );
        let mut surface = RecordingSurface::default();
        SkeletalRenderer::default().draw(&[hand], &mut surface);

        let circles = surface
            .calls
            .iter()
            .filter(|call| matches!(call, DrawCall::Circle(..)))
            .count();
        assert_eq!(circles, 5);

        let paths = paths(&surface);
        assert_eq!(paths.len(), FINGER_CHAINS.len());
        // Thumb: wrist, cmc, mcp, ip (tip missing).
        assert_eq!(paths[0].points().count(), 4);
        // Index: wrist and mcp only.
        assert_eq!(paths[1].points().count(), 2);
        // Others: just the wrist, nothing to stroke.
        for path in &paths[2..] {
            assert_eq!(path.points().count(), 1);
            assert_eq!(path.segments().count(), 0);
        }
    }

    #[test]
    fn empty_hand() {
        let hand = DetectedHand::from_slots(Handedness::Right, []);
        let mut surface = RecordingSurface::default();
        SkeletalRenderer::default().draw(&[hand], &mut surface);
        for path in paths(&surface) {
            assert!(path.is_empty());
        }
    }

    #[test]
    fn names_do_not_change_skeleton() {
        let hand = hand_at(Handedness::Left, (10.0, 10.0));

        let mut plain = RecordingSurface::default();
        SkeletalRenderer::default().draw(std::slice::from_ref(&hand), &mut plain);

        let mut renderer = SkeletalRenderer::default();
        renderer.set_show_names(true);
        let mut labelled = RecordingSurface::default();
        renderer.draw(std::slice::from_ref(&hand), &mut labelled);

        let labels: Vec<_> = labelled
            .calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Text(text, color) => Some((text.as_str(), *color)),
                _ => None,
            })
            .collect();
        assert_eq!(labels.len(), LandmarkIdx::COUNT);
        assert_eq!(labels[0], ("wrist", Color::BLACK));
        assert_eq!(labels[8], ("index_finger_tip", Color::BLACK));

        let without_labels: Vec<_> = labelled
            .calls
            .into_iter()
            .filter(|call| !matches!(call, DrawCall::Text(..)))
            .collect();
        assert_eq!(without_labels, plain.calls);
    }

    /// Draws the name label of a single right-hand wrist at (50, 20) onto a canvas and returns
    /// the x coordinates of all painted pixels.
    fn label_columns(mirrored: bool) -> Vec<u32> {
        use crate::image::Canvas;

        let hand = DetectedHand::new(Handedness::Right, [Keypoint::new(50.0, 20.0, "wrist")]);
        let mut renderer = SkeletalRenderer::default();
        renderer.set_show_names(true);
        renderer.set_mirrored(mirrored);
        let mut canvas = Canvas::new(Resolution::new(100, 40));
        renderer.draw(&[hand], &mut canvas);

        let image = canvas.image();
        image
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0 != Color::NULL.0)
            .map(|(x, _, _)| x)
            .collect()
    }

    #[test]
    fn labels_follow_presentation_mirror() {
        assert!(SkeletalRenderer::default().mirrored());

        // The keypoint circle covers roughly 46..=54. Mirrored labels run leftwards from x=40.
        let mirrored = label_columns(true);
        assert!(mirrored.iter().any(|&x| x < 45));
        assert!(mirrored.iter().all(|&x| x <= 55));

        // Unmirrored labels run rightwards from x=60.
        let plain = label_columns(false);
        assert!(plain.iter().any(|&x| x > 55));
        assert!(plain.iter().all(|&x| x >= 45));
    }

    #[test]
    fn far_off_keypoints_render_without_panicking() {
        use crate::detector::{validate, RawHand, RawKeypoint};
        use crate::image::Canvas;

        let hand_with = |wrist: (f32, f32), thumb_cmc: (f32, f32)| {
            let keypoints = LandmarkIdx::ALL
                .iter()
                .map(|lm| {
                    let (x, y) = match lm {
                        LandmarkIdx::Wrist => wrist,
                        LandmarkIdx::ThumbCmc => thumb_cmc,
                        _ => (lm.index() as f32, 30.0),
                    };
                    RawKeypoint::new(x, y, lm.name())
                })
                .collect();
            validate(RawHand {
                handedness: "Right".into(),
                keypoints,
            })
            .unwrap()
        };

        let hands = [
            hand_with((10.0, 10.0), (1e5, 7e4)),
            hand_with((-3e9, 10.0), (2.0, 2.0)),
            hand_with((3e38, -3e38), (-3e38, 3e38)),
        ];
        let mut renderer = SkeletalRenderer::default();
        renderer.set_show_names(true);
        let mut canvas = Canvas::new(Resolution::new(64, 48));
        renderer.draw(&hands, &mut canvas);

        let pixels: Vec<_> = canvas.image().pixels().map(|p| Color(p.0)).collect();
        assert!(pixels.contains(&Color::BLUE));
    }

    #[test]
    fn renders_onto_canvas() {
        use crate::image::Canvas;

        let mut canvas = Canvas::new(Resolution::new(64, 64));
        let hand = hand_at(Handedness::Right, (10.0, 10.0));
        SkeletalRenderer::default().draw(&[hand], &mut canvas);

        let pixels: Vec<_> = canvas.image().pixels().map(|p| Color(p.0)).collect();
        assert!(pixels.contains(&Color::BLUE));
        assert!(pixels.contains(&Color::WHITE));
        assert_eq!(canvas.get(63, 0), Color::NULL);
    }
}
