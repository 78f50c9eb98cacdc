//! Detected hands and their rendering order.

pub mod schema;

use nalgebra::Point2;

use self::schema::LandmarkIdx;

/// Which hand the detector believes it is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    /// Parses the detector's handedness label (`"Left"` or `"Right"`).
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Left" => Some(Self::Left),
            "Right" => Some(Self::Right),
            _ => None,
        }
    }

    /// Position of this handedness in the rendering order. Right hands are drawn first.
    fn draw_rank(self) -> u8 {
        match self {
            Handedness::Right => 0,
            Handedness::Left => 1,
        }
    }
}

/// A single landmark of a detected hand, in frame pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Keypoint {
    position: Point2<f32>,
    name: String,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, name: impl Into<String>) -> Self {
        Self {
            position: Point2::new(x, y),
            name: name.into(),
        }
    }

    #[inline]
    pub fn position(&self) -> Point2<f32> {
        self.position
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.position.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A hand returned by the detector for a single frame.
///
/// Keypoint slots are `None` when the detector did not deliver usable coordinates for them. The
/// slot list may also be shorter than [`LandmarkIdx::COUNT`]; lookups past its end yield `None` as
/// well.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedHand {
    handedness: Handedness,
    keypoints: Vec<Option<Keypoint>>,
}

impl DetectedHand {
    /// Creates a hand whose keypoints are all present.
    pub fn new(handedness: Handedness, keypoints: impl IntoIterator<Item = Keypoint>) -> Self {
        Self::from_slots(handedness, keypoints.into_iter().map(Some))
    }

    /// Creates a hand from keypoint slots, some of which may be missing.
    pub fn from_slots(
        handedness: Handedness,
        keypoints: impl IntoIterator<Item = Option<Keypoint>>,
    ) -> Self {
        Self {
            handedness,
            keypoints: keypoints.into_iter().collect(),
        }
    }

    #[inline]
    pub fn handedness(&self) -> Handedness {
        self.handedness
    }

    /// Returns the keypoint at `index`, or `None` if it is missing.
    pub fn keypoint(&self, index: usize) -> Option<&Keypoint> {
        self.keypoints.get(index).and_then(Option::as_ref)
    }

    /// Returns the keypoint for a named landmark, or `None` if it is missing.
    pub fn landmark(&self, landmark: LandmarkIdx) -> Option<&Keypoint> {
        self.keypoint(landmark.index())
    }

    /// Returns an iterator over all keypoint slots, in model order.
    pub fn keypoints(&self) -> impl Iterator<Item = Option<&Keypoint>> + '_ {
        self.keypoints.iter().map(Option::as_ref)
    }

    /// Returns the number of keypoint slots delivered by the detector.
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Sorts hands into rendering order: right hands before left hands.
///
/// The sort is stable, so hands of equal handedness keep their relative order. This keeps paint
/// order (and the hand that ends up controlling the cursor) from flickering when the detector
/// reports hands in a different order from one frame to the next.
pub fn order_hands(hands: &mut [DetectedHand]) {
    hands.sort_by_key(|hand| hand.handedness().draw_rank());
}
