//! Mapping detected hands to an on-screen cursor.
//!
//! The cursor follows the tip of the index finger. A "pinch" of thumb and index fingertip is
//! detected as well, but it is purely observational: it gets logged and reported, and does not
//! drive any state.

use crate::hand::schema::LandmarkIdx;
use crate::hand::DetectedHand;

/// Position of the cursor overlay, in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorState {
    pub x: f32,
    pub y: f32,
}

/// An on-screen element whose position follows the cursor.
pub trait CursorOverlay {
    fn set_position(&mut self, cursor: CursorState);
}

/// Result of a [`CursorMapper::update`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CursorUpdate {
    /// Whether any hand moved the cursor.
    pub moved: bool,
    /// The pinch signal of each hand, in the order the hands were passed in. `None` if a pinch
    /// landmark of that hand is missing.
    pub pinches: Vec<Option<bool>>,
}

impl CursorUpdate {
    /// Returns whether any hand is pinching.
    pub fn any_pinch(&self) -> bool {
        self.pinches.iter().any(|pinch| *pinch == Some(true))
    }
}

/// Derives the cursor position and pinch signal from detected hands.
#[derive(Debug, Clone)]
pub struct CursorMapper {
    state: Option<CursorState>,
    pointer: LandmarkIdx,
    pinch_pair: (LandmarkIdx, LandmarkIdx),
    pinch_threshold: f32,
}

impl CursorMapper {
    /// Landmark the cursor follows.
    pub const POINTER: LandmarkIdx = LandmarkIdx::IndexFingerTip;

    /// Landmarks whose proximity is treated as a pinch.
    pub const PINCH_PAIR: (LandmarkIdx, LandmarkIdx) =
        (LandmarkIdx::ThumbTip, LandmarkIdx::IndexFingerTip);

    /// Horizontal distance (in pixels) below which the pinch pair counts as pinching.
    pub const DEFAULT_PINCH_THRESHOLD: f32 = 2.0;

    pub fn new() -> Self {
        Self {
            state: None,
            pointer: Self::POINTER,
            pinch_pair: Self::PINCH_PAIR,
            pinch_threshold: Self::DEFAULT_PINCH_THRESHOLD,
        }
    }

    pub fn set_pinch_threshold(&mut self, threshold: f32) {
        self.pinch_threshold = threshold;
    }

    pub fn pinch_threshold(&self) -> f32 {
        self.pinch_threshold
    }

    /// Returns the current cursor position, or `None` if no hand has placed the cursor yet.
    pub fn state(&self) -> Option<CursorState> {
        self.state
    }

    /// Updates the cursor from the hands of one frame.
    ///
    /// Every hand with a pointer landmark moves the cursor to that landmark, without smoothing.
    /// With several hands the last one wins, so callers should pass hands in rendering order.
    pub fn update(&mut self, hands: &[DetectedHand]) -> CursorUpdate {
        let mut update = CursorUpdate {
            moved: false,
            pinches: Vec::with_capacity(hands.len()),
        };

        for hand in hands {
            if let Some(pointer) = hand.landmark(self.pointer) {
                self.state = Some(CursorState {
                    x: pointer.x(),
                    y: pointer.y(),
                });
                update.moved = true;
            }

            let pinch = self.pinch_signal(hand);
            if pinch == Some(true) {
                log::debug!("pinch ({:?} hand)", hand.handedness());
            }
            update.pinches.push(pinch);
        }

        update
    }

    /// Computes the pinch signal of a single hand.
    ///
    /// Returns `None` if either landmark of the pinch pair is missing.
    pub fn pinch_signal(&self, hand: &DetectedHand) -> Option<bool> {
        let a = hand.landmark(self.pinch_pair.0)?;
        let b = hand.landmark(self.pinch_pair.1)?;
        Some((a.x() - b.x()).abs() < self.pinch_threshold)
    }
}

impl Default for CursorMapper {
    fn default() -> Self {
        Self::new()
    }
}
