//! Hand landmark detection.
//!
//! The landmark model itself is an external collaborator behind the [`HandEstimator`] trait. A
//! [`Detector`] runs an estimator on a dedicated worker thread and validates its output into
//! [`DetectedHand`]s, so that everything downstream only ever sees well-formed hands.

use std::{
    fs,
    panic::{catch_unwind, AssertUnwindSafe},
    path::Path,
};

use pawawwewism::{promise, Promise, PromiseHandle, Worker};
use serde::Deserialize;

use crate::error::{MalformedHand, PipelineError, Resource};
use crate::hand::schema::LandmarkIdx;
use crate::hand::{DetectedHand, Handedness, Keypoint};
use crate::image::Frame;
use crate::timer::Timer;

/// Per-request options passed to the estimator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EstimationConfig {
    /// Whether the estimator should mirror its output horizontally.
    pub flip_horizontal: bool,
}

/// A hand landmark estimator.
///
/// Implementations return hands in the detector's payload format. Validation happens in the
/// [`Detector`], so estimators may pass through whatever the model produced.
pub trait HandEstimator: Send + 'static {
    fn estimate(&mut self, frame: &Frame, config: EstimationConfig)
        -> anyhow::Result<Vec<RawHand>>;
}

impl<F> HandEstimator for F
where
    F: FnMut(&Frame, EstimationConfig) -> anyhow::Result<Vec<RawHand>> + Send + 'static,
{
    fn estimate(
        &mut self,
        frame: &Frame,
        config: EstimationConfig,
    ) -> anyhow::Result<Vec<RawHand>> {
        self(frame, config)
    }
}

/// A hand as reported by the landmark model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawHand {
    pub handedness: String,
    #[serde(default)]
    pub keypoints: Vec<RawKeypoint>,
}

/// A keypoint as reported by the landmark model. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawKeypoint {
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default)]
    pub name: Option<String>,
}

impl RawKeypoint {
    pub fn new(x: f32, y: f32, name: impl Into<String>) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            name: Some(name.into()),
        }
    }
}

/// Validates a raw hand.
///
/// Keypoints with missing or non-finite coordinates become empty slots. Keypoints without a name
/// get the name of the landmark at their index.
pub fn validate(raw: RawHand) -> Result<DetectedHand, MalformedHand> {
    let handedness = Handedness::from_label(&raw.handedness)
        .ok_or_else(|| MalformedHand::Handedness(raw.handedness.clone()))?;

    let slots = raw.keypoints.into_iter().enumerate().map(|(i, kp)| {
        let (x, y) = (kp.x?, kp.y?);
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let name = kp
            .name
            .or_else(|| LandmarkIdx::from_index(i).map(|lm| lm.name().to_string()))
            .unwrap_or_default();
        Some(Keypoint::new(x, y, name))
    });
    Ok(DetectedHand::from_slots(handedness, slots))
}

/// Validates every hand of a payload, dropping (and logging) malformed ones.
fn validate_all(raw: Vec<RawHand>) -> Vec<DetectedHand> {
    raw.into_iter()
        .filter_map(|hand| match validate(hand) {
            Ok(hand) => Some(hand),
            Err(e) => {
                log::warn!("dropping malformed hand: {}", e);
                None
            }
        })
        .collect()
}

/// Result of a single detection request.
pub type Detection = anyhow::Result<Vec<DetectedHand>>;

struct DetectParams {
    frame: Frame,
    config: EstimationConfig,
    hands: Promise<Detection>,
}

/// Runs a [`HandEstimator`] on a background thread.
pub struct Detector {
    worker: Worker<DetectParams>,
}

impl Detector {
    /// Spawns the detector thread.
    ///
    /// A panic in the estimator is reported as a failed detection of that frame. The worker keeps
    /// serving later requests.
    pub fn spawn<E: HandEstimator>(mut estimator: E) -> Result<Self, PipelineError> {
        let t_estimate = Timer::new("estimate");
        let mut requests = 0usize;

        let worker = Worker::builder()
            .name("hand detector")
            .spawn(move |DetectParams { frame, config, hands }: DetectParams| {
                let result = t_estimate.time(|| {
                    catch_unwind(AssertUnwindSafe(|| estimator.estimate(&frame, config)))
                        .unwrap_or_else(|_| Err(anyhow::anyhow!("hand estimator panicked")))
                });
                hands.fulfill(result.map(validate_all));

                requests += 1;
                if requests % 100 == 0 {
                    log::trace!("{}", t_estimate);
                }
            })
            .map_err(|e| PipelineError::unavailable(Resource::Detector, e))?;

        Ok(Self { worker })
    }

    /// Submits a frame for detection.
    ///
    /// Blocks until the worker is ready to accept the frame. The returned handle resolves once the
    /// worker has processed it.
    pub fn request(&mut self, frame: Frame, config: EstimationConfig) -> PromiseHandle<Detection> {
        let (hands, handle) = promise();
        self.worker.send(DetectParams {
            frame,
            config,
            hands,
        });
        handle
    }
}

/// Replays recorded detections, one recorded frame per call.
///
/// The recording is a JSON array with one entry per frame, each entry being the array of hands the
/// landmark model returned for that frame. Once the recording is exhausted, no hands are reported.
pub struct ReplayEstimator {
    frames: std::vec::IntoIter<Vec<RawHand>>,
}

impl ReplayEstimator {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let frames: Vec<Vec<RawHand>> = serde_json::from_str(json)?;
        log::debug!("loaded {} recorded detection frames", frames.len());
        Ok(Self {
            frames: frames.into_iter(),
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|json| Self::from_json(&json))
            .map_err(|e| {
                PipelineError::unavailable(
                    Resource::Detector,
                    e.context(format!("failed to load '{}'", path.display())),
                )
            })
    }
}

impl HandEstimator for ReplayEstimator {
    fn estimate(
        &mut self,
        frame: &Frame,
        config: EstimationConfig,
    ) -> anyhow::Result<Vec<RawHand>> {
        let mut hands = self.frames.next().unwrap_or_default();
        if config.flip_horizontal {
            let width = frame.width() as f32;
            for kp in hands.iter_mut().flat_map(|hand| &mut hand.keypoints) {
                kp.x = kp.x.map(|x| width - x);
            }
        }
        Ok(hands)
    }
}
