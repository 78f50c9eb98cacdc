//! The per-frame capture, detect, render and interact loop.
//!
//! A [`FrameScheduler`] owns handles to its collaborators (video source, detector, drawing surface
//! and cursor overlay) and drives them one [`tick`][FrameScheduler::tick] at a time:
//!
//! 1. Read a frame and submit it to the detector, blocking until the detector responds.
//! 2. Clear the surface and draw the frame onto it.
//! 3. Order the detected hands and draw their skeletons.
//! 4. Update the cursor and move the cursor overlay.
//!
//! Ticks never overlap, and the detector response is the only point where a tick waits. If the
//! scheduler is stopped while a detection is in flight, the result is thrown away once it arrives.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::config::Config;
use crate::cursor::{CursorMapper, CursorOverlay};
use crate::detector::{Detector, EstimationConfig};
use crate::error::{PipelineError, VideoError};
use crate::hand::order_hands;
use crate::image::{Rect, Resolution};
use crate::skeleton::SkeletalRenderer;
use crate::surface::Surface;
use crate::timer::{FpsCounter, FramePacer, Timer};
use crate::video::VideoSource;

/// Lifecycle state of a [`FrameScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Created, but setup has not started. Ticks do nothing.
    Idle,
    /// Waiting for the video source, detector and surface to be attached.
    WaitingForReadiness,
    /// Processing a frame on every tick.
    Running,
    /// Stopped for good.
    Stopped,
}

/// What a call to [`FrameScheduler::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The scheduler is [`SchedulerState::Idle`].
    Idle,
    /// Not all collaborators are attached yet.
    NotReady,
    /// A frame was rendered with this many hands.
    Rendered { hands: usize },
    /// The scheduler was stopped while detection was in flight. The result was dropped without
    /// touching the surface or the cursor.
    Discarded,
    /// The detector failed on this frame. Nothing was drawn.
    DetectionFailed,
    /// The video source failed to deliver a frame. Nothing was drawn.
    FrameDropped,
    /// The video source is exhausted. The scheduler is now stopped.
    Ended,
    /// The scheduler is stopped.
    Stopped,
}

/// A cloneable handle that stops a [`FrameScheduler`], from any thread.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Drives the frame pipeline.
pub struct FrameScheduler<V, S, O> {
    config: Config,
    state: SchedulerState,
    video: Option<V>,
    detector: Option<Detector>,
    surface: Option<S>,
    overlay: O,
    renderer: SkeletalRenderer,
    cursor: CursorMapper,
    stop: StopHandle,
    ready: bool,
    t_detect: Timer,
    t_render: Timer,
    fps: FpsCounter,
}

impl<V: VideoSource, S: Surface, O: CursorOverlay> FrameScheduler<V, S, O> {
    /// Creates an idle scheduler that will move `overlay` to the cursor position.
    pub fn new(config: Config, overlay: O) -> Self {
        let mut renderer = SkeletalRenderer::default();
        renderer.set_show_names(config.get_show_names());
        renderer.set_mirrored(config.get_mirror_output());
        let mut cursor = CursorMapper::new();
        cursor.set_pinch_threshold(config.get_pinch_threshold());

        Self {
            config,
            state: SchedulerState::Idle,
            video: None,
            detector: None,
            surface: None,
            overlay,
            renderer,
            cursor,
            stop: StopHandle::default(),
            ready: false,
            t_detect: Timer::new("detect"),
            t_render: Timer::new("render"),
            fps: FpsCounter::new("pipeline"),
        }
    }

    /// Starts waiting for collaborators to be attached.
    pub fn begin_setup(&mut self) {
        match self.state {
            SchedulerState::Idle => self.set_state(SchedulerState::WaitingForReadiness),
            state => log::debug!("begin_setup called in state {:?}, ignoring", state),
        }
    }

    pub fn attach_video(&mut self, video: V) {
        log::debug!("video source attached ({})", video.resolution());
        self.video = Some(video);
        self.update_readiness();
    }

    pub fn attach_detector(&mut self, detector: Detector) {
        log::debug!("detector attached");
        self.detector = Some(detector);
        self.update_readiness();
    }

    pub fn attach_surface(&mut self, surface: S) {
        log::debug!("surface attached ({})", surface.resolution());
        self.surface = Some(surface);
        self.update_readiness();
    }

    /// Reports that a collaborator could not be set up.
    ///
    /// The error is logged and the scheduler keeps waiting, so the resource may still be attached
    /// later.
    pub fn report_unavailable(&mut self, error: PipelineError) {
        log::error!("{}", error);
    }

    fn update_readiness(&mut self) {
        let ready = self.video.is_some() && self.detector.is_some() && self.surface.is_some();
        if ready && !self.ready {
            log::info!("pipeline ready");
        }
        self.ready = ready;
    }

    /// Returns whether video source, detector and surface are all attached.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn state(&self) -> SchedulerState {
        if self.stop.is_stopped() {
            SchedulerState::Stopped
        } else {
            self.state
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    pub fn cursor(&self) -> &CursorMapper {
        &self.cursor
    }

    /// Returns a handle that can stop this scheduler from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Stops the scheduler. Subsequent ticks do nothing.
    pub fn stop(&mut self) {
        self.stop.stop();
        self.set_state(SchedulerState::Stopped);
    }

    fn set_state(&mut self, state: SchedulerState) {
        if self.state != state {
            log::debug!("scheduler: {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Performs one iteration of the pipeline.
    pub fn tick(&mut self) -> TickOutcome {
        if self.stop.is_stopped() {
            self.set_state(SchedulerState::Stopped);
        }

        match self.state {
            SchedulerState::Idle => return TickOutcome::Idle,
            SchedulerState::Stopped => return TickOutcome::Stopped,
            SchedulerState::WaitingForReadiness if !self.ready => return TickOutcome::NotReady,
            SchedulerState::WaitingForReadiness => self.set_state(SchedulerState::Running),
            SchedulerState::Running => {}
        }

        let (Some(video), Some(detector)) = (self.video.as_mut(), self.detector.as_mut()) else {
            return TickOutcome::NotReady;
        };

        let frame = match video.read() {
            Ok(frame) => frame,
            Err(VideoError::EndOfStream) => {
                log::info!("end of video stream, stopping");
                self.stop();
                return TickOutcome::Ended;
            }
            Err(e) => {
                log::warn!("dropping frame: {}", e);
                return TickOutcome::FrameDropped;
            }
        };

        let handle = detector.request(
            frame.clone(),
            EstimationConfig {
                flip_horizontal: false,
            },
        );
        let detection = self.t_detect.time(|| handle.block());

        if self.stop.is_stopped() {
            log::debug!("scheduler stopped during detection, discarding result");
            self.set_state(SchedulerState::Stopped);
            return TickOutcome::Discarded;
        }

        let mut hands = match detection {
            Ok(Ok(hands)) => hands,
            Ok(Err(e)) => {
                log::warn!("hand detection failed: {:#}", e);
                return TickOutcome::DetectionFailed;
            }
            Err(_) => {
                log::warn!("hand detector dropped the request");
                return TickOutcome::DetectionFailed;
            }
        };

        let Some(surface) = self.surface.as_mut() else {
            return TickOutcome::NotReady;
        };
        let renderer = &self.renderer;
        self.t_render.time(|| {
            surface.clear(Rect::covering(Resolution::of(&frame)));
            surface.draw_frame(&frame);
            order_hands(&mut hands);
            renderer.draw(&hands, surface);
        });

        if self.cursor.update(&hands).moved {
            if let Some(cursor) = self.cursor.state() {
                self.overlay.set_position(cursor);
            }
        }

        self.fps.tick_with([&self.t_detect, &self.t_render]);
        TickOutcome::Rendered { hands: hands.len() }
    }

    /// Ticks once per refresh of `pacer` until the scheduler stops.
    ///
    /// `on_frame` is called after every tick and may stop the loop early by returning an error (or
    /// by stopping the scheduler through a [`StopHandle`]).
    pub fn run<E>(
        &mut self,
        pacer: &mut FramePacer,
        mut on_frame: impl FnMut(&Self, TickOutcome) -> Result<(), E>,
    ) -> Result<(), E> {
        loop {
            pacer.wait();
            let outcome = self.tick();
            on_frame(self, outcome)?;
            if self.state() == SchedulerState::Stopped {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use image::RgbaImage;

    use super::*;
    use crate::cursor::CursorState;
    use crate::detector::{RawHand, RawKeypoint};
    use crate::error::Resource;
    use crate::hand::schema::LandmarkIdx;
    use crate::image::{Color, Frame};
    use crate::skeleton::tests::{DrawCall, RecordingSurface};

    struct FakeVideo {
        resolution: Resolution,
        frames: VecDeque<Result<Frame, VideoError>>,
    }

    impl FakeVideo {
        fn new(frames: usize) -> Self {
            let resolution = Resolution::new(64, 48);
            Self {
                resolution,
                frames: (0..frames)
                    .map(|_| Ok(Arc::new(RgbaImage::new(64, 48))))
                    .collect(),
            }
        }
    }

    impl VideoSource for FakeVideo {
        fn resolution(&self) -> Resolution {
            self.resolution
        }

        fn read(&mut self) -> Result<Frame, VideoError> {
            self.frames.pop_front().unwrap_or(Err(VideoError::EndOfStream))
        }
    }

    #[derive(Default)]
    struct RecordingOverlay {
        positions: Vec<CursorState>,
    }

    impl CursorOverlay for RecordingOverlay {
        fn set_position(&mut self, cursor: CursorState) {
            self.positions.push(cursor);
        }
    }

    type TestScheduler = FrameScheduler<FakeVideo, RecordingSurface, RecordingOverlay>;

    fn raw_hand(handedness: &str, origin: (f32, f32)) -> RawHand {
        RawHand {
            handedness: handedness.into(),
            keypoints: LandmarkIdx::ALL
                .iter()
                .map(|lm| {
                    let i = lm.index() as f32;
                    RawKeypoint::new(origin.0 + i, origin.1 + i, lm.name())
                })
                .collect(),
        }
    }

    fn replaying(hands: Vec<RawHand>) -> Detector {
        Detector::spawn(
            move |_: &Frame, _: EstimationConfig| -> anyhow::Result<Vec<RawHand>> {
                Ok(hands.clone())
            },
        )
        .unwrap()
    }

    fn ready_scheduler(frames: usize, detector: Detector) -> TestScheduler {
        let mut scheduler = TestScheduler::new(Config::default(), RecordingOverlay::default());
        scheduler.begin_setup();
        scheduler.attach_video(FakeVideo::new(frames));
        scheduler.attach_detector(detector);
        scheduler.attach_surface(RecordingSurface::default());
        scheduler
    }

    fn calls(scheduler: &TestScheduler) -> &[DrawCall] {
        &scheduler.surface().unwrap().calls
    }

    #[test]
    fn idle_does_nothing() {
        let mut scheduler = TestScheduler::new(Config::default(), RecordingOverlay::default());
        scheduler.attach_video(FakeVideo::new(1));
        scheduler.attach_detector(replaying(vec![raw_hand("Left", (0.0, 0.0))]));
        scheduler.attach_surface(RecordingSurface::default());

        assert_eq!(scheduler.tick(), TickOutcome::Idle);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(calls(&scheduler).is_empty());
        assert!(scheduler.overlay().positions.is_empty());
    }

    #[test]
    fn config_reaches_components() {
        let scheduler = TestScheduler::new(Config::default(), RecordingOverlay::default());
        assert!(scheduler.renderer.mirrored());
        assert!(!scheduler.renderer.show_names());

        let config = Config::default()
            .mirror_output(false)
            .show_names(true)
            .pinch_threshold(7.5);
        let scheduler = TestScheduler::new(config, RecordingOverlay::default());
        assert!(!scheduler.renderer.mirrored());
        assert!(scheduler.renderer.show_names());
        assert_eq!(scheduler.cursor().pinch_threshold(), 7.5);
    }

    #[test]
    fn waits_for_readiness() {
        let mut scheduler = TestScheduler::new(Config::default(), RecordingOverlay::default());
        scheduler.begin_setup();
        assert_eq!(scheduler.tick(), TickOutcome::NotReady);

        scheduler.attach_video(FakeVideo::new(1));
        scheduler.attach_detector(replaying(Vec::new()));
        assert!(!scheduler.is_ready());
        assert_eq!(scheduler.tick(), TickOutcome::NotReady);

        scheduler.report_unavailable(PipelineError::unavailable(
            Resource::Surface,
            "no display",
        ));
        assert_eq!(scheduler.state(), SchedulerState::WaitingForReadiness);
        assert_eq!(scheduler.tick(), TickOutcome::NotReady);

        scheduler.attach_surface(RecordingSurface::default());
        assert!(scheduler.is_ready());
        assert_eq!(scheduler.tick(), TickOutcome::Rendered { hands: 0 });
        assert_eq!(scheduler.state(), SchedulerState::Running);
    }

    #[test]
    fn renders_in_order() {
        let detector = replaying(vec![
            raw_hand("Left", (0.0, 0.0)),
            raw_hand("Right", (30.0, 10.0)),
        ]);
        let mut scheduler = ready_scheduler(1, detector);
        assert_eq!(scheduler.tick(), TickOutcome::Rendered { hands: 2 });

        let calls = calls(&scheduler);
        let res = Resolution::new(64, 48);
        assert_eq!(calls[0], DrawCall::Clear(Rect::covering(res)));
        assert_eq!(calls[1], DrawCall::Frame(res));
        // Right hand is drawn first.
        match &calls[2] {
            DrawCall::Circle(center, _, color) => {
                assert_eq!(*color, Color::BLUE);
                assert_eq!((center.x, center.y), (30.0, 10.0));
            }
            call => panic!("unexpected draw call {:?}", call),
        }
        let last_circle = calls
            .iter()
            .rev()
            .find_map(|call| match call {
                DrawCall::Circle(_, _, color) => Some(*color),
                _ => None,
            })
            .unwrap();
        assert_eq!(last_circle, Color::BLACK);

        // The left hand is last, so its index fingertip controls the cursor.
        let tip = CursorState { x: 8.0, y: 8.0 };
        assert_eq!(scheduler.cursor().state(), Some(tip));
        assert_eq!(scheduler.overlay().positions, [tip]);
    }

    #[test]
    fn zero_hands() {
        let mut scheduler = ready_scheduler(1, replaying(Vec::new()));
        assert_eq!(scheduler.tick(), TickOutcome::Rendered { hands: 0 });
        assert_eq!(calls(&scheduler).len(), 2);
        assert_eq!(scheduler.cursor().state(), None);
        assert!(scheduler.overlay().positions.is_empty());
    }

    #[test]
    fn stop_during_detection_discards_result() {
        let mut scheduler = TestScheduler::new(Config::default(), RecordingOverlay::default());
        let stop = scheduler.stop_handle();
        let detector = Detector::spawn(
            move |_: &Frame, _: EstimationConfig| -> anyhow::Result<Vec<RawHand>> {
                stop.stop();
                Ok(vec![raw_hand("Right", (5.0, 5.0))])
            },
        )
        .unwrap();
        scheduler.begin_setup();
        scheduler.attach_video(FakeVideo::new(3));
        scheduler.attach_detector(detector);
        scheduler.attach_surface(RecordingSurface::default());

        assert_eq!(scheduler.tick(), TickOutcome::Discarded);
        assert!(calls(&scheduler).is_empty());
        assert_eq!(scheduler.cursor().state(), None);
        assert!(scheduler.overlay().positions.is_empty());
        assert_eq!(scheduler.state(), SchedulerState::Stopped);

        assert_eq!(scheduler.tick(), TickOutcome::Stopped);
        assert!(calls(&scheduler).is_empty());
    }

    #[test]
    fn stop_before_tick() {
        let mut scheduler = ready_scheduler(3, replaying(Vec::new()));
        scheduler.stop_handle().stop();
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert_eq!(scheduler.tick(), TickOutcome::Stopped);
        assert!(calls(&scheduler).is_empty());
    }

    #[test]
    fn end_of_stream_stops() {
        let mut scheduler = ready_scheduler(1, replaying(Vec::new()));
        assert_eq!(scheduler.tick(), TickOutcome::Rendered { hands: 0 });
        assert_eq!(scheduler.tick(), TickOutcome::Ended);
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert_eq!(scheduler.tick(), TickOutcome::Stopped);
    }

    #[test]
    fn failures_skip_the_frame() {
        let mut calls_made = 0;
        let detector = Detector::spawn(
            move |_: &Frame, _: EstimationConfig| -> anyhow::Result<Vec<RawHand>> {
                calls_made += 1;
                if calls_made == 1 {
                    anyhow::bail!("estimator failure");
                }
                Ok(vec![raw_hand("Left", (1.0, 1.0))])
            },
        )
        .unwrap();

        let mut scheduler = ready_scheduler(0, detector);
        let mut video = FakeVideo::new(0);
        video.frames = VecDeque::from([
            Ok(Arc::new(RgbaImage::new(64, 48))),
            Err(VideoError::Read("corrupt frame".into())),
            Ok(Arc::new(RgbaImage::new(64, 48))),
        ]);
        scheduler.attach_video(video);

        assert_eq!(scheduler.tick(), TickOutcome::DetectionFailed);
        assert!(calls(&scheduler).is_empty());
        assert_eq!(scheduler.tick(), TickOutcome::FrameDropped);
        assert!(calls(&scheduler).is_empty());
        assert_eq!(scheduler.tick(), TickOutcome::Rendered { hands: 1 });
        assert_eq!(scheduler.state(), SchedulerState::Running);
    }

    #[test]
    fn run_until_end() {
        let mut scheduler = ready_scheduler(3, replaying(vec![raw_hand("Right", (2.0, 2.0))]));
        let mut outcomes = Vec::new();
        scheduler
            .run(&mut FramePacer::new(0), |scheduler, outcome| {
                outcomes.push(outcome);
                assert!(scheduler.surface().is_some());
                Ok::<_, ()>(())
            })
            .unwrap();

        assert_eq!(
            outcomes,
            [
                TickOutcome::Rendered { hands: 1 },
                TickOutcome::Rendered { hands: 1 },
                TickOutcome::Rendered { hands: 1 },
                TickOutcome::Ended,
            ]
        );
        assert_eq!(scheduler.overlay().positions.len(), 3);
    }
}
