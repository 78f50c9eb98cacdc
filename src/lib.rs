//! Real-time hand skeleton and cursor overlay pipeline.
//!
//! `handview` reads frames from a [`VideoSource`][video::VideoSource], runs a hand landmark
//! estimator on each of them, draws the detected hand skeletons onto a
//! [`Surface`][surface::Surface], and moves a cursor overlay to the tip of the index finger. The
//! [`FrameScheduler`][scheduler::FrameScheduler] ties these pieces together.
//!
//! # Coordinates
//!
//! Keypoints, drawing operations and the cursor all use frame pixel coordinates: X points to the
//! right, Y points *down*, and the origin is the top left corner of the frame.
//!
//! # Environment Variables
//!
//! [`Config::from_env`][config::Config::from_env] reads these overrides:
//!
//! * `HANDVIEW_REFRESH_RATE`: refresh rate the frame loop is paced to, in Hz (default 60, 0
//!   disables pacing).
//! * `HANDVIEW_SHOW_NAMES`: set to `1` or `true` to draw landmark names next to each keypoint.
//! * `HANDVIEW_PINCH_THRESHOLD`: horizontal distance in pixels below which the thumb and index
//!   fingertip count as pinching (default 2).
//! * `HANDVIEW_MIRROR`: set to `0` or `false` to present the output unmirrored.

use log::LevelFilter;

pub mod config;
pub mod cursor;
pub mod detector;
pub mod error;
pub mod hand;
pub mod image;
pub mod scheduler;
pub mod skeleton;
pub mod surface;
pub mod timer;
pub mod video;

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = LevelFilter::Debug;
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_CRATE_NAME")), log_level)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// The calling crate and `handview` will log at *debug* level. `RUST_LOG` can be used to override
/// this.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
