//! Replays recorded hand detections over a directory of frames and writes the rendered output.

use std::{env, fs, path::PathBuf};

use anyhow::Context;
use handview::config::Config;
use handview::cursor::{CursorOverlay, CursorState};
use handview::detector::{Detector, ReplayEstimator};
use handview::image::{Canvas, Color};
use handview::scheduler::{FrameScheduler, TickOutcome};
use handview::surface::Surface;
use handview::timer::FramePacer;
use handview::video::{ImageSequence, VideoSource};
use image::RgbaImage;
use nalgebra::Point2;

const ENV_VAR_FRAMES: &str = "HANDVIEW_FRAMES";
const ENV_VAR_DETECTIONS: &str = "HANDVIEW_DETECTIONS";
const ENV_VAR_OUTPUT: &str = "HANDVIEW_OUTPUT";

const CURSOR_RADIUS: f32 = 6.0;

/// Remembers where the cursor should be drawn on the next presented frame.
#[derive(Default)]
struct CursorMarker {
    position: Option<CursorState>,
}

impl CursorOverlay for CursorMarker {
    fn set_position(&mut self, cursor: CursorState) {
        self.position = Some(cursor);
    }
}

fn main() -> anyhow::Result<()> {
    handview::init_logger!();

    let config = Config::from_env()?;
    let frames = path_from_env(ENV_VAR_FRAMES)?;
    let detections = path_from_env(ENV_VAR_DETECTIONS)?;
    let output = path_from_env(ENV_VAR_OUTPUT)?;
    fs::create_dir_all(&output)
        .with_context(|| format!("failed to create output directory '{}'", output.display()))?;

    let mut scheduler = FrameScheduler::new(config.clone(), CursorMarker::default());
    scheduler.begin_setup();

    match ImageSequence::open(&frames) {
        Ok(video) => {
            scheduler.attach_surface(Canvas::new(video.resolution()));
            scheduler.attach_video(video);
        }
        Err(e) => scheduler.report_unavailable(e),
    }
    match ReplayEstimator::from_path(&detections).and_then(Detector::spawn) {
        Ok(detector) => scheduler.attach_detector(detector),
        Err(e) => scheduler.report_unavailable(e),
    }
    if !scheduler.is_ready() {
        anyhow::bail!("pipeline setup failed, see log output for details");
    }

    let mut pacer = FramePacer::new(config.get_refresh_rate());
    let mut written = 0;
    scheduler.run(&mut pacer, |scheduler, outcome| -> anyhow::Result<()> {
        let TickOutcome::Rendered { .. } = outcome else {
            return Ok(());
        };
        let Some(canvas) = scheduler.surface() else {
            return Ok(());
        };

        let path = output.join(format!("{written:05}.png"));
        present(
            canvas,
            scheduler.overlay().position,
            config.get_mirror_output(),
        )
        .save(&path)
        .with_context(|| format!("failed to write '{}'", path.display()))?;
        written += 1;
        Ok(())
    })?;

    log::info!("wrote {} frames to '{}'", written, output.display());
    Ok(())
}

fn path_from_env(var: &str) -> anyhow::Result<PathBuf> {
    env::var_os(var)
        .map(PathBuf::from)
        .with_context(|| format!("environment variable `{var}` must be set"))
}

/// Composites the cursor onto the rendered canvas and applies the presentation mirror.
fn present(canvas: &Canvas, cursor: Option<CursorState>, mirror: bool) -> RgbaImage {
    let mut presented = canvas.clone();
    if let Some(cursor) = cursor {
        presented.fill_circle(Point2::new(cursor.x, cursor.y), CURSOR_RADIUS, Color::RED);
    }

    let mut image = presented.into_image();
    if mirror {
        image::imageops::flip_horizontal_in_place(&mut image);
    }
    image
}
