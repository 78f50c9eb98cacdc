//! Video sources.
//!
//! The pipeline only needs a source of frames with a known, fixed size; how the frames are
//! acquired is up to the [`VideoSource`] implementation.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::{PipelineError, Resource, VideoError};
use crate::image::{load_frame, Frame, ImageFormat, Resolution};
use crate::timer::Timer;

/// A source of video frames.
pub trait VideoSource {
    /// Returns the size of the frames produced by this source.
    fn resolution(&self) -> Resolution;

    /// Reads the next frame.
    ///
    /// Returns [`VideoError::EndOfStream`] once the source is exhausted.
    fn read(&mut self) -> Result<Frame, VideoError>;
}

/// Plays back a directory of still images (`png`, `jpg`/`jpeg`) as a video, in file name order.
///
/// The resolution of the first image is the resolution of the video. Later images with a
/// different size are reported as read errors.
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    next: usize,
    resolution: Resolution,
    first: Option<Frame>,
    t_decode: Timer,
}

impl ImageSequence {
    /// Opens an image directory.
    ///
    /// Fails if the directory cannot be read, contains no images, or the first image cannot be
    /// decoded.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, PipelineError> {
        Self::open_impl(dir.as_ref())
            .map_err(|e| PipelineError::unavailable(Resource::Video, e))
    }

    fn open_impl(dir: &Path) -> anyhow::Result<Self> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && ImageFormat::from_path(&path).is_some() {
                paths.push(path);
            }
        }
        paths.sort();

        let Some(first_path) = paths.first() else {
            anyhow::bail!("no images found in '{}'", dir.display());
        };
        let t_decode = Timer::new("decode");
        let first = t_decode.time(|| load_frame(first_path))?;
        let resolution = Resolution::of(&first);

        log::info!(
            "opened image sequence '{}', {} frames at {}",
            dir.display(),
            paths.len(),
            resolution,
        );

        Ok(Self {
            paths,
            next: 0,
            resolution,
            first: Some(first),
            t_decode,
        })
    }

    /// Returns the number of frames in the sequence.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Returns profiling timers for image decoding.
    pub fn timers(&self) -> impl Iterator<Item = &Timer> + '_ {
        [&self.t_decode].into_iter()
    }
}

impl VideoSource for ImageSequence {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn read(&mut self) -> Result<Frame, VideoError> {
        let Some(path) = self.paths.get(self.next) else {
            return Err(VideoError::EndOfStream);
        };
        self.next += 1;

        if let Some(first) = self.first.take() {
            return Ok(first);
        }

        let frame = self
            .t_decode
            .time(|| load_frame(path))
            .map_err(|e| VideoError::Read(e.into()))?;
        if Resolution::of(&frame) != self.resolution {
            return Err(VideoError::Read(
                format!(
                    "'{}' is {}, expected {}",
                    path.display(),
                    Resolution::of(&frame),
                    self.resolution
                )
                .into(),
            ));
        }
        Ok(frame)
    }
}
