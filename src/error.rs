//! Error types.

use std::fmt;

use thiserror::Error;

/// Boxed error from an external collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A collaborator the frame pipeline needs before it can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Video,
    Detector,
    Surface,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Video => "video source",
            Resource::Detector => "hand detector",
            Resource::Surface => "drawing surface",
        })
    }
}

/// Errors reported to whoever sets up the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Setting up a collaborator failed (eg. missing camera permission, model failed to load).
    ///
    /// The scheduler keeps waiting for the resource; a later attach may still succeed.
    #[error("{resource} unavailable: {source}")]
    ResourceUnavailable {
        resource: Resource,
        #[source]
        source: BoxError,
    },
}

impl PipelineError {
    pub fn unavailable(resource: Resource, source: impl Into<BoxError>) -> Self {
        Self::ResourceUnavailable {
            resource,
            source: source.into(),
        }
    }

    pub fn resource(&self) -> Resource {
        match self {
            PipelineError::ResourceUnavailable { resource, .. } => *resource,
        }
    }
}

/// Errors returned by a [`VideoSource`][crate::video::VideoSource].
#[derive(Debug, Error)]
pub enum VideoError {
    /// The source has no more frames.
    #[error("end of video stream")]
    EndOfStream,
    /// A frame could not be read. The source may still deliver later frames.
    #[error("failed to read frame: {0}")]
    Read(#[source] BoxError),
}

/// A hand in a detector payload that cannot be used at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedHand {
    #[error("unknown handedness label '{0}'")]
    Handedness(String),
}

/// An environment variable override that could not be parsed.
#[derive(Debug, Error)]
#[error("invalid value '{value}' for `{var}`: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}
