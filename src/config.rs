//! Pipeline configuration.

use std::{env, str::FromStr};

use crate::cursor::CursorMapper;
use crate::error::ConfigError;

const ENV_VAR_REFRESH_RATE: &str = "HANDVIEW_REFRESH_RATE";
const ENV_VAR_SHOW_NAMES: &str = "HANDVIEW_SHOW_NAMES";
const ENV_VAR_PINCH_THRESHOLD: &str = "HANDVIEW_PINCH_THRESHOLD";
const ENV_VAR_MIRROR: &str = "HANDVIEW_MIRROR";

/// Pipeline settings.
///
/// Use the builder methods to change individual settings, or [`Config::from_env`] to apply the
/// environment variable overrides listed in the crate documentation.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    refresh_rate: u32,
    show_names: bool,
    pinch_threshold: f32,
    mirror_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_rate: 60,
            show_names: false,
            pinch_threshold: CursorMapper::DEFAULT_PINCH_THRESHOLD,
            mirror_output: true,
        }
    }
}

impl Config {
    /// Returns the default configuration with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|var| env::var(var).ok())
    }

    fn with_overrides(
        mut self,
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(rate) = parse(&lookup, ENV_VAR_REFRESH_RATE)? {
            self.refresh_rate = rate;
        }
        if let Some(show) = parse_flag(&lookup, ENV_VAR_SHOW_NAMES)? {
            self.show_names = show;
        }
        if let Some(threshold) = parse::<f32>(&lookup, ENV_VAR_PINCH_THRESHOLD)? {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(ConfigError {
                    var: ENV_VAR_PINCH_THRESHOLD,
                    value: threshold.to_string(),
                    reason: "must be a non-negative number".into(),
                });
            }
            self.pinch_threshold = threshold;
        }
        if let Some(mirror) = parse_flag(&lookup, ENV_VAR_MIRROR)? {
            self.mirror_output = mirror;
        }
        Ok(self)
    }

    /// Sets the refresh rate the frame loop is paced to, in Hz.
    ///
    /// By default, 60 Hz is used. 0 runs the loop unpaced.
    pub fn refresh_rate(self, hz: u32) -> Self {
        Self {
            refresh_rate: hz,
            ..self
        }
    }

    /// Enables drawing landmark names next to each keypoint.
    pub fn show_names(self, show: bool) -> Self {
        Self {
            show_names: show,
            ..self
        }
    }

    /// Sets the horizontal pixel distance below which thumb and index fingertip count as a pinch.
    pub fn pinch_threshold(self, threshold: f32) -> Self {
        Self {
            pinch_threshold: threshold,
            ..self
        }
    }

    /// Sets whether rendered output is presented mirrored, like a selfie camera.
    pub fn mirror_output(self, mirror: bool) -> Self {
        Self {
            mirror_output: mirror,
            ..self
        }
    }

    pub fn get_refresh_rate(&self) -> u32 {
        self.refresh_rate
    }

    pub fn get_show_names(&self) -> bool {
        self.show_names
    }

    pub fn get_pinch_threshold(&self) -> f32 {
        self.pinch_threshold
    }

    pub fn get_mirror_output(&self) -> bool {
        self.mirror_output
    }
}

fn parse<T>(
    lookup: &impl Fn(&'static str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    log::debug!("config override: `{}` is set to '{}'", var, value);
    match value.trim().parse() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => Err(ConfigError {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

fn parse_flag(
    lookup: &impl Fn(&'static str) -> Option<String>,
    var: &'static str,
) -> Result<Option<bool>, ConfigError> {
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    log::debug!("config override: `{}` is set to '{}'", var, value);
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError {
            var,
            value,
            reason: "expected a boolean (1/0, true/false)".into(),
        }),
    }
}
