use crate::sphere::layout::SphereRotation;
use serde::{Deserialize, Serialize};
use serde_with::DeserializeFromStr;
use std::time::Duration;
use strum::{Display as StrumDisplay, EnumString};
use thiserror::Error;

/// Capability flag handed over by whoever does device detection.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    DeserializeFromStr,
    EnumString,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    #[strum(to_string = "full", serialize = "desktop", serialize = "f")]
    Full,
    #[strum(to_string = "compact", serialize = "mobile", serialize = "c")]
    Compact,
}

/// Perspective parameters used to size cards by their distance from the camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthScale {
    pub focal: f64,
    pub gain: f64,
    pub min: f64,
    pub max: f64,
    pub camera_offset: f64,
}

const CADENCE_RANGE_HZ: std::ops::RangeInclusive<f64> = 1.0..=1000.0;
const MAX_DELAY_MS: u64 = 3_600_000;

/// Everything the layout and the spin engine need to know about the display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub mode: DisplayMode,
    pub radius: f64,
    pub pool_length: usize,
    pub cadence_hz: f64,
    pub ambient_step: SphereRotation,
    pub initial_speed_ms: u64,
    pub speed_increment_ms: u64,
    pub rotation_step: f64,
    pub rotation_decay: f64,
    pub rounds_before_slowdown: u32,
    pub min_rounds_before_stop: u32,
    pub stop_speed_threshold_ms: u64,
    pub settle_delay_ms: u64,
    pub depth: DepthScale,
}

impl DeviceProfile {
    pub const FULL: Self = Self {
        mode: DisplayMode::Full,
        radius: 280.0,
        pool_length: 60,
        cadence_hz: 60.0,
        ambient_step: SphereRotation { x: 0.2, y: 0.3 },
        initial_speed_ms: 40,
        speed_increment_ms: 15,
        rotation_step: 8.0,
        rotation_decay: 0.95,
        rounds_before_slowdown: 2,
        min_rounds_before_stop: 4,
        stop_speed_threshold_ms: 300,
        settle_delay_ms: 1000,
        depth: DepthScale {
            focal: 800.0,
            gain: 0.8,
            min: 0.3,
            max: 1.0,
            camera_offset: 400.0,
        },
    };

    pub const COMPACT: Self = Self {
        mode: DisplayMode::Compact,
        radius: 120.0,
        pool_length: 30,
        cadence_hz: 30.0,
        ambient_step: SphereRotation { x: 0.5, y: 0.8 },
        initial_speed_ms: 60,
        speed_increment_ms: 20,
        rotation_step: 4.0,
        rotation_decay: 0.95,
        rounds_before_slowdown: 2,
        min_rounds_before_stop: 3,
        stop_speed_threshold_ms: 250,
        settle_delay_ms: 1000,
        depth: DepthScale {
            focal: 600.0,
            gain: 0.7,
            min: 0.4,
            max: 0.8,
            camera_offset: 400.0,
        },
    };

    pub fn select(mode: DisplayMode) -> Self {
        match mode {
            DisplayMode::Full => Self::FULL,
            DisplayMode::Compact => Self::COMPACT,
        }
    }

    pub fn with_overrides(self, overrides: &ProfileOverrides) -> Self {
        let mut profile = self;

        macro_rules! apply {
            ($($field:ident),+ $(,)?) => {
                $(
                    if let Some(value) = overrides.$field {
                        profile.$field = value;
                    }
                )+
            };
        }

        apply!(
            radius,
            pool_length,
            cadence_hz,
            ambient_step,
            initial_speed_ms,
            speed_increment_ms,
            rotation_step,
            rotation_decay,
            rounds_before_slowdown,
            min_rounds_before_stop,
            stop_speed_threshold_ms,
            settle_delay_ms,
            depth,
        );
        profile
    }

    /// Rejects profiles the layout cannot place or the spin engine cannot stop with.
    pub fn validated(self) -> Result<Self, ProfileError> {
        if self.pool_length == 0 {
            return Err(ProfileError::EmptyPool);
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ProfileError::Radius(self.radius));
        }
        if !CADENCE_RANGE_HZ.contains(&self.cadence_hz) {
            return Err(ProfileError::Cadence(self.cadence_hz));
        }
        for (field, value) in [
            ("initial_speed_ms", self.initial_speed_ms),
            ("speed_increment_ms", self.speed_increment_ms),
            ("settle_delay_ms", self.settle_delay_ms),
        ] {
            if value > MAX_DELAY_MS {
                return Err(ProfileError::Delay { field, value });
            }
        }
        if !(self.rotation_decay > 0.0 && self.rotation_decay <= 1.0) {
            return Err(ProfileError::Decay(self.rotation_decay));
        }
        if self.speed_increment_ms == 0 && self.initial_speed_ms <= self.stop_speed_threshold_ms {
            return Err(ProfileError::NeverStops {
                speed: self.initial_speed_ms,
                threshold: self.stop_speed_threshold_ms,
            });
        }
        Ok(self)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.cadence_hz)
    }

    pub fn spin_tuning(&self) -> SpinTuning {
        SpinTuning {
            initial_speed_ms: self.initial_speed_ms,
            speed_increment_ms: self.speed_increment_ms,
            rotation_step: self.rotation_step,
            rotation_decay: self.rotation_decay,
            rounds_before_slowdown: self.rounds_before_slowdown,
            min_rounds_before_stop: self.min_rounds_before_stop,
            stop_speed_threshold_ms: self.stop_speed_threshold_ms,
            settle_delay: Duration::from_millis(self.settle_delay_ms),
        }
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self::FULL
    }
}

/// The subset of a profile the spin engine runs on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinTuning {
    pub initial_speed_ms: u64,
    pub speed_increment_ms: u64,
    pub rotation_step: f64,
    pub rotation_decay: f64,
    pub rounds_before_slowdown: u32,
    pub min_rounds_before_stop: u32,
    pub stop_speed_threshold_ms: u64,
    pub settle_delay: Duration,
}

/// Per-profile values taken from the config file; unset fields keep the profile's value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOverrides {
    pub radius: Option<f64>,
    pub pool_length: Option<usize>,
    pub cadence_hz: Option<f64>,
    pub ambient_step: Option<SphereRotation>,
    pub initial_speed_ms: Option<u64>,
    pub speed_increment_ms: Option<u64>,
    pub rotation_step: Option<f64>,
    pub rotation_decay: Option<f64>,
    pub rounds_before_slowdown: Option<u32>,
    pub min_rounds_before_stop: Option<u32>,
    pub stop_speed_threshold_ms: Option<u64>,
    pub settle_delay_ms: Option<u64>,
    pub depth: Option<DepthScale>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("Pool length must be at least 1")]
    EmptyPool,
    #[error("Sphere radius must be positive, got {0}")]
    Radius(f64),
    #[error("Ambient cadence must be between 1 and 1000 Hz, got {0} Hz")]
    Cadence(f64),
    #[error("{field} must be at most one hour, got {value} ms")]
    Delay { field: &'static str, value: u64 },
    #[error("Rotation decay must be in (0, 1], got {0}")]
    Decay(f64),
    #[error("Spin never slows past the stop threshold ({speed} ms <= {threshold} ms)")]
    NeverStops { speed: u64, threshold: u64 },
}
