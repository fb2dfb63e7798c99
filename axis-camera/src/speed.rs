use std::sync::atomic::{AtomicU8, Ordering};
use strum::{Display, EnumString};

pub const SPEED_MIN: i64 = 0;
pub const SPEED_MAX: i64 = 100;
pub const DEFAULT_SPEED: u8 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SpeedAxis {
    Pan,
    Tilt,
    Zoom,
}

/// A single speed setting in `[0, 100]`.
///
/// Assignments outside the range are ignored and the previous value is kept.
#[derive(Debug)]
pub struct Speed(AtomicU8);

impl Speed {
    pub fn new(value: u8) -> Self {
        Self(AtomicU8::new(value.min(SPEED_MAX as u8)))
    }

    pub fn get(&self) -> u8 {
        self.0.load(Ordering::Acquire)
    }

    /// Returns `false` when `value` was rejected.
    pub fn try_set(&self, value: i64) -> bool {
        if !(SPEED_MIN..=SPEED_MAX).contains(&value) {
            return false;
        }
        self.0.store(value as u8, Ordering::Release);
        true
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::new(DEFAULT_SPEED)
    }
}

#[derive(Debug, Default)]
pub struct SpeedSettings {
    pan: Speed,
    tilt: Speed,
    zoom: Speed,
}

impl SpeedSettings {
    pub fn axis(&self, axis: SpeedAxis) -> &Speed {
        match axis {
            SpeedAxis::Pan => &self.pan,
            SpeedAxis::Tilt => &self.tilt,
            SpeedAxis::Zoom => &self.zoom,
        }
    }

    pub fn pan(&self) -> u8 {
        self.pan.get()
    }

    pub fn tilt(&self) -> u8 {
        self.tilt.get()
    }

    pub fn zoom(&self) -> u8 {
        self.zoom.get()
    }
}
