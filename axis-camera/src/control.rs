use crate::camera::AxisCamera;
use crate::speed::SpeedAxis;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use strum::{Display, EnumString};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Holding a preset's recall control this long saves the preset.
pub const PRESET_SAVE_HOLD: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum MotionButton {
    PanLeft,
    PanRight,
    TiltUp,
    TiltDown,
    ZoomIn,
    ZoomOut,
}

/// Maps discrete operator inputs onto camera actions. Press starts a
/// continuous move, release stops it.
pub struct ControlSurface {
    camera: Arc<AxisCamera>,
    hold_time: Duration,
    held: Mutex<HashMap<u32, JoinHandle<()>>>,
}

impl ControlSurface {
    pub fn new(camera: Arc<AxisCamera>) -> Self {
        Self {
            camera,
            hold_time: PRESET_SAVE_HOLD,
            held: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_hold_time(mut self, hold_time: Duration) -> Self {
        self.hold_time = hold_time;
        self
    }

    pub fn camera(&self) -> &Arc<AxisCamera> {
        &self.camera
    }

    pub fn motion(&self, button: MotionButton, pressed: bool) {
        use MotionButton::*;
        match (button, pressed) {
            (PanLeft, true) => self.camera.pan_left(),
            (PanRight, true) => self.camera.pan_right(),
            (TiltUp, true) => self.camera.tilt_up(),
            (TiltDown, true) => self.camera.tilt_down(),
            (ZoomIn, true) => self.camera.zoom_in(),
            (ZoomOut, true) => self.camera.zoom_out(),
            (PanLeft | PanRight | TiltUp | TiltDown, false) => self.camera.pan_tilt_stop(),
            (ZoomIn | ZoomOut, false) => self.camera.zoom_stop(),
        }
    }

    pub fn set_speed(&self, axis: SpeedAxis, value: i64) -> bool {
        self.camera.set_speed(axis, value)
    }

    /// Press recalls at once; still held after the hold time, the preset
    /// is saved. Releasing earlier cancels the save.
    pub fn preset_recall(&self, preset: u32, pressed: bool) {
        if preset == 0 {
            tracing::debug!("[{}] ignoring preset 0", self.camera.key());
            return;
        }
        let pending = self.lock().remove(&preset);
        if let Some(pending) = pending {
            pending.abort();
        }
        if !pressed {
            return;
        }
        self.camera.recall_preset(preset);

        let Ok(handle) = Handle::try_current() else {
            tracing::debug!("[{}] no runtime, hold-to-save disabled", self.camera.key());
            return;
        };
        let camera = self.camera.clone();
        let hold_time = self.hold_time;
        let task = handle.spawn(async move {
            tokio::time::sleep(hold_time).await;
            tracing::info!("[{}] preset {preset} held, saving", camera.key());
            camera.save_preset(preset);
        });
        self.lock().insert(preset, task);
    }

    pub fn preset_save(&self, preset: u32) {
        if preset == 0 {
            tracing::debug!("[{}] ignoring preset 0", self.camera.key());
            return;
        }
        self.camera.save_preset(preset);
    }

    pub fn custom_command(&self, suffix: &str) {
        self.camera.send_custom(suffix);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u32, JoinHandle<()>>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ControlSurface {
    fn drop(&mut self) {
        for (_, task) in self.lock().drain() {
            task.abort();
        }
    }
}
