use crate::speed::SpeedSettings;
use std::fmt;

pub const BASE_PATH: &str = "axis-cgi/com/ptz.cgi?";
pub const PAN_TILT_MOVE: &str = "continuouspantiltmove=";
pub const ZOOM_MOVE: &str = "continuouszoommove=";
pub const GOTO_PRESET: &str = "gotoserverpresetno=";
pub const INFO_REQUEST: &str = "info=1";

/// One rendered request for one camera. Built by [`CommandBuilder`] and
/// consumed by [`crate::dispatcher::Dispatcher`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    camera: String,
    text: String,
}

impl Command {
    fn new(camera: &str, suffix: fmt::Arguments<'_>) -> Self {
        Self {
            camera: camera.to_string(),
            text: format!("{BASE_PATH}{suffix}"),
        }
    }

    /// Key of the camera the command is addressed to.
    pub fn camera(&self) -> &str {
        &self.camera
    }

    /// Full wire text, base path included.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Wire text after the base path.
    pub fn fragment(&self) -> &str {
        &self.text[BASE_PATH.len()..]
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Renders PTZ actions against a camera's speed settings. Speeds are read
/// when each method is called.
#[derive(Clone, Copy)]
pub struct CommandBuilder<'a> {
    camera: &'a str,
    speeds: &'a SpeedSettings,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(camera: &'a str, speeds: &'a SpeedSettings) -> Self {
        Self { camera, speeds }
    }

    pub fn pan_left(self) -> Command {
        self.pan_tilt(-i32::from(self.speeds.pan()), 0)
    }

    pub fn pan_right(self) -> Command {
        self.pan_tilt(i32::from(self.speeds.pan()), 0)
    }

    pub fn tilt_up(self) -> Command {
        self.pan_tilt(0, i32::from(self.speeds.tilt()))
    }

    pub fn tilt_down(self) -> Command {
        self.pan_tilt(0, -i32::from(self.speeds.tilt()))
    }

    pub fn pan_tilt_stop(self) -> Command {
        self.pan_tilt(0, 0)
    }

    pub fn zoom_in(self) -> Command {
        self.zoom(i32::from(self.speeds.zoom()))
    }

    pub fn zoom_out(self) -> Command {
        self.zoom(-i32::from(self.speeds.zoom()))
    }

    pub fn zoom_stop(self) -> Command {
        self.zoom(0)
    }

    pub fn recall_preset(self, preset: u32) -> Command {
        Command::new(self.camera, format_args!("{GOTO_PRESET}{preset}"))
    }

    /// Same wire text as recall; the device has no separate save request.
    pub fn save_preset(self, preset: u32) -> Command {
        Command::new(self.camera, format_args!("{GOTO_PRESET}{preset}"))
    }

    pub fn poll(self) -> Command {
        Self::poll_for(self.camera)
    }

    /// Poll rendering needs no speed state.
    pub fn poll_for(camera: &str) -> Command {
        Command::new(camera, format_args!("{INFO_REQUEST}"))
    }

    /// Appends `suffix` to the base path untouched.
    pub fn custom(self, suffix: &str) -> Command {
        Command::new(self.camera, format_args!("{suffix}"))
    }

    fn pan_tilt(self, pan: i32, tilt: i32) -> Command {
        Command::new(self.camera, format_args!("{PAN_TILT_MOVE}{pan},{tilt}"))
    }

    fn zoom(self, zoom: i32) -> Command {
        Command::new(self.camera, format_args!("{ZOOM_MOVE}{zoom}"))
    }
}
