use crate::command::{Command, CommandBuilder};
use crate::config::DeviceConfig;
use crate::dispatcher::Dispatcher;
use crate::feedback::Feedback;
use crate::monitor::{HealthMonitor, MonitorConfig, MonitorError};
use crate::preset::{Preset, PresetList};
use crate::speed::{SpeedAxis, SpeedSettings};
use crate::transport::Transport;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Observable values of one camera.
#[derive(Debug)]
pub struct CameraFeedbacks {
    pub name: Feedback<String>,
    pub preset_count: Feedback<usize>,
    pub pan_speed: Feedback<u8>,
    pub tilt_speed: Feedback<u8>,
    pub zoom_speed: Feedback<u8>,
    pub preset_names: BTreeMap<u32, Feedback<String>>,
}

impl CameraFeedbacks {
    fn new(presets: &PresetList) -> Self {
        Self {
            name: Feedback::new("name"),
            preset_count: Feedback::new("preset_count"),
            pan_speed: Feedback::new("pan_speed"),
            tilt_speed: Feedback::new("tilt_speed"),
            zoom_speed: Feedback::new("zoom_speed"),
            preset_names: presets
                .iter()
                .map(|preset| (preset.id, Feedback::new(format!("preset_{}_name", preset.id))))
                .collect(),
        }
    }

    pub fn speed(&self, axis: SpeedAxis) -> &Feedback<u8> {
        match axis {
            SpeedAxis::Pan => &self.pan_speed,
            SpeedAxis::Tilt => &self.tilt_speed,
            SpeedAxis::Zoom => &self.zoom_speed,
        }
    }

    pub fn preset_name(&self, id: u32) -> Option<&Feedback<String>> {
        self.preset_names.get(&id)
    }
}

/// A network PTZ camera: speed state, presets, command dispatch and the
/// connection health monitor.
pub struct AxisCamera {
    key: String,
    name: String,
    speeds: SpeedSettings,
    presets: PresetList,
    dispatcher: Dispatcher,
    monitor: HealthMonitor,
    feedbacks: CameraFeedbacks,
}

impl AxisCamera {
    pub fn from_config(config: &DeviceConfig, transport: Arc<dyn Transport>) -> Self {
        CameraBuilder::new(&config.key, &config.name)
            .monitor(config.monitor_config())
            .presets(config.presets())
            .build(transport)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn presets(&self) -> &PresetList {
        &self.presets
    }

    pub fn monitor(&self) -> &HealthMonitor {
        &self.monitor
    }

    pub fn feedbacks(&self) -> &CameraFeedbacks {
        &self.feedbacks
    }

    pub fn speed(&self, axis: SpeedAxis) -> u8 {
        self.speeds.axis(axis).get()
    }

    pub fn pan_speed(&self) -> u8 {
        self.speeds.pan()
    }

    pub fn tilt_speed(&self) -> u8 {
        self.speeds.tilt()
    }

    pub fn zoom_speed(&self) -> u8 {
        self.speeds.zoom()
    }

    /// Stores `value` and notifies observers, even when unchanged. Values
    /// outside `[0, 100]` are ignored without notification.
    pub fn set_speed(&self, axis: SpeedAxis, value: i64) -> bool {
        let speed = self.speeds.axis(axis);
        if !speed.try_set(value) {
            tracing::debug!("[{}] ignoring {axis} speed {value}", self.key);
            return false;
        }
        self.feedbacks.speed(axis).fire(&speed.get());
        true
    }

    pub fn set_pan_speed(&self, value: i64) -> bool {
        self.set_speed(SpeedAxis::Pan, value)
    }

    pub fn set_tilt_speed(&self, value: i64) -> bool {
        self.set_speed(SpeedAxis::Tilt, value)
    }

    pub fn set_zoom_speed(&self, value: i64) -> bool {
        self.set_speed(SpeedAxis::Zoom, value)
    }

    /// Builder over the current speed settings.
    pub fn commands(&self) -> CommandBuilder<'_> {
        CommandBuilder::new(&self.key, &self.speeds)
    }

    pub fn dispatch(&self, command: &Command) {
        self.dispatcher.dispatch(command);
    }

    pub fn pan_left(&self) {
        self.dispatch(&self.commands().pan_left());
    }

    pub fn pan_right(&self) {
        self.dispatch(&self.commands().pan_right());
    }

    pub fn tilt_up(&self) {
        self.dispatch(&self.commands().tilt_up());
    }

    pub fn tilt_down(&self) {
        self.dispatch(&self.commands().tilt_down());
    }

    pub fn pan_tilt_stop(&self) {
        self.dispatch(&self.commands().pan_tilt_stop());
    }

    pub fn zoom_in(&self) {
        self.dispatch(&self.commands().zoom_in());
    }

    pub fn zoom_out(&self) {
        self.dispatch(&self.commands().zoom_out());
    }

    pub fn zoom_stop(&self) {
        self.dispatch(&self.commands().zoom_stop());
    }

    pub fn recall_preset(&self, preset: u32) {
        self.dispatch(&self.commands().recall_preset(preset));
    }

    pub fn save_preset(&self, preset: u32) {
        self.dispatch(&self.commands().save_preset(preset));
    }

    pub fn poll(&self) {
        self.dispatch(&self.commands().poll());
    }

    pub fn send_custom(&self, suffix: &str) {
        self.dispatch(&self.commands().custom(suffix));
    }

    /// Pushes every current value to its observers.
    pub fn fire_updates(&self) {
        self.feedbacks.name.fire(&self.name);
        self.feedbacks.preset_count.fire(&self.presets.len());
        for axis in [SpeedAxis::Pan, SpeedAxis::Tilt, SpeedAxis::Zoom] {
            self.feedbacks.speed(axis).fire(&self.speed(axis));
        }
        for preset in &self.presets {
            if let Some(feedback) = self.feedbacks.preset_name(preset.id) {
                feedback.fire(&preset.name);
            }
        }
    }

    /// Starts health monitoring. Call once construction is complete.
    pub fn activate(&self) -> Result<(), MonitorError> {
        tracing::info!(
            "[{}] activating {:?} with {} preset(s)",
            self.key,
            self.name,
            self.presets.len()
        );
        self.monitor.start()
    }

    pub fn shutdown(&self) {
        tracing::info!("[{}] shutting down", self.key);
        self.monitor.stop();
    }
}

pub struct CameraBuilder {
    key: String,
    name: String,
    monitor: MonitorConfig,
    presets: Vec<Preset>,
}

impl CameraBuilder {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            monitor: MonitorConfig::default(),
            presets: Vec::new(),
        }
    }

    /// `None` keeps the defaults.
    pub fn monitor(mut self, config: Option<MonitorConfig>) -> Self {
        if let Some(config) = config {
            self.monitor = config;
        }
        self
    }

    /// `None` keeps the current list.
    pub fn presets(mut self, presets: Option<Vec<Preset>>) -> Self {
        if let Some(presets) = presets {
            self.presets = presets;
        }
        self
    }

    /// Wires dispatch, monitoring and feedbacks. The monitor is left
    /// stopped; see [`AxisCamera::activate`].
    pub fn build(self, transport: Arc<dyn Transport>) -> AxisCamera {
        let dispatcher = Dispatcher::new(transport.clone());
        let monitor = HealthMonitor::new(
            self.key.clone(),
            self.monitor,
            dispatcher.clone(),
            transport.responses(),
        );
        let presets = PresetList::new(self.presets);
        let feedbacks = CameraFeedbacks::new(&presets);
        let camera = AxisCamera {
            key: self.key,
            name: self.name,
            speeds: SpeedSettings::default(),
            presets,
            dispatcher,
            monitor,
            feedbacks,
        };
        camera.fire_updates();
        camera
    }
}
