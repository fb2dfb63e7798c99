use crate::monitor::{
    MonitorConfig, DEFAULT_POLL_INTERVAL, DEFAULT_TIME_TO_ERROR, DEFAULT_TIME_TO_WARNING,
};
use crate::preset::Preset;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Device entry: identity plus the camera's own properties.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    pub key: String,
    pub name: String,
    pub properties: CameraProperties,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraProperties {
    pub hostname: String,
    #[serde(default)]
    pub communication_monitor: Option<CommunicationMonitorConfig>,
    #[serde(default)]
    pub presets: Option<Vec<Preset>>,
}

/// Durations in milliseconds. Missing fields take the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommunicationMonitorConfig {
    pub poll_interval: u64,
    pub time_to_warning: u64,
    pub time_to_error: u64,
    pub poll_string: String,
}

impl Default for CommunicationMonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            time_to_warning: DEFAULT_TIME_TO_WARNING.as_millis() as u64,
            time_to_error: DEFAULT_TIME_TO_ERROR.as_millis() as u64,
            poll_string: String::new(),
        }
    }
}

impl From<&CommunicationMonitorConfig> for MonitorConfig {
    fn from(config: &CommunicationMonitorConfig) -> Self {
        let poll_string = config.poll_string.trim();
        Self {
            poll_interval: Duration::from_millis(config.poll_interval),
            time_to_warning: Duration::from_millis(config.time_to_warning),
            time_to_error: Duration::from_millis(config.time_to_error),
            poll_string: (!poll_string.is_empty()).then(|| poll_string.to_string()),
        }
    }
}

impl DeviceConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("config parse failed")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.key.trim().is_empty() {
            bail!("key is required");
        }
        if self.properties.hostname.trim().is_empty() {
            bail!("hostname is required");
        }
        if let Some(monitor) = &self.properties.communication_monitor {
            for (field, value) in [
                ("pollInterval", monitor.poll_interval),
                ("timeToWarning", monitor.time_to_warning),
                ("timeToError", monitor.time_to_error),
            ] {
                if value == 0 {
                    bail!("communicationMonitor.{field} must be greater than zero");
                }
            }
        }
        let mut ids = HashSet::new();
        for preset in self.properties.presets.iter().flatten() {
            if preset.id == 0 {
                bail!("preset {:?} has id 0, ids start at 1", preset.name);
            }
            if !ids.insert(preset.id) {
                bail!("preset id {} is defined more than once", preset.id);
            }
        }
        Ok(())
    }

    pub fn hostname(&self) -> &str {
        self.properties.hostname.trim()
    }

    /// `None` when the document has no monitor block.
    pub fn monitor_config(&self) -> Option<MonitorConfig> {
        self.properties
            .communication_monitor
            .as_ref()
            .map(MonitorConfig::from)
    }

    pub fn presets(&self) -> Option<Vec<Preset>> {
        self.properties.presets.clone()
    }
}
