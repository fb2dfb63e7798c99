pub mod camera;
pub mod cli;
pub mod command;
pub mod config;
pub mod console;
pub mod control;
pub mod dispatcher;
pub mod feedback;
pub mod http_client;
pub mod http_transport;
pub mod logging;
pub mod monitor;
pub mod preset;
pub mod speed;
pub mod transport;

pub use camera::{AxisCamera, CameraBuilder};
pub use command::{Command, CommandBuilder};
pub use config::DeviceConfig;
pub use monitor::{HealthMonitor, HealthState, MonitorConfig};
pub use transport::{ResponseEvent, ResponseFeed, ResponseOutcome, Transport, TransportError};
