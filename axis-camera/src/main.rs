use anyhow::Result;
use axis_camera::{
    cli, console, control::ControlSurface, http_client, http_transport::HttpTransport, logging,
    transport::MemoryTransport, AxisCamera, DeviceConfig, Transport,
};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    logging::init_logging(&args.log_level, args.log_dir.as_deref())?;

    let config = DeviceConfig::from_file(&args.config)?;
    let transport: Arc<dyn Transport> = if args.dry_run {
        tracing::info!("dry run: commands are answered locally");
        Arc::new(MemoryTransport::with_auto_reply())
    } else {
        let client = http_client::build(Duration::from_millis(args.timeout_ms))?;
        let transport = HttpTransport::new(client, config.hostname());
        tracing::info!("camera endpoint: {}", transport.base_url());
        Arc::new(transport)
    };

    let camera = Arc::new(AxisCamera::from_config(&config, transport));
    log_feedbacks(&camera);
    camera.activate()?;

    let surface = ControlSurface::new(camera.clone());
    let (tx, rx) = mpsc::channel(32);
    console::spawn_input_loop(tx);
    println!("{}", console::HELP);
    tokio::select! {
        _ = console::run(&surface, rx) => {}
        _ = tokio::signal::ctrl_c() => tracing::info!("interrupted"),
    }

    camera.shutdown();
    Ok(())
}

fn log_feedbacks(camera: &AxisCamera) {
    let key = camera.key().to_string();
    for axis in [
        axis_camera::speed::SpeedAxis::Pan,
        axis_camera::speed::SpeedAxis::Tilt,
        axis_camera::speed::SpeedAxis::Zoom,
    ] {
        let key = key.clone();
        camera
            .feedbacks()
            .speed(axis)
            .subscribe(move |value| tracing::info!("[{key}] {axis} speed {value}"));
    }

    let mut health = camera.monitor().subscribe();
    tokio::spawn(async move {
        while health.changed().await.is_ok() {
            let state = *health.borrow_and_update();
            tracing::debug!("[{key}] health feedback {state}");
        }
    });
}
