use axis_camera::control::{ControlSurface, MotionButton};
use axis_camera::speed::SpeedAxis;
use axis_camera::transport::MemoryTransport;
use axis_camera::{AxisCamera, DeviceConfig, HealthState, ResponseEvent};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const CONFIG: &str = r#"{
    "key": "lobby-cam",
    "name": "Lobby Camera",
    "properties": {
        "hostname": "10.0.0.20",
        "communicationMonitor": {
            "pollInterval": 10000,
            "timeToWarning": 30000,
            "timeToError": 60000
        },
        "presets": [
            { "id": 4, "name": "Door" },
            { "id": 1, "name": "Wide" },
            { "id": 2, "name": "Podium" }
        ]
    }
}"#;

fn fragments(transport: &MemoryTransport) -> Vec<String> {
    transport
        .take_sent()
        .into_iter()
        .map(|text| text.replace("axis-cgi/com/ptz.cgi?", ""))
        .collect()
}

fn session(transport: &Arc<MemoryTransport>) -> (Arc<AxisCamera>, ControlSurface) {
    let config = DeviceConfig::from_json(CONFIG).unwrap();
    let camera = Arc::new(AxisCamera::from_config(&config, transport.clone()));
    let surface = ControlSurface::new(camera.clone());
    (camera, surface)
}

#[tokio::test(start_paused = true)]
async fn operator_session() {
    let transport = Arc::new(MemoryTransport::new());
    let (camera, surface) = session(&transport);

    let ids: Vec<u32> = camera.presets().iter().map(|preset| preset.id).collect();
    assert_eq!(ids, vec![1, 2, 4]);
    assert_eq!(camera.name(), "Lobby Camera");

    let speeds = Arc::new(Mutex::new(Vec::new()));
    let sink = speeds.clone();
    camera
        .feedbacks()
        .zoom_speed
        .subscribe(move |value| sink.lock().unwrap().push(*value));

    camera.activate().unwrap();
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(fragments(&transport), vec!["info=1"]);
    assert_eq!(camera.monitor().state(), HealthState::Initializing);

    transport.respond(ResponseEvent::completed("axis-cgi/com/ptz.cgi?info=1", 200));
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(camera.monitor().state(), HealthState::Ok);

    surface.set_speed(SpeedAxis::Zoom, 25);
    surface.set_speed(SpeedAxis::Zoom, 250);
    surface.motion(MotionButton::ZoomIn, true);
    surface.motion(MotionButton::ZoomIn, false);
    surface.motion(MotionButton::PanLeft, true);
    surface.motion(MotionButton::PanLeft, false);
    surface.preset_recall(4, true);
    surface.preset_recall(4, false);
    assert_eq!(*speeds.lock().unwrap(), vec![25]);
    assert_eq!(
        fragments(&transport),
        vec![
            "continuouszoommove=25",
            "continuouszoommove=0",
            "continuouspantiltmove=-50,0",
            "continuouspantiltmove=0,0",
            "gotoserverpresetno=4",
        ]
    );

    camera.shutdown();
    assert_eq!(camera.monitor().state(), HealthState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn unanswered_camera_goes_offline_and_recovers() {
    let transport = Arc::new(MemoryTransport::new());
    let (camera, _surface) = session(&transport);
    let mut health = camera.monitor().subscribe();
    camera.activate().unwrap();

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(camera.monitor().state(), HealthState::Warning);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(camera.monitor().state(), HealthState::Error);
    assert!(!camera.monitor().is_online());
    // Polls keep going while offline.
    assert_eq!(fragments(&transport).len(), 7);

    transport.set_auto_reply(true);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(camera.monitor().state(), HealthState::Ok);
    assert!(health.has_changed().unwrap());
    assert_eq!(*health.borrow_and_update(), HealthState::Ok);

    camera.shutdown();
    camera.shutdown();
}
