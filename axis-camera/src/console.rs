use crate::control::{ControlSurface, MotionButton};
use crate::speed::SpeedAxis;
use anyhow::{anyhow, bail, Context, Result};
use std::io::BufRead;
use std::str::FromStr;
use std::thread;
use tokio::sync::mpsc;

pub const HELP: &str = "commands: left | right | up | down | stop | in | out | zoomstop | \
recall <id> | save <id> | speed <pan|tilt|zoom> <0-100> | raw <suffix> | status | help | quit";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsoleCommand {
    Move(MotionButton),
    Stop,
    ZoomStop,
    Recall(u32),
    Save(u32),
    Speed(SpeedAxis, i64),
    Raw(String),
    Status,
    Help,
    Quit,
}

/// `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>> {
    let line = line.trim();
    let Some((word, rest)) = split_word(line) else {
        return Ok(None);
    };
    let command = match word.to_ascii_lowercase().as_str() {
        "left" => ConsoleCommand::Move(MotionButton::PanLeft),
        "right" => ConsoleCommand::Move(MotionButton::PanRight),
        "up" => ConsoleCommand::Move(MotionButton::TiltUp),
        "down" => ConsoleCommand::Move(MotionButton::TiltDown),
        "in" => ConsoleCommand::Move(MotionButton::ZoomIn),
        "out" => ConsoleCommand::Move(MotionButton::ZoomOut),
        "stop" => ConsoleCommand::Stop,
        "zoomstop" => ConsoleCommand::ZoomStop,
        "recall" => ConsoleCommand::Recall(parse_preset(rest)?),
        "save" => ConsoleCommand::Save(parse_preset(rest)?),
        "speed" => {
            let (axis, value) =
                split_word(rest).ok_or_else(|| anyhow!("usage: speed <axis> <value>"))?;
            let axis = SpeedAxis::from_str(axis).map_err(|_| anyhow!("unknown axis {axis:?}"))?;
            let value = value
                .trim()
                .parse::<i64>()
                .with_context(|| format!("invalid speed {:?}", value.trim()))?;
            ConsoleCommand::Speed(axis, value)
        }
        "raw" => {
            if rest.is_empty() {
                bail!("usage: raw <suffix>");
            }
            ConsoleCommand::Raw(rest.to_string())
        }
        "status" => ConsoleCommand::Status,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" | "q" => ConsoleCommand::Quit,
        other => bail!("unknown command {other:?}"),
    };
    Ok(Some(command))
}

/// Reads stdin on its own thread so a pending read never holds up the
/// runtime.
pub fn spawn_input_loop(tx: mpsc::Sender<String>) {
    thread::spawn(move || input_loop(tx));
}

fn input_loop(tx: mpsc::Sender<String>) {
    for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else {
            break;
        };
        if tx.blocking_send(line).is_err() {
            break;
        }
    }
}

/// Executes lines until `quit` or until the sender side closes.
pub async fn run(surface: &ControlSurface, mut lines: mpsc::Receiver<String>) {
    while let Some(line) = lines.recv().await {
        match parse_line(&line) {
            Ok(Some(ConsoleCommand::Quit)) => break,
            Ok(Some(command)) => execute(surface, command),
            Ok(None) => {}
            Err(err) => println!("{err:#}\n{HELP}"),
        }
    }
}

pub fn execute(surface: &ControlSurface, command: ConsoleCommand) {
    let camera = surface.camera();
    match command {
        ConsoleCommand::Move(button) => surface.motion(button, true),
        ConsoleCommand::Stop => camera.pan_tilt_stop(),
        ConsoleCommand::ZoomStop => camera.zoom_stop(),
        ConsoleCommand::Recall(preset) => {
            surface.preset_recall(preset, true);
            surface.preset_recall(preset, false);
        }
        ConsoleCommand::Save(preset) => surface.preset_save(preset),
        ConsoleCommand::Speed(axis, value) => {
            if !surface.set_speed(axis, value) {
                println!("{axis} speed must be within 0..=100");
            }
        }
        ConsoleCommand::Raw(suffix) => surface.custom_command(&suffix),
        ConsoleCommand::Status => print_status(surface),
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Quit => {}
    }
}

fn print_status(surface: &ControlSurface) {
    let camera = surface.camera();
    println!("{} ({})", camera.name(), camera.key());
    println!("  health: {}", camera.monitor().state());
    println!(
        "  speeds: pan={} tilt={} zoom={}",
        camera.pan_speed(),
        camera.tilt_speed(),
        camera.zoom_speed()
    );
    for preset in camera.presets() {
        println!("  preset {}: {}", preset.id, preset.name);
    }
}

fn split_word(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    if text.is_empty() {
        return None;
    }
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => Some((word, rest.trim())),
        None => Some((text, "")),
    }
}

fn parse_preset(text: &str) -> Result<u32> {
    let preset = text
        .trim()
        .parse::<u32>()
        .with_context(|| format!("invalid preset id {:?}", text.trim()))?;
    if preset == 0 {
        bail!("preset ids start at 1");
    }
    Ok(preset)
}
