//! Screen and audio recording in a detached `wf-recorder` or `ffmpeg` process

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{Step, fail, finish, submenu, unknown_action};
use crate::commands::command::{Command, CommandResult};
use crate::commands::context::Context;
use crate::session::Session;
use crate::tools::{self, ToolError};

pub const NAME: &str = "record";
const SESSION: &str = "record";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RecordConfig {
    pub directory: String,
    pub video_format: String,
    pub audio_format: String,
    pub framerate: u32,
    /// PulseAudio/PipeWire source name
    pub audio_source: String,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            directory: "~/Videos/Recordings".to_string(),
            video_format: "mp4".to_string(),
            audio_format: "mp3".to_string(),
            framerate: 30,
            audio_source: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Screen,
    Region,
    Audio,
}

impl Kind {
    fn label(self) -> &'static str {
        match self {
            Kind::Screen => "Record screen",
            Kind::Region => "Record region",
            Kind::Audio => "Record audio",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "video" | "screen" => Some(Kind::Screen),
            "region" => Some(Kind::Region),
            "audio" => Some(Kind::Audio),
            _ => None,
        }
    }
}

/// Recorder program and arguments writing to `output`
#[must_use]
pub fn recorder_argv(
    kind: Kind,
    wayland: bool,
    config: &RecordConfig,
    output: &Path,
    geometry: Option<&str>,
) -> (&'static str, Vec<String>) {
    let output = output.display().to_string();
    let framerate = config.framerate.to_string();
    match (kind, wayland) {
        (Kind::Audio, _) => (
            "ffmpeg",
            vec![
                "-y".into(),
                "-f".into(),
                "pulse".into(),
                "-i".into(),
                config.audio_source.clone(),
                output,
            ],
        ),
        (Kind::Screen | Kind::Region, true) => {
            let mut args: Vec<String> = Vec::new();
            if let Some(geometry) = geometry {
                args.extend(["-g".to_string(), geometry.to_string()]);
            }
            args.extend(["-r".to_string(), framerate, "-f".to_string(), output]);
            ("wf-recorder", args)
        }
        (Kind::Screen | Kind::Region, false) => {
            let display = std::env::var("DISPLAY").unwrap_or_else(|_| ":0".to_string());
            let mut args: Vec<String> = vec![
                "-y".into(),
                "-f".into(),
                "x11grab".into(),
                "-framerate".into(),
                framerate,
            ];
            // slop prints WxH+X+Y
            let input = match geometry.and_then(|g| g.split_once('+')) {
                Some((size, offset)) => {
                    args.extend(["-video_size".into(), size.to_string()]);
                    format!("{display}+{}", offset.replace('+', ","))
                }
                None => display,
            };
            args.extend([
                "-i".into(),
                input,
                "-c:v".into(),
                "libx264".into(),
                "-preset".into(),
                "ultrafast".into(),
                output,
            ]);
            ("ffmpeg", args)
        }
    }
}

#[must_use]
pub fn command() -> Command {
    Command::new(NAME, "Record", run)
}

fn run(ctx: &dyn Context) -> CommandResult {
    let config: RecordConfig = ctx.config().module(NAME);
    let session = Session::new(SESSION);
    if ctx.is_direct_launch() {
        let action = ctx.args()[0].as_str();
        if action == "stop" {
            return stop(ctx, &session);
        }
        return match Kind::from_key(action) {
            Some(kind) => start(ctx, &session, kind, &config),
            None => unknown_action(ctx, NAME, "video|region|audio|stop"),
        };
    }
    finish(interactive(ctx, &session, &config))
}

fn interactive(ctx: &dyn Context, session: &Session, config: &RecordConfig) -> Step<CommandResult> {
    if let Some(current) = session.current() {
        let stop_label = format!("Stop recording ({})", current.label);
        loop {
            if submenu(ctx, std::slice::from_ref(&stop_label), "Recording")? == stop_label {
                return Ok(stop(ctx, session));
            }
        }
    }
    let kinds = [Kind::Screen, Kind::Region, Kind::Audio];
    let options: Vec<String> = kinds.iter().map(|k| k.label().to_string()).collect();
    loop {
        let choice = submenu(ctx, &options, "Record")?;
        if let Some(kind) = kinds.iter().find(|k| k.label() == choice) {
            return Ok(start(ctx, session, *kind, config));
        }
    }
}

fn start(ctx: &dyn Context, session: &Session, kind: Kind, config: &RecordConfig) -> CommandResult {
    let wayland = tools::is_wayland();
    let geometry = if kind == Kind::Region {
        let selection = if wayland {
            tools::output("slurp", Vec::<&str>::new())
        } else {
            tools::output("slop", ["-f", "%wx%h+%x+%y"])
        };
        match region_geometry(ctx, selection) {
            Ok(geometry) => Some(geometry),
            Err(result) => return result,
        }
    } else {
        None
    };

    let output = match output_path(kind, config) {
        Ok(path) => path,
        Err(e) => return fail(ctx, "Recording")(e),
    };
    let (program, args) = recorder_argv(kind, wayland, config, &output, geometry.as_deref());
    match session.start(program, &args, kind.label(), Some(output.clone())) {
        Ok(_) => {
            ctx.notifier()
                .info("Recording started", &output.display().to_string());
            CommandResult::Success
        }
        Err(e) => fail(ctx, "Recording")(e),
    }
}

fn region_geometry(
    ctx: &dyn Context,
    selection: Result<String, ToolError>,
) -> Result<String, CommandResult> {
    match selection {
        Ok(geometry) => Ok(geometry.trim().to_string()),
        // slurp and slop exit non-zero when the selection is aborted
        Err(ToolError::Failed { .. }) => Err(CommandResult::Cancelled),
        Err(e) => Err(fail(ctx, "Recording")(e)),
    }
}

fn stop(ctx: &dyn Context, session: &Session) -> CommandResult {
    match session.stop() {
        Ok(record) => {
            let body = record
                .output
                .map(|path| path.display().to_string())
                .unwrap_or_default();
            ctx.notifier().info("Recording saved", &body);
            CommandResult::Success
        }
        Err(e) => fail(ctx, "Recording")(e),
    }
}

fn output_path(kind: Kind, config: &RecordConfig) -> Result<PathBuf, std::io::Error> {
    let dir = tools::expand_path(&config.directory);
    std::fs::create_dir_all(&dir)?;
    let (prefix, extension) = match kind {
        Kind::Audio => ("audio", &config.audio_format),
        Kind::Screen | Kind::Region => ("recording", &config.video_format),
    };
    let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    Ok(dir.join(format!("{prefix}_{stamp}.{extension}")))
}
