//! Screenshots with `grim`/`slurp` on Wayland and `maim` on X11

use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::Deserialize;

use super::{Step, fail, finish, submenu, unknown_action};
use crate::commands::command::{Command, CommandResult};
use crate::commands::context::Context;
use crate::tools::{self, ToolError};

pub const NAME: &str = "screenshot";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScreenshotConfig {
    pub directory: String,
    /// `strftime` pattern for the file name
    pub filename_format: String,
    pub delay_secs: u64,
    pub copy_to_clipboard: bool,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            directory: "~/Pictures/Screenshots".to_string(),
            filename_format: "screenshot_%Y-%m-%d_%H-%M-%S.png".to_string(),
            delay_secs: 3,
            copy_to_clipboard: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Full,
    Region,
    Window,
    Delayed,
}

impl Mode {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "full" | "screen" => Some(Mode::Full),
            "region" | "area" => Some(Mode::Region),
            "window" => Some(Mode::Window),
            "delay" | "delayed" => Some(Mode::Delayed),
            _ => None,
        }
    }

    fn label(self, config: &ScreenshotConfig) -> String {
        match self {
            Mode::Full => "Full screen".to_string(),
            Mode::Region => "Region".to_string(),
            Mode::Window => "Active window".to_string(),
            Mode::Delayed => format!("Full screen in {}s", config.delay_secs),
        }
    }
}

/// Capture program family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Wayland,
    X11,
}

impl Backend {
    fn detect() -> Self {
        if tools::is_wayland() {
            Backend::Wayland
        } else {
            Backend::X11
        }
    }

    /// Program and arguments that write a capture of `geometry` (or the whole
    /// screen) to `path`
    #[must_use]
    pub fn capture(self, path: &Path, geometry: Option<&str>) -> (&'static str, Vec<String>) {
        let path = path.display().to_string();
        match (self, geometry) {
            (Backend::Wayland, Some(geometry)) => ("grim", vec!["-g".into(), geometry.into(), path]),
            (Backend::Wayland, None) => ("grim", vec![path]),
            (Backend::X11, Some(geometry)) => ("maim", vec!["-g".into(), geometry.into(), path]),
            (Backend::X11, None) => ("maim", vec![path]),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HyprWindow {
    at: [i32; 2],
    size: [i32; 2],
}

/// `hyprctl activewindow -j` → `"x,y wxh"`
fn parse_hyprland_geometry(json: &str) -> Result<String, ToolError> {
    let window: HyprWindow =
        serde_json::from_str(json).map_err(|e| ToolError::parse("hyprctl", e.to_string()))?;
    Ok(format!(
        "{},{} {}x{}",
        window.at[0], window.at[1], window.size[0], window.size[1]
    ))
}

/// `xdotool getactivewindow getwindowgeometry --shell` → `"WxH+X+Y"`
fn parse_xdotool_geometry(output: &str) -> Result<String, ToolError> {
    let value = |key: &str| {
        output
            .lines()
            .find_map(|line| line.strip_prefix(key)?.strip_prefix('='))
            .and_then(|v| v.trim().parse::<i32>().ok())
            .ok_or_else(|| ToolError::parse("xdotool", format!("missing {key}")))
    };
    Ok(format!(
        "{}x{}+{}+{}",
        value("WIDTH")?,
        value("HEIGHT")?,
        value("X")?,
        value("Y")?
    ))
}

#[must_use]
pub fn command() -> Command {
    Command::new(NAME, "Screenshot", run)
}

fn run(ctx: &dyn Context) -> CommandResult {
    let config: ScreenshotConfig = ctx.config().module(NAME);
    if ctx.is_direct_launch() {
        return match Mode::from_key(&ctx.args()[0]) {
            Some(mode) => take(ctx, mode, &config),
            None => unknown_action(ctx, NAME, "full|region|window|delay"),
        };
    }
    finish(interactive(ctx, &config))
}

fn interactive(ctx: &dyn Context, config: &ScreenshotConfig) -> Step<CommandResult> {
    let modes = [Mode::Full, Mode::Region, Mode::Window, Mode::Delayed];
    let options: Vec<String> = modes.iter().map(|m| m.label(config)).collect();
    loop {
        let choice = submenu(ctx, &options, "Screenshot")?;
        if let Some(mode) = modes.iter().find(|m| m.label(config) == choice) {
            return Ok(take(ctx, *mode, config));
        }
    }
}

fn take(ctx: &dyn Context, mode: Mode, config: &ScreenshotConfig) -> CommandResult {
    let backend = Backend::detect();
    let geometry = match select_geometry(backend, mode) {
        Ok(geometry) => geometry,
        // slurp and slop exit non-zero when the selection is aborted
        Err(ToolError::Failed { .. }) if mode == Mode::Region => return CommandResult::Cancelled,
        Err(e) => return fail(ctx, "Screenshot")(e),
    };
    if mode == Mode::Delayed {
        std::thread::sleep(Duration::from_secs(config.delay_secs));
    }

    let path = match target_path(config) {
        Ok(path) => path,
        Err(e) => return fail(ctx, "Screenshot")(e),
    };
    let (program, args) = backend.capture(&path, geometry.as_deref());
    if let Err(e) = tools::run(program, &args) {
        return fail(ctx, "Screenshot")(e);
    }
    info!("Saved screenshot to {}", path.display());

    if config.copy_to_clipboard {
        let copied = std::fs::read(&path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                tools::copy_to_clipboard(&bytes, Some("image/png")).map_err(|e| e.to_string())
            });
        if let Err(e) = copied {
            warn!("Screenshot not copied to clipboard: {e}");
        }
    }
    ctx.notifier()
        .info("Screenshot saved", &path.display().to_string());
    CommandResult::Success
}

fn select_geometry(backend: Backend, mode: Mode) -> Result<Option<String>, ToolError> {
    match (mode, backend) {
        (Mode::Full | Mode::Delayed, _) => Ok(None),
        (Mode::Region, Backend::Wayland) => {
            tools::output("slurp", Vec::<&str>::new()).map(|out| Some(out.trim().to_string()))
        }
        (Mode::Region, Backend::X11) => tools::output("slop", ["-f", "%wx%h+%x+%y"])
            .map(|out| Some(out.trim().to_string())),
        (Mode::Window, Backend::Wayland) => {
            let json = tools::output("hyprctl", ["activewindow", "-j"])?;
            parse_hyprland_geometry(&json).map(Some)
        }
        (Mode::Window, Backend::X11) => {
            let out = tools::output(
                "xdotool",
                ["getactivewindow", "getwindowgeometry", "--shell"],
            )?;
            parse_xdotool_geometry(&out).map(Some)
        }
    }
}

fn target_path(config: &ScreenshotConfig) -> Result<PathBuf, std::io::Error> {
    let dir = tools::expand_path(&config.directory);
    std::fs::create_dir_all(&dir)?;
    let mut name = String::new();
    write!(name, "{}", chrono::Local::now().format(&config.filename_format)).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid filename_format '{}'", config.filename_format),
        )
    })?;
    Ok(dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_commands() {
        let path = Path::new("/tmp/shot.png");
        assert_eq!(
            Backend::Wayland.capture(path, Some("10,20 300x200")),
            ("grim", vec!["-g".to_string(), "10,20 300x200".to_string(), "/tmp/shot.png".to_string()])
        );
        assert_eq!(
            Backend::X11.capture(path, None),
            ("maim", vec!["/tmp/shot.png".to_string()])
        );
    }

    #[test]
    fn test_hyprland_geometry() {
        let json = r#"{"address":"0x1","at":[12,40],"size":[1280,720],"title":"x"}"#;
        assert_eq!(parse_hyprland_geometry(json).unwrap(), "12,40 1280x720");
        assert!(parse_hyprland_geometry("{}").is_err());
    }

    #[test]
    fn test_xdotool_geometry() {
        let out = "WINDOW=123\nX=5\nY=10\nWIDTH=800\nHEIGHT=600\nSCREEN=0\n";
        assert_eq!(parse_xdotool_geometry(out).unwrap(), "800x600+5+10");
        assert!(parse_xdotool_geometry("WINDOW=1\n").is_err());
    }

    #[test]
    fn test_delay_label_uses_config() {
        let config = ScreenshotConfig {
            delay_secs: 5,
            ..ScreenshotConfig::default()
        };
        assert_eq!(Mode::Delayed.label(&config), "Full screen in 5s");
        assert_eq!(Mode::from_key("area"), Some(Mode::Region));
    }
}
