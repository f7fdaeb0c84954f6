//! MPD control through `mpc`

use serde::Deserialize;

use super::{Step, fail, finish, submenu, unknown_action};
use crate::commands::command::{Command, CommandResult};
use crate::commands::context::Context;
use crate::tools::{self, ToolError};

pub const NAME: &str = "music";
const PLAYLIST: &str = "Playlist";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MusicConfig {
    pub host: String,
    pub port: u16,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6600,
        }
    }
}

impl MusicConfig {
    fn mpc_args<'a>(&self, args: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut argv = vec![
            "--host".to_string(),
            self.host.clone(),
            "--port".to_string(),
            self.port.to_string(),
        ];
        argv.extend(args.into_iter().map(String::from));
        argv
    }

    fn mpc<'a>(&self, args: impl IntoIterator<Item = &'a str>) -> Result<String, ToolError> {
        tools::output("mpc", self.mpc_args(args))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Playing,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MpcStatus {
    pub current: Option<String>,
    pub state: State,
    pub random: bool,
}

/// Parse plain `mpc status` output.
///
/// A stopped player prints only the options line; otherwise the first line is
/// the song and the second `[playing] #3/12 ...`.
#[must_use]
pub fn parse_status(output: &str) -> MpcStatus {
    let lines: Vec<&str> = output.lines().collect();
    let state_line = lines.iter().find(|l| l.starts_with('['));
    let state = match state_line {
        Some(line) if line.starts_with("[playing]") => State::Playing,
        Some(line) if line.starts_with("[paused]") => State::Paused,
        _ => State::Stopped,
    };
    let current = match state {
        State::Stopped => None,
        State::Playing | State::Paused => lines
            .first()
            .filter(|l| !l.starts_with('['))
            .map(|l| l.trim().to_string()),
    };
    let random = lines
        .iter()
        .find(|l| l.starts_with("volume:"))
        .and_then(|l| l.split("random:").nth(1))
        .is_some_and(|rest| rest.trim_start().starts_with("on"));
    MpcStatus {
        current,
        state,
        random,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Toggle,
    Play,
    Pause,
    Next,
    Prev,
    Stop,
    Random,
}

impl Action {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "toggle" => Some(Action::Toggle),
            "play" => Some(Action::Play),
            "pause" => Some(Action::Pause),
            "next" => Some(Action::Next),
            "prev" | "previous" => Some(Action::Prev),
            "stop" => Some(Action::Stop),
            "random" | "shuffle" => Some(Action::Random),
            _ => None,
        }
    }

    fn mpc_command(self) -> &'static str {
        match self {
            Action::Toggle => "toggle",
            Action::Play => "play",
            Action::Pause => "pause",
            Action::Next => "next",
            Action::Prev => "prev",
            Action::Stop => "stop",
            Action::Random => "random",
        }
    }
}

fn menu(status: &MpcStatus) -> Vec<(String, Option<Action>)> {
    let toggle = match (&status.state, &status.current) {
        (State::Playing, Some(song)) => format!("Pause: {song}"),
        (State::Playing, None) => "Pause".to_string(),
        (State::Paused, Some(song)) => format!("Play: {song}"),
        (State::Paused | State::Stopped, _) => "Play".to_string(),
    };
    let random = if status.random { "Random: on" } else { "Random: off" };
    vec![
        (toggle, Some(Action::Toggle)),
        ("Next".to_string(), Some(Action::Next)),
        ("Previous".to_string(), Some(Action::Prev)),
        ("Stop".to_string(), Some(Action::Stop)),
        (random.to_string(), Some(Action::Random)),
        (PLAYLIST.to_string(), None),
    ]
}

/// Song position from a `%position%. %artist% - %title%` playlist line
fn playlist_position(line: &str) -> Option<&str> {
    let (position, _) = line.split_once('.')?;
    position.trim().parse::<u32>().ok().map(|_| position.trim())
}

#[must_use]
pub fn command() -> Command {
    Command::new(NAME, "Music", run)
}

fn run(ctx: &dyn Context) -> CommandResult {
    let config: MusicConfig = ctx.config().module(NAME);
    if ctx.is_direct_launch() {
        return match Action::from_key(&ctx.args()[0]) {
            Some(action) => perform(ctx, &config, action),
            None => unknown_action(ctx, NAME, "toggle|play|pause|next|prev|stop|random"),
        };
    }
    finish(interactive(ctx, &config))
}

fn interactive(ctx: &dyn Context, config: &MusicConfig) -> Step<CommandResult> {
    loop {
        let status = config.mpc(["status"]).map_err(fail(ctx, "Music"))?;
        let entries = menu(&parse_status(&status));
        let options: Vec<String> = entries.iter().map(|(label, _)| label.clone()).collect();
        let choice = submenu(ctx, &options, "Music")?;
        match entries.into_iter().find(|(label, _)| *label == choice) {
            Some((_, Some(action))) => return Ok(perform(ctx, config, action)),
            Some((_, None)) => match playlist(ctx, config) {
                Err(CommandResult::Back) => {}
                other => return other,
            },
            None => {}
        }
    }
}

fn playlist(ctx: &dyn Context, config: &MusicConfig) -> Step<CommandResult> {
    let out = config
        .mpc(["-f", "%position%. %artist% - %title%", "playlist"])
        .map_err(fail(ctx, "Music"))?;
    let songs: Vec<String> = out.lines().map(str::to_string).collect();
    loop {
        let choice = submenu(ctx, &songs, PLAYLIST)?;
        if let Some(position) = playlist_position(&choice) {
            return Ok(match config.mpc(["play", position]) {
                Ok(_) => CommandResult::Success,
                Err(e) => fail(ctx, "Music")(e),
            });
        }
    }
}

fn perform(ctx: &dyn Context, config: &MusicConfig, action: Action) -> CommandResult {
    match config.mpc([action.mpc_command()]) {
        Ok(_) => CommandResult::Success,
        Err(e) => fail(ctx, "Music")(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYING: &str = "\
Daft Punk - Around the World
[playing] #3/12   1:02/7:09 (14%)
volume: 80%   repeat: off   random: on    single: off   consume: off
";

    #[test]
    fn test_parse_playing_status() {
        let status = parse_status(PLAYING);
        assert_eq!(status.state, State::Playing);
        assert_eq!(status.current.as_deref(), Some("Daft Punk - Around the World"));
        assert!(status.random);
    }

    #[test]
    fn test_parse_stopped_status() {
        let status =
            parse_status("volume: 80%   repeat: off   random: off   single: off   consume: off\n");
        assert_eq!(status.state, State::Stopped);
        assert_eq!(status.current, None);
        assert!(!status.random);
    }

    #[test]
    fn test_menu_labels_follow_state() {
        let labels: Vec<String> = menu(&parse_status(PLAYING))
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(labels[0], "Pause: Daft Punk - Around the World");
        assert_eq!(labels[4], "Random: on");
        assert_eq!(labels[5], PLAYLIST);
    }

    #[test]
    fn test_playlist_position() {
        assert_eq!(playlist_position("12. Daft Punk - One More Time"), Some("12"));
        assert_eq!(playlist_position("Mr. Oizo - Flat Beat"), None);
    }

    #[test]
    fn test_mpc_args_include_connection() {
        let config = MusicConfig {
            host: "nas".to_string(),
            port: 6601,
        };
        assert_eq!(
            config.mpc_args(["next"]),
            vec!["--host", "nas", "--port", "6601", "next"]
        );
        assert_eq!(Action::from_key("previous"), Some(Action::Prev));
    }
}
