//! Internet radio streamed by a detached `mpv`

use serde::Deserialize;

use super::{Step, fail, finish, submenu};
use crate::commands::command::{Command, CommandResult};
use crate::commands::context::Context;
use crate::session::Session;

pub const NAME: &str = "radio";
const SESSION: &str = "radio";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Station {
    pub name: String,
    pub url: String,
}

impl Station {
    fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    pub player: String,
    /// 0-100
    pub volume: u8,
    pub stations: Vec<Station>,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            player: "mpv".to_string(),
            volume: 60,
            stations: vec![
                Station::new(
                    "SomaFM Groove Salad",
                    "https://ice1.somafm.com/groovesalad-128-mp3",
                ),
                Station::new("SomaFM Drone Zone", "https://ice1.somafm.com/dronezone-128-mp3"),
                Station::new("SomaFM Lush", "https://ice1.somafm.com/lush-128-mp3"),
                Station::new("SomaFM Secret Agent", "https://ice1.somafm.com/secretagent-128-mp3"),
            ],
        }
    }
}

impl RadioConfig {
    /// Station by exact name, falling back to a case-insensitive substring match
    #[must_use]
    pub fn find(&self, query: &str) -> Option<&Station> {
        let needle = query.to_lowercase();
        self.stations
            .iter()
            .find(|s| s.name == query)
            .or_else(|| {
                self.stations
                    .iter()
                    .find(|s| s.name.to_lowercase().contains(&needle))
            })
    }

    #[must_use]
    pub fn player_args(&self, station: &Station) -> Vec<String> {
        vec![
            "--no-video".to_string(),
            "--really-quiet".to_string(),
            format!("--volume={}", self.volume.min(100)),
            station.url.clone(),
        ]
    }
}

#[must_use]
pub fn command() -> Command {
    Command::new(NAME, "Radio", run)
}

fn run(ctx: &dyn Context) -> CommandResult {
    let config: RadioConfig = ctx.config().module(NAME);
    let session = Session::new(SESSION);
    if ctx.is_direct_launch() {
        let query = ctx.args().join(" ");
        if query == "stop" {
            return stop(ctx, &session);
        }
        return match config.find(&query) {
            Some(station) => play(ctx, &session, &config, station),
            None => fail(ctx, "Radio")(format!("no station matching '{query}'")),
        };
    }
    finish(interactive(ctx, &session, &config))
}

fn interactive(ctx: &dyn Context, session: &Session, config: &RadioConfig) -> Step<CommandResult> {
    let playing = session.current();
    let stop_label = playing
        .as_ref()
        .map(|record| format!("Stop ({})", record.label));
    let mut options: Vec<String> = stop_label.iter().cloned().collect();
    options.extend(config.stations.iter().map(|s| s.name.clone()));
    loop {
        let choice = submenu(ctx, &options, "Radio")?;
        if stop_label.as_ref() == Some(&choice) {
            return Ok(stop(ctx, session));
        }
        if let Some(station) = config.stations.iter().find(|s| s.name == choice) {
            if playing.is_some()
                && let Err(e) = session.stop()
            {
                return Ok(fail(ctx, "Radio")(e));
            }
            return Ok(play(ctx, session, config, station));
        }
    }
}

fn play(ctx: &dyn Context, session: &Session, config: &RadioConfig, station: &Station) -> CommandResult {
    let args = config.player_args(station);
    match session.start(&config.player, &args, &station.name, None) {
        Ok(_) => {
            ctx.notifier().info("Now playing", &station.name);
            CommandResult::Success
        }
        Err(e) => fail(ctx, "Radio")(e),
    }
}

fn stop(ctx: &dyn Context, session: &Session) -> CommandResult {
    match session.stop() {
        Ok(record) => {
            ctx.notifier().info("Radio stopped", &record.label);
            CommandResult::Success
        }
        Err(e) => fail(ctx, "Radio")(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::testing::TestContext;

    #[test]
    fn test_find_station() {
        let config = RadioConfig::default();
        assert_eq!(
            config.find("SomaFM Lush").map(|s| s.name.as_str()),
            Some("SomaFM Lush")
        );
        assert_eq!(
            config.find("drone").map(|s| s.name.as_str()),
            Some("SomaFM Drone Zone")
        );
        assert!(config.find("jazz fm").is_none());
    }

    #[test]
    fn test_player_args_clamp_volume() {
        let config = RadioConfig {
            volume: 250,
            ..RadioConfig::default()
        };
        let args = config.player_args(&config.stations[0]);
        assert_eq!(args[2], "--volume=100");
        assert_eq!(args[3], "https://ice1.somafm.com/groovesalad-128-mp3");
    }

    #[test]
    fn test_stations_from_config() {
        let ctx = TestContext::new(&[]).with_config(
            r#"
[commands.radio]
volume = 30
[[commands.radio.stations]]
name = "Local"
url = "http://localhost:8000/stream"
"#,
        );
        let config: RadioConfig = ctx.config.module(NAME);
        assert_eq!(config.volume, 30);
        assert_eq!(config.player, "mpv");
        assert_eq!(config.stations, vec![Station::new("Local", "http://localhost:8000/stream")]);
    }

    #[test]
    fn test_unknown_station_fails() {
        let ctx = TestContext::new(&[]).with_args(&["jazz", "fm"]);
        assert!(matches!(run(&ctx), CommandResult::Failed(ref m) if m.contains("'jazz fm'")));
    }
}
