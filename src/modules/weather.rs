//! Current conditions from wttr.in's JSON API

use std::time::Duration;

use log::debug;
use serde::Deserialize;

use super::{Step, fail, finish, submenu};
use crate::commands::command::{Command, CommandResult};
use crate::commands::context::Context;
use crate::tools::ToolError;

pub const NAME: &str = "weather";
const REFRESH: &str = "Refresh";
const USER_AGENT: &str = concat!("ql/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Empty means "let the service locate me"
    pub location: String,
    pub units: Units,
    pub timeout_secs: u64,
    pub url: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            location: String::new(),
            units: Units::Metric,
            timeout_secs: 10,
            url: "https://wttr.in".to_string(),
        }
    }
}

impl WeatherConfig {
    #[must_use]
    pub fn request_url(&self, location: &str) -> String {
        let location = location.trim().replace(' ', "+");
        format!("{}/{location}?format=j1", self.url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct Text {
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Current {
    #[serde(rename = "temp_C")]
    temp_c: String,
    #[serde(rename = "temp_F")]
    temp_f: String,
    #[serde(rename = "FeelsLikeC")]
    feels_like_c: String,
    #[serde(rename = "FeelsLikeF")]
    feels_like_f: String,
    humidity: String,
    windspeed_kmph: String,
    windspeed_miles: String,
    winddir16_point: String,
    weather_desc: Vec<Text>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Area {
    area_name: Vec<Text>,
    country: Vec<Text>,
}

#[derive(Debug, Deserialize)]
struct Response {
    current_condition: Vec<Current>,
    #[serde(default)]
    nearest_area: Vec<Area>,
}

/// Conditions ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub place: Option<String>,
    pub description: String,
    pub temperature: String,
    pub feels_like: String,
    pub humidity: String,
    pub wind: String,
}

impl Report {
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(place) = &self.place {
            lines.push(place.clone());
        }
        lines.push(format!("{}, {}", self.description, self.temperature));
        lines.push(format!("Feels like {}", self.feels_like));
        lines.push(format!("Humidity {}", self.humidity));
        lines.push(format!("Wind {}", self.wind));
        lines
    }
}

fn first(texts: &[Text]) -> Option<&str> {
    texts
        .first()
        .map(|t| t.value.trim())
        .filter(|v| !v.is_empty())
}

/// Decode a `format=j1` response.
///
/// # Errors
///
/// Returns `ToolError::Parse` if the JSON does not have the expected shape.
pub fn parse_report(json: &str, units: Units) -> Result<Report, ToolError> {
    let response: Response =
        serde_json::from_str(json).map_err(|e| ToolError::parse("wttr.in", e.to_string()))?;
    let current = response
        .current_condition
        .first()
        .ok_or_else(|| ToolError::parse("wttr.in", "no current conditions"))?;
    let place = response.nearest_area.first().and_then(|area| {
        let name = first(&area.area_name)?;
        Some(match first(&area.country) {
            Some(country) => format!("{name}, {country}"),
            None => name.to_string(),
        })
    });
    let (temperature, feels_like, wind) = match units {
        Units::Metric => (
            format!("{}°C", current.temp_c),
            format!("{}°C", current.feels_like_c),
            format!("{} km/h {}", current.windspeed_kmph, current.winddir16_point),
        ),
        Units::Imperial => (
            format!("{}°F", current.temp_f),
            format!("{}°F", current.feels_like_f),
            format!("{} mph {}", current.windspeed_miles, current.winddir16_point),
        ),
    };
    Ok(Report {
        place,
        description: first(&current.weather_desc).unwrap_or("Unknown").to_string(),
        temperature,
        feels_like,
        humidity: format!("{}%", current.humidity),
        wind,
    })
}

fn fetch(config: &WeatherConfig, location: &str) -> Result<Report, ToolError> {
    let url = config.request_url(location);
    debug!("Fetching weather from {url}");
    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    let body = client.get(&url).send()?.error_for_status()?.text()?;
    parse_report(&body, config.units)
}

#[must_use]
pub fn command() -> Command {
    Command::new(NAME, "Weather", run)
}

fn run(ctx: &dyn Context) -> CommandResult {
    let config: WeatherConfig = ctx.config().module(NAME);
    if ctx.is_direct_launch() {
        let location = ctx.args().join(" ");
        return match fetch(&config, &location) {
            Ok(report) => {
                for line in report.lines() {
                    println!("{line}");
                }
                CommandResult::Success
            }
            Err(e) => fail(ctx, "Weather")(e),
        };
    }
    finish(interactive(ctx, &config))
}

fn interactive(ctx: &dyn Context, config: &WeatherConfig) -> Step<CommandResult> {
    loop {
        let report = fetch(config, &config.location).map_err(fail(ctx, "Weather"))?;
        let mut options = report.lines();
        options.push(REFRESH.to_string());
        let choice = submenu(ctx, &options, "Weather")?;
        if choice != REFRESH {
            return Ok(CommandResult::Success);
        }
    }
}
