//! Per-interface traffic totals and rates from `/proc/net/dev`

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use super::{Step, fail, finish, submenu};
use crate::commands::command::{Command, CommandResult};
use crate::commands::context::Context;
use crate::tools::ToolError;

pub const NAME: &str = "netstats";
const PROC_NET_DEV: &str = "/proc/net/dev";
const REFRESH: &str = "Refresh";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NetstatsConfig {
    /// Time between the two samples used for rates
    pub interval_ms: u64,
    pub show_loopback: bool,
}

impl Default for NetstatsConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            show_loopback: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Interface counters keyed by interface name.
///
/// # Errors
///
/// Returns `ToolError::Parse` for a line without enough numeric columns.
pub fn parse_net_dev(contents: &str) -> Result<BTreeMap<String, Counters>, ToolError> {
    let mut interfaces = BTreeMap::new();
    // Two header lines
    for line in contents.lines().skip(2) {
        let Some((name, data)) = line.split_once(':') else {
            continue;
        };
        let fields: Vec<&str> = data.split_whitespace().collect();
        let column = |index: usize| {
            fields
                .get(index)
                .and_then(|v| v.parse::<u64>().ok())
                .ok_or_else(|| ToolError::parse(PROC_NET_DEV, format!("bad line '{}'", line.trim())))
        };
        interfaces.insert(
            name.trim().to_string(),
            Counters {
                rx_bytes: column(0)?,
                tx_bytes: column(8)?,
            },
        );
    }
    Ok(interfaces)
}

#[must_use]
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// One display line per interface
#[must_use]
pub fn summarize(
    before: &BTreeMap<String, Counters>,
    after: &BTreeMap<String, Counters>,
    interval: Duration,
    show_loopback: bool,
) -> Vec<String> {
    let secs = interval.as_secs_f64().max(f64::EPSILON);
    let rate = |now: u64, then: u64| {
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let per_sec = (now.saturating_sub(then) as f64 / secs).round() as u64;
        format!("{}/s", human_bytes(per_sec))
    };
    after
        .iter()
        .filter(|(name, _)| show_loopback || name.as_str() != "lo")
        .map(|(name, now)| {
            let then = before.get(name).copied().unwrap_or(*now);
            format!(
                "{name}: ↓ {} ({}) ↑ {} ({})",
                rate(now.rx_bytes, then.rx_bytes),
                human_bytes(now.rx_bytes),
                rate(now.tx_bytes, then.tx_bytes),
                human_bytes(now.tx_bytes),
            )
        })
        .collect()
}

fn read_counters() -> Result<BTreeMap<String, Counters>, ToolError> {
    let contents = std::fs::read_to_string(PROC_NET_DEV).map_err(|source| ToolError::Io {
        program: PROC_NET_DEV.to_string(),
        source,
    })?;
    parse_net_dev(&contents)
}

fn sample(config: &NetstatsConfig) -> Result<Vec<String>, ToolError> {
    let interval = Duration::from_millis(config.interval_ms);
    let before = read_counters()?;
    std::thread::sleep(interval);
    let after = read_counters()?;
    Ok(summarize(&before, &after, interval, config.show_loopback))
}

#[must_use]
pub fn command() -> Command {
    Command::new(NAME, "Network statistics", run)
}

fn run(ctx: &dyn Context) -> CommandResult {
    let config: NetstatsConfig = ctx.config().module(NAME);
    if ctx.is_direct_launch() {
        return match sample(&config) {
            Ok(lines) => {
                for line in lines {
                    println!("{line}");
                }
                CommandResult::Success
            }
            Err(e) => fail(ctx, "Network statistics")(e),
        };
    }
    finish(interactive(ctx, &config))
}

fn interactive(ctx: &dyn Context, config: &NetstatsConfig) -> Step<CommandResult> {
    loop {
        let mut options = sample(config).map_err(fail(ctx, "Network statistics"))?;
        options.push(REFRESH.to_string());
        if submenu(ctx, &options, "Network")? != REFRESH {
            return Ok(CommandResult::Success);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEV: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:  104857       10    0    0    0     0          0         0   104857      10    0    0    0     0       0          0
 wlan0: 5242880     4000    0    0    0     0          0         0  1048576    2000    0    0    0     0       0          0
";

    #[test]
    fn test_parse_net_dev() {
        let interfaces = parse_net_dev(DEV).unwrap();
        assert_eq!(interfaces.len(), 2);
        assert_eq!(
            interfaces["wlan0"],
            Counters {
                rx_bytes: 5_242_880,
                tx_bytes: 1_048_576
            }
        );
    }

    #[test]
    fn test_truncated_line_is_error() {
        let bad = format!("{DEV}  eth0: 12 34\n");
        assert!(matches!(parse_net_dev(&bad), Err(ToolError::Parse { .. })));
    }

    #[test]
    fn test_human_bytes() {
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(1536), "1.5 KiB");
        assert_eq!(human_bytes(5_242_880), "5.0 MiB");
    }

    #[test]
    fn test_summarize_rates() {
        let before = parse_net_dev(DEV).unwrap();
        let mut after = before.clone();
        if let Some(wlan) = after.get_mut("wlan0") {
            wlan.rx_bytes += 2048;
        }
        let lines = summarize(&before, &after, Duration::from_secs(2), false);
        assert_eq!(lines, vec!["wlan0: ↓ 1.0 KiB/s (5.0 MiB) ↑ 0 B/s (1.0 MiB)"]);
        assert_eq!(summarize(&before, &after, Duration::from_secs(2), true).len(), 2);
    }
}
