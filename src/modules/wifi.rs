//! Wireless networks through NetworkManager's `nmcli`

use serde::Deserialize;

use super::{Step, fail, finish, input, submenu, unknown_action};
use crate::commands::command::{Command, CommandResult};
use crate::commands::context::Context;
use crate::tools::{self, ToolError};

pub const NAME: &str = "wifi";
const RESCAN: &str = "Rescan";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WifiConfig {
    pub show_signal: bool,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self { show_signal: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub ssid: String,
    pub signal: u8,
    pub security: String,
    pub in_use: bool,
}

impl Network {
    #[must_use]
    pub fn is_secured(&self) -> bool {
        !self.security.is_empty() && self.security != "--"
    }

    fn label(&self, show_signal: bool) -> String {
        let mut label = String::new();
        label.push_str(if self.in_use { "* " } else { "  " });
        label.push_str(&self.ssid);
        if show_signal {
            label.push_str(&format!(" ({}%)", self.signal));
        }
        if self.is_secured() {
            label.push_str(" 🔒");
        }
        label
    }
}

/// Split one line of `nmcli -t` output on unescaped `:`
#[must_use]
pub fn split_terse(line: &str) -> Vec<String> {
    let mut fields = vec![String::new()];
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next()
                    && let Some(field) = fields.last_mut()
                {
                    field.push(next);
                }
            }
            ':' => fields.push(String::new()),
            c => {
                if let Some(field) = fields.last_mut() {
                    field.push(c);
                }
            }
        }
    }
    fields
}

/// Networks from `nmcli -t -f IN-USE,SSID,SIGNAL,SECURITY device wifi list`,
/// hidden networks dropped, one entry per SSID (strongest), strongest first
#[must_use]
pub fn parse_networks(output: &str) -> Vec<Network> {
    let mut networks: Vec<Network> = Vec::new();
    for line in output.lines() {
        let fields = split_terse(line);
        let [in_use, ssid, signal, security] = fields.as_slice() else {
            continue;
        };
        if ssid.is_empty() {
            continue;
        }
        let network = Network {
            ssid: ssid.clone(),
            signal: signal.trim().parse().unwrap_or(0),
            security: security.clone(),
            in_use: in_use.trim() == "*",
        };
        match networks.iter_mut().find(|n| n.ssid == network.ssid) {
            Some(existing) => {
                let in_use = existing.in_use || network.in_use;
                if network.signal > existing.signal {
                    *existing = network;
                }
                existing.in_use = in_use;
            }
            None => networks.push(network),
        }
    }
    networks.sort_by(|a, b| b.signal.cmp(&a.signal));
    networks
}

/// Names of saved connection profiles from `nmcli -t -f NAME connection show`
#[must_use]
pub fn parse_saved(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| split_terse(line).into_iter().next())
        .filter(|name| !name.is_empty())
        .collect()
}

fn radio_enabled() -> Result<bool, ToolError> {
    let state = tools::output("nmcli", ["radio", "wifi"])?;
    Ok(state.trim() == "enabled")
}

fn set_radio(on: bool) -> Result<(), ToolError> {
    tools::run("nmcli", ["radio", "wifi", if on { "on" } else { "off" }])
}

fn scan() -> Result<Vec<Network>, ToolError> {
    let out = tools::output(
        "nmcli",
        ["-t", "-f", "IN-USE,SSID,SIGNAL,SECURITY", "device", "wifi", "list"],
    )?;
    Ok(parse_networks(&out))
}

fn rescan() -> Result<(), ToolError> {
    tools::run("nmcli", ["device", "wifi", "rescan"])
}

fn is_saved(ssid: &str) -> Result<bool, ToolError> {
    let out = tools::output("nmcli", ["-t", "-f", "NAME", "connection", "show"])?;
    Ok(parse_saved(&out).iter().any(|name| name == ssid))
}

fn connect_argv(ssid: &str, password: Option<&str>) -> Vec<String> {
    let mut args = vec![
        "device".to_string(),
        "wifi".to_string(),
        "connect".to_string(),
        ssid.to_string(),
    ];
    if let Some(password) = password {
        args.extend(["password".to_string(), password.to_string()]);
    }
    args
}

#[must_use]
pub fn command() -> Command {
    Command::new(NAME, "Wi-Fi", run)
}

fn run(ctx: &dyn Context) -> CommandResult {
    let config: WifiConfig = ctx.config().module(NAME);
    if ctx.is_direct_launch() {
        return direct(ctx);
    }
    finish(interactive(ctx, &config))
}

fn direct(ctx: &dyn Context) -> CommandResult {
    let args = ctx.args();
    let done = |result: Result<(), ToolError>| match result {
        Ok(()) => CommandResult::Success,
        Err(e) => fail(ctx, "Wi-Fi")(e),
    };
    match args[0].as_str() {
        "on" => done(set_radio(true)),
        "off" => done(set_radio(false)),
        "rescan" => done(rescan()),
        "connect" if args.len() >= 2 => {
            let password = args.get(2).map(String::as_str);
            if password.is_none()
                && let Ok(true) = is_saved(&args[1])
            {
                return connect_saved(ctx, &args[1]);
            }
            connect(ctx, &args[1], password)
        }
        _ => unknown_action(ctx, NAME, "connect <ssid> [password]|on|off|rescan"),
    }
}

fn interactive(ctx: &dyn Context, config: &WifiConfig) -> Step<CommandResult> {
    loop {
        let enabled = radio_enabled().map_err(fail(ctx, "Wi-Fi"))?;
        let toggle = if enabled { "Turn Wi-Fi off" } else { "Turn Wi-Fi on" };
        let networks = if enabled {
            scan().map_err(fail(ctx, "Wi-Fi"))?
        } else {
            Vec::new()
        };
        let labels: Vec<String> = networks.iter().map(|n| n.label(config.show_signal)).collect();
        let mut options = vec![toggle.to_string(), RESCAN.to_string()];
        options.extend(labels.iter().cloned());

        let choice = submenu(ctx, &options, "Wi-Fi")?;
        if choice == toggle {
            return Ok(match set_radio(!enabled) {
                Ok(()) => CommandResult::Success,
                Err(e) => fail(ctx, "Wi-Fi")(e),
            });
        }
        if choice == RESCAN {
            rescan().map_err(fail(ctx, "Wi-Fi"))?;
            continue;
        }
        let Some(index) = labels.iter().position(|label| *label == choice) else {
            continue;
        };
        let network = &networks[index];
        if network.in_use {
            ctx.notifier().info("Already connected", &network.ssid);
            return Ok(CommandResult::Success);
        }
        if is_saved(&network.ssid).unwrap_or(false) {
            return Ok(connect_saved(ctx, &network.ssid));
        }
        let password = if network.is_secured() {
            Some(input(ctx, &format!("Password for {}", network.ssid))?)
        } else {
            None
        };
        return Ok(connect(ctx, &network.ssid, password.as_deref()));
    }
}

fn connect_saved(ctx: &dyn Context, ssid: &str) -> CommandResult {
    match tools::run("nmcli", ["connection", "up", "id", ssid]) {
        Ok(()) => connected(ctx, ssid),
        Err(e) => fail(ctx, "Wi-Fi")(e),
    }
}

fn connect(ctx: &dyn Context, ssid: &str, password: Option<&str>) -> CommandResult {
    match tools::run("nmcli", connect_argv(ssid, password)) {
        Ok(()) => connected(ctx, ssid),
        Err(e) => fail(ctx, "Wi-Fi")(e),
    }
}

fn connected(ctx: &dyn Context, ssid: &str) -> CommandResult {
    ctx.notifier().info("Connected", ssid);
    CommandResult::Success
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = "\
*:Home:78:WPA2
:Cafe\\: Free:55:
:Home:40:WPA2
::30:WPA2
:Office:90:WPA1 WPA2
";

    #[test]
    fn test_split_terse_unescapes() {
        assert_eq!(split_terse(r"a:b\:c:d\\e"), vec!["a", "b:c", r"d\e"]);
        assert_eq!(split_terse(""), vec![""]);
    }

    #[test]
    fn test_parse_networks() {
        let networks = parse_networks(LIST);
        let ssids: Vec<&str> = networks.iter().map(|n| n.ssid.as_str()).collect();
        assert_eq!(ssids, vec!["Office", "Home", "Cafe: Free"]);

        let home = &networks[1];
        assert!(home.in_use);
        assert_eq!(home.signal, 78);
        assert!(!networks[2].is_secured());
    }

    #[test]
    fn test_labels() {
        let networks = parse_networks(LIST);
        assert_eq!(networks[1].label(true), "* Home (78%) 🔒");
        assert_eq!(networks[2].label(false), "  Cafe: Free");
    }

    #[test]
    fn test_parse_saved() {
        assert_eq!(parse_saved("Home\nWired connection 1\n\n"), vec!["Home", "Wired connection 1"]);
    }

    #[test]
    fn test_connect_argv() {
        assert_eq!(
            connect_argv("Home", Some("hunter2")),
            vec!["device", "wifi", "connect", "Home", "password", "hunter2"]
        );
        assert_eq!(connect_argv("Cafe", None).len(), 4);
    }
}
