//! Pick a busy process and signal it

use serde::Deserialize;

use super::{Step, confirm, fail, finish, submenu};
use crate::commands::command::{Command, CommandResult};
use crate::commands::context::Context;
use crate::session;
use crate::tools;

pub const NAME: &str = "kill";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KillConfig {
    pub limit: usize,
    /// Signal name, with or without the `SIG` prefix
    pub signal: String,
    pub confirm: bool,
}

impl Default for KillConfig {
    fn default() -> Self {
        Self {
            limit: 30,
            signal: "TERM".to_string(),
            confirm: true,
        }
    }
}

#[must_use]
pub fn signal_number(name: &str) -> Option<libc::c_int> {
    let name = name.trim().to_ascii_uppercase();
    let name = name.strip_prefix("SIG").unwrap_or(&name);
    Some(match name {
        "TERM" => libc::SIGTERM,
        "KILL" => libc::SIGKILL,
        "INT" => libc::SIGINT,
        "HUP" => libc::SIGHUP,
        "QUIT" => libc::SIGQUIT,
        "STOP" => libc::SIGSTOP,
        "CONT" => libc::SIGCONT,
        "USR1" => libc::SIGUSR1,
        "USR2" => libc::SIGUSR2,
        _ => return None,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Process {
    pub pid: u32,
    pub name: String,
    pub cpu: f32,
    pub mem: f32,
}

impl Process {
    fn label(&self) -> String {
        format!(
            "{:>7}  {:<20} {:>5.1}% cpu {:>5.1}% mem",
            self.pid, self.name, self.cpu, self.mem
        )
    }
}

/// `ps -eo pid=,comm=,%cpu=,%mem= --sort=-%cpu`, skipping `own_pid`.
///
/// `comm` can contain spaces, so the numeric columns are taken from the end.
#[must_use]
pub fn parse_ps(output: &str, own_pid: u32, limit: usize) -> Vec<Process> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let pid = fields.next()?.parse().ok()?;
            let mut rest: Vec<&str> = fields.collect();
            let mem = rest.pop()?.parse().ok()?;
            let cpu = rest.pop()?.parse().ok()?;
            if rest.is_empty() {
                return None;
            }
            Some(Process {
                pid,
                name: rest.join(" "),
                cpu,
                mem,
            })
        })
        .filter(|p| p.pid != own_pid)
        .take(limit)
        .collect()
}

#[must_use]
pub fn command() -> Command {
    Command::new(NAME, "Kill process", run)
}

fn run(ctx: &dyn Context) -> CommandResult {
    let config: KillConfig = ctx.config().module(NAME);
    let Some(signal) = signal_number(&config.signal) else {
        return fail(ctx, "Kill")(format!("unknown signal '{}'", config.signal));
    };
    if ctx.is_direct_launch() {
        let arg = &ctx.args()[0];
        return match arg.parse::<u32>() {
            Ok(pid) => send(ctx, pid, arg, signal),
            Err(_) => fail(ctx, "Kill")(format!("'{arg}' is not a pid")),
        };
    }
    finish(interactive(ctx, &config, signal))
}

fn interactive(ctx: &dyn Context, config: &KillConfig, signal: libc::c_int) -> Step<CommandResult> {
    let ps = tools::output("ps", ["-eo", "pid=,comm=,%cpu=,%mem=", "--sort=-%cpu"])
        .map_err(fail(ctx, "Kill"))?;
    let processes = parse_ps(&ps, std::process::id(), config.limit);
    let labels: Vec<String> = processes.iter().map(Process::label).collect();
    loop {
        let choice = submenu(ctx, &labels, "Kill")?;
        let Some(index) = labels.iter().position(|label| *label == choice) else {
            continue;
        };
        let process = &processes[index];
        let question = format!(
            "Send {} to {} ({})?",
            config.signal.to_ascii_uppercase(),
            process.name,
            process.pid
        );
        if config.confirm && !confirm(ctx, &question)? {
            continue;
        }
        return Ok(send(ctx, process.pid, &process.name, signal));
    }
}

fn send(ctx: &dyn Context, pid: u32, name: &str, signal: libc::c_int) -> CommandResult {
    match session::send_signal(pid, signal) {
        Ok(()) => {
            ctx.notifier().info("Signal sent", &format!("{name} ({pid})"));
            CommandResult::Success
        }
        Err(e) => fail(ctx, "Kill")(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::testing::TestContext;

    const PS: &str = "\
   4242 firefox          35.2  12.4
    100 ql                9.0   0.1
   1337 Web Content      12.5   3.0
    bad line
      7 kworker/0:1       0.0   0.0
";

    #[test]
    fn test_parse_ps() {
        let processes = parse_ps(PS, 100, 10);
        assert_eq!(processes.len(), 3);
        assert_eq!(processes[0].pid, 4242);
        assert_eq!(processes[1].name, "Web Content");
        assert!((processes[1].cpu - 12.5).abs() < f32::EPSILON);
        assert_eq!(parse_ps(PS, 100, 1).len(), 1);
    }

    #[test]
    fn test_signal_names() {
        assert_eq!(signal_number("TERM"), Some(libc::SIGTERM));
        assert_eq!(signal_number("sigkill"), Some(libc::SIGKILL));
        assert_eq!(signal_number("WINCH2"), None);
    }

    #[test]
    fn test_direct_launch_rejects_non_pid() {
        let ctx = TestContext::new(&[]).with_args(&["firefox"]);
        assert!(matches!(run(&ctx), CommandResult::Failed(ref m) if m.contains("not a pid")));
    }

    #[test]
    fn test_unknown_signal_in_config() {
        let ctx = TestContext::new(&[])
            .with_config("[commands.kill]\nsignal = \"BOGUS\"\n")
            .with_args(&["1"]);
        assert!(matches!(run(&ctx), CommandResult::Failed(ref m) if m.contains("unknown signal")));
    }
}
