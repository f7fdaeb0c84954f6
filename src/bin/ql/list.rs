use std::io::IsTerminal;

use ql::commands::registry::Registry;
use ql::config_file::Config;

/// ANSI color helpers, only emitting escape codes when stdout is a terminal
struct Style {
    color: bool,
}

impl Style {
    fn new() -> Self {
        Self {
            color: std::io::stdout().is_terminal(),
        }
    }

    fn style(&self, code: &str, s: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    }

    fn bold(&self, s: &str) -> String {
        self.style("1", s)
    }

    fn green(&self, s: &str) -> String {
        self.style("32", s)
    }

    fn dim(&self, s: &str) -> String {
        self.style("2", s)
    }

    fn state(&self, enabled: bool) -> String {
        if enabled {
            self.green("enabled")
        } else {
            self.dim("disabled")
        }
    }
}

/// Print registered commands and configured groups with their enabled state.
pub fn print(registry: &Registry, config: &Config) {
    let sty = Style::new();

    println!("{}", sty.bold("Commands:"));
    for command in registry.commands() {
        println!(
            "  {:<12} {:<22} {}",
            command.name,
            command.description,
            sty.state(config.is_enabled(command.name))
        );
    }

    println!();
    println!("{}", sty.bold("Groups:"));
    for group in &config.groups {
        println!(
            "  {:<12} {:<22} {} {}",
            group.key,
            group.name,
            sty.state(group.enabled),
            sty.dim(&format!("[{}]", group.modules.join(", ")))
        );
    }
}
