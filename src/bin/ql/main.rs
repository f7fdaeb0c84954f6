mod init;
mod list;

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use log::{info, warn};

use ql::commands::command::CommandResult;
use ql::config_file::MenuStyle;
use ql::launcher::{self, LauncherKind};
use ql::navigation::Navigator;
use ql::notify::DesktopNotifier;
use ql::{VERSION, load_config, logger, modules};

#[derive(Parser, Debug)]
#[command(
    name = "ql",
    version,
    about = "Quick launcher for everyday desktop actions",
    after_help = "Positional arguments: `init`, `version`, `help`, a module name followed by \
                  its arguments (e.g. `ql wifi connect home`), or a launcher name."
)]
struct Cli {
    /// Write the default config file and exit
    #[arg(long)]
    init: bool,

    /// Overwrite an existing config file with --init
    #[arg(long)]
    force: bool,

    /// Show every enabled command in one menu
    #[arg(long, conflicts_with = "grouped")]
    flat: bool,

    /// Show the group list first
    #[arg(long)]
    grouped: bool,

    /// Menu program to use (rofi, dmenu, fzf, bemenu, fuzzel, prompt)
    #[arg(short, long)]
    launcher: Option<String>,

    /// Open a group directly, by key or name
    #[arg(short, long)]
    group: Option<String>,

    /// Path to config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<String>,

    /// Write log records to this file instead of stderr
    #[arg(long)]
    log_file: Option<String>,

    /// Print registered commands and groups, then exit
    #[arg(long)]
    list: bool,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    args: Vec<String>,
}

impl Cli {
    fn style_override(&self) -> Option<MenuStyle> {
        if self.flat {
            Some(MenuStyle::Flat)
        } else if self.grouped {
            Some(MenuStyle::Grouped)
        } else {
            None
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .as_deref()
        .map(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
        })
        .transpose()?;
    logger::init(log_file);

    let first = cli.args.first().map(String::as_str);
    if cli.init || first == Some("init") {
        return init::run(cli.config.as_deref(), cli.force);
    }
    match first {
        Some("version") => {
            println!("ql {VERSION}");
            return Ok(ExitCode::SUCCESS);
        }
        Some("help") => {
            Cli::command().print_help()?;
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let (config, config_path) = load_config(cli.config.as_deref())?;
    info!("Using config {}", config_path.display());
    let registry = modules::registry()?;

    if cli.list {
        list::print(&registry, &config);
        return Ok(ExitCode::SUCCESS);
    }

    let direct = first.filter(|name| registry.get(name).is_some());
    let legacy_launcher = match (first, direct) {
        (Some(name), None) => {
            if cli.args.len() > 1 {
                warn!("Ignoring extra arguments after launcher '{name}'");
            }
            Some(name)
        }
        _ => None,
    };
    let launcher_name = cli
        .launcher
        .as_deref()
        .or(legacy_launcher)
        .unwrap_or(&config.launcher.name);
    let kind = LauncherKind::parse_or_default(launcher_name);
    let launcher = launcher::build(kind, &config);
    let notifier = DesktopNotifier::new(config.notifications.clone());
    let navigator = Navigator::new(&registry, &config, launcher.as_ref(), &notifier);

    if let Some(name) = direct {
        let args = cli.args[1..].to_vec();
        return Ok(match navigator.run_direct(name, args)? {
            CommandResult::Failed(_) => ExitCode::FAILURE,
            CommandResult::Success | CommandResult::Back | CommandResult::Cancelled => {
                ExitCode::SUCCESS
            }
        });
    }

    let style = cli.style_override().unwrap_or(config.menu.style);
    navigator.run(style, cli.group.as_deref())?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_module_arguments_are_collected() {
        let cli = Cli::try_parse_from(["ql", "--flat", "wifi", "connect", "--hidden", "home"]).unwrap();
        assert!(cli.flat);
        assert_eq!(cli.args, vec!["wifi", "connect", "--hidden", "home"]);
    }

    #[test]
    fn test_flat_and_grouped_conflict() {
        assert!(Cli::try_parse_from(["ql", "--flat", "--grouped"]).is_err());
    }

    #[test]
    fn test_style_override() {
        let cli = Cli::try_parse_from(["ql", "--grouped"]).unwrap();
        assert_eq!(cli.style_override(), Some(MenuStyle::Grouped));
        let cli = Cli::try_parse_from(["ql", "dmenu"]).unwrap();
        assert_eq!(cli.style_override(), None);
        assert_eq!(cli.args, vec!["dmenu"]);
    }
}
