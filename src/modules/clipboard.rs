//! Clipboard history through `cliphist`

use serde::Deserialize;

use super::{Step, confirm, fail, finish, submenu, unknown_action};
use crate::commands::command::{Command, CommandResult};
use crate::commands::context::Context;
use crate::tools;

pub const NAME: &str = "clipboard";
const CLEAR: &str = "Clear history";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClipboardConfig {
    pub max_items: usize,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self { max_items: 50 }
    }
}

/// One `cliphist list` line: `<id>\t<preview>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub line: String,
    pub preview: String,
}

/// Entries newest first, at most `limit`
#[must_use]
pub fn parse_history(output: &str, limit: usize) -> Vec<Entry> {
    output
        .lines()
        .filter_map(|line| {
            let (id, preview) = line.split_once('\t')?;
            if id.trim().is_empty() {
                return None;
            }
            Some(Entry {
                line: line.to_string(),
                preview: preview.trim().to_string(),
            })
        })
        .take(limit)
        .collect()
}

/// Menu labels, disambiguated so equal previews stay selectable
fn labels(entries: &[Entry]) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("{}: {}", i + 1, entry.preview))
        .collect()
}

#[must_use]
pub fn command() -> Command {
    Command::new(NAME, "Clipboard history", run)
}

fn run(ctx: &dyn Context) -> CommandResult {
    let config: ClipboardConfig = ctx.config().module(NAME);
    if ctx.is_direct_launch() {
        return match ctx.args()[0].as_str() {
            "clear" => clear(ctx),
            _ => unknown_action(ctx, NAME, "clear"),
        };
    }
    finish(interactive(ctx, &config))
}

fn interactive(ctx: &dyn Context, config: &ClipboardConfig) -> Step<CommandResult> {
    let history = tools::output("cliphist", ["list"]).map_err(fail(ctx, "Clipboard"))?;
    let entries = parse_history(&history, config.max_items);
    let labels = labels(&entries);
    let mut options = labels.clone();
    options.push(CLEAR.to_string());
    loop {
        let choice = submenu(ctx, &options, "Clipboard")?;
        if choice == CLEAR {
            if confirm(ctx, "Clear clipboard history?")? {
                return Ok(clear(ctx));
            }
            continue;
        }
        if let Some(index) = labels.iter().position(|label| *label == choice) {
            return Ok(copy(ctx, &entries[index]));
        }
    }
}

fn copy(ctx: &dyn Context, entry: &Entry) -> CommandResult {
    let copied = tools::pipe("cliphist", ["decode"], entry.line.as_bytes())
        .and_then(|data| tools::copy_to_clipboard(&data, None));
    match copied {
        Ok(()) => CommandResult::Success,
        Err(e) => fail(ctx, "Clipboard")(e),
    }
}

fn clear(ctx: &dyn Context) -> CommandResult {
    match tools::run("cliphist", ["wipe"]) {
        Ok(()) => {
            ctx.notifier().info("Clipboard history cleared", "");
            CommandResult::Success
        }
        Err(e) => fail(ctx, "Clipboard")(e),
    }
}
