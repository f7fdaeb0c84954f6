//! Man page search, opened in a terminal

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use serde::Deserialize;

use super::{Step, fail, finish, input, submenu};
use crate::commands::command::{Command, CommandResult};
use crate::commands::context::Context;
use crate::tools;

pub const NAME: &str = "man";
const MAN_GLOB: &str = "/usr/share/man/man*/*";

/// `name (section) - description`, as printed by `man -k` / `apropos`
static APROPOS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>\S+)\s+\((?P<section>[^)]+)\)\s+-\s+(?P<description>.*)$").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ManConfig {
    pub terminal: String,
    /// Sections to list; empty lists every section
    pub sections: Vec<String>,
}

impl Default for ManConfig {
    fn default() -> Self {
        Self {
            terminal: "xterm".to_string(),
            sections: vec!["1".to_string(), "8".to_string()],
        }
    }
}

impl ManConfig {
    fn wants(&self, section: &str) -> bool {
        self.sections.is_empty() || self.sections.iter().any(|s| section.starts_with(s.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Page {
    pub name: String,
    pub section: String,
    pub description: String,
}

impl Page {
    fn label(&self) -> String {
        if self.description.is_empty() {
            format!("{} ({})", self.name, self.section)
        } else {
            format!("{} ({}) - {}", self.name, self.section, self.description)
        }
    }
}

#[must_use]
pub fn parse_apropos(output: &str, config: &ManConfig) -> Vec<Page> {
    let pages: BTreeSet<Page> = output
        .lines()
        .filter_map(|line| APROPOS_LINE.captures(line.trim()))
        .map(|caps| Page {
            name: caps["name"].to_string(),
            section: caps["section"].to_string(),
            description: caps["description"].trim().to_string(),
        })
        .filter(|page| config.wants(&page.section))
        .collect();
    pages.into_iter().collect()
}

/// Page from a file such as `/usr/share/man/man1/ls.1.gz`
#[must_use]
pub fn page_from_path(path: &Path) -> Option<Page> {
    let section = path
        .parent()?
        .file_name()?
        .to_str()?
        .strip_prefix("man")
        .filter(|section| !section.is_empty())?
        .to_string();
    let file = path.file_name()?.to_str()?;
    let marker = format!(".{section}");
    let name = match file.rfind(&marker) {
        Some(index) if index > 0 => &file[..index],
        _ => file.split('.').next()?,
    };
    Some(Page {
        name: name.to_string(),
        section,
        description: String::new(),
    })
}

fn scan_man_dirs(config: &ManConfig) -> Vec<Page> {
    let Ok(paths) = glob::glob(MAN_GLOB) else {
        return Vec::new();
    };
    let pages: BTreeSet<Page> = paths
        .filter_map(Result::ok)
        .filter_map(|path| page_from_path(&path))
        .filter(|page| config.wants(&page.section))
        .collect();
    pages.into_iter().collect()
}

fn list_pages(config: &ManConfig) -> Vec<Page> {
    match tools::output("man", ["-k", "."]) {
        Ok(out) => {
            let pages = parse_apropos(&out, config);
            if !pages.is_empty() {
                return pages;
            }
            debug!("man -k returned nothing, scanning {MAN_GLOB}");
        }
        Err(e) => debug!("man -k failed ({e}), scanning {MAN_GLOB}"),
    }
    scan_man_dirs(config)
}

/// Terminal invocation showing `page`
#[must_use]
pub fn terminal_argv(config: &ManConfig, section: Option<&str>, page: &str) -> Vec<String> {
    let mut argv: Vec<String> = config.terminal.split_whitespace().map(String::from).collect();
    argv.extend(["-e".to_string(), "man".to_string()]);
    if let Some(section) = section {
        argv.push(section.to_string());
    }
    argv.push(page.to_string());
    argv
}

#[must_use]
pub fn command() -> Command {
    Command::new(NAME, "Manual pages", run)
}

fn run(ctx: &dyn Context) -> CommandResult {
    let config: ManConfig = ctx.config().module(NAME);
    if ctx.is_direct_launch() {
        return open(ctx, &config, None, &ctx.args()[0]);
    }
    finish(interactive(ctx, &config))
}

fn interactive(ctx: &dyn Context, config: &ManConfig) -> Step<CommandResult> {
    let pages = list_pages(config);
    if pages.is_empty() {
        let page = input(ctx, "Man page")?;
        return Ok(open(ctx, config, None, page.trim()));
    }
    let labels: Vec<String> = pages.iter().map(Page::label).collect();
    loop {
        let choice = submenu(ctx, &labels, "Man")?;
        if let Some(index) = labels.iter().position(|label| *label == choice) {
            let page = &pages[index];
            return Ok(open(ctx, config, Some(&page.section), &page.name));
        }
    }
}

fn open(ctx: &dyn Context, config: &ManConfig, section: Option<&str>, page: &str) -> CommandResult {
    if page.is_empty() {
        return CommandResult::Cancelled;
    }
    if config.terminal.trim().is_empty() {
        return fail(ctx, "Man")("no terminal configured");
    }
    let argv = terminal_argv(config, section, page);
    let Some((program, args)) = argv.split_first() else {
        return CommandResult::Cancelled;
    };
    match tools::spawn_detached(program, args) {
        Ok(_) => CommandResult::Success,
        Err(e) => fail(ctx, "Man")(e),
    }
}
