//! Open configured bookmarks with `xdg-open`

use serde::Deserialize;

use super::{Step, fail, finish, submenu};
use crate::commands::command::{Command, CommandResult};
use crate::commands::context::Context;
use crate::tools;

pub const NAME: &str = "bookmarks";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Bookmark {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BookmarksConfig {
    pub opener: String,
    pub bookmarks: Vec<Bookmark>,
}

impl Default for BookmarksConfig {
    fn default() -> Self {
        let bookmark = |name: &str, url: &str| Bookmark {
            name: name.to_string(),
            url: url.to_string(),
        };
        Self {
            opener: "xdg-open".to_string(),
            bookmarks: vec![
                bookmark("Rust documentation", "https://doc.rust-lang.org/std/"),
                bookmark("crates.io", "https://crates.io"),
                bookmark("Arch Wiki", "https://wiki.archlinux.org"),
            ],
        }
    }
}

impl BookmarksConfig {
    /// URL for a bookmark name (case-insensitive), or the argument itself when it
    /// already looks like a URL
    #[must_use]
    pub fn resolve<'a>(&'a self, query: &'a str) -> Option<&'a str> {
        self.bookmarks
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(query))
            .map(|b| b.url.as_str())
            .or_else(|| query.contains("://").then_some(query))
    }
}

#[must_use]
pub fn command() -> Command {
    Command::new(NAME, "Bookmarks", run)
}

fn run(ctx: &dyn Context) -> CommandResult {
    let config: BookmarksConfig = ctx.config().module(NAME);
    if ctx.is_direct_launch() {
        let query = ctx.args().join(" ");
        return match config.resolve(&query) {
            Some(url) => open(ctx, &config, url),
            None => fail(ctx, "Bookmarks")(format!("no bookmark named '{query}'")),
        };
    }
    finish(interactive(ctx, &config))
}

fn interactive(ctx: &dyn Context, config: &BookmarksConfig) -> Step<CommandResult> {
    let options: Vec<String> = config.bookmarks.iter().map(|b| b.name.clone()).collect();
    loop {
        let choice = submenu(ctx, &options, "Bookmarks")?;
        if let Some(bookmark) = config.bookmarks.iter().find(|b| b.name == choice) {
            return Ok(open(ctx, config, &bookmark.url));
        }
    }
}

fn open(ctx: &dyn Context, config: &BookmarksConfig, url: &str) -> CommandResult {
    match tools::spawn_detached(&config.opener, [url]) {
        Ok(_) => CommandResult::Success,
        Err(e) => fail(ctx, "Bookmarks")(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::testing::TestContext;
    use crate::navigation::BACK;

    #[test]
    fn test_resolve() {
        let config = BookmarksConfig::default();
        assert_eq!(config.resolve("CRATES.IO"), Some("https://crates.io"));
        assert_eq!(config.resolve("https://example.org"), Some("https://example.org"));
        assert_eq!(config.resolve("nowhere"), None);
    }

    #[test]
    fn test_configured_bookmarks_replace_defaults() {
        let ctx = TestContext::new(&[BACK]).with_config(
            r#"
[[commands.bookmarks.bookmarks]]
name = "Home"
url = "http://localhost"
"#,
        );
        assert_eq!(run(&ctx), CommandResult::Back);
        assert_eq!(ctx.shown.borrow()[0], vec![BACK.to_string(), "Home".to_string()]);
    }

    #[test]
    fn test_unknown_bookmark_fails() {
        let ctx = TestContext::new(&[]).with_args(&["nowhere"]);
        assert!(matches!(run(&ctx), CommandResult::Failed(ref m) if m.contains("'nowhere'")));
    }
}
