//! Helpers for running the external programs the modules wrap

use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command as ProcessCommand, Stdio};

use log::debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{0} not found in PATH")]
    NotFound(String),
    #[error("{program} exited with code {code:?}: {stderr}")]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("failed to run {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected output from {program}: {message}")]
    Parse { program: String, message: String },
}

impl ToolError {
    pub fn parse(program: impl Into<String>, message: impl Into<String>) -> Self {
        ToolError::Parse {
            program: program.into(),
            message: message.into(),
        }
    }
}

/// Look a program up in `PATH`.
///
/// # Errors
///
/// Returns `ToolError::NotFound` if the program is not installed.
pub fn require(program: &str) -> Result<PathBuf, ToolError> {
    which::which(program).map_err(|_| ToolError::NotFound(program.to_string()))
}

fn io_error(program: &str) -> impl FnOnce(std::io::Error) -> ToolError + '_ {
    move |source| ToolError::Io {
        program: program.to_string(),
        source,
    }
}

fn build<I, S>(program: &str, args: I) -> Result<ProcessCommand, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let path = require(program)?;
    let mut command = ProcessCommand::new(path);
    command.args(args);
    Ok(command)
}

/// Run a program to completion and return its stdout.
///
/// # Errors
///
/// Returns `ToolError::NotFound` if the program is missing, `ToolError::Io` if it
/// cannot be started, or `ToolError::Failed` if it exits non-zero.
pub fn output<I, S>(program: &str, args: I) -> Result<String, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = build(program, args)?
        .stdin(Stdio::null())
        .output()
        .map_err(io_error(program))?;
    if !output.status.success() {
        return Err(ToolError::Failed {
            program: program.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run a program to completion, discarding its output.
///
/// # Errors
///
/// Same as [`output`].
pub fn run<I, S>(program: &str, args: I) -> Result<(), ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    output(program, args).map(|_| ())
}

/// Run a program with `input` on its stdin and return its raw stdout.
///
/// # Errors
///
/// Same as [`output`].
pub fn pipe<I, S>(program: &str, args: I, input: &[u8]) -> Result<Vec<u8>, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut child = build(program, args)?
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(io_error(program))?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input).map_err(io_error(program))?;
    }
    let output = child.wait_with_output().map_err(io_error(program))?;
    if !output.status.success() {
        return Err(ToolError::Failed {
            program: program.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output.stdout)
}

/// Start a program in its own process group with all standard streams closed,
/// and return its pid without waiting for it.
///
/// # Errors
///
/// Returns `ToolError::NotFound` or `ToolError::Io` if the program cannot be started.
pub fn spawn_detached<I, S>(program: &str, args: I) -> Result<u32, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    use std::os::unix::process::CommandExt;

    let child = build(program, args)?
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0)
        .spawn()
        .map_err(io_error(program))?;
    let pid = child.id();
    debug!("Detached {program} with pid {pid}");
    Ok(pid)
}

/// Whether the session runs under a Wayland compositor
#[must_use]
pub fn is_wayland() -> bool {
    std::env::var_os("WAYLAND_DISPLAY").is_some_and(|v| !v.is_empty())
}

/// Put `data` on the system clipboard with `wl-copy` or `xclip`.
///
/// # Errors
///
/// Returns `ToolError::NotFound` if no clipboard tool is installed.
pub fn copy_to_clipboard(data: &[u8], mime: Option<&str>) -> Result<(), ToolError> {
    if is_wayland() {
        let mut args = Vec::new();
        if let Some(mime) = mime {
            args.extend(["--type", mime]);
        }
        pipe("wl-copy", args, data).map(|_| ())
    } else {
        let mut args = vec!["-selection", "clipboard"];
        if let Some(mime) = mime {
            args.extend(["-t", mime]);
        }
        pipe("xclip", args, data).map(|_| ())
    }
}

/// Expand a leading `~` and `$HOME` in a configured path.
#[must_use]
pub fn expand_path(path: &str) -> PathBuf {
    let Some(home) = dirs::home_dir() else {
        return PathBuf::from(path);
    };
    expand_with_home(path, &home)
}

fn expand_with_home(path: &str, home: &Path) -> PathBuf {
    if path == "~" || path == "$HOME" {
        return home.to_path_buf();
    }
    for prefix in ["~/", "$HOME/"] {
        if let Some(rest) = path.strip_prefix(prefix) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home_prefixes() {
        let home = Path::new("/home/user");
        assert_eq!(
            expand_with_home("~/Pictures", home),
            PathBuf::from("/home/user/Pictures")
        );
        assert_eq!(
            expand_with_home("$HOME/Videos", home),
            PathBuf::from("/home/user/Videos")
        );
        assert_eq!(expand_with_home("~", home), PathBuf::from("/home/user"));
        assert_eq!(expand_with_home("/tmp/x", home), PathBuf::from("/tmp/x"));
        assert_eq!(expand_with_home("~other/x", home), PathBuf::from("~other/x"));
    }

    #[test]
    fn test_missing_program_is_reported() {
        match output("ql-definitely-not-installed", ["--help"]) {
            Err(ToolError::NotFound(name)) => assert_eq!(name, "ql-definitely-not-installed"),
            other => panic!("Expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn test_output_captures_stdout() {
        let out = output("sh", ["-c", "printf hello"]).unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn test_non_zero_exit_is_failure() {
        match output("sh", ["-c", "echo oops >&2; exit 3"]) {
            Err(ToolError::Failed { code, stderr, .. }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "oops");
            }
            other => panic!("Expected Failed, got: {other:?}"),
        }
    }

    #[test]
    fn test_pipe_passes_stdin_through() {
        let out = pipe("cat", Vec::<&str>::new(), b"piped").unwrap();
        assert_eq!(out, b"piped");
    }
}
