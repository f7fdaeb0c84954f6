use std::io::Write;
use std::process::{Command as ProcessCommand, Stdio};

use log::debug;

use super::{Launcher, LauncherError, LauncherKind};

/// Runs a dmenu-compatible program: options on stdin, selection on stdout.
#[derive(Debug, Clone)]
pub struct ExternalLauncher {
    kind: LauncherKind,
    program: String,
    extra_args: Vec<String>,
}

impl ExternalLauncher {
    #[must_use]
    pub fn new(kind: LauncherKind, extra_args: Vec<String>) -> Self {
        Self {
            kind,
            program: kind.name().to_string(),
            extra_args,
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument list for one invocation
    #[must_use]
    pub fn args(&self, prompt: &str) -> Vec<String> {
        let mut args: Vec<String> = match self.kind {
            LauncherKind::Rofi => vec!["-dmenu".into(), "-i".into(), "-p".into(), prompt.into()],
            LauncherKind::Dmenu | LauncherKind::Bemenu => {
                vec!["-i".into(), "-p".into(), prompt.into()]
            }
            LauncherKind::Fzf => vec!["--prompt".into(), format!("{prompt}> ")],
            LauncherKind::Fuzzel => vec!["--dmenu".into(), "--prompt".into(), format!("{prompt}: ")],
            LauncherKind::Prompt => Vec::new(),
        };
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Exit codes the program uses when the user closes the menu
    fn is_cancel_code(&self, code: Option<i32>) -> bool {
        match self.kind {
            LauncherKind::Fzf => matches!(code, Some(1 | 130)),
            _ => code == Some(1),
        }
    }
}

impl Launcher for ExternalLauncher {
    fn show(&self, options: &[String], prompt: &str) -> Result<String, LauncherError> {
        let program = self.program();
        let path = which::which(program).map_err(|_| LauncherError::NotFound(program.to_string()))?;
        debug!("Showing {} options with {program}", options.len());

        let mut child = ProcessCommand::new(path)
            .args(self.args(prompt))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // No options leaves an empty list for free-form input
            let mut input = options.join("\n");
            if !options.is_empty() {
                input.push('\n');
            }
            // A menu closed before reading all options is not an error
            if let Err(e) = stdin.write_all(input.as_bytes())
                && e.kind() != std::io::ErrorKind::BrokenPipe
            {
                return Err(e.into());
            }
        }
        let output = child.wait_with_output()?;

        if !output.status.success() {
            if self.is_cancel_code(output.status.code()) {
                return Err(LauncherError::Cancelled);
            }
            return Err(LauncherError::Failed {
                program: program.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let selection = parse_selection(&output.stdout).ok_or(LauncherError::Cancelled)?;
        debug!("{program} returned '{selection}'");
        Ok(selection)
    }
}

/// First line of the program's output, or `None` if nothing was selected.
fn parse_selection(stdout: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(stdout);
    let line = text.lines().next()?.trim_end_matches('\r');
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}
