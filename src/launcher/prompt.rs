use inquire::{InquireError, Select, Text};

use super::{Launcher, LauncherError};

/// Terminal select list for use without a graphical menu program.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptLauncher;

impl Launcher for PromptLauncher {
    fn show(&self, options: &[String], prompt: &str) -> Result<String, LauncherError> {
        if options.is_empty() {
            return Text::new(prompt).prompt().map_err(map_error);
        }
        Select::new(prompt, options.to_vec())
            .with_page_size(15)
            .prompt()
            .map_err(map_error)
    }
}

fn map_error(error: InquireError) -> LauncherError {
    match error {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            LauncherError::Cancelled
        }
        InquireError::IO(e) => LauncherError::Io(e),
        other => LauncherError::Failed {
            program: "prompt".to_string(),
            code: None,
            stderr: other.to_string(),
        },
    }
}
