use std::path::PathBuf;
use std::process::ExitCode;

use ql::config_file::Config;

/// Write the embedded default config to `path` or the user config location.
///
/// # Errors
///
/// Returns an error if the file exists and `force` is not set, or it cannot be written.
pub fn run(path: Option<&str>, force: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let path = match path {
        Some(path) => PathBuf::from(path),
        None => Config::default_path()?,
    };
    Config::write_default(&path, force)?;
    println!("Wrote default config to {}", path.display());
    Ok(ExitCode::SUCCESS)
}
