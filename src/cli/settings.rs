//! The `settings` command, which manages the user's `settings.toml`
use crate::settings::{Settings, get_settings_file_path};
use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;
use std::path::Path;

/// What to do with the settings file
#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Open the settings file in a text editor, writing a commented-out default one first if needed
    Edit,
    /// Print the location the settings file is loaded from
    Path,
    /// Print a commented-out settings file listing every setting and its default
    DumpDefault,
}

impl SettingsSubcommands {
    /// Run the subcommand
    pub fn execute(self) -> Result<()> {
        let file_path = get_settings_file_path();
        match self {
            Self::Edit => {
                if write_default_settings(&file_path)? {
                    println!("Created settings file {}", file_path.display());
                }
                println!("Editing {}", file_path.display());
                edit::edit_file(&file_path)
                    .with_context(|| format!("Could not edit {}", file_path.display()))?;
            }
            Self::Path => println!("{}", file_path.display()),
            Self::DumpDefault => print!("{}", Settings::default_file_contents()?),
        }

        Ok(())
    }
}

/// Write the default settings to `file_path` unless a file is already there.
///
/// Returns whether a file was written.
fn write_default_settings(file_path: &Path) -> Result<bool> {
    if file_path.is_file() {
        return Ok(false);
    }

    if let Some(config_dir) = file_path.parent() {
        fs::create_dir_all(config_dir).with_context(|| {
            format!("Could not create config directory {}", config_dir.display())
        })?;
    }
    fs::write(file_path, Settings::default_file_contents()?)
        .with_context(|| format!("Could not write settings file {}", file_path.display()))?;

    Ok(true)
}
