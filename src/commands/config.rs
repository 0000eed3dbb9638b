//! Open the configuration file in the user's preferred editor.

use anyhow::anyhow;
use std::process::Command;

use crate::config::{config_path, VmemoConfig};

/// Opens the configuration file in `$EDITOR`, falling back to nano then vim.
///
/// The config file is created with defaults first if it does not exist yet.
///
/// # Errors
/// - If the config path cannot be determined
/// - If no editor can be launched
pub fn handle_config() -> Result<(), anyhow::Error> {
    let path = config_path()?;

    if !path.exists() {
        VmemoConfig::default().save()?;
        tracing::info!("Created default config at {}", path.display());
    }

    let editors: Vec<String> = std::env::var("EDITOR")
        .ok()
        .into_iter()
        .chain(["nano".to_string(), "vim".to_string()])
        .collect();

    for editor in &editors {
        match Command::new(editor).arg(&path).status() {
            Ok(status) if status.success() => {
                tracing::info!("Config edited with {}", editor);
                return Ok(());
            }
            Ok(status) => {
                return Err(anyhow!("Editor {} exited with status {}", editor, status));
            }
            Err(_) => continue,
        }
    }

    Err(anyhow!(
        "No editor found. Set $EDITOR or install nano/vim. Config file: {}",
        path.display()
    ))
}
