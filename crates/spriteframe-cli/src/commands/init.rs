//! Init command implementation
//!
//! Writes a `spriteframe.json` for a project with every action enabled.

use anyhow::{bail, Result};
use colored::Colorize;
use spriteframe_core::{ActionSelection, Host, RenderConfig};
use std::path::Path;
use std::process::ExitCode;

use super::{open_project, BlenderOptions};
use crate::input::{config_path, save_config};

/// Run the init command
///
/// # Arguments
/// * `project` - Path to the .blend project
/// * `config` - Optional config path
/// * `force` - Overwrite an existing configuration
/// * `options` - Blender lookup options
pub fn run(
    project: &str,
    config: Option<&str>,
    force: bool,
    options: &BlenderOptions,
) -> Result<ExitCode> {
    let project = Path::new(project);
    let path = config_path(project, config);
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let host = open_project(project, options)?;
    let actions = host.actions()?;
    let mut config = initial_config(&actions);
    if let Some(render) = host.scene().render {
        config.resolution = render.resolution;
        config.fps = render.fps;
        config.frame_step = render.frame_step;
    }
    save_config(&path, &config)?;

    println!("{} Wrote {}", "SUCCESS".green().bold(), path.display());
    for action in &actions {
        println!("  {} {}", "->".green(), action.name);
    }
    Ok(ExitCode::SUCCESS)
}

/// Configuration listing every action as enabled.
pub fn initial_config(actions: &[spriteframe_core::Action]) -> RenderConfig {
    RenderConfig {
        actions: ActionSelection::from_actions(actions, true),
        ..RenderConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use spriteframe_core::Action;

    #[test]
    fn test_initial_config_lists_actions() {
        let actions = vec![Action::new("Idle", 1.0, 12.0), Action::new("Walk", 1.0, 24.0)];
        let config = initial_config(&actions);
        assert_eq!(config.output_path, std::path::PathBuf::from("sprites"));
        assert_eq!(config.actions.flags.len(), 2);
        assert!(config.actions.is_included("Idle"));
        assert!(config.actions.is_included("Walk"));
        assert!(config.validate().is_ok());
    }
}
