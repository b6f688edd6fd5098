//! Apply-settings command implementation
//!
//! Copies the configured resolution, fps and frame step into the project and
//! aims the active camera at the world origin.

use anyhow::Result;
use colored::Colorize;
use spriteframe_core::apply_render_settings;
use std::path::Path;
use std::process::ExitCode;

use super::{open_project, BlenderOptions};
use crate::input::{config_path, load_config};

/// Run the apply-settings command
///
/// # Arguments
/// * `project` - Path to the .blend project
/// * `config` - Optional config path
/// * `options` - Blender lookup options
///
/// # Returns
/// Exit code: 0 on success
pub fn run(project: &str, config: Option<&str>, options: &BlenderOptions) -> Result<ExitCode> {
    let project = Path::new(project);
    let config = load_config(&config_path(project, config))?;
    let mut host = open_project(project, options)?;

    let pose = apply_render_settings(&mut host, &config)?;
    host.save()?;

    let settings = config.render_settings();
    println!(
        "{} Applied {}x{} @ {} fps, frame step {}",
        "SUCCESS".green().bold(),
        settings.resolution[0],
        settings.resolution[1],
        settings.fps,
        settings.frame_step
    );
    println!(
        "  {} camera at ({:.3}, {:.3}, {:.3}) aimed at the origin",
        "->".cyan(),
        pose.location.x,
        pose.location.y,
        pose.location.z
    );
    Ok(ExitCode::SUCCESS)
}
