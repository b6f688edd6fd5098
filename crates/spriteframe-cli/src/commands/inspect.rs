//! Inspect command implementation
//!
//! Prints the actions, objects, camera and render settings of a project.

use anyhow::Result;
use colored::Colorize;
use spriteframe_backend_blender::SceneInfo;
use std::path::Path;
use std::process::ExitCode;

use super::{open_project, BlenderOptions};

/// Run the inspect command
///
/// # Arguments
/// * `project` - Path to the .blend project
/// * `json` - Print the scene description as JSON
/// * `options` - Blender lookup options
pub fn run(project: &str, json: bool, options: &BlenderOptions) -> Result<ExitCode> {
    let host = open_project(Path::new(project), options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(host.scene())?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} {}", "Project:".cyan().bold(), host.project().display());
    if let Some(version) = host.blender_version() {
        println!("{} {}", "Blender:".cyan().bold(), version);
    }
    println!();
    print_scene(host.scene());
    Ok(ExitCode::SUCCESS)
}

fn print_scene(scene: &SceneInfo) {
    println!("{} ({})", "Actions:".bold(), scene.actions.len());
    for action in &scene.actions {
        let (start, end) = action.frame_bounds();
        println!("  {} {} [{}..{}]", "->".green(), action.name, start, end);
    }
    println!();

    println!("{} ({})", "Objects:".bold(), scene.objects.len());
    for object in &scene.objects {
        let marker = if object.selected {
            "sel".green()
        } else {
            "   ".normal()
        };
        let animated = if object.has_animation_data {
            "animated".normal()
        } else {
            "no animation data".dimmed()
        };
        println!("  {} {} ({})", marker, object.name, animated);
    }
    println!();

    match &scene.camera {
        Some(camera) => println!(
            "{} {} at ({:.3}, {:.3}, {:.3})",
            "Camera:".bold(),
            camera.name,
            camera.location.x,
            camera.location.y,
            camera.location.z
        ),
        None => println!("{} {}", "Camera:".bold(), "none".yellow()),
    }
    if let Some(render) = &scene.render {
        println!(
            "{} {}x{} @ {} fps, frame step {}",
            "Render:".bold(),
            render.resolution[0],
            render.resolution[1],
            render.fps,
            render.frame_step
        );
    }
}
