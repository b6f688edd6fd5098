//! Composite command implementation
//!
//! Replaces the project's compositor graph with the pixel-art graph. The
//! rebuild deletes every existing node, so it asks first unless `--yes`.

use anyhow::Result;
use colored::Colorize;
use spriteframe_core::composite::CONFIRM_MESSAGE;
use spriteframe_core::{confirm_and_generate, generate_composite_nodes, PixelArtSettings};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;

use super::{open_project, BlenderOptions};
use crate::input::{config_path, load_config};

/// Run the composite command
///
/// # Arguments
/// * `project` - Path to the .blend project
/// * `config` - Optional config path
/// * `pixel_size` - Override for the pixelation size
/// * `palette_size` - Override for the posterize level count
/// * `yes` - Skip the confirmation prompt
/// * `options` - Blender lookup options
pub fn run(
    project: &str,
    config: Option<&str>,
    pixel_size: Option<f64>,
    palette_size: Option<f64>,
    yes: bool,
    options: &BlenderOptions,
) -> Result<ExitCode> {
    let project = Path::new(project);
    let config = load_config(&config_path(project, config))?;
    let settings = PixelArtSettings::new(
        pixel_size.unwrap_or(config.composite.pixel_size),
        palette_size.unwrap_or(config.composite.color_palette_size),
    );
    settings.validate()?;

    let mut host = open_project(project, options)?;
    let graph = if yes {
        Some(generate_composite_nodes(&mut host, &settings)?)
    } else {
        confirm_and_generate(&mut host, &settings, prompt)?
    };

    match graph {
        Some(graph) => {
            println!(
                "{} Built {} nodes and {} links (pixel size {}, palette size {})",
                "SUCCESS".green().bold(),
                graph.nodes.len(),
                graph.links.len(),
                settings.pixel_size,
                settings.color_palette_size
            );
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("{}", "Compositor left unchanged.".yellow());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn prompt(message: &str) -> bool {
    print!("{} [y/N] ", message);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(_) => is_affirmative(&line),
        Err(_) => false,
    }
}

/// Whether a prompt answer means yes. Anything else, including an empty
/// answer, means no.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative("y\n"));
        assert!(is_affirmative("  YES "));
        assert!(!is_affirmative("\n"));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative("yeah"));
    }

    #[test]
    fn test_confirm_message_warns_about_deletion() {
        assert!(CONFIRM_MESSAGE.starts_with("Delete all composite nodes?"));
    }
}
