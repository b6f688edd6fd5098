//! SpriteFrame CLI - Command-line interface for turntable sprite rendering
//!
//! This binary renders every animation action of a Blender project from
//! evenly spaced camera angles around the origin.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

// Use modules from the library crate
use spriteframe_cli::commands::{self, BlenderOptions};

/// SpriteFrame - Turntable Sprite Frame Generator
#[derive(Parser)]
#[command(name = "spriteframe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the Blender executable (default: BLENDER_PATH, then PATH)
    #[arg(long, global = true)]
    blender: Option<String>,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a spriteframe.json for a project with every action enabled
    Init {
        /// Path to the .blend project
        project: String,

        /// Config file path (default: spriteframe.json beside the project)
        #[arg(short, long)]
        config: Option<String>,

        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the actions, objects, camera and render settings of a project
    Inspect {
        /// Path to the .blend project
        project: String,

        /// Output the scene description as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply resolution, fps and frame step, and aim the camera at the origin
    ApplySettings {
        /// Path to the .blend project
        project: String,

        /// Config file path (default: spriteframe.json beside the project)
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Render every included action from every camera angle
    Render {
        /// Path to the .blend project
        project: String,

        /// Config file path (default: spriteframe.json beside the project)
        #[arg(short, long)]
        config: Option<String>,

        /// Object to animate instead of the saved selection (repeatable)
        #[arg(long = "object")]
        objects: Vec<String>,

        /// Walk the job without rendering anything
        #[arg(long)]
        dry_run: bool,

        /// Timeout for a single render call, in seconds
        #[arg(long)]
        render_timeout: Option<u64>,
    },

    /// Replace the compositor graph with the pixel-art node graph
    Composite {
        /// Path to the .blend project
        project: String,

        /// Config file path (default: spriteframe.json beside the project)
        #[arg(short, long)]
        config: Option<String>,

        /// Pixel block size (overrides the config)
        #[arg(long)]
        pixel_size: Option<f64>,

        /// Number of color levels (overrides the config)
        #[arg(long)]
        palette_size: Option<f64>,

        /// Delete existing compositor nodes without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Check system dependencies
    Doctor,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut options = BlenderOptions {
        blender: cli.blender,
        render_timeout_secs: None,
    };

    let result = match cli.command {
        Commands::Init {
            project,
            config,
            force,
        } => commands::init::run(&project, config.as_deref(), force, &options),
        Commands::Inspect { project, json } => commands::inspect::run(&project, json, &options),
        Commands::ApplySettings { project, config } => {
            commands::apply_settings::run(&project, config.as_deref(), &options)
        }
        Commands::Render {
            project,
            config,
            objects,
            dry_run,
            render_timeout,
        } => {
            options.render_timeout_secs = render_timeout;
            commands::render::run(&project, config.as_deref(), &objects, dry_run, &options)
        }
        Commands::Composite {
            project,
            config,
            pixel_size,
            palette_size,
            yes,
        } => commands::composite::run(
            &project,
            config.as_deref(),
            pixel_size,
            palette_size,
            yes,
            &options,
        ),
        Commands::Doctor => commands::doctor::run(&options),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_render() {
        let cli = Cli::try_parse_from([
            "spriteframe",
            "render",
            "hero.blend",
            "--object",
            "Armature",
            "--object",
            "Sword",
            "--dry-run",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Render {
                project,
                objects,
                dry_run,
                config,
                render_timeout,
            } => {
                assert_eq!(project, "hero.blend");
                assert_eq!(objects, vec!["Armature".to_string(), "Sword".to_string()]);
                assert!(dry_run);
                assert!(config.is_none());
                assert!(render_timeout.is_none());
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn test_cli_parses_composite_overrides() {
        let cli = Cli::try_parse_from([
            "spriteframe",
            "composite",
            "hero.blend",
            "--pixel-size",
            "8",
            "--palette-size",
            "16",
            "--yes",
        ])
        .unwrap();
        match cli.command {
            Commands::Composite {
                pixel_size,
                palette_size,
                yes,
                ..
            } => {
                assert_eq!(pixel_size, Some(8.0));
                assert_eq!(palette_size, Some(16.0));
                assert!(yes);
            }
            _ => panic!("expected composite"),
        }
    }

    #[test]
    fn test_cli_global_blender_flag() {
        let cli = Cli::try_parse_from(["spriteframe", "doctor", "--blender", "/opt/blender"])
            .unwrap();
        assert_eq!(cli.blender.as_deref(), Some("/opt/blender"));
        assert!(matches!(cli.command, Commands::Doctor));
    }

    #[test]
    fn test_cli_requires_project() {
        assert!(Cli::try_parse_from(["spriteframe", "render"]).is_err());
    }
}
