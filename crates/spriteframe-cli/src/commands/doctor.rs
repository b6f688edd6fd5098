//! Doctor command implementation
//!
//! Checks that Blender can be found and reports its version.

use anyhow::Result;
use colored::Colorize;
use spriteframe_backend_blender::Orchestrator;
use std::process::{Command, ExitCode};

use super::BlenderOptions;

/// Run the doctor command
///
/// # Returns
/// Exit code: 0 if all checks pass, 1 if any fail
pub fn run(options: &BlenderOptions) -> Result<ExitCode> {
    println!("{}", "SpriteFrame Doctor".cyan().bold());
    println!("{}", "==================".cyan());
    println!();

    println!("{}", "Versions:".bold());
    println!(
        "  {} spriteframe v{}",
        "->".green(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("{}", "Dependencies:".bold());
    let orchestrator = Orchestrator::with_config(options.orchestrator_config());
    let all_ok = match orchestrator.find_blender() {
        Ok(path) => match blender_version(&path) {
            Ok(version) => {
                println!(
                    "  {} Blender {} ({})",
                    "ok".green(),
                    version,
                    path.display()
                );
                true
            }
            Err(e) => {
                println!("  {} Blender check failed: {}", "!!".red(), e);
                false
            }
        },
        Err(e) => {
            println!("  {} {}", "!!".red(), e);
            println!(
                "     {}",
                "Set BLENDER_PATH or pass --blender to point at the executable.".dimmed()
            );
            println!(
                "     {}",
                "Install from https://www.blender.org/download/".dimmed()
            );
            false
        }
    };

    println!();
    if all_ok {
        println!("{} All checks passed!", "SUCCESS".green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "{} Some checks failed. See above for details.",
            "WARNING".yellow().bold()
        );
        Ok(ExitCode::from(1))
    }
}

fn blender_version(path: &std::path::Path) -> Result<String> {
    let output = Command::new(path).arg("--version").output()?;
    if !output.status.success() {
        anyhow::bail!("Blender exited with status: {}", output.status);
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_blender_version(&stdout).unwrap_or_else(|| "unknown".to_string()))
}

fn parse_blender_version(output: &str) -> Option<String> {
    output
        .lines()
        .next()
        .and_then(|line| line.strip_prefix("Blender "))
        .map(|v| v.trim().to_string())
}
