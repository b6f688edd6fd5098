//! Render command implementation
//!
//! Renders every included action at every camera angle. The job runs on a
//! worker thread; this side ticks every 100 ms to report progress and treats
//! Ctrl-C as the abort input.

use anyhow::{Context, Result};
use colored::Colorize;
use spriteframe_backend_blender::BlenderHost;
use spriteframe_core::controller::DEFAULT_TICK_INTERVAL;
use spriteframe_core::{
    CodedError, CoreError, Host, JobEvent, JobOutcome, MemoryHost, RenderConfig,
    RenderController, Tick,
};
use std::path::Path;
use std::process::ExitCode;

use super::{open_project, BlenderOptions};
use crate::input::{config_path, load_config};

/// Exit code for a job cancelled by the user.
pub const EXIT_CANCELLED: u8 = 130;

/// Run the render command
///
/// # Arguments
/// * `project` - Path to the .blend project
/// * `config` - Optional config path (default: `spriteframe.json` beside the project)
/// * `objects` - Object names to use instead of the saved selection
/// * `dry_run` - Walk the job against an in-memory copy of the scene
/// * `options` - Blender lookup options
///
/// # Returns
/// Exit code: 0 completed, 1 precondition failed, 2 job failed, 130 cancelled
pub fn run(
    project: &str,
    config: Option<&str>,
    objects: &[String],
    dry_run: bool,
    options: &BlenderOptions,
) -> Result<ExitCode> {
    let project = Path::new(project);
    let config_file = config_path(project, config);
    let mut config = load_config(&config_file)?;

    let mut host = open_project(project, options)?;
    if !objects.is_empty() {
        host = host.with_selection(objects.iter().cloned())?;
    }

    let output_root = config.resolved_output_path(host.project_dir());
    println!("{} {}", "Project:".cyan().bold(), project.display());
    println!("{} {}", "Output root:".cyan().bold(), output_root.display());

    if dry_run {
        let preview = tempfile::tempdir().context("failed to create dry-run folder")?;
        config.output_path = preview.path().to_path_buf();
        println!("{}", "Dry run: nothing will be rendered".yellow());
        let controller = RenderController::new(memory_copy(&host)?);
        return drive(controller, &config);
    }

    config.output_path = output_root;
    drive(RenderController::new(host), &config)
}

/// In-memory stand-in with the same actions, selection and camera.
fn memory_copy(host: &BlenderHost) -> Result<MemoryHost> {
    let mut memory = MemoryHost::new(host.camera_location()?);
    for action in host.actions()? {
        memory = memory.with_action(action);
    }
    for object in host.selected_objects()? {
        memory = memory.with_selected(object);
    }
    Ok(memory)
}

fn drive<H: Host>(mut controller: RenderController<H>, config: &RenderConfig) -> Result<ExitCode> {
    if let Err(e) = controller.start(config) {
        print_start_error(&e);
        return Ok(exit_code_for_start_error(&e));
    }
    println!("{}", "Rendering started.".green().bold());
    println!("{}", "Press Ctrl-C to cancel.".dimmed());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start tick runtime")?;
    let outcome = runtime.block_on(watch(&mut controller))?;

    print_outcome(&outcome);
    Ok(exit_code_for_outcome(&outcome))
}

/// Ticks the controller until the job ends or Ctrl-C cancels it.
async fn watch<H: Host>(controller: &mut RenderController<H>) -> Result<JobOutcome> {
    let mut ticker = tokio::time::interval(DEFAULT_TICK_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                println!();
                println!("{}", "Cancel requested; waiting for the current render to finish...".yellow());
                return Ok(controller.cancel()?);
            }
            _ = ticker.tick() => {
                match controller.poll()? {
                    Tick::Running { events } => events.iter().for_each(print_event),
                    Tick::Finished { events, outcome } => {
                        events.iter().for_each(print_event);
                        return Ok(outcome);
                    }
                }
            }
        }
    }
}

fn print_event(event: &JobEvent) {
    match event {
        JobEvent::ActionStarted { .. } => println!("{} {}", "->".cyan(), event),
        JobEvent::DirectionStarted { .. } => println!("   {}", event.to_string().dimmed()),
        JobEvent::DirectionRendered { output_dir, .. } => {
            println!("   {} {}", "ok".green(), output_dir.display())
        }
    }
}

fn print_start_error(err: &CoreError) {
    println!("{} {} {}", "ERROR".red().bold(), format!("[{}]", err.code()).dimmed(), err);
}

fn print_outcome(outcome: &JobOutcome) {
    let summary = outcome.summary();
    match outcome {
        JobOutcome::Completed(_) => println!(
            "{} Rendering finished: {} action(s), {} render(s)",
            "SUCCESS".green().bold(),
            summary.actions_completed.len(),
            summary.render_calls
        ),
        JobOutcome::Cancelled(_) => println!(
            "{} Rendering canceled after {} render(s); partial output kept",
            "CANCELED".yellow().bold(),
            summary.render_calls
        ),
        JobOutcome::Failed { error, .. } => println!(
            "{} {} Rendering failed after {} render(s): {}",
            "FAILED".red().bold(),
            format!("[{}]", error.code()).dimmed(),
            summary.render_calls,
            error
        ),
    }
}

/// Exit code for a job that never started.
pub fn exit_code_for_start_error(err: &CoreError) -> ExitCode {
    if err.is_precondition() {
        ExitCode::from(1)
    } else {
        ExitCode::from(2)
    }
}

/// Exit code for a finished job.
pub fn exit_code_for_outcome(outcome: &JobOutcome) -> ExitCode {
    match outcome {
        JobOutcome::Completed(_) => ExitCode::SUCCESS,
        JobOutcome::Cancelled(_) => ExitCode::from(EXIT_CANCELLED),
        JobOutcome::Failed { .. } => ExitCode::from(2),
    }
}
