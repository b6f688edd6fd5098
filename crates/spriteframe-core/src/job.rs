//! The render job that runs on the worker thread.

use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::geometry::{orbit, orbit_step, CameraPose, Vec3};
use crate::host::{Action, Host, SceneObject};
use crate::layout;

/// Cooperative stop flag shared between the controller and its worker.
///
/// The worker checks the flag before each action and before each angle.
/// A render already in progress always completes.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Creates a cleared flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the worker to stop at its next check.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress notices emitted by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    /// An action's angle loop is starting.
    ActionStarted { action: String },
    /// A direction is about to be rendered.
    DirectionStarted { action: String, direction: u32 },
    /// A direction finished rendering into `output_dir`.
    DirectionRendered {
        action: String,
        direction: u32,
        output_dir: PathBuf,
    },
}

impl std::fmt::Display for JobEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobEvent::ActionStarted { action } => write!(f, "Rendering action {}...", action),
            JobEvent::DirectionStarted { direction, .. } => {
                write!(f, "Rendering direction {}...", direction)
            }
            JobEvent::DirectionRendered {
                action,
                direction,
                output_dir,
            } => write!(
                f,
                "Rendered {} direction {} into {}",
                action,
                direction,
                output_dir.display()
            ),
        }
    }
}

/// What a job has done so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSummary {
    /// Actions whose every direction was rendered.
    pub actions_completed: Vec<String>,
    /// Direction folders created.
    pub directions_created: usize,
    /// Calls made to the renderer.
    pub render_calls: usize,
}

/// How the worker loop ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Termination {
    Completed,
    Cancelled,
}

/// Everything the worker needs, captured once when the job starts.
#[derive(Debug, Clone)]
pub(crate) struct JobPlan {
    pub output_root: PathBuf,
    pub actions: Vec<Action>,
    pub selection: Vec<SceneObject>,
    pub rotation_angles: u32,
    pub yaw_correction: f64,
    pub reset_each_action: bool,
    pub camera_home: Vec3,
}

/// Runs the action × angle loop against `host`.
///
/// Progress is recorded in `summary` as it happens, so it stays accurate
/// when the loop fails or unwinds part way.
pub(crate) fn run_job<H: Host>(
    host: &mut H,
    plan: &JobPlan,
    stop: &StopHandle,
    events: &Sender<JobEvent>,
    summary: &mut JobSummary,
) -> CoreResult<Termination> {
    let step = orbit_step(plan.rotation_angles);

    for action in &plan.actions {
        if stop.is_stop_requested() {
            return Ok(Termination::Cancelled);
        }

        log::info!("Rendering action {}...", action.name);
        emit(events, JobEvent::ActionStarted {
            action: action.name.clone(),
        });

        let (start, end) = action.frame_bounds();
        host.set_frame_range(start, end).map_err(CoreError::host)?;

        if plan.reset_each_action {
            host.set_camera_pose(CameraPose::aimed_at_origin(plan.camera_home))
                .map_err(CoreError::host)?;
        }

        remove_stale_dir(&layout::action_dir(&plan.output_root, &action.name))?;

        for direction in 0..plan.rotation_angles {
            if stop.is_stop_requested() {
                return Ok(Termination::Cancelled);
            }

            log::info!("Rendering direction {}...", direction);
            emit(events, JobEvent::DirectionStarted {
                action: action.name.clone(),
                direction,
            });

            let dir = layout::direction_dir(&plan.output_root, &action.name, direction);
            if !dir.exists() {
                std::fs::create_dir_all(&dir).map_err(|e| CoreError::CreateDirFailed {
                    path: dir.clone(),
                    source: e,
                })?;
                summary.directions_created += 1;
            }

            for object in &plan.selection {
                host.bind_action(&object.name, &action.name)
                    .map_err(CoreError::host)?;
            }

            let location = host.camera_location().map_err(CoreError::host)?;
            host.set_camera_pose(orbit(location, step, plan.yaw_correction))
                .map_err(CoreError::host)?;

            host.set_output_template(&layout::frame_template(&dir))
                .map_err(CoreError::host)?;

            summary.render_calls += 1;
            host.render_animation().map_err(CoreError::host)?;

            emit(events, JobEvent::DirectionRendered {
                action: action.name.clone(),
                direction,
                output_dir: dir,
            });
        }

        summary.actions_completed.push(action.name.clone());
    }

    Ok(Termination::Completed)
}

fn remove_stale_dir(path: &Path) -> CoreResult<()> {
    if path.exists() {
        log::debug!("Removing stale output {}", path.display());
        std::fs::remove_dir_all(path).map_err(|e| CoreError::RemoveDirFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

fn emit(events: &Sender<JobEvent>, event: JobEvent) {
    // The controller may have gone away; progress is best effort.
    let _ = events.send(event);
}
