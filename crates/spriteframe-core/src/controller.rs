//! Batch render controller.
//!
//! The controller validates a job, hands the host to a worker thread for the
//! duration of the job and gets it back when the job ends. While a job is
//! running the worker is the only code that can touch scene state; the
//! controlling side only polls, or cancels and joins.
//!
//! ```text
//! Idle -> Validating -> Running -> Completed | Cancelled | Failed
//!              \-> Failed (precondition)
//! ```

use crossbeam_channel::{bounded, unbounded, Receiver, TryRecvError};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::RenderConfig;
use crate::error::{CoreError, CoreResult};
use crate::host::Host;
use crate::job::{run_job, JobEvent, JobPlan, JobSummary, StopHandle, Termination};
use crate::layout::check_action_name;
use crate::settings::apply_render_settings;

/// Interval between two polls of a running job.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Lifecycle state of the controller's current or last job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Validating,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl JobState {
    /// Whether the state ends a job.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Cancelled | JobState::Failed
        )
    }
}

/// Terminal result of a job.
#[derive(Debug)]
pub enum JobOutcome {
    /// Every included action was rendered at every angle.
    Completed(JobSummary),
    /// The stop flag was observed. Output written so far is kept.
    Cancelled(JobSummary),
    /// A host or filesystem error ended the job.
    Failed {
        summary: JobSummary,
        error: CoreError,
    },
}

impl JobOutcome {
    /// State this outcome leaves the controller in.
    pub fn state(&self) -> JobState {
        match self {
            JobOutcome::Completed(_) => JobState::Completed,
            JobOutcome::Cancelled(_) => JobState::Cancelled,
            JobOutcome::Failed { .. } => JobState::Failed,
        }
    }

    /// Work done before the job ended.
    pub fn summary(&self) -> &JobSummary {
        match self {
            JobOutcome::Completed(summary) | JobOutcome::Cancelled(summary) => summary,
            JobOutcome::Failed { summary, .. } => summary,
        }
    }

    /// The failure cause, if the job failed.
    pub fn error(&self) -> Option<&CoreError> {
        match self {
            JobOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Whether the job completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, JobOutcome::Completed(_))
    }
}

/// Result of one poll tick.
#[derive(Debug)]
pub enum Tick {
    /// The worker is still busy.
    Running { events: Vec<JobEvent> },
    /// The job reached a terminal state on this tick.
    Finished {
        events: Vec<JobEvent>,
        outcome: JobOutcome,
    },
}

/// Final message from the worker: the host it borrowed and how it ended.
/// The host is dropped when the loop panicked, since its state is unknown.
struct WorkerReport<H> {
    host: Option<H>,
    summary: JobSummary,
    result: CoreResult<Termination>,
}

/// In-flight job state.
struct RenderJob<H> {
    stop: StopHandle,
    worker: Option<JoinHandle<()>>,
    events: Receiver<JobEvent>,
    report: Receiver<WorkerReport<H>>,
    output_root: PathBuf,
    started_at: Instant,
}

/// Drives render jobs against a host, one job at a time.
pub struct RenderController<H: Host> {
    host: Option<H>,
    state: JobState,
    job: Option<RenderJob<H>>,
    tick_interval: Duration,
}

impl<H: Host> RenderController<H> {
    /// Creates an idle controller owning `host`.
    pub fn new(host: H) -> Self {
        Self {
            host: Some(host),
            state: JobState::Idle,
            job: None,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    /// Sets the interval [`run`](Self::run) sleeps between polls.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Current state.
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Whether a job is running.
    pub fn is_running(&self) -> bool {
        self.state == JobState::Running
    }

    /// The host, unless a job currently owns it.
    pub fn host(&self) -> Option<&H> {
        self.host.as_ref()
    }

    /// Mutable access to the host, unless a job currently owns it.
    pub fn host_mut(&mut self) -> Option<&mut H> {
        self.host.as_mut()
    }

    /// Handle to the running job's stop flag.
    pub fn stop_handle(&self) -> Option<StopHandle> {
        self.job.as_ref().map(|job| job.stop.clone())
    }

    /// Output root of the running job.
    pub fn output_root(&self) -> Option<&std::path::Path> {
        self.job.as_ref().map(|job| job.output_root.as_path())
    }

    /// Takes the host back. Cancels and joins a running job first.
    pub fn into_host(mut self) -> Option<H> {
        if self.job.is_some() {
            let _ = self.cancel();
        }
        self.host.take()
    }

    /// Validates the job and starts the worker.
    ///
    /// Fails without side effects when a job is already running, the config
    /// is out of range, nothing is selected, a selected object has no
    /// animation data, or no action is included. On success the render
    /// settings are applied, the output root is created and the worker owns
    /// the host until the job ends.
    pub fn start(&mut self, config: &RenderConfig) -> CoreResult<()> {
        if self.state == JobState::Running {
            return Err(CoreError::JobAlreadyRunning);
        }
        let mut host = self.host.take().ok_or(CoreError::HostUnavailable)?;
        self.state = JobState::Validating;

        let plan = match prepare(&mut host, config) {
            Ok(plan) => plan,
            Err(e) => {
                log::error!("{}", e);
                self.host = Some(host);
                self.state = JobState::Failed;
                return Err(e);
            }
        };

        log::info!(
            "Rendering started: {} action(s) x {} direction(s) into {}",
            plan.actions.len(),
            plan.rotation_angles,
            plan.output_root.display()
        );

        let stop = StopHandle::new();
        let (event_tx, event_rx) = unbounded();
        let (report_tx, report_rx) = bounded(1);
        let worker_stop = stop.clone();
        let output_root = plan.output_root.clone();

        let worker = thread::Builder::new()
            .name("spriteframe-render".to_string())
            .spawn(move || {
                let mut host = host;
                let mut summary = JobSummary::default();
                let run = panic::catch_unwind(AssertUnwindSafe(|| {
                    run_job(&mut host, &plan, &worker_stop, &event_tx, &mut summary)
                }));
                let report = match run {
                    Ok(result) => WorkerReport {
                        host: Some(host),
                        summary,
                        result,
                    },
                    Err(_) => {
                        log::error!(
                            "Render worker panicked after {} render(s); the host is dropped",
                            summary.render_calls
                        );
                        WorkerReport {
                            host: None,
                            summary,
                            result: Err(CoreError::WorkerPanicked),
                        }
                    }
                };
                let _ = report_tx.send(report);
            });

        let worker = match worker {
            Ok(handle) => handle,
            Err(e) => {
                // The closure, and the host with it, is gone.
                self.state = JobState::Failed;
                return Err(CoreError::host(e));
            }
        };

        self.job = Some(RenderJob {
            stop,
            worker: Some(worker),
            events: event_rx,
            report: report_rx,
            output_root,
            started_at: Instant::now(),
        });
        self.state = JobState::Running;
        Ok(())
    }

    /// One tick: collects progress and detects the end of the job.
    pub fn poll(&mut self) -> CoreResult<Tick> {
        let job = self.job.as_mut().ok_or(CoreError::NoActiveJob)?;

        // Check the report before draining events: every event is sent
        // before the report, so none can be missed.
        let report = job.report.try_recv();
        let events: Vec<JobEvent> = job.events.try_iter().collect();

        match report {
            Ok(report) => {
                let outcome = self.finish(Some(report));
                Ok(Tick::Finished { events, outcome })
            }
            Err(TryRecvError::Empty) => Ok(Tick::Running { events }),
            Err(TryRecvError::Disconnected) => {
                let outcome = self.finish(None);
                Ok(Tick::Finished { events, outcome })
            }
        }
    }

    /// Requests a stop and blocks until the worker exits.
    ///
    /// The render in progress, if any, completes first. Returns the job's
    /// terminal outcome, which is `Completed` if the worker finished before
    /// it saw the request.
    pub fn cancel(&mut self) -> CoreResult<JobOutcome> {
        let job = self.job.as_mut().ok_or(CoreError::NoActiveJob)?;
        job.stop.request_stop();
        if let Some(worker) = job.worker.take() {
            let _ = worker.join();
        }
        let report = job.report.try_recv().ok();
        Ok(self.finish(report))
    }

    /// Polls at the tick interval until the job ends.
    ///
    /// `abort` is checked every tick; when it returns true the job is
    /// cancelled. `on_event` sees every progress event in order.
    pub fn run(
        &mut self,
        mut abort: impl FnMut() -> bool,
        mut on_event: impl FnMut(&JobEvent),
    ) -> CoreResult<JobOutcome> {
        loop {
            if abort() {
                return self.cancel();
            }
            match self.poll()? {
                Tick::Running { events } => {
                    events.iter().for_each(&mut on_event);
                    thread::sleep(self.tick_interval);
                }
                Tick::Finished { events, outcome } => {
                    events.iter().for_each(&mut on_event);
                    return Ok(outcome);
                }
            }
        }
    }

    fn finish(&mut self, report: Option<WorkerReport<H>>) -> JobOutcome {
        let mut job = match self.job.take() {
            Some(job) => job,
            None => {
                return JobOutcome::Failed {
                    summary: JobSummary::default(),
                    error: CoreError::NoActiveJob,
                }
            }
        };

        let panicked = match job.worker.take() {
            Some(worker) => worker.join().is_err(),
            None => false,
        };

        let outcome = match report {
            Some(WorkerReport {
                host,
                summary,
                result,
            }) => {
                self.host = host;
                match result {
                    Ok(Termination::Completed) => JobOutcome::Completed(summary),
                    Ok(Termination::Cancelled) => JobOutcome::Cancelled(summary),
                    Err(error) => JobOutcome::Failed { summary, error },
                }
            }
            None => {
                if panicked {
                    log::error!("Render worker panicked; the host is lost");
                }
                JobOutcome::Failed {
                    summary: JobSummary::default(),
                    error: CoreError::WorkerPanicked,
                }
            }
        };

        let elapsed = job.started_at.elapsed();
        match &outcome {
            JobOutcome::Completed(summary) => log::info!(
                "Rendering finished: {} render(s) in {:.1}s",
                summary.render_calls,
                elapsed.as_secs_f64()
            ),
            JobOutcome::Cancelled(summary) => log::info!(
                "Rendering canceled after {} render(s)",
                summary.render_calls
            ),
            JobOutcome::Failed { error, .. } => log::error!("Rendering failed: {}", error),
        }

        self.state = outcome.state();
        outcome
    }
}

impl<H: Host> Drop for RenderController<H> {
    fn drop(&mut self) {
        if let Some(job) = self.job.as_mut() {
            job.stop.request_stop();
            if let Some(worker) = job.worker.take() {
                let _ = worker.join();
            }
        }
    }
}

/// Validates the job and prepares the host. Nothing touches the filesystem
/// until every precondition holds.
fn prepare<H: Host>(host: &mut H, config: &RenderConfig) -> CoreResult<JobPlan> {
    config.validate()?;

    let selection = host.selected_objects().map_err(CoreError::host)?;
    if selection.is_empty() {
        return Err(CoreError::NoSelection);
    }
    if let Some(object) = selection.iter().find(|o| !o.has_animation_data) {
        return Err(CoreError::MissingAnimationData {
            object: object.name.clone(),
        });
    }

    let all_actions = host.actions().map_err(CoreError::host)?;
    for name in config.actions.unknown(&all_actions) {
        log::warn!("Action '{}' is configured but not in the project", name);
    }
    let actions = config.actions.resolve(&all_actions);
    if actions.is_empty() {
        return Err(CoreError::NoActionSelected);
    }
    for action in &actions {
        check_action_name(&action.name)?;
    }

    apply_render_settings(host, config)?;
    let camera_home = host.camera_location().map_err(CoreError::host)?;

    let output_root = config.output_path.clone();
    std::fs::create_dir_all(&output_root).map_err(|e| CoreError::CreateDirFailed {
        path: output_root.clone(),
        source: e,
    })?;

    Ok(JobPlan {
        output_root,
        actions,
        selection,
        rotation_angles: config.rotation_angles,
        yaw_correction: config.camera.yaw_correction(),
        reset_each_action: config.camera.reset_each_action,
        camera_home,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ActionSelection;
    use crate::geometry::Vec3;
    use crate::host::{Action, SceneObject};
    use crate::memory::MemoryHost;

    fn host() -> MemoryHost {
        MemoryHost::new(Vec3::new(0.0, -10.0, 3.0))
            .with_action(Action::new("Idle", 1.0, 4.0))
            .with_selected(SceneObject::animated("Rig"))
    }

    #[test]
    fn test_poll_without_job() {
        let mut controller = RenderController::new(host());
        assert!(matches!(controller.poll(), Err(CoreError::NoActiveJob)));
        assert!(matches!(controller.cancel(), Err(CoreError::NoActiveJob)));
        assert_eq!(controller.state(), JobState::Idle);
    }

    #[test]
    fn test_failed_start_keeps_host() {
        let mut controller = RenderController::new(host());
        let config = RenderConfig {
            actions: ActionSelection::only(Vec::<String>::new()),
            ..RenderConfig::default()
        };
        assert!(matches!(
            controller.start(&config),
            Err(CoreError::NoActionSelected)
        ));
        assert_eq!(controller.state(), JobState::Failed);
        assert!(controller.host().is_some());
        assert!(controller.host().unwrap().settings().is_none());
    }

    #[test]
    fn test_second_start_rejected_while_running() {
        let dir = tempfile::tempdir().unwrap();
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(0);
        let host = host().with_render_hook(move |_| {
            let _ = release_rx.recv();
            Ok(())
        });
        let config = RenderConfig::default()
            .with_output_path(dir.path())
            .with_rotation_angles(1);

        let mut controller =
            RenderController::new(host).with_tick_interval(Duration::from_millis(5));
        controller.start(&config).unwrap();
        assert!(controller.is_running());
        assert!(controller.host().is_none());
        assert!(matches!(
            controller.start(&config),
            Err(CoreError::JobAlreadyRunning)
        ));

        release_tx.send(()).unwrap();
        let outcome = controller.run(|| false, |_| {}).unwrap();
        assert!(outcome.is_completed());
    }

    #[test]
    fn test_rejected_name_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let host = MemoryHost::new(Vec3::new(0.0, -10.0, 3.0))
            .with_action(Action::new("..", 1.0, 4.0))
            .with_selected(SceneObject::animated("Rig"));
        let mut controller = RenderController::new(host);
        let err = controller
            .start(&RenderConfig::default().with_output_path(dir.path().join("out")))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidActionName { .. }));
        assert!(!dir.path().join("out").exists());
    }
}
