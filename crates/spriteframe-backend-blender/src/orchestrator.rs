//! Blender subprocess orchestrator.
//!
//! This module handles spawning Blender on a project file and exchanging
//! JSON request and report files with the embedded Python entrypoint.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::error::{BlenderError, BlenderResult};
use crate::report::{BlenderReport, BlenderRequest};

const EMBEDDED_ENTRYPOINT_PY: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../blender/entrypoint.py"
));

/// Default timeout for inspection and edit runs (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Default timeout for one render run (1 hour).
pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 3600;

/// Environment variable overriding the entrypoint script.
pub const ENTRYPOINT_ENV: &str = "SPRITEFRAME_BLENDER_ENTRYPOINT";

/// What the entrypoint should do with the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlenderMode {
    /// Report actions, objects, camera and render settings.
    Inspect,
    /// Apply scene changes and save.
    Apply,
    /// Apply scene changes and render the animation.
    Render,
    /// Rebuild the compositor graph and save.
    Composite,
}

impl BlenderMode {
    /// Returns the string identifier for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlenderMode::Inspect => "inspect",
            BlenderMode::Apply => "apply",
            BlenderMode::Render => "render",
            BlenderMode::Composite => "composite",
        }
    }
}

/// Configuration for the Blender orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Path to the Blender executable.
    pub blender_path: Option<PathBuf>,
    /// Path to the Python entrypoint script.
    pub entrypoint_path: PathBuf,
    /// Timeout for inspection and edit runs.
    pub timeout: Duration,
    /// Timeout for a single render run.
    pub render_timeout: Duration,
    /// Whether to capture Blender's stderr.
    pub capture_output: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            blender_path: None,
            entrypoint_path: PathBuf::from("blender/entrypoint.py"),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            render_timeout: Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SECS),
            capture_output: true,
        }
    }
}

impl OrchestratorConfig {
    /// Creates a new config with the given entrypoint path.
    pub fn with_entrypoint(entrypoint_path: impl Into<PathBuf>) -> Self {
        Self {
            entrypoint_path: entrypoint_path.into(),
            ..Default::default()
        }
    }

    /// Sets the Blender executable path.
    pub fn blender_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.blender_path = Some(path.into());
        self
    }

    /// Sets the inspection and edit timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Sets the per-render timeout in seconds.
    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.render_timeout = Duration::from_secs(secs);
        self
    }

    fn timeout_for(&self, mode: BlenderMode) -> Duration {
        match mode {
            BlenderMode::Render => self.render_timeout,
            _ => self.timeout,
        }
    }
}

/// The Blender subprocess orchestrator.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    config: OrchestratorConfig,
}

struct ResolvedEntrypoint {
    path: PathBuf,
    _tempfile: Option<tempfile::NamedTempFile>,
}

impl Orchestrator {
    /// Creates a new orchestrator with default configuration.
    pub fn new() -> Self {
        Self {
            config: OrchestratorConfig::default(),
        }
    }

    /// Creates a new orchestrator with the given configuration.
    pub fn with_config(config: OrchestratorConfig) -> Self {
        Self { config }
    }

    /// The orchestrator's configuration.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Finds the Blender executable path.
    pub fn find_blender(&self) -> BlenderResult<PathBuf> {
        // Check config override first
        if let Some(ref path) = self.config.blender_path {
            if path.exists() {
                return Ok(path.clone());
            }
        }

        // Check BLENDER_PATH environment variable
        if let Ok(path) = std::env::var("BLENDER_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok(path);
            }
        }

        let blender_names = if cfg!(windows) {
            vec!["blender.exe", "blender"]
        } else {
            vec!["blender"]
        };

        for name in blender_names {
            if let Ok(path) = which::which(name) {
                return Ok(path);
            }
        }

        let common_paths = if cfg!(windows) {
            vec![
                "C:\\Program Files\\Blender Foundation\\Blender 4.2\\blender.exe",
                "C:\\Program Files\\Blender Foundation\\Blender 3.6\\blender.exe",
                "C:\\Program Files\\Blender Foundation\\Blender\\blender.exe",
            ]
        } else if cfg!(target_os = "macos") {
            vec!["/Applications/Blender.app/Contents/MacOS/Blender"]
        } else {
            vec![
                "/usr/bin/blender",
                "/usr/local/bin/blender",
                "/snap/bin/blender",
            ]
        };

        for path_str in common_paths {
            let path = PathBuf::from(path_str);
            if path.exists() {
                return Ok(path);
            }
        }

        Err(BlenderError::BlenderNotFound)
    }

    fn resolve_entrypoint(&self) -> BlenderResult<ResolvedEntrypoint> {
        if self.config.entrypoint_path.exists() {
            return Ok(ResolvedEntrypoint {
                path: self.config.entrypoint_path.clone(),
                _tempfile: None,
            });
        }

        if let Ok(path) = std::env::var(ENTRYPOINT_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok(ResolvedEntrypoint {
                    path,
                    _tempfile: None,
                });
            }
            return Err(BlenderError::EntrypointNotFound { path });
        }

        // Last resort: write embedded entrypoint to a temp file.
        let mut file = tempfile::Builder::new()
            .prefix("spriteframe_entrypoint_")
            .suffix(".py")
            .tempfile()?;
        file.write_all(EMBEDDED_ENTRYPOINT_PY.as_bytes())?;
        file.flush()?;

        Ok(ResolvedEntrypoint {
            path: file.path().to_path_buf(),
            _tempfile: Some(file),
        })
    }

    /// Runs Blender on `project` in the given mode.
    ///
    /// `request_path` is passed to the entrypoint when present; the report
    /// is read back from `report_path`.
    pub fn run(
        &self,
        mode: BlenderMode,
        project: &Path,
        request_path: Option<&Path>,
        report_path: &Path,
    ) -> BlenderResult<BlenderReport> {
        if !project.exists() {
            return Err(BlenderError::ProjectNotFound {
                path: project.to_path_buf(),
            });
        }
        let blender_path = self.find_blender()?;
        let entrypoint = self.resolve_entrypoint()?;

        // blender --background <project> --python entrypoint.py -- --mode <mode> [--request <path>] --report <path>
        let mut cmd = Command::new(&blender_path);
        cmd.arg("--background")
            .arg(project)
            .arg("--python")
            .arg(&entrypoint.path)
            .arg("--")
            .arg("--mode")
            .arg(mode.as_str())
            .arg("--report")
            .arg(report_path);
        if let Some(request_path) = request_path {
            cmd.arg("--request").arg(request_path);
        }

        if self.config.capture_output {
            cmd.stdout(Stdio::null()).stderr(Stdio::piped());
        }
        detach_from_terminal_signals(&mut cmd);

        log::debug!("Running {:?}", cmd);
        let child = cmd.spawn().map_err(BlenderError::SpawnFailed)?;

        let (status, stderr) = wait_with_timeout(
            child,
            self.config.timeout_for(mode),
            self.config.capture_output,
        )?;

        if !status.success() {
            let exit_code = status.code().unwrap_or(-1);
            return Err(BlenderError::process_failed(exit_code, stderr));
        }

        let report_content =
            std::fs::read_to_string(report_path).map_err(|e| BlenderError::ReadReportFailed {
                path: report_path.to_path_buf(),
                source: e,
            })?;

        let report: BlenderReport =
            serde_json::from_str(&report_content).map_err(BlenderError::ParseReportFailed)?;

        if !report.ok {
            return Err(BlenderError::blender_failed(
                report.error.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        Ok(report)
    }

    /// Runs Blender with `request` written to a temporary file.
    pub fn run_request(
        &self,
        mode: BlenderMode,
        project: &Path,
        request: Option<&BlenderRequest>,
    ) -> BlenderResult<BlenderReport> {
        let temp_dir = tempfile::tempdir()?;
        let report_path = temp_dir.path().join("report.json");

        let request_path = match request {
            Some(request) => {
                let path = temp_dir.path().join("request.json");
                let json =
                    serde_json::to_string_pretty(request).map_err(BlenderError::SerializeFailed)?;
                std::fs::write(&path, json).map_err(BlenderError::WriteRequestFailed)?;
                Some(path)
            }
            None => None,
        };

        self.run(mode, project, request_path.as_deref(), &report_path)
    }
}

/// Runs Blender in its own process group so a Ctrl-C meant for the job
/// controller does not interrupt the render in progress.
#[cfg(unix)]
fn detach_from_terminal_signals(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn detach_from_terminal_signals(_cmd: &mut Command) {}

fn wait_with_timeout(
    mut child: Child,
    timeout: Duration,
    capture_output: bool,
) -> BlenderResult<(ExitStatus, String)> {
    let start = Instant::now();

    // Stderr is read while the child runs; a full pipe would block it.
    let stderr_reader = if capture_output {
        child.stderr.take().map(|mut err| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = err.read_to_end(&mut buf);
                String::from_utf8_lossy(&buf).into_owned()
            })
        })
    } else {
        None
    };

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(BlenderError::Timeout {
                        timeout_secs: timeout.as_secs(),
                    });
                }
                std::thread::sleep(Duration::from_millis(100));
            }
            Err(e) => return Err(BlenderError::SpawnFailed(e)),
        }
    };

    let stderr = stderr_reader
        .and_then(|reader| reader.join().ok())
        .unwrap_or_default();

    Ok((status, stderr))
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}
