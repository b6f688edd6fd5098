//! [`Host`] and [`Compositor`] implementations backed by a Blender project.
//!
//! Blender runs as a fresh subprocess for every render, so the host keeps the
//! scene changes made by the controller in a [`BlenderRequest`] and sends the
//! whole accumulated state with each render call. Nothing is written back to
//! the project unless [`BlenderHost::save`] or the compositor is used.

use std::path::{Path, PathBuf};

use spriteframe_core::{
    Action, CameraPose, CompositeGraph, Compositor, Host, RenderSettings, SceneObject, Vec3,
};

use crate::error::{BlenderError, BlenderResult};
use crate::orchestrator::{BlenderMode, Orchestrator, OrchestratorConfig};
use crate::report::{BlenderRequest, SceneInfo};

/// A Blender project driven through subprocess calls.
#[derive(Debug)]
pub struct BlenderHost {
    project: PathBuf,
    orchestrator: Orchestrator,
    scene: SceneInfo,
    selection: Option<Vec<String>>,
    pending: BlenderRequest,
    blender_version: Option<String>,
}

impl BlenderHost {
    /// Opens `project` and inspects its scene.
    pub fn open(project: impl Into<PathBuf>, config: OrchestratorConfig) -> BlenderResult<Self> {
        let project = project.into();
        let orchestrator = Orchestrator::with_config(config);
        let report = orchestrator.run_request(BlenderMode::Inspect, &project, None)?;
        let scene = report.scene.ok_or(BlenderError::MissingScene)?;

        log::info!(
            "Opened {} ({} actions, {} objects)",
            project.display(),
            scene.actions.len(),
            scene.objects.len()
        );

        Ok(Self {
            project,
            orchestrator,
            scene,
            selection: None,
            pending: BlenderRequest::default(),
            blender_version: report.blender_version,
        })
    }

    /// Uses `names` as the selection instead of what the file has selected.
    pub fn with_selection<I, S>(mut self, names: I) -> BlenderResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if let Some(missing) = names.iter().find(|n| self.scene.object(n).is_none()) {
            return Err(BlenderError::UnknownObject {
                name: missing.clone(),
            });
        }
        self.selection = Some(names);
        Ok(self)
    }

    /// Path of the project file.
    pub fn project(&self) -> &Path {
        &self.project
    }

    /// Folder containing the project file; relative output paths resolve here.
    pub fn project_dir(&self) -> &Path {
        self.project.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Scene as inspected when the project was opened.
    pub fn scene(&self) -> &SceneInfo {
        &self.scene
    }

    /// Blender version reported by the inspection run.
    pub fn blender_version(&self) -> Option<&str> {
        self.blender_version.as_deref()
    }

    /// Scene changes not yet written to the project.
    pub fn pending(&self) -> &BlenderRequest {
        &self.pending
    }

    /// Writes the pending render settings and camera pose into the project.
    pub fn save(&mut self) -> BlenderResult<()> {
        let request = BlenderRequest {
            render: self.pending.render,
            camera: self.pending.camera,
            save: true,
            ..BlenderRequest::default()
        };
        self.orchestrator
            .run_request(BlenderMode::Apply, &self.project, Some(&request))?;

        if let Some(render) = request.render {
            self.scene.render = Some(render);
        }
        if let (Some(pose), Some(camera)) = (request.camera, self.scene.camera.as_mut()) {
            camera.location = pose.location;
        }
        log::info!("Saved render settings to {}", self.project.display());
        Ok(())
    }
}

impl Host for BlenderHost {
    type Error = BlenderError;

    fn actions(&self) -> Result<Vec<Action>, Self::Error> {
        Ok(self.scene.actions.clone())
    }

    fn selected_objects(&self) -> Result<Vec<SceneObject>, Self::Error> {
        match &self.selection {
            Some(names) => names
                .iter()
                .map(|name| {
                    self.scene
                        .object(name)
                        .map(SceneObject::from)
                        .ok_or_else(|| BlenderError::UnknownObject { name: name.clone() })
                })
                .collect(),
            None => Ok(self.scene.selected().map(SceneObject::from).collect()),
        }
    }

    fn camera_location(&self) -> Result<Vec3, Self::Error> {
        if let Some(pose) = self.pending.camera {
            return Ok(pose.location);
        }
        self.scene
            .camera
            .as_ref()
            .map(|c| c.location)
            .ok_or(BlenderError::NoActiveCamera)
    }

    fn set_camera_pose(&mut self, pose: CameraPose) -> Result<(), Self::Error> {
        if self.scene.camera.is_none() {
            return Err(BlenderError::NoActiveCamera);
        }
        self.pending.camera = Some(pose);
        Ok(())
    }

    fn bind_action(&mut self, object: &str, action: &str) -> Result<(), Self::Error> {
        if self.scene.object(object).is_none() {
            return Err(BlenderError::UnknownObject {
                name: object.to_string(),
            });
        }
        self.pending
            .bindings
            .insert(object.to_string(), action.to_string());
        Ok(())
    }

    fn set_frame_range(&mut self, start: i32, end: i32) -> Result<(), Self::Error> {
        self.pending.frame_range = Some([start, end]);
        Ok(())
    }

    fn apply_render_settings(&mut self, settings: &RenderSettings) -> Result<(), Self::Error> {
        self.pending.render = Some(*settings);
        Ok(())
    }

    fn set_output_template(&mut self, template: &Path) -> Result<(), Self::Error> {
        self.pending.output_template = Some(template.to_string_lossy().into_owned());
        Ok(())
    }

    fn render_animation(&mut self) -> Result<(), Self::Error> {
        let request = BlenderRequest {
            render_animation: true,
            save: false,
            composite: None,
            ..self.pending.clone()
        };
        let report = self
            .orchestrator
            .run_request(BlenderMode::Render, &self.project, Some(&request))?;
        log::debug!(
            "Rendered {} frame(s) into {}",
            report.frames_rendered.unwrap_or(0),
            request.output_template.as_deref().unwrap_or("<default>")
        );
        Ok(())
    }
}

impl Compositor for BlenderHost {
    type Error = BlenderError;

    fn rebuild(&mut self, graph: &CompositeGraph) -> Result<(), Self::Error> {
        let request = BlenderRequest {
            composite: Some(graph.clone()),
            save: true,
            ..BlenderRequest::default()
        };
        self.orchestrator
            .run_request(BlenderMode::Composite, &self.project, Some(&request))?;
        Ok(())
    }
}
