//! In-memory host.
//!
//! `MemoryHost` keeps scene state in plain fields and records every render
//! call. It backs dry runs and the test suites; it can optionally write a
//! placeholder file per frame so folder layouts can be inspected.

use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::composite::CompositeGraph;
use crate::geometry::{CameraPose, Vec3};
use crate::host::{Action, Compositor, Host, RenderSettings, SceneObject};
use crate::layout::expand_frame_template;

/// Errors reported by [`MemoryHost`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryHostError {
    /// The object to bind an action to does not exist.
    #[error("Unknown object '{0}'")]
    UnknownObject(String),

    /// The action to bind does not exist.
    #[error("Unknown action '{0}'")]
    UnknownAction(String),

    /// Render requested before an output template was set.
    #[error("No output template set")]
    NoOutputTemplate,

    /// Writing a placeholder frame failed.
    #[error("Failed to write frame {path}: {message}")]
    WriteFrame { path: PathBuf, message: String },

    /// Failure injected by a render hook.
    #[error("Render failed: {0}")]
    Render(String),
}

/// Snapshot of the scene taken at each render call.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRecord {
    /// Object name to bound action name.
    pub bindings: BTreeMap<String, String>,
    /// Camera pose at render time.
    pub camera: CameraPose,
    /// Frame range at render time.
    pub frame_range: Option<(i32, i32)>,
    /// Output template at render time.
    pub output_template: PathBuf,
    /// Render settings at render time.
    pub settings: Option<RenderSettings>,
}

type RenderHook = Box<dyn FnMut(usize) -> Result<(), String> + Send>;

/// Host whose scene lives entirely in memory.
pub struct MemoryHost {
    actions: Vec<Action>,
    selection: Vec<SceneObject>,
    camera: CameraPose,
    settings: Option<RenderSettings>,
    frame_range: Option<(i32, i32)>,
    bindings: BTreeMap<String, String>,
    output_template: Option<PathBuf>,
    renders: Vec<RenderRecord>,
    write_frames: bool,
    render_hook: Option<RenderHook>,
    graphs: Vec<CompositeGraph>,
}

impl std::fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryHost")
            .field("actions", &self.actions)
            .field("selection", &self.selection)
            .field("camera", &self.camera)
            .field("renders", &self.renders.len())
            .finish_non_exhaustive()
    }
}

impl MemoryHost {
    /// Creates a host with the camera at `camera_location`.
    pub fn new(camera_location: Vec3) -> Self {
        Self {
            actions: Vec::new(),
            selection: Vec::new(),
            camera: CameraPose::aimed_at_origin(camera_location),
            settings: None,
            frame_range: None,
            bindings: BTreeMap::new(),
            output_template: None,
            renders: Vec::new(),
            write_frames: false,
            render_hook: None,
            graphs: Vec::new(),
        }
    }

    /// Adds an action.
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Adds a selected object.
    pub fn with_selected(mut self, object: SceneObject) -> Self {
        self.selection.push(object);
        self
    }

    /// Writes an empty placeholder file for every rendered frame.
    pub fn writing_frames(mut self) -> Self {
        self.write_frames = true;
        self
    }

    /// Runs `hook` with the zero-based render index before each render.
    /// An `Err` from the hook fails that render.
    pub fn with_render_hook(
        mut self,
        hook: impl FnMut(usize) -> Result<(), String> + Send + 'static,
    ) -> Self {
        self.render_hook = Some(Box::new(hook));
        self
    }

    /// Every render call so far.
    pub fn renders(&self) -> &[RenderRecord] {
        &self.renders
    }

    /// Current camera pose.
    pub fn camera(&self) -> CameraPose {
        self.camera
    }

    /// Render settings last applied.
    pub fn settings(&self) -> Option<RenderSettings> {
        self.settings
    }

    /// Current object to action bindings.
    pub fn bindings(&self) -> &BTreeMap<String, String> {
        &self.bindings
    }

    /// Graphs built through [`Compositor::rebuild`], oldest first.
    pub fn graphs(&self) -> &[CompositeGraph] {
        &self.graphs
    }

    /// The compositor graph currently in place.
    pub fn current_graph(&self) -> Option<&CompositeGraph> {
        self.graphs.last()
    }

    fn write_placeholder_frames(&self, template: &std::path::Path) -> Result<(), MemoryHostError> {
        let (start, end) = self.frame_range.unwrap_or((1, 1));
        let step = self.settings.map(|s| s.frame_step.max(1)).unwrap_or(1);
        let template = template.to_string_lossy();

        let mut frame = start;
        while frame <= end {
            let path = PathBuf::from(expand_frame_template(&template, frame));
            std::fs::write(&path, b"").map_err(|e| MemoryHostError::WriteFrame {
                path: path.clone(),
                message: e.to_string(),
            })?;
            frame += step as i32;
        }
        Ok(())
    }
}

impl Host for MemoryHost {
    type Error = MemoryHostError;

    fn actions(&self) -> Result<Vec<Action>, Self::Error> {
        Ok(self.actions.clone())
    }

    fn selected_objects(&self) -> Result<Vec<SceneObject>, Self::Error> {
        Ok(self.selection.clone())
    }

    fn camera_location(&self) -> Result<Vec3, Self::Error> {
        Ok(self.camera.location)
    }

    fn set_camera_pose(&mut self, pose: CameraPose) -> Result<(), Self::Error> {
        self.camera = pose;
        Ok(())
    }

    fn bind_action(&mut self, object: &str, action: &str) -> Result<(), Self::Error> {
        if !self.selection.iter().any(|o| o.name == object) {
            return Err(MemoryHostError::UnknownObject(object.to_string()));
        }
        if !self.actions.iter().any(|a| a.name == action) {
            return Err(MemoryHostError::UnknownAction(action.to_string()));
        }
        self.bindings.insert(object.to_string(), action.to_string());
        Ok(())
    }

    fn set_frame_range(&mut self, start: i32, end: i32) -> Result<(), Self::Error> {
        self.frame_range = Some((start, end));
        Ok(())
    }

    fn apply_render_settings(&mut self, settings: &RenderSettings) -> Result<(), Self::Error> {
        self.settings = Some(*settings);
        Ok(())
    }

    fn set_output_template(&mut self, template: &std::path::Path) -> Result<(), Self::Error> {
        self.output_template = Some(template.to_path_buf());
        Ok(())
    }

    fn render_animation(&mut self) -> Result<(), Self::Error> {
        let index = self.renders.len();
        if let Some(hook) = self.render_hook.as_mut() {
            hook(index).map_err(MemoryHostError::Render)?;
        }

        let template = self
            .output_template
            .clone()
            .ok_or(MemoryHostError::NoOutputTemplate)?;
        if self.write_frames {
            self.write_placeholder_frames(&template)?;
        }

        self.renders.push(RenderRecord {
            bindings: self.bindings.clone(),
            camera: self.camera,
            frame_range: self.frame_range,
            output_template: template,
            settings: self.settings,
        });
        Ok(())
    }
}

impl Compositor for MemoryHost {
    type Error = MemoryHostError;

    fn rebuild(&mut self, graph: &CompositeGraph) -> Result<(), Self::Error> {
        self.graphs.push(graph.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_unknown_object_fails() {
        let mut host = MemoryHost::new(Vec3::new(0.0, -5.0, 1.0))
            .with_action(Action::new("Walk", 1.0, 4.0))
            .with_selected(SceneObject::animated("Rig"));
        assert!(host.bind_action("Rig", "Walk").is_ok());
        assert_eq!(
            host.bind_action("Ghost", "Walk"),
            Err(MemoryHostError::UnknownObject("Ghost".to_string()))
        );
        assert_eq!(
            host.bind_action("Rig", "Jump"),
            Err(MemoryHostError::UnknownAction("Jump".to_string()))
        );
    }

    #[test]
    fn test_render_requires_template() {
        let mut host = MemoryHost::new(Vec3::new(0.0, -5.0, 1.0));
        assert_eq!(
            host.render_animation(),
            Err(MemoryHostError::NoOutputTemplate)
        );
    }

    #[test]
    fn test_placeholder_frames_follow_step() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = MemoryHost::new(Vec3::new(0.0, -5.0, 1.0)).writing_frames();
        host.set_frame_range(1, 5).unwrap();
        host.apply_render_settings(&RenderSettings {
            resolution: [64, 64],
            fps: 12,
            frame_step: 2,
        })
        .unwrap();
        host.set_output_template(&dir.path().join("frame_####"))
            .unwrap();
        host.render_animation().unwrap();

        let mut names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["frame_0001", "frame_0003", "frame_0005"]);
        assert_eq!(host.renders().len(), 1);
    }
}
