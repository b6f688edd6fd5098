//! Host capabilities consumed by the orchestrator.
//!
//! The host owns the scene graph, the renderer and the compositor. The core
//! only reads action names and frame ranges, moves the camera, binds actions
//! to objects and asks the renderer to render.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::composite::CompositeGraph;
use crate::error::BoxedHostError;
use crate::geometry::{CameraPose, Vec3};

/// An animation clip owned by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Action name, unique within the project.
    pub name: String,
    /// Frame range `[start, end]` as stored by the host.
    pub frame_range: [f64; 2],
}

impl Action {
    /// Creates a new action.
    pub fn new(name: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            name: name.into(),
            frame_range: [start, end],
        }
    }

    /// Integer frame bounds, truncated toward zero.
    pub fn frame_bounds(&self) -> (i32, i32) {
        (self.frame_range[0] as i32, self.frame_range[1] as i32)
    }
}

/// A selected scene object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Object name.
    pub name: String,
    /// Whether the object carries animation data an action can be bound to.
    pub has_animation_data: bool,
}

impl SceneObject {
    /// Creates an object with animation data.
    pub fn animated(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            has_animation_data: true,
        }
    }

    /// Creates an object without animation data.
    pub fn static_object(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            has_animation_data: false,
        }
    }
}

/// Render output settings copied from the configuration onto the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Output resolution `[width, height]` in pixels.
    pub resolution: [u32; 2],
    /// Frames per second.
    pub fps: u32,
    /// Number of frames to advance between rendered frames.
    pub frame_step: u32,
}

/// Scene and renderer operations used by the render controller.
///
/// A host is moved onto the worker thread while a job runs, so it must be
/// `Send`. Every method is called from exactly one thread at a time.
pub trait Host: Send + 'static {
    /// Error type reported by the host.
    type Error: Into<BoxedHostError>;

    /// All actions, in the host's fixed ordering.
    fn actions(&self) -> Result<Vec<Action>, Self::Error>;

    /// Currently selected objects.
    fn selected_objects(&self) -> Result<Vec<SceneObject>, Self::Error>;

    /// World-space location of the active camera.
    fn camera_location(&self) -> Result<Vec3, Self::Error>;

    /// Moves and orients the active camera.
    fn set_camera_pose(&mut self, pose: CameraPose) -> Result<(), Self::Error>;

    /// Binds `action` as the active action of `object`.
    fn bind_action(&mut self, object: &str, action: &str) -> Result<(), Self::Error>;

    /// Sets the scene's frame range.
    fn set_frame_range(&mut self, start: i32, end: i32) -> Result<(), Self::Error>;

    /// Applies resolution, fps and frame step to the renderer.
    fn apply_render_settings(&mut self, settings: &RenderSettings) -> Result<(), Self::Error>;

    /// Sets the output path template. `#` characters are replaced by the
    /// zero-padded frame number.
    fn set_output_template(&mut self, template: &Path) -> Result<(), Self::Error>;

    /// Renders the scene's full frame range. Blocks until done.
    fn render_animation(&mut self) -> Result<(), Self::Error>;
}

/// Compositor node graph operations.
pub trait Compositor {
    /// Error type reported by the compositor.
    type Error: Into<BoxedHostError>;

    /// Discards every existing node and builds `graph` in its place.
    fn rebuild(&mut self, graph: &CompositeGraph) -> Result<(), Self::Error>;
}
