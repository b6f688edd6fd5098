//! JSON documents exchanged with the Blender entrypoint.
//!
//! Rust writes a [`BlenderRequest`] describing the scene state to apply,
//! Blender answers with a [`BlenderReport`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use spriteframe_core::{Action, CameraPose, CompositeGraph, RenderSettings, SceneObject, Vec3};

/// An object as seen by the inspection pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object name.
    pub name: String,
    /// Whether the object is selected in the saved view layer.
    pub selected: bool,
    /// Whether the object has animation data.
    pub has_animation_data: bool,
}

impl From<&ObjectInfo> for SceneObject {
    fn from(info: &ObjectInfo) -> Self {
        SceneObject {
            name: info.name.clone(),
            has_animation_data: info.has_animation_data,
        }
    }
}

/// The active camera as seen by the inspection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraInfo {
    /// Camera object name.
    pub name: String,
    /// World-space location.
    pub location: Vec3,
}

/// Scene state reported by the inspection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneInfo {
    /// Every action in `bpy.data.actions` order.
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Every object in the scene.
    #[serde(default)]
    pub objects: Vec<ObjectInfo>,
    /// The active camera, if any.
    #[serde(default)]
    pub camera: Option<CameraInfo>,
    /// Current render settings.
    #[serde(default)]
    pub render: Option<RenderSettings>,
}

impl SceneInfo {
    /// Objects selected in the saved file.
    pub fn selected(&self) -> impl Iterator<Item = &ObjectInfo> {
        self.objects.iter().filter(|o| o.selected)
    }

    /// Looks up an object by name.
    pub fn object(&self, name: &str) -> Option<&ObjectInfo> {
        self.objects.iter().find(|o| o.name == name)
    }
}

/// Scene changes for Blender to apply before acting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlenderRequest {
    /// Resolution, fps and frame step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render: Option<RenderSettings>,
    /// Active camera pose.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraPose>,
    /// Scene frame range `[start, end]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_range: Option<[i32; 2]>,
    /// Object name to action name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bindings: BTreeMap<String, String>,
    /// Render output path template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_template: Option<String>,
    /// Compositor graph replacing the existing one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite: Option<CompositeGraph>,
    /// Render the animation after applying the changes.
    #[serde(default)]
    pub render_animation: bool,
    /// Save the project after applying the changes.
    #[serde(default)]
    pub save: bool,
}

/// Report written by the Blender entrypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlenderReport {
    /// Whether the request succeeded.
    pub ok: bool,
    /// Error message if the request failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Scene state, for inspection requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<SceneInfo>,
    /// Number of frames written by a render request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames_rendered: Option<u32>,
    /// Blender version used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blender_version: Option<String>,
    /// Execution time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl BlenderReport {
    /// Creates a successful report.
    pub fn success() -> Self {
        Self {
            ok: true,
            error: None,
            scene: None,
            frames_rendered: None,
            blender_version: None,
            duration_ms: None,
        }
    }

    /// Creates a failed report.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            ..Self::success()
        }
    }
}
